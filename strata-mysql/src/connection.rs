use crate::MysqlSqlWriter;
use mysql::prelude::{Protocol, Queryable};
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::{
    Backend, ConnectOptions, Error, ForeignKeyRef, IndexDef, Operation, QueryResponse,
    RenderedQuery, Result, RowLabeled, RowsAffected, SqlWriter, TableColumn, Value,
};
use time::PrimitiveDateTime;

/// MySQL backend over a single connection.
pub struct MysqlConnection {
    connection: mysql::Conn,
    writer: MysqlSqlWriter,
}

impl MysqlConnection {
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        options.validate()?;
        let mut builder = mysql::OptsBuilder::new()
            .ip_or_hostname(Some(options.hostname.clone()))
            .db_name(Some(options.database.clone()))
            .user(Some(options.username.clone()));
        if options.port > 0 {
            builder = builder.tcp_port(options.port);
        }
        if !options.password.is_empty() {
            builder = builder.pass(Some(options.password.clone()));
        }
        let connection = mysql::Conn::new(builder).map_err(map_connect_error)?;
        Ok(Self {
            connection,
            writer: MysqlSqlWriter::new(),
        })
    }

    fn run_inner(&mut self, rendered: &RenderedQuery) -> Result<QueryResponse> {
        if rendered.params.is_empty() {
            // Text protocol accepts DDL and SHOW statements.
            let result = self
                .connection
                .query_iter(&rendered.sql)
                .map_err(map_error)?;
            collect_result(result)
        } else {
            let params =
                mysql::Params::Positional(rendered.params.iter().map(bind_param).collect());
            let result = self
                .connection
                .exec_iter(rendered.sql.as_str(), params)
                .map_err(map_error)?;
            collect_result(result)
        }
    }

    fn query_rows(&mut self, rendered: RenderedQuery) -> Result<Vec<RowLabeled>> {
        self.run_inner(&rendered)?.into_rows()
    }

    fn quoted(&self, identifier: &str) -> String {
        let mut out = String::with_capacity(identifier.len() + 2);
        self.writer.write_identifier_quoted(&mut out, identifier);
        out
    }
}

impl Backend for MysqlConnection {
    fn dialect(&self) -> &'static str {
        "mysql"
    }

    fn writer(&self) -> &dyn SqlWriter {
        &self.writer
    }

    fn run(&mut self, _operation: Operation, rendered: &RenderedQuery) -> QueryResponse {
        match self.run_inner(rendered) {
            Ok(response) => response,
            Err(error) => {
                log::error!("{error}");
                QueryResponse::from_error(error)
            }
        }
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let rows = self.query_rows(RenderedQuery {
            sql: "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
                  WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?"
                .to_string(),
            params: vec![Value::from(table)],
        })?;
        Ok(!rows.is_empty())
    }

    fn describe_columns(&mut self, table: &str) -> Result<Vec<TableColumn>> {
        let foreign: HashMap<String, ForeignKeyRef> = self
            .query_rows(RenderedQuery {
                sql: "SELECT COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
                      FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE \
                      WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
                        AND REFERENCED_TABLE_NAME IS NOT NULL"
                    .to_string(),
                params: vec![Value::from(table)],
            })?
            .iter()
            .filter_map(|row| {
                Some((
                    row.get_column("COLUMN_NAME")?.text()?.to_string(),
                    ForeignKeyRef {
                        table: row.get_column("REFERENCED_TABLE_NAME")?.text()?.to_string(),
                        column: row
                            .get_column("REFERENCED_COLUMN_NAME")?
                            .text()?
                            .to_string(),
                    },
                ))
            })
            .collect();
        let columns = self
            .query_rows(RenderedQuery {
                sql: format!("SHOW COLUMNS FROM {}", self.quoted(table)),
                params: Vec::new(),
            })?
            .iter()
            .filter_map(|row| {
                let name = row.get_column("Field")?.text()?.to_string();
                Some(TableColumn {
                    references: foreign.get(&name).cloned(),
                    auto_increment: row
                        .get_column("Extra")
                        .and_then(Value::text)
                        .is_some_and(|extra| extra.contains("auto_increment")),
                    nullable: row.get_column("Null").and_then(Value::text) == Some("YES"),
                    column_type: row.get_column("Type")?.text()?.to_string(),
                    default: row
                        .get_column("Default")
                        .and_then(Value::text)
                        .map(str::to_string),
                    name,
                })
            })
            .collect();
        Ok(columns)
    }

    fn get_indexes(&mut self, table: &str) -> Result<Vec<IndexDef>> {
        let indexes = self
            .query_rows(RenderedQuery {
                sql: format!("SHOW INDEX FROM {}", self.quoted(table)),
                params: Vec::new(),
            })?
            .iter()
            .filter_map(|row| {
                let name = row.get_column("Key_name")?.text()?.to_string();
                Some(IndexDef {
                    primary: name == "PRIMARY",
                    unique: row.get_column("Non_unique").and_then(Value::text) == Some("0")
                        || row.get_column("Non_unique").and_then(Value::integer) == Some(0),
                    column: row.get_column("Column_name")?.text()?.to_string(),
                    name,
                })
            })
            .collect();
        Ok(indexes)
    }
}

fn collect_result<P: Protocol>(
    mut result: mysql::QueryResult<'_, '_, '_, P>,
) -> Result<QueryResponse> {
    let affected = result.affected_rows();
    let last_id = result.last_insert_id();
    let mut labels: Option<Arc<[String]>> = None;
    let mut rows = Vec::new();
    for row in result.by_ref() {
        let row = row.map_err(map_error)?;
        let labels = labels
            .get_or_insert_with(|| {
                row.columns_ref()
                    .iter()
                    .map(|c| c.name_str().into_owned())
                    .collect()
            })
            .clone();
        let values: Vec<Value> = row.unwrap().into_iter().map(extract_value).collect();
        rows.push(RowLabeled::new(labels, values.into()));
    }
    if labels.is_some() {
        Ok(QueryResponse::from_rows(rows))
    } else {
        Ok(QueryResponse::from_affected(RowsAffected {
            rows_affected: affected,
            last_affected_id: last_id.map(|id| id as i64),
        }))
    }
}

fn bind_param(value: &Value) -> mysql::Value {
    use mysql::Value as Sql;
    match value {
        v if v.is_null() => Sql::NULL,
        Value::Boolean(Some(v)) => Sql::Int(*v as i64),
        Value::Int32(Some(v)) => Sql::Int(*v as i64),
        Value::Int64(Some(v)) => Sql::Int(*v),
        Value::Float64(Some(v)) => Sql::Double(*v),
        Value::Varchar(Some(v)) => Sql::Bytes(v.clone().into_bytes()),
        Value::Blob(Some(v)) => Sql::Bytes(v.clone()),
        Value::Date(Some(v)) => Sql::Date(
            v.year() as u16,
            v.month() as u8,
            v.day(),
            0,
            0,
            0,
            0,
        ),
        Value::Timestamp(Some(v)) => Sql::Date(
            v.year() as u16,
            v.month() as u8,
            v.day(),
            v.hour(),
            v.minute(),
            v.second(),
            0,
        ),
        other => {
            // Lists are expanded by the writer before binding.
            log::warn!("cannot bind {:?}, sending NULL", other);
            Sql::NULL
        }
    }
}

fn extract_value(value: mysql::Value) -> Value {
    use mysql::Value as Sql;
    match value {
        Sql::NULL => Value::Null,
        Sql::Bytes(bytes) => Value::Varchar(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Sql::Int(v) => Value::Int64(Some(v)),
        Sql::UInt(v) => Value::Int64(Some(v as i64)),
        Sql::Float(v) => Value::Float64(Some(v as f64)),
        Sql::Double(v) => Value::Float64(Some(v)),
        Sql::Date(year, month, day, hour, minute, second, _micros) => {
            match datetime(year, month, day, hour, minute, second) {
                Some(v) => Value::Timestamp(Some(v)),
                None => Value::Null,
            }
        }
        Sql::Time(..) => {
            log::warn!("TIME values are not mapped, reading NULL");
            Value::Null
        }
    }
}

fn datetime(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Option<PrimitiveDateTime> {
    let month = time::Month::try_from(month).ok()?;
    let date = time::Date::from_calendar_date(year as i32, month, day).ok()?;
    let time = time::Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

/// Table name inside `Table 'db.name' doesn't exist`.
fn quoted_table(message: &str) -> Option<String> {
    let start = message.find('\'')? + 1;
    let end = message[start..].find('\'')? + start;
    let full = &message[start..end];
    Some(
        full.rsplit('.')
            .next()
            .unwrap_or(full)
            .to_string(),
    )
}

fn map_error(error: mysql::Error) -> Error {
    match &error {
        mysql::Error::MySqlError(e) => {
            let code = e.code.to_string();
            match e.code {
                // ER_NO_SUCH_TABLE
                1146 => Error::TableDoesntExist {
                    table: quoted_table(&e.message).unwrap_or_default(),
                    code,
                    message: e.message.clone(),
                },
                // Duplicate key and foreign key failures.
                1062 | 1451 | 1452 | 1216 | 1217 => Error::ConstraintViolation {
                    code,
                    message: e.message.clone(),
                },
                _ => Error::Query {
                    code,
                    message: e.message.clone(),
                },
            }
        }
        mysql::Error::IoError(e) => Error::connection(e.to_string()),
        other => Error::query("", other.to_string()),
    }
}

fn map_connect_error(error: mysql::Error) -> Error {
    Error::connection(error.to_string())
}
