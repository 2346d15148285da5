use crate::SqliteSqlWriter;
use rusqlite::types::ValueRef;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::{
    Backend, ConnectOptions, DATETIME_FORMAT, DATE_FORMAT, Error, ForeignKeyRef, IndexDef,
    Operation, QueryResponse, RenderedQuery, Result, RowLabeled, RowsAffected, SqlWriter,
    TableColumn, Value,
};

/// SQLite backend over a single `rusqlite` connection.
pub struct SqliteConnection {
    connection: rusqlite::Connection,
    writer: SqliteSqlWriter,
}

impl SqliteConnection {
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        options.validate()?;
        let connection = if options.file == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&options.file)
        }
        .map_err(|e| Error::connection(e.to_string()))?;
        Ok(Self {
            connection,
            writer: SqliteSqlWriter::new(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::connect(&ConnectOptions::sqlite_in_memory())
    }

    fn run_inner(&mut self, rendered: &RenderedQuery) -> Result<QueryResponse> {
        let mut statement = self.connection.prepare(&rendered.sql).map_err(map_error)?;
        let params: Vec<rusqlite::types::Value> =
            rendered.params.iter().map(bind_param).collect();
        if statement.column_count() > 0 {
            let labels: Arc<[String]> = statement
                .column_names()
                .iter()
                .map(|name| name.to_string())
                .collect();
            let mut out = Vec::new();
            let mut rows = statement
                .query(rusqlite::params_from_iter(params))
                .map_err(map_error)?;
            while let Some(row) = rows.next().map_err(map_error)? {
                let mut values = Vec::with_capacity(labels.len());
                for i in 0..labels.len() {
                    values.push(extract_value(row.get_ref(i).map_err(map_error)?));
                }
                out.push(RowLabeled::new(labels.clone(), values.into()));
            }
            Ok(QueryResponse::from_rows(out))
        } else {
            let affected = statement
                .execute(rusqlite::params_from_iter(params))
                .map_err(map_error)?;
            Ok(QueryResponse::from_affected(RowsAffected {
                rows_affected: affected as u64,
                last_affected_id: Some(self.connection.last_insert_rowid()),
            }))
        }
    }

    fn query_rows(&mut self, sql: String) -> Result<Vec<RowLabeled>> {
        self.run_inner(&RenderedQuery {
            sql,
            params: Vec::new(),
        })?
        .into_rows()
    }

    fn quoted(&self, identifier: &str) -> String {
        let mut out = String::with_capacity(identifier.len() + 2);
        self.writer.write_identifier_quoted(&mut out, identifier);
        out
    }

    fn missing(&self, table: &str) -> Error {
        Error::table_doesnt_exist(table, "1", format!("no such table: {table}"))
    }
}

impl Backend for SqliteConnection {
    fn dialect(&self) -> &'static str {
        "sqlite"
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
        let mut statement = self
            .connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .map_err(map_error)?;
        statement.exists([table]).map_err(map_error)
    }

    fn describe_columns(&mut self, table: &str) -> Result<Vec<TableColumn>> {
        if !self.table_exists(table)? {
            return Err(self.missing(table));
        }
        let quoted = self.quoted(table);
        let foreign: HashMap<String, ForeignKeyRef> = self
            .query_rows(format!("PRAGMA foreign_key_list({quoted})"))?
            .iter()
            .filter_map(|row| {
                Some((
                    row.get_column("from")?.text()?.to_string(),
                    ForeignKeyRef {
                        table: row.get_column("table")?.text()?.to_string(),
                        column: row.get_column("to")?.text()?.to_string(),
                    },
                ))
            })
            .collect();
        let columns = self
            .query_rows(format!("PRAGMA table_info({quoted})"))?
            .iter()
            .filter_map(|row| {
                let name = row.get_column("name")?.text()?.to_string();
                let column_type = row.get_column("type")?.text().unwrap_or("").to_string();
                let in_pk = row
                    .get_column("pk")
                    .and_then(Value::integer)
                    .unwrap_or(0)
                    > 0;
                Some(TableColumn {
                    references: foreign.get(&name).cloned(),
                    auto_increment: in_pk && column_type.eq_ignore_ascii_case("INTEGER"),
                    nullable: row
                        .get_column("notnull")
                        .and_then(Value::integer)
                        .unwrap_or(0)
                        == 0,
                    default: row.get_column("dflt_value").and_then(default_text),
                    name,
                    column_type,
                })
            })
            .collect();
        Ok(columns)
    }

    fn get_indexes(&mut self, table: &str) -> Result<Vec<IndexDef>> {
        if !self.table_exists(table)? {
            return Err(self.missing(table));
        }
        let quoted = self.quoted(table);
        let mut indexes = Vec::new();
        // Primary key columns come from the table description itself.
        for row in self.query_rows(format!("PRAGMA table_info({quoted})"))? {
            if row.get_column("pk").and_then(Value::integer).unwrap_or(0) > 0 {
                if let Some(column) = row.get_column("name").and_then(Value::text) {
                    indexes.push(IndexDef {
                        name: "PRIMARY".to_string(),
                        column: column.to_string(),
                        unique: true,
                        primary: true,
                    });
                }
            }
        }
        for index in self.query_rows(format!("PRAGMA index_list({quoted})"))? {
            let Some(name) = index.get_column("name").and_then(Value::text) else {
                continue;
            };
            // The implicit primary key index is already listed.
            if index.get_column("origin").and_then(Value::text) == Some("pk") {
                continue;
            }
            let name = name.to_string();
            let unique = index
                .get_column("unique")
                .and_then(Value::integer)
                .unwrap_or(0)
                != 0;
            let quoted_index = self.quoted(&name);
            for info in self.query_rows(format!("PRAGMA index_info({quoted_index})"))? {
                if let Some(column) = info.get_column("name").and_then(Value::text) {
                    indexes.push(IndexDef {
                        name: name.clone(),
                        column: column.to_string(),
                        unique,
                        primary: false,
                    });
                }
            }
        }
        Ok(indexes)
    }
}

fn default_text(value: &Value) -> Option<String> {
    match value {
        Value::Varchar(Some(v)) => Some(v.clone()),
        Value::Int64(Some(v)) => Some(v.to_string()),
        Value::Float64(Some(v)) => Some(v.to_string()),
        _ => None,
    }
}

fn bind_param(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        v if v.is_null() => Sql::Null,
        Value::Boolean(Some(v)) => Sql::Integer(*v as i64),
        Value::Int32(Some(v)) => Sql::Integer(*v as i64),
        Value::Int64(Some(v)) => Sql::Integer(*v),
        Value::Float64(Some(v)) => Sql::Real(*v),
        Value::Varchar(Some(v)) => Sql::Text(v.clone()),
        Value::Blob(Some(v)) => Sql::Blob(v.clone()),
        Value::Date(Some(v)) => Sql::Text(v.format(DATE_FORMAT).unwrap_or_default()),
        Value::Timestamp(Some(v)) => Sql::Text(v.format(DATETIME_FORMAT).unwrap_or_default()),
        other => {
            // Lists are expanded by the writer before binding.
            log::warn!("cannot bind {:?}, sending NULL", other);
            Sql::Null
        }
    }
}

fn extract_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(String::from_utf8_lossy(v).into_owned())),
        ValueRef::Blob(v) => Value::Blob(Some(v.to_vec())),
    }
}

fn map_error(error: rusqlite::Error) -> Error {
    match &error {
        rusqlite::Error::SqliteFailure(code, message) => {
            let text = message
                .clone()
                .unwrap_or_else(|| code.to_string());
            let code_text = code.extended_code.to_string();
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                Error::ConstraintViolation {
                    code: code_text,
                    message: text,
                }
            } else if let Some(table) = text.strip_prefix("no such table: ") {
                Error::TableDoesntExist {
                    table: table.to_string(),
                    code: code_text,
                    message: text.clone(),
                }
            } else if code.code == rusqlite::ErrorCode::CannotOpen
                || code.code == rusqlite::ErrorCode::NotADatabase
            {
                Error::Connection { message: text }
            } else {
                Error::Query {
                    code: code_text,
                    message: text,
                }
            }
        }
        other => Error::query("", other.to_string()),
    }
}
