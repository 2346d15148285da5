use crate::PostgresSqlWriter;
use postgres::types::{ToSql, Type};
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::{
    Backend, ConnectOptions, Error, ForeignKeyRef, IndexDef, Operation, QueryResponse,
    RenderedQuery, Result, RowLabeled, RowsAffected, SqlWriter, TableColumn, Value,
};

/// Postgres backend over a single blocking client.
pub struct PostgresConnection {
    client: postgres::Client,
    writer: PostgresSqlWriter,
}

impl PostgresConnection {
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        options.validate()?;
        let mut config = postgres::Config::new();
        config
            .host(&options.hostname)
            .dbname(&options.database)
            .user(&options.username);
        if options.port > 0 {
            config.port(options.port);
        }
        if !options.password.is_empty() {
            config.password(&options.password);
        }
        let client = config
            .connect(postgres::NoTls)
            .map_err(|e| Error::connection(e.to_string()))?;
        Ok(Self {
            client,
            writer: PostgresSqlWriter::new(),
        })
    }

    fn run_inner(
        &mut self,
        operation: Operation,
        rendered: &RenderedQuery,
    ) -> Result<QueryResponse> {
        let params = bind_params(&rendered.params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        match operation {
            Operation::Select | Operation::Lock => {
                let rows = self
                    .client
                    .query(&rendered.sql, &refs)
                    .map_err(map_error)?;
                Ok(QueryResponse::from_rows(extract_rows(&rows)?))
            }
            Operation::Insert => {
                // The writer appends RETURNING <pk> when the key is known.
                if rendered.sql.contains(" RETURNING ") {
                    let rows = self
                        .client
                        .query(&rendered.sql, &refs)
                        .map_err(map_error)?;
                    let id = rows
                        .first()
                        .map(|row| row.try_get::<_, i64>(0).map_err(map_error))
                        .transpose()?;
                    Ok(QueryResponse::from_affected(RowsAffected {
                        rows_affected: rows.len() as u64,
                        last_affected_id: id,
                    }))
                } else {
                    let affected = self
                        .client
                        .execute(&rendered.sql, &refs)
                        .map_err(map_error)?;
                    Ok(QueryResponse::from_affected(RowsAffected {
                        rows_affected: affected,
                        last_affected_id: None,
                    }))
                }
            }
            Operation::Update | Operation::Delete => {
                let affected = self
                    .client
                    .execute(&rendered.sql, &refs)
                    .map_err(map_error)?;
                Ok(QueryResponse::from_affected(RowsAffected {
                    rows_affected: affected,
                    last_affected_id: None,
                }))
            }
            Operation::Passthru => {
                if refs.is_empty() {
                    // Text protocol accepts DDL and multiple statements.
                    self.run_simple(&rendered.sql)
                } else {
                    let rows = self
                        .client
                        .query(&rendered.sql, &refs)
                        .map_err(map_error)?;
                    Ok(QueryResponse::from_rows(extract_rows(&rows)?))
                }
            }
        }
    }

    fn run_simple(&mut self, sql: &str) -> Result<QueryResponse> {
        use postgres::SimpleQueryMessage;
        let messages = self.client.simple_query(sql).map_err(map_error)?;
        let mut rows = Vec::new();
        let mut affected = 0;
        for message in &messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    let labels: Arc<[String]> = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect();
                    let values = (0..row.len())
                        .map(|i| match row.get(i) {
                            Some(text) => Value::Varchar(Some(text.to_string())),
                            None => Value::Null,
                        })
                        .collect();
                    rows.push(RowLabeled::new(labels, values));
                }
                SimpleQueryMessage::CommandComplete(count) => affected += count,
                _ => {}
            }
        }
        if rows.is_empty() {
            Ok(QueryResponse::from_affected(RowsAffected {
                rows_affected: affected,
                last_affected_id: None,
            }))
        } else {
            Ok(QueryResponse::from_rows(rows))
        }
    }

    fn query_typed(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<RowLabeled>> {
        let rows = self.client.query(sql, params).map_err(map_error)?;
        extract_rows(&rows)
    }
}

impl Backend for PostgresConnection {
    fn dialect(&self) -> &'static str {
        "postgres"
    }

    fn writer(&self) -> &dyn SqlWriter {
        &self.writer
    }

    fn run(&mut self, operation: Operation, rendered: &RenderedQuery) -> QueryResponse {
        match self.run_inner(operation, rendered) {
            Ok(response) => response,
            Err(error) => {
                log::error!("{error}");
                QueryResponse::from_error(error)
            }
        }
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = 'public' AND table_name = $1)",
                &[&table],
            )
            .map_err(map_error)?;
        row.try_get(0).map_err(map_error)
    }

    fn describe_columns(&mut self, table: &str) -> Result<Vec<TableColumn>> {
        if !self.table_exists(table)? {
            return Err(Error::table_doesnt_exist(
                table,
                "42P01",
                format!("relation \"{table}\" does not exist"),
            ));
        }
        let foreign: HashMap<String, ForeignKeyRef> = self
            .query_typed(
                "SELECT kcu.column_name, ccu.table_name AS foreign_table, \
                        ccu.column_name AS foreign_column \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                   ON tc.constraint_name = kcu.constraint_name \
                 JOIN information_schema.constraint_column_usage ccu \
                   ON tc.constraint_name = ccu.constraint_name \
                 WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_name = $1",
                &[&table],
            )?
            .iter()
            .filter_map(|row| {
                Some((
                    row.get_column("column_name")?.text()?.to_string(),
                    ForeignKeyRef {
                        table: row.get_column("foreign_table")?.text()?.to_string(),
                        column: row.get_column("foreign_column")?.text()?.to_string(),
                    },
                ))
            })
            .collect();
        let columns = self
            .query_typed(
                "SELECT column_name, data_type, is_nullable, column_default \
                 FROM information_schema.columns \
                 WHERE table_schema = 'public' AND table_name = $1 \
                 ORDER BY ordinal_position",
                &[&table],
            )?
            .iter()
            .filter_map(|row| {
                let name = row.get_column("column_name")?.text()?.to_string();
                let default = row
                    .get_column("column_default")
                    .and_then(Value::text)
                    .map(str::to_string);
                Some(TableColumn {
                    references: foreign.get(&name).cloned(),
                    auto_increment: default
                        .as_deref()
                        .is_some_and(|d| d.starts_with("nextval(")),
                    nullable: row.get_column("is_nullable")?.text()? == "YES",
                    column_type: row.get_column("data_type")?.text()?.to_string(),
                    default,
                    name,
                })
            })
            .collect();
        Ok(columns)
    }

    fn get_indexes(&mut self, table: &str) -> Result<Vec<IndexDef>> {
        if !self.table_exists(table)? {
            return Err(Error::table_doesnt_exist(
                table,
                "42P01",
                format!("relation \"{table}\" does not exist"),
            ));
        }
        let indexes = self
            .query_typed(
                "SELECT i.relname AS index_name, a.attname AS column_name, \
                        ix.indisunique AS is_unique, ix.indisprimary AS is_primary \
                 FROM pg_class t \
                 JOIN pg_index ix ON t.oid = ix.indrelid \
                 JOIN pg_class i ON i.oid = ix.indexrelid \
                 JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
                 WHERE t.relname = $1 \
                 ORDER BY ix.indisprimary DESC, i.relname",
                &[&table],
            )?
            .iter()
            .filter_map(|row| {
                Some(IndexDef {
                    name: row.get_column("index_name")?.text()?.to_string(),
                    column: row.get_column("column_name")?.text()?.to_string(),
                    unique: row.get_column("is_unique")?.boolean().unwrap_or(false),
                    primary: row.get_column("is_primary")?.boolean().unwrap_or(false),
                })
            })
            .collect();
        Ok(indexes)
    }
}

fn bind_params(params: &[Value]) -> Vec<Box<dyn ToSql + Sync>> {
    params
        .iter()
        .map(|value| -> Box<dyn ToSql + Sync> {
            match value {
                Value::Boolean(Some(v)) => Box::new(*v),
                // Integers widen to 64 bits; provisioned integer columns
                // are BIGINT for the same reason.
                Value::Int32(Some(v)) => Box::new(*v as i64),
                Value::Int64(Some(v)) => Box::new(*v),
                Value::Float64(Some(v)) => Box::new(*v),
                Value::Varchar(Some(v)) => Box::new(v.clone()),
                Value::Blob(Some(v)) => Box::new(v.clone()),
                Value::Date(Some(v)) => Box::new(*v),
                Value::Timestamp(Some(v)) => Box::new(*v),
                // NULLs are inlined by the writer; lists are expanded.
                other => {
                    if !other.is_null() {
                        log::warn!("cannot bind {:?}, sending NULL", other);
                    }
                    Box::new(Option::<String>::None)
                }
            }
        })
        .collect()
}

fn extract_rows(rows: &[postgres::Row]) -> Result<Vec<RowLabeled>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let labels: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(labels.len());
        for i in 0..labels.len() {
            values.push(extract_value(row, i)?);
        }
        out.push(RowLabeled::new(labels.clone(), values.into()));
    }
    Ok(out)
}

fn extract_value(row: &postgres::Row, index: usize) -> Result<Value> {
    let ty = row.columns()[index].type_();
    let value = if *ty == Type::BOOL {
        Value::Boolean(row.try_get(index).map_err(map_error)?)
    } else if *ty == Type::INT2 {
        Value::Int32(
            row.try_get::<_, Option<i16>>(index)
                .map_err(map_error)?
                .map(i32::from),
        )
    } else if *ty == Type::INT4 {
        Value::Int32(row.try_get(index).map_err(map_error)?)
    } else if *ty == Type::INT8 {
        Value::Int64(row.try_get(index).map_err(map_error)?)
    } else if *ty == Type::FLOAT4 {
        Value::Float64(
            row.try_get::<_, Option<f32>>(index)
                .map_err(map_error)?
                .map(f64::from),
        )
    } else if *ty == Type::FLOAT8 {
        Value::Float64(row.try_get(index).map_err(map_error)?)
    } else if *ty == Type::BYTEA {
        Value::Blob(row.try_get(index).map_err(map_error)?)
    } else if *ty == Type::DATE {
        Value::Date(row.try_get(index).map_err(map_error)?)
    } else if *ty == Type::TIMESTAMP {
        Value::Timestamp(row.try_get(index).map_err(map_error)?)
    } else {
        match row.try_get::<_, Option<String>>(index) {
            Ok(text) => Value::Varchar(text),
            Err(_) => {
                log::warn!("unsupported column type {}, reading NULL", ty);
                Value::Null
            }
        }
    };
    Ok(value)
}

fn map_error(error: postgres::Error) -> Error {
    if let Some(db) = error.as_db_error() {
        let code = db.code().code().to_string();
        let message = db.message().to_string();
        if code == "42P01" {
            let table = db
                .table()
                .map(str::to_string)
                .or_else(|| quoted_relation(&message))
                .unwrap_or_default();
            return Error::TableDoesntExist {
                table,
                code,
                message,
            };
        }
        if code.starts_with("23") {
            return Error::ConstraintViolation { code, message };
        }
        return Error::Query { code, message };
    }
    if error.is_closed() {
        return Error::connection(error.to_string());
    }
    Error::query("", error.to_string())
}

/// Pulls the relation name out of `relation "x" does not exist`.
fn quoted_relation(message: &str) -> Option<String> {
    let start = message.find('"')? + 1;
    let end = message[start..].find('"')? + start;
    Some(message[start..end].to_string())
}
