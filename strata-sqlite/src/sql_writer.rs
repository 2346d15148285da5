use strata_core::{Error, RenderedQuery, Result, SqlWriter, Value, VirtualQuery};

#[derive(Default, Clone, Copy)]
pub struct SqliteSqlWriter;

impl SqliteSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "Sqlite"
    }

    fn render_select(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_select(query)
    }

    fn render_insert(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_insert(query)
    }

    fn render_update(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_update(query)
    }

    fn render_delete(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_delete(query)
    }

    // SQLite has no SELECT ... FOR UPDATE; locking is database-wide and
    // implicit.
    fn render_lock(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::unsupported_operation(query.operation))
    }

    fn render_passthru(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_passthru(query)
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        out.push_str(match value {
            Value::Boolean(..)
            | Value::Int32(..)
            | Value::Null
            | Value::Int64(..) => "INTEGER",
            Value::Float64(..) => "REAL",
            Value::Varchar(..)
            | Value::List(..)
            | Value::Date(..)
            | Value::Timestamp(..) => "TEXT",
            Value::Blob(..) => "BLOB",
        });
    }

    fn write_auto_increment_primary_key(&self, out: &mut String) {
        // Explicit NOT NULL so the flag survives PRAGMA table_info.
        out.push_str("INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT");
    }
}
