use strata_core::{RenderedQuery, Result, SqlWriter, Value, VirtualQuery};

#[derive(Default, Clone, Copy)]
pub struct MysqlSqlWriter;

impl MysqlSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for MysqlSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "Mysql"
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

    fn render_lock(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_lock(query)
    }

    fn render_passthru(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_passthru(query)
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        out.push_str(match value {
            Value::Boolean(..) => "TINYINT(1)",
            Value::Int32(..) => "INT",
            Value::Null | Value::Int64(..) => "BIGINT",
            Value::Float64(..) => "DOUBLE",
            Value::Varchar(..) | Value::List(..) => "TEXT",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Timestamp(..) => "DATETIME",
        });
    }

    fn write_auto_increment_primary_key(&self, out: &mut String) {
        out.push_str("BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY");
    }
}
