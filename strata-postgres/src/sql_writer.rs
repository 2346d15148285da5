use strata_core::{RenderedQuery, Result, SqlWriter, Value, VirtualQuery};

#[derive(Default, Clone, Copy)]
pub struct PostgresSqlWriter;

impl PostgresSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn dialect(&self) -> &'static str {
        "Postgres"
    }

    fn render_select(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        self.build_select(query)
    }

    /// Appends `RETURNING <pk>` so the generated key comes back with the
    /// insert instead of a second round-trip.
    fn render_insert(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        let mut rendered = self.build_insert(query)?;
        if let Some(pk) = &query.primary_key {
            rendered.sql.push_str(" RETURNING ");
            self.write_identifier_quoted(&mut rendered.sql, pk);
        }
        Ok(rendered)
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

    fn write_placeholder(&self, out: &mut String, index: usize) {
        let mut buffer = itoa::Buffer::new();
        out.push('$');
        out.push_str(buffer.format(index));
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        out.push_str(match value {
            Value::Boolean(..) => "BOOLEAN",
            Value::Int32(..) => "INTEGER",
            // Generated keys and counters bind as 64-bit integers.
            Value::Null | Value::Int64(..) => "BIGINT",
            Value::Float64(..) => "DOUBLE PRECISION",
            Value::Varchar(..) | Value::List(..) => "TEXT",
            Value::Blob(..) => "BYTEA",
            Value::Date(..) => "DATE",
            Value::Timestamp(..) => "TIMESTAMP",
        });
    }

    fn write_auto_increment_primary_key(&self, out: &mut String) {
        out.push_str("BIGSERIAL PRIMARY KEY");
    }
}
