use crate::{Database, QueryResponse, Result, RowLabeled, Value, VirtualQuery};

/// Raw SQL escape hatch.
///
/// Runs through the same backend path as every other operation, so driver
/// errors come back normalized. Results are never cached, and executing one
/// conservatively clears the whole query cache.
pub struct Passthru<'db> {
    db: &'db mut Database,
    query: VirtualQuery,
}

impl<'db> Passthru<'db> {
    pub(crate) fn new(db: &'db mut Database, sql: impl Into<String>) -> Self {
        Self {
            db,
            query: VirtualQuery::passthru(sql),
        }
    }

    /// Appends a bound parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.query.bind(value);
        self
    }

    /// The SQL that will be handed to the driver.
    pub fn sql_to_passthru(&self) -> &str {
        &self.query.raw_sql
    }

    pub fn exec(self) -> Result<Vec<RowLabeled>> {
        self.db.run(&self.query)?.into_rows()
    }

    /// Inspection-path variant of [`exec`](Self::exec).
    pub fn exec_response(self) -> QueryResponse {
        self.db.run_response(&self.query)
    }
}
