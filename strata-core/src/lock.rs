use crate::{Database, Operator, Result, RowLabeled, TableRef, Value, VirtualQuery};

/// Advisory row locking through the engine's native mechanism
/// (`SELECT ... FOR UPDATE`).
///
/// The library itself holds no locks; mutual exclusion is entirely the
/// database engine's. Dialects without a locking statement report
/// `UnsupportedOperation`.
pub struct LockController<'db> {
    db: &'db mut Database,
    query: VirtualQuery,
}

impl<'db> LockController<'db> {
    pub(crate) fn new(db: &'db mut Database, table: &str, alias: &str) -> Self {
        Self {
            db,
            query: VirtualQuery::lock(TableRef::new(table, alias)),
        }
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.query.condition(column, Operator::Equals, value);
        self
    }

    /// Issues the locking select and returns the locked rows.
    pub fn acquire(self) -> Result<Vec<RowLabeled>> {
        self.db.run(&self.query)?.into_rows()
    }
}
