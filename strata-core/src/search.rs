use crate::{
    Database, Error, Model, Operator, Order, Result, TableRef, Value, VirtualQuery, mapper,
};
use std::marker::PhantomData;

/// Fluent select builder for one model type.
///
/// Every method appends to the underlying virtual query; previously added
/// clauses are never mutated, so the SQL text (and the cache key derived
/// from it) is deterministic in construction order.
pub struct Search<'db, M: Model> {
    db: &'db mut Database,
    query: VirtualQuery,
    marker: PhantomData<M>,
}

impl<'db, M: Model> Search<'db, M> {
    pub fn new(db: &'db mut Database) -> Self {
        let table = TableRef::aliased(M::table_name());
        let alias = table.alias.clone();
        let mut query = VirtualQuery::select(table);
        query.fields(&alias);
        Self {
            db,
            query,
            marker: PhantomData,
        }
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Equals, value)
    }

    pub fn where_op(mut self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.query.condition(column, operator, value);
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.query.order_by(column, order);
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        let offset = self.query.limit.map_or(0, |l| l.offset);
        self.query.limit(count, offset);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        let count = self.query.limit.map_or(i64::MAX as u64, |l| l.count);
        self.query.limit(count, offset);
        self
    }

    /// Replaces the select list with `alias.*`.
    pub fn fields(mut self, alias: &str) -> Self {
        self.query.fields.clear();
        self.query.fields(alias);
        self
    }

    /// Runs the select and hydrates every matching row.
    pub fn exec(self) -> Result<Vec<M>> {
        self.db.ensure_table::<M>()?;
        let response = self.db.run(&self.query)?;
        response.rows().iter().map(mapper::hydrate).collect()
    }

    /// Runs the select with an implicit `LIMIT 1` and unwraps the single
    /// result. Zero matching rows is `None`, never an error.
    pub fn exec_one(mut self) -> Result<Option<M>> {
        let offset = self.query.limit.map_or(0, |l| l.offset);
        self.query.limit(1, offset);
        Ok(self.exec()?.into_iter().next())
    }

    /// Issues a `COUNT(*)` query over the same condition list without
    /// loading any rows.
    pub fn count(mut self) -> Result<i64> {
        self.query.count_only = true;
        self.db.ensure_table::<M>()?;
        let response = self.db.run(&self.query)?;
        let row = response
            .rows()
            .first()
            .ok_or_else(|| Error::decode("count", "count query produced no row"))?;
        row.get_column("count")
            .and_then(Value::integer)
            .ok_or_else(|| Error::decode("count", "count query produced no integer"))
    }
}
