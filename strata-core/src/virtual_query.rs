use crate::{TableRef, Value};
use std::fmt::{self, Display};

/// Kind of database operation a [`VirtualQuery`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Lock,
    Passthru,
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Lock => "lock",
            Operation::Passthru => "passthru",
        })
    }
}

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Like,
    In,
}

impl Operator {
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
        }
    }
}

/// One `column <op> value` predicate. Conditions are combined with `AND` in
/// the order they were appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub column: String,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub count: u64,
    pub offset: u64,
}

/// Operation-agnostic descriptor of a database operation.
///
/// Built incrementally by the fluent builders, then handed to a dialect
/// writer which renders it into SQL text and bound parameters. Conditions
/// and ordering are append-only, so construction order is preserved into
/// the SQL text and the cache key derived from it.
#[derive(Debug, Clone)]
pub struct VirtualQuery {
    pub operation: Operation,
    pub table: TableRef,
    /// Select list entries. Empty means `*`; an entry ending in `.*` is
    /// written verbatim, anything else is identifier-quoted.
    pub fields: Vec<String>,
    pub conditions: Vec<Condition>,
    pub ordering: Vec<Ordering>,
    pub limit: Option<Limit>,
    /// Column to value payload for writes.
    pub data: Vec<(String, Value)>,
    /// Primary key column when known; drives generated-key retrieval.
    pub primary_key: Option<String>,
    /// Raw SQL for [`Operation::Passthru`].
    pub raw_sql: String,
    /// Bound parameters for [`Operation::Passthru`].
    pub raw_params: Vec<Value>,
    /// Render a `COUNT(*)` projection instead of the field list.
    pub count_only: bool,
}

impl VirtualQuery {
    fn new(operation: Operation, table: TableRef) -> Self {
        Self {
            operation,
            table,
            fields: Vec::new(),
            conditions: Vec::new(),
            ordering: Vec::new(),
            limit: None,
            data: Vec::new(),
            primary_key: None,
            raw_sql: String::new(),
            raw_params: Vec::new(),
            count_only: false,
        }
    }

    pub fn select(table: TableRef) -> Self {
        Self::new(Operation::Select, table)
    }

    pub fn insert(table: TableRef) -> Self {
        Self::new(Operation::Insert, table)
    }

    pub fn update(table: TableRef) -> Self {
        Self::new(Operation::Update, table)
    }

    pub fn delete(table: TableRef) -> Self {
        Self::new(Operation::Delete, table)
    }

    pub fn lock(table: TableRef) -> Self {
        Self::new(Operation::Lock, table)
    }

    pub fn passthru(sql: impl Into<String>) -> Self {
        let mut query = Self::new(Operation::Passthru, TableRef::default());
        query.raw_sql = sql.into();
        query
    }

    /// Appends a condition. Previously added clauses are never mutated.
    pub fn condition(
        &mut self,
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.conditions.push(Condition {
            column: column.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn order_by(&mut self, column: impl Into<String>, order: Order) -> &mut Self {
        self.ordering.push(Ordering {
            column: column.into(),
            order,
        });
        self
    }

    pub fn limit(&mut self, count: u64, offset: u64) -> &mut Self {
        self.limit = Some(Limit { count, offset });
        self
    }

    /// Restricts the select list to `alias.*`.
    pub fn fields(&mut self, alias: &str) -> &mut Self {
        self.fields.push(format!("{alias}.*"));
        self
    }

    pub fn set_data(&mut self, data: Vec<(String, Value)>) -> &mut Self {
        self.data = data;
        self
    }

    pub fn set_primary_key(&mut self, column: impl Into<String>) -> &mut Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.raw_params.push(value.into());
        self
    }
}
