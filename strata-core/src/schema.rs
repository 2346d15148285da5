use crate::{Database, Error, Model, Result, VirtualQuery};

/// Introspected description of one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    /// Dialect type text as reported by the engine.
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub auto_increment: bool,
    /// Foreign key target, when a constraint references another table.
    pub references: Option<ForeignKeyRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

/// Introspected description of one index column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub column: String,
    pub unique: bool,
    pub primary: bool,
}

/// Introspected table metadata, cached per table name on the database
/// instance.
#[derive(Debug, Clone, Default)]
pub struct TableMeta {
    pub columns: Vec<TableColumn>,
    pub indexes: Vec<IndexDef>,
}

impl TableMeta {
    /// First column of the primary index, or none.
    pub fn primary_key(&self) -> Option<&str> {
        self.indexes
            .iter()
            .find(|index| index.primary)
            .map(|index| index.column.as_str())
    }
}

/// Creates the backing table for a model the first time it is used.
///
/// Does nothing when the table already exists or automatic tables are
/// disabled; in the latter case the caller's own query surfaces
/// `TableDoesntExist` with the dialect error attached.
pub(crate) fn ensure_table<M: Model>(db: &mut Database) -> Result<()> {
    let table = M::table_name();
    if db.is_table_known(table) {
        return Ok(());
    }
    if db.options().disable_automatic_tables {
        return Ok(());
    }
    if db.backend_mut().table_exists(table)? {
        db.mark_table_known(table);
        return Ok(());
    }
    create_table::<M>(db)
}

/// Issues the CREATE TABLE derived from the model's declared columns,
/// adding the declared primary key column when the field list does not
/// already carry one.
pub(crate) fn create_table<M: Model>(db: &mut Database) -> Result<()> {
    let table = M::table_name();
    log::info!("auto-creating table {table}");
    let mut columns = Vec::with_capacity(M::columns().len() + 1);
    if !M::columns().iter().any(|c| c.primary_key) {
        columns.push(crate::ColumnDef::primary_key(M::primary_key()));
    }
    columns.extend(M::columns().iter().cloned());
    let rendered = db.backend_mut().writer().render_create_table(table, &columns)?;
    let query = VirtualQuery::passthru(rendered.sql);
    db.run(&query)?;
    db.forget_table(table);
    db.mark_table_known(table);
    Ok(())
}

/// Unconditionally drops the table if present. Idempotent; used primarily
/// by test fixtures.
pub(crate) fn delete_table<M: Model>(db: &mut Database) -> Result<()> {
    delete_table_named(db, M::table_name())
}

pub(crate) fn delete_table_named(db: &mut Database, table: &str) -> Result<()> {
    let rendered = db.backend_mut().writer().render_drop_table(table, true)?;
    let query = VirtualQuery::passthru(rendered.sql);
    db.run(&query)?;
    db.forget_table(table);
    Ok(())
}

/// Maps a missing-table failure observed during introspection onto the
/// table it was about.
pub(crate) fn for_table(table: &str, error: Error) -> Error {
    match error {
        Error::TableDoesntExist { code, message, .. } => Error::TableDoesntExist {
            table: table.to_string(),
            code,
            message,
        },
        other => other,
    }
}
