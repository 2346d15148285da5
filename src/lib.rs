//! Strata: a synchronous active-record data layer.
//!
//! Models bind to tables, a fluent [`Search`] builder produces
//! dialect-agnostic [`VirtualQuery`] descriptors, and a per-dialect backend
//! renders and executes them. Tables are created automatically from the
//! model's declared columns on first use, unless disabled in the
//! [`ConnectOptions`].
//!
//! ```no_run
//! use strata::{ConnectOptions, Model};
//! # use strata::{ColumnDef, Result, RowLabeled, Value};
//! # #[derive(Default)]
//! # struct Book { book_id: Option<i64>, name: Option<String> }
//! # impl Model for Book {
//! #     fn table_name() -> &'static str { "books" }
//! #     fn primary_key() -> &'static str { "book_id" }
//! #     fn columns() -> &'static [ColumnDef] {
//! #         const COLUMNS: &[ColumnDef] =
//! #             &[ColumnDef::new("name", Value::Varchar(None))];
//! #         COLUMNS
//! #     }
//! #     fn from_row(row: &RowLabeled) -> Result<Self> {
//! #         Ok(Self {
//! #             book_id: strata::mapper::get(row, "book_id")?,
//! #             name: strata::mapper::get(row, "name")?,
//! #         })
//! #     }
//! #     fn to_row(&self) -> Vec<(&'static str, Value)> {
//! #         vec![
//! #             ("book_id", self.book_id.into()),
//! #             ("name", self.name.clone().into()),
//! #         ]
//! #     }
//! #     fn id(&self) -> Option<i64> { self.book_id }
//! #     fn set_id(&mut self, id: i64) { self.book_id = Some(id); }
//! # }
//!
//! # fn main() -> strata::Result<()> {
//! let mut db = strata::connect(ConnectOptions::sqlite_in_memory())?;
//! let mut book = Book::default();
//! book.name = Some("Moby-Dick".into());
//! book.save(&mut db)?;
//! let found = Book::search(&mut db).where_eq("name", "Moby-Dick").exec_one()?;
//! assert!(found.is_some());
//! # Ok(())
//! # }
//! ```

pub use strata_core::*;

pub use strata_core::{Backend, ConnectOptions, Database, DbType};

/// Opens a connection for the configured dialect and wraps it in a
/// [`Database`] context.
///
/// Configuration problems surface here as [`Error::Configuration`], before
/// any query runs.
pub fn connect(options: ConnectOptions) -> Result<Database> {
    options.validate()?;
    let backend: Box<dyn Backend> = match options.db_type {
        DbType::Sqlite => Box::new(strata_sqlite::SqliteConnection::connect(&options)?),
        DbType::Postgres => Box::new(strata_postgres::PostgresConnection::connect(&options)?),
        DbType::Mysql => Box::new(strata_mysql::MysqlConnection::connect(&options)?),
    };
    Ok(Database::new(backend, options))
}
