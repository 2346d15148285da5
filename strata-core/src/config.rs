use crate::{Error, Result};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Mysql,
    Sqlite,
    Postgres,
}

impl Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbType::Mysql => "Mysql",
            DbType::Sqlite => "Sqlite",
            DbType::Postgres => "Postgres",
        })
    }
}

impl FromStr for DbType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Mysql" => Ok(DbType::Mysql),
            "Sqlite" => Ok(DbType::Sqlite),
            "Postgres" => Ok(DbType::Postgres),
            other => Err(Error::configuration(format!(
                "DB TYPE not supported: {other}"
            ))),
        }
    }
}

/// Connection configuration.
///
/// Validated when the connection is constructed, not lazily; a bad or
/// missing option is a [`Error::Configuration`] before any query runs.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub db_type: DbType,
    pub hostname: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Database file path, SQLite only. `":memory:"` for an in-memory
    /// database.
    pub file: String,
    /// When set, missing tables are never created automatically and every
    /// operation against one fails with `TableDoesntExist`.
    pub disable_automatic_tables: bool,
}

impl ConnectOptions {
    pub fn new(db_type: DbType) -> Self {
        Self {
            db_type,
            hostname: String::new(),
            port: 0,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            file: String::new(),
            disable_automatic_tables: false,
        }
    }

    /// In-memory SQLite, the usual test fixture configuration.
    pub fn sqlite_in_memory() -> Self {
        let mut options = Self::new(DbType::Sqlite);
        options.file = ":memory:".into();
        options
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn disable_automatic_tables(mut self, disable: bool) -> Self {
        self.disable_automatic_tables = disable;
        self
    }

    /// Checks that the options required by the selected dialect are
    /// present.
    pub fn validate(&self) -> Result<()> {
        match self.db_type {
            DbType::Sqlite => {
                if self.file.is_empty() {
                    return Err(Error::configuration("db_file is required for Sqlite"));
                }
            }
            DbType::Mysql | DbType::Postgres => {
                if self.hostname.is_empty() {
                    return Err(Error::configuration(format!(
                        "db_hostname is required for {}",
                        self.db_type
                    )));
                }
                if self.database.is_empty() {
                    return Err(Error::configuration(format!(
                        "db_database is required for {}",
                        self.db_type
                    )));
                }
            }
        }
        Ok(())
    }

    /// Driver connection string, mostly useful for logging.
    pub fn dsn(&self) -> String {
        match self.db_type {
            DbType::Mysql => format!(
                "mysql:host={};port={};dbname={}",
                self.hostname, self.port, self.database
            ),
            DbType::Sqlite => format!("sqlite:{}", self.file),
            DbType::Postgres => format!(
                "pgsql:host={};port={};dbname={}",
                self.hostname, self.port, self.database
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_type_parsing() {
        assert_eq!("Sqlite".parse::<DbType>().unwrap(), DbType::Sqlite);
        assert_eq!("Postgres".parse::<DbType>().unwrap(), DbType::Postgres);
        let error = "Oracle".parse::<DbType>().unwrap_err();
        assert_eq!(
            error,
            Error::Configuration("DB TYPE not supported: Oracle".into())
        );
    }

    #[test]
    fn validation_catches_missing_options() {
        assert!(ConnectOptions::new(DbType::Sqlite).validate().is_err());
        assert!(ConnectOptions::sqlite_in_memory().validate().is_ok());
        let options = ConnectOptions::new(DbType::Mysql).hostname("localhost");
        assert!(options.validate().is_err());
        let options = ConnectOptions::new(DbType::Mysql)
            .hostname("localhost")
            .database("test");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn dsn_shapes() {
        assert_eq!(
            ConnectOptions::sqlite_in_memory().dsn(),
            "sqlite::memory:"
        );
        let options = ConnectOptions::new(DbType::Postgres)
            .hostname("localhost")
            .port(5432)
            .database("test");
        assert_eq!(options.dsn(), "pgsql:host=localhost;port=5432;dbname=test");
    }
}
