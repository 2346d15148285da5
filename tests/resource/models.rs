// Each integration test crate pulls in the fixtures it needs.
#![allow(dead_code)]

use strata::{
    ColumnDef, ConnectOptions, Database, MemoryCache, Model, Result, RowLabeled, Value, mapper,
};

/// Fresh in-memory SQLite database with a query cache attached.
pub fn database() -> Database {
    let _ = env_logger::builder().is_test(true).try_init();
    strata::connect(ConnectOptions::sqlite_in_memory())
        .expect("in-memory sqlite should open")
        .with_cache(Box::new(MemoryCache::new()))
}

/// Same fixture without automatic table creation.
pub fn database_without_auto_tables() -> Database {
    let _ = env_logger::builder().is_test(true).try_init();
    strata::connect(ConnectOptions::sqlite_in_memory().disable_automatic_tables(true))
        .expect("in-memory sqlite should open")
        .with_cache(Box::new(MemoryCache::new()))
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct TestModel {
    pub test_model_id: Option<i64>,
    pub integer_field: Option<i64>,
    pub text_field: Option<String>,
    pub date_field: Option<String>,
}

impl Model for TestModel {
    fn table_name() -> &'static str {
        "test_models"
    }

    fn primary_key() -> &'static str {
        "test_model_id"
    }

    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("integer_field", Value::Int64(None)),
            ColumnDef::new("text_field", Value::Varchar(None)),
            ColumnDef::new("date_field", Value::Timestamp(None)),
        ];
        COLUMNS
    }

    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            test_model_id: mapper::get(row, "test_model_id")?,
            integer_field: mapper::get(row, "integer_field")?,
            text_field: mapper::get(row, "text_field")?,
            date_field: mapper::get(row, "date_field")?,
        })
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("test_model_id", self.test_model_id.into()),
            ("integer_field", self.integer_field.into()),
            ("text_field", self.text_field.clone().into()),
            ("date_field", self.date_field.clone().into()),
        ]
    }

    fn id(&self) -> Option<i64> {
        self.test_model_id
    }

    fn set_id(&mut self, id: i64) {
        self.test_model_id = Some(id);
    }
}

impl TestModel {
    pub fn sample() -> Self {
        Self {
            test_model_id: None,
            integer_field: Some(1234567),
            text_field: Some("Feh".into()),
            date_field: Some("2015-02-09 15:33:00".into()),
        }
    }
}

/// Label precedence fixture: a designated label column plus the `name` and
/// `description` fallbacks.
#[derive(Default, Debug, Clone)]
pub struct TestModelLabeled {
    pub test_model_labeled_id: Option<i64>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Model for TestModelLabeled {
    fn table_name() -> &'static str {
        "test_models_labeled"
    }

    fn primary_key() -> &'static str {
        "test_model_labeled_id"
    }

    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("title", Value::Varchar(None)),
            ColumnDef::new("name", Value::Varchar(None)),
            ColumnDef::new("description", Value::Varchar(None)),
        ];
        COLUMNS
    }

    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            test_model_labeled_id: mapper::get(row, "test_model_labeled_id")?,
            title: mapper::get(row, "title")?,
            name: mapper::get(row, "name")?,
            description: mapper::get(row, "description")?,
        })
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("test_model_labeled_id", self.test_model_labeled_id.into()),
            ("title", self.title.clone().into()),
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
        ]
    }

    fn id(&self) -> Option<i64> {
        self.test_model_labeled_id
    }

    fn set_id(&mut self, id: i64) {
        self.test_model_labeled_id = Some(id);
    }

    fn label_column() -> Option<&'static str> {
        Some("title")
    }
}

/// Unique-constraint fixture.
#[derive(Default, Debug, Clone)]
pub struct TestModelUnique {
    pub test_model_unique_id: Option<i64>,
    pub code: Option<String>,
}

impl Model for TestModelUnique {
    fn table_name() -> &'static str {
        "test_models_unique"
    }

    fn primary_key() -> &'static str {
        "test_model_unique_id"
    }

    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[ColumnDef {
            name: std::borrow::Cow::Borrowed("code"),
            value: Value::Varchar(None),
            nullable: false,
            primary_key: false,
            unique: true,
            references: None,
        }];
        COLUMNS
    }

    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            test_model_unique_id: mapper::get(row, "test_model_unique_id")?,
            code: mapper::get(row, "code")?,
        })
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("test_model_unique_id", self.test_model_unique_id.into()),
            ("code", self.code.clone().into()),
        ]
    }

    fn id(&self) -> Option<i64> {
        self.test_model_unique_id
    }

    fn set_id(&mut self, id: i64) {
        self.test_model_unique_id = Some(id);
    }
}

/// Structured-field fixture: `payload` stores canonical JSON text.
#[derive(Default, Debug, Clone)]
pub struct TestModelStructured {
    pub test_model_structured_id: Option<i64>,
    pub payload: serde_json::Value,
}

impl Model for TestModelStructured {
    fn table_name() -> &'static str {
        "test_models_structured"
    }

    fn primary_key() -> &'static str {
        "test_model_structured_id"
    }

    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[ColumnDef::new("payload", Value::Varchar(None))];
        COLUMNS
    }

    fn from_row(row: &RowLabeled) -> Result<Self> {
        Ok(Self {
            test_model_structured_id: mapper::get(row, "test_model_structured_id")?,
            payload: mapper::get(row, "payload")?,
        })
    }

    fn to_row(&self) -> Vec<(&'static str, Value)> {
        vec![
            (
                "test_model_structured_id",
                self.test_model_structured_id.into(),
            ),
            ("payload", Value::from(&self.payload)),
        ]
    }

    fn id(&self) -> Option<i64> {
        self.test_model_structured_id
    }

    fn set_id(&mut self, id: i64) {
        self.test_model_structured_id = Some(id);
    }
}
