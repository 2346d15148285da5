use crate::{
    ColumnDef, Database, Error, Operator, Result, RowLabeled, Search, TableRef, Value,
    VirtualQuery, mapper, util,
};

/// An active record: a typed in-memory representation of one table row.
///
/// Implementations declare the table binding and field descriptors once per
/// type and provide the hydrate/dehydrate pair; everything else is derived.
/// Field access is ordinary typed struct access, validated when the
/// implementation is written, not at call time.
pub trait Model: Default {
    /// Backing table name.
    fn table_name() -> &'static str;

    /// Primary key column, conventionally `<singular(table)>_id`. The
    /// provisioner creates this column, and it must match the name used in
    /// [`to_row`](Self::to_row) / [`from_row`](Self::from_row). A primary
    /// key declared in [`columns`](Self::columns) must carry the same name.
    fn primary_key() -> &'static str;

    /// Declared field descriptors, used by the table provisioner.
    fn columns() -> &'static [ColumnDef];

    /// Hydrates an instance from a (already identifier-filtered) row.
    fn from_row(row: &RowLabeled) -> Result<Self>;

    /// Serializes every persistent field, primary key included.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Current primary key, if the record has been persisted.
    fn id(&self) -> Option<i64>;

    /// Stores the generated primary key after an insert.
    fn set_id(&mut self, id: i64);

    /// Column used by [`get_label`](Self::get_label) before the `name` /
    /// `description` fallbacks.
    fn label_column() -> Option<&'static str> {
        None
    }

    // Overridable lifecycle hooks.
    fn before_save(&mut self) {}
    fn after_save(&mut self) {}
    fn after_load(&mut self) {}

    fn table_alias() -> String {
        util::table_alias(Self::table_name())
    }

    /// Effective primary key column: the first column of the table's
    /// primary index when the table exists, otherwise the declared
    /// [`primary_key`](Self::primary_key).
    fn primary_key_column(db: &mut Database) -> Result<String> {
        match db.table_primary_key(Self::table_name())? {
            Some(pk) => Ok(pk),
            None => Ok(Self::primary_key().to_string()),
        }
    }

    /// Starts a search on this model type.
    fn search(db: &mut Database) -> Search<'_, Self>
    where
        Self: Sized,
    {
        Search::new(db)
    }

    /// All records, unordered.
    fn get_all(db: &mut Database) -> Result<Vec<Self>>
    where
        Self: Sized,
    {
        Self::search(db).exec()
    }

    /// Finds a record by primary key. Zero matches is `None`, never an
    /// error.
    fn get_by_id(db: &mut Database, id: i64) -> Result<Option<Self>>
    where
        Self: Sized,
    {
        db.ensure_table::<Self>()?;
        let pk = Self::primary_key_column(db)?;
        Self::search(db).where_eq(&pk, id).exec_one()
    }

    /// Finds a record by its URL slug (`<id>-<label>`).
    fn get_by_slug(db: &mut Database, slug: &str) -> Result<Option<Self>>
    where
        Self: Sized,
    {
        let id_part = slug.split('-').next().unwrap_or_default();
        match id_part.parse::<i64>() {
            Ok(id) => Self::get_by_id(db, id),
            Err(_) => Ok(None),
        }
    }

    /// Persists the record: INSERT when no primary key is set (the
    /// generated key is written back), UPDATE keyed on the primary key
    /// otherwise. The in-memory record is reloaded from storage
    /// afterwards; on failure it is left untouched.
    fn save(&mut self, db: &mut Database) -> Result<()>
    where
        Self: Sized,
    {
        self.before_save();
        db.ensure_table::<Self>()?;
        let pk_column = Self::primary_key_column(db)?;
        let data = mapper::dehydrate(self, Some(&pk_column));
        let table = TableRef::new(Self::table_name(), "");
        if let Some(id) = self.id() {
            let mut query = VirtualQuery::update(table);
            query
                .set_data(data)
                .set_primary_key(&pk_column)
                .condition(&pk_column, Operator::Equals, id);
            db.run(&query)?;
        } else {
            let mut query = VirtualQuery::insert(table);
            query.set_data(data).set_primary_key(&pk_column);
            let response = db.run(&query)?;
            let id = response.last_insert_id().ok_or_else(|| {
                Error::query("", "insert did not report a generated key")
            })?;
            self.set_id(id);
        }
        self.reload(db)?;
        self.after_save();
        Ok(())
    }

    /// Re-hydrates the record from storage. `false` when the row is gone.
    fn reload(&mut self, db: &mut Database) -> Result<bool>
    where
        Self: Sized,
    {
        let Some(id) = self.id() else {
            return Ok(false);
        };
        match Self::get_by_id(db, id)? {
            Some(fresh) => {
                *self = fresh;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deletes the backing row. The in-memory record becomes stale.
    fn delete(&self, db: &mut Database) -> Result<()>
    where
        Self: Sized,
    {
        let Some(id) = self.id() else {
            log::warn!(
                "delete called on an unsaved {} record",
                util::short_type_name(std::any::type_name::<Self>())
            );
            return Ok(());
        };
        let pk_column = Self::primary_key_column(db)?;
        let mut query = VirtualQuery::delete(TableRef::new(Self::table_name(), ""));
        query.condition(&pk_column, Operator::Equals, id);
        db.run(&query)?;
        Ok(())
    }

    /// Human-readable label: the designated label column, then a `name`
    /// field, then a `description` field, then a fallback string.
    fn get_label(&self) -> String {
        let row = self.to_row();
        let find = |column: &str| {
            row.iter()
                .find(|(c, _)| *c == column)
                .and_then(|(_, v)| v.text())
                .map(str::to_string)
        };
        if let Some(column) = Self::label_column() {
            if let Some(label) = find(column) {
                return label;
            }
        }
        for column in ["name", "description"] {
            if let Some(label) = find(column) {
                return label;
            }
        }
        format!(
            "No label for {} ID {}",
            util::short_type_name(std::any::type_name::<Self>()),
            self.id().unwrap_or(0)
        )
    }

    /// URL slug, `<id>-<slugified label>`.
    fn get_slug(&self) -> String {
        format!("{}-{}", self.id().unwrap_or(0), util::slugify(&self.get_label()))
    }

    /// JSON export of the dehydrated row.
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.to_row()
                .into_iter()
                .map(|(column, value)| (column.to_string(), value.to_json()))
                .collect(),
        )
    }
}
