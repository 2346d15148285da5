use crate::{
    ColumnDef, Condition, Error, Limit, Operator, Ordering, Result, TableRef, Value, VirtualQuery,
    separated_by,
};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        let mut buffer = ryu::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// SQL text plus the bound parameters it references, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Renders [`VirtualQuery`] descriptors into dialect SQL.
///
/// The provided fragment helpers implement the common ANSI forms; dialects
/// override the ones that differ (identifier quoting, placeholder syntax,
/// column types, generated keys). The per-operation `render_*` methods
/// default to [`Error::NotImplemented`], so a dialect gap surfaces as a
/// typed error at test time instead of silently wrong SQL. Each dialect
/// overrides them, usually by delegating to the matching `build_*` helper.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Name used in error messages for unimplemented operations.
    fn dialect(&self) -> &'static str {
        "Base"
    }

    /// Renders any virtual query, dispatching on its operation kind.
    fn render(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        use crate::Operation::*;
        match query.operation {
            Select => self.render_select(query),
            Insert => self.render_insert(query),
            Update => self.render_update(query),
            Delete => self.render_delete(query),
            Lock => self.render_lock(query),
            Passthru => self.render_passthru(query),
        }
    }

    fn render_select(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::not_implemented(self.dialect(), query.operation))
    }

    fn render_insert(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::not_implemented(self.dialect(), query.operation))
    }

    fn render_update(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::not_implemented(self.dialect(), query.operation))
    }

    fn render_delete(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::not_implemented(self.dialect(), query.operation))
    }

    fn render_lock(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::not_implemented(self.dialect(), query.operation))
    }

    fn render_passthru(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Err(Error::not_implemented(self.dialect(), query.operation))
    }

    // ---- generic builders the dialects delegate to ----

    fn build_select(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        let mut sql = String::with_capacity(128);
        let mut params = Vec::new();
        sql.push_str("SELECT ");
        if query.count_only {
            sql.push_str("COUNT(*) AS ");
            self.write_identifier_quoted(&mut sql, "count");
        } else {
            self.write_field_list(&mut sql, &query.fields);
        }
        sql.push_str(" FROM ");
        self.write_table_ref(&mut sql, &query.table, true);
        self.write_where(&mut sql, &mut params, &query.conditions);
        self.write_ordering(&mut sql, &query.ordering);
        self.write_limit(&mut sql, query.limit);
        Ok(RenderedQuery { sql, params })
    }

    fn build_insert(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        let mut sql = String::with_capacity(128);
        let mut params = Vec::new();
        sql.push_str("INSERT INTO ");
        self.write_table_ref(&mut sql, &query.table, false);
        sql.push_str(" (");
        separated_by(
            &mut sql,
            &query.data,
            |out, (column, _)| self.write_identifier_quoted(out, column),
            ", ",
        );
        sql.push_str(") VALUES (");
        separated_by(
            &mut sql,
            &query.data,
            |out, (_, value)| {
                if value.is_null() {
                    out.push_str("NULL");
                } else {
                    params.push(value.clone());
                    self.write_placeholder(out, params.len());
                }
            },
            ", ",
        );
        sql.push(')');
        Ok(RenderedQuery { sql, params })
    }

    fn build_update(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        let mut sql = String::with_capacity(128);
        let mut params = Vec::new();
        sql.push_str("UPDATE ");
        self.write_table_ref(&mut sql, &query.table, false);
        sql.push_str(" SET ");
        // The primary key never appears in an update payload.
        let payload = query
            .data
            .iter()
            .filter(|(column, _)| Some(column.as_str()) != query.primary_key.as_deref());
        separated_by(
            &mut sql,
            payload,
            |out, (column, value)| {
                self.write_identifier_quoted(out, column);
                out.push_str(" = ");
                if value.is_null() {
                    out.push_str("NULL");
                } else {
                    params.push(value.clone());
                    self.write_placeholder(out, params.len());
                }
            },
            ", ",
        );
        self.write_where(&mut sql, &mut params, &query.conditions);
        Ok(RenderedQuery { sql, params })
    }

    fn build_delete(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        let mut sql = String::with_capacity(64);
        let mut params = Vec::new();
        sql.push_str("DELETE FROM ");
        self.write_table_ref(&mut sql, &query.table, false);
        self.write_where(&mut sql, &mut params, &query.conditions);
        Ok(RenderedQuery { sql, params })
    }

    /// Advisory row lock: a select with the dialect's locking suffix.
    fn build_lock(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        let mut rendered = self.build_select(query)?;
        rendered.sql.push_str(" FOR UPDATE");
        Ok(rendered)
    }

    fn build_passthru(&self, query: &VirtualQuery) -> Result<RenderedQuery> {
        Ok(RenderedQuery {
            sql: query.raw_sql.clone(),
            params: query.raw_params.clone(),
        })
    }

    // ---- DDL ----

    fn render_create_table(&self, table: &str, columns: &[ColumnDef]) -> Result<RenderedQuery> {
        let mut sql = String::with_capacity(128);
        sql.push_str("CREATE TABLE ");
        self.write_identifier_quoted(&mut sql, table);
        sql.push_str(" (\n");
        separated_by(
            &mut sql,
            columns,
            |out, column| self.write_create_table_column(out, column),
            ",\n"
        );
        sql.push_str("\n)");
        Ok(RenderedQuery {
            sql,
            params: Vec::new(),
        })
    }

    fn write_create_table_column(&self, out: &mut String, column: &ColumnDef) {
        self.write_identifier_quoted(out, column.name());
        out.push(' ');
        if column.primary_key {
            self.write_auto_increment_primary_key(out);
            return;
        }
        self.write_column_type(out, &column.value);
        if !column.nullable {
            out.push_str(" NOT NULL");
        }
        if column.unique {
            out.push_str(" UNIQUE");
        }
        if let Some((table, col)) = column.references {
            out.push_str(" REFERENCES ");
            self.write_identifier_quoted(out, table);
            out.push('(');
            self.write_identifier_quoted(out, col);
            out.push(')');
        }
    }

    fn render_drop_table(&self, table: &str, if_exists: bool) -> Result<RenderedQuery> {
        let mut sql = String::with_capacity(32);
        sql.push_str("DROP TABLE ");
        if if_exists {
            sql.push_str("IF EXISTS ");
        }
        self.write_identifier_quoted(&mut sql, table);
        Ok(RenderedQuery {
            sql,
            params: Vec::new(),
        })
    }

    /// Declaration of the auto-incrementing integer primary key column,
    /// excluding the column name.
    fn write_auto_increment_primary_key(&self, out: &mut String) {
        out.push_str("INTEGER PRIMARY KEY");
    }

    // ---- fragments ----

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_table_ref(&self, out: &mut String, table: &TableRef, with_alias: bool) {
        self.write_identifier_quoted(out, &table.name);
        if with_alias && !table.alias.is_empty() {
            out.push(' ');
            out.push_str(&table.alias);
        }
    }

    fn write_field_list(&self, out: &mut String, fields: &[String]) {
        if fields.is_empty() {
            out.push('*');
            return;
        }
        separated_by(
            out,
            fields,
            |out, field| {
                // `alias.*` entries are generated, not user identifiers.
                if field == "*" || field.ends_with(".*") {
                    out.push_str(field);
                } else {
                    self.write_identifier_quoted(out, field);
                }
            },
            ", ",
        );
    }

    /// Parameter placeholder for the 1-based `index`.
    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = index;
        out.push('?');
    }

    fn write_condition(&self, out: &mut String, params: &mut Vec<Value>, condition: &Condition) {
        self.write_identifier_quoted(out, &condition.column);
        if condition.value.is_null() {
            out.push_str(match condition.operator {
                Operator::NotEquals => " IS NOT NULL",
                _ => " IS NULL",
            });
            return;
        }
        if condition.operator == Operator::In {
            out.push_str(" IN (");
            let values = match &condition.value {
                Value::List(Some(values)) => values.as_slice(),
                other => std::slice::from_ref(other),
            };
            if values.is_empty() {
                // IN over an empty set matches nothing.
                out.push_str("NULL");
            }
            separated_by(
                out,
                values,
                |out, value| {
                    params.push(value.clone());
                    self.write_placeholder(out, params.len());
                },
                ", ",
            );
            out.push(')');
            return;
        }
        out.push(' ');
        out.push_str(condition.operator.sql());
        out.push(' ');
        params.push(condition.value.clone());
        self.write_placeholder(out, params.len());
    }

    fn write_where(&self, out: &mut String, params: &mut Vec<Value>, conditions: &[Condition]) {
        if conditions.is_empty() {
            return;
        }
        out.push_str(" WHERE ");
        let mut first = true;
        for condition in conditions {
            if !first {
                out.push_str(" AND ");
            }
            first = false;
            self.write_condition(out, params, condition);
        }
    }

    fn write_ordering(&self, out: &mut String, ordering: &[Ordering]) {
        if ordering.is_empty() {
            return;
        }
        out.push_str(" ORDER BY ");
        separated_by(
            out,
            ordering,
            |out, item| {
                self.write_identifier_quoted(out, &item.column);
                out.push(' ');
                out.push_str(item.order.sql());
            },
            ", ",
        );
    }

    fn write_limit(&self, out: &mut String, limit: Option<Limit>) {
        let Some(limit) = limit else {
            return;
        };
        out.push_str(" LIMIT ");
        write_integer!(out, limit.count);
        if limit.offset > 0 {
            out.push_str(" OFFSET ");
            write_integer!(out, limit.offset);
        }
    }

    /// SQL column type for a value prototype.
    fn write_column_type(&self, out: &mut String, value: &Value) {
        out.push_str(match value {
            Value::Boolean(..) => "BOOLEAN",
            Value::Int32(..) => "INTEGER",
            Value::Null | Value::Int64(..) => "BIGINT",
            Value::Float64(..) => "DOUBLE PRECISION",
            Value::Varchar(..) | Value::List(..) => "TEXT",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Timestamp(..) => "TIMESTAMP",
        });
    }

    // ---- literal rendering, used for logging and cache fingerprints ----

    fn write_value(&self, out: &mut String, value: &Value) {
        if value.is_null() {
            out.push_str("NULL");
            return;
        }
        match value {
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            Value::Date(Some(v)) => {
                let _ = write!(
                    out,
                    "'{:04}-{:02}-{:02}'",
                    v.year(),
                    v.month() as u8,
                    v.day()
                );
            }
            Value::Timestamp(Some(v)) => {
                let _ = write!(
                    out,
                    "'{:04}-{:02}-{:02} {:02}:{:02}:{:02}'",
                    v.year(),
                    v.month() as u8,
                    v.day(),
                    v.hour(),
                    v.minute(),
                    v.second()
                );
            }
            Value::List(Some(v)) => {
                out.push('(');
                separated_by(out, v, |out, v| self.write_value(out, v), ", ");
                out.push(')');
            }
            _ => {}
        }
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        for b in value {
            let _ = write!(out, "{:02X}", b);
        }
        out.push('\'');
    }
}

/// Writer with no overrides. Every operation reports the dialect gap; used
/// to assert that real dialects cover the full operation set.
#[derive(Default, Clone, Copy)]
pub struct BaseSqlWriter;

impl BaseSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for BaseSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Operation, VirtualQuery};

    const WRITER: BaseSqlWriter = BaseSqlWriter::new();

    #[test]
    fn base_writer_reports_every_gap() {
        let table = || TableRef::aliased("test_models");
        let queries = [
            VirtualQuery::select(table()),
            VirtualQuery::insert(table()),
            VirtualQuery::update(table()),
            VirtualQuery::delete(table()),
            VirtualQuery::lock(table()),
            VirtualQuery::passthru("SELECT 1"),
        ];
        for query in queries {
            let error = WRITER.render(&query).unwrap_err();
            assert_eq!(
                error,
                Error::NotImplemented {
                    writer: "Base".into(),
                    operation: query.operation.to_string(),
                },
            );
        }
    }

    #[test]
    fn generic_select_shape() {
        let mut query = VirtualQuery::select(TableRef::aliased("test_models"));
        query
            .fields("tm")
            .condition("integer_field", Operator::Greater, 5)
            .condition("text_field", Operator::Equals, "x")
            .order_by("integer_field", crate::Order::Desc)
            .limit(10, 20);
        let rendered = WRITER.build_select(&query).unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT tm.* FROM \"test_models\" tm \
             WHERE \"integer_field\" > ? AND \"text_field\" = ? \
             ORDER BY \"integer_field\" DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            rendered.params,
            vec![Value::Int32(Some(5)), Value::from("x")]
        );
    }

    #[test]
    fn null_conditions_render_is_null() {
        let mut query = VirtualQuery::select(TableRef::new("test_models", ""));
        query.condition("text_field", Operator::Equals, Value::Varchar(None));
        query.condition("integer_field", Operator::NotEquals, Value::Null);
        let rendered = WRITER.build_select(&query).unwrap();
        assert_eq!(
            rendered.sql,
            "SELECT * FROM \"test_models\" \
             WHERE \"text_field\" IS NULL AND \"integer_field\" IS NOT NULL"
        );
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn update_never_touches_the_primary_key() {
        let mut query = VirtualQuery::update(TableRef::new("test_models", ""));
        query
            .set_data(vec![
                ("test_model_id".into(), Value::from(7i64)),
                ("text_field".into(), Value::from("after")),
            ])
            .set_primary_key("test_model_id")
            .condition("test_model_id", Operator::Equals, 7i64);
        let rendered = WRITER.build_update(&query).unwrap();
        assert_eq!(
            rendered.sql,
            "UPDATE \"test_models\" SET \"text_field\" = ? WHERE \"test_model_id\" = ?"
        );
        assert_eq!(
            rendered.params,
            vec![Value::from("after"), Value::from(7i64)]
        );
    }

    #[test]
    fn insert_inlines_nulls() {
        let mut query = VirtualQuery::insert(TableRef::new("test_models", ""));
        query.set_data(vec![
            ("text_field".into(), Value::from("x")),
            ("integer_field".into(), Value::Int64(None)),
        ]);
        let rendered = WRITER.build_insert(&query).unwrap();
        assert_eq!(
            rendered.sql,
            "INSERT INTO \"test_models\" (\"text_field\", \"integer_field\") VALUES (?, NULL)"
        );
        assert_eq!(rendered.params, vec![Value::from("x")]);
    }

    #[test]
    fn in_condition_expands() {
        let mut query = VirtualQuery::delete(TableRef::new("test_models", ""));
        query.condition(
            "integer_field",
            Operator::In,
            Value::List(Some(vec![Value::from(1i64), Value::from(2i64)])),
        );
        let rendered = WRITER.build_delete(&query).unwrap();
        assert_eq!(
            rendered.sql,
            "DELETE FROM \"test_models\" WHERE \"integer_field\" IN (?, ?)"
        );
        assert_eq!(rendered.params.len(), 2);
    }

    #[test]
    fn count_projection() {
        let mut query = VirtualQuery::select(TableRef::new("test_models", ""));
        query.count_only = true;
        let rendered = WRITER.build_select(&query).unwrap();
        assert_eq!(rendered.sql, "SELECT COUNT(*) AS \"count\" FROM \"test_models\"");
    }

    #[test]
    fn create_and_drop_table() {
        let columns = [
            ColumnDef::primary_key("test_model_id"),
            ColumnDef::new("integer_field", Value::Int64(None)),
            ColumnDef {
                nullable: false,
                ..ColumnDef::new("text_field", Value::Varchar(None))
            },
            ColumnDef {
                references: Some(("others", "other_id")),
                ..ColumnDef::new("other_id", Value::Int64(None))
            },
        ];
        let rendered = WRITER.render_create_table("test_models", &columns).unwrap();
        assert_eq!(
            rendered.sql,
            indoc::indoc! {r#"
                CREATE TABLE "test_models" (
                "test_model_id" INTEGER PRIMARY KEY,
                "integer_field" BIGINT,
                "text_field" TEXT NOT NULL,
                "other_id" BIGINT REFERENCES "others"("other_id")
                )"#}
        );
        let rendered = WRITER.render_drop_table("test_models", true).unwrap();
        assert_eq!(rendered.sql, "DROP TABLE IF EXISTS \"test_models\"");
    }

    #[test]
    fn unknown_operation_name_flows_into_the_error() {
        let error = Error::unsupported_operation(Operation::Lock);
        assert_eq!(error.to_string(), "Operation lock not supported");
    }
}
