use indoc::indoc;
use strata_core::{ColumnDef, Operator, SqlWriter, TableRef, Value, VirtualQuery};
use strata_postgres::PostgresSqlWriter;

const WRITER: PostgresSqlWriter = PostgresSqlWriter::new();

#[test]
fn placeholders_are_numbered() {
    let mut query = VirtualQuery::select(TableRef::new("test_models", ""));
    query
        .condition("integer_field", Operator::Greater, 1i64)
        .condition("text_field", Operator::Equals, "x")
        .condition(
            "integer_field",
            Operator::In,
            Value::List(Some(vec![Value::from(1i64), Value::from(2i64)])),
        );
    let rendered = WRITER.render(&query).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT * FROM \"test_models\" WHERE \"integer_field\" > $1 \
         AND \"text_field\" = $2 AND \"integer_field\" IN ($3, $4)"
    );
    assert_eq!(rendered.params.len(), 4);
}

#[test]
fn insert_returns_the_generated_key() {
    let mut query = VirtualQuery::insert(TableRef::new("test_models", ""));
    query
        .set_data(vec![("text_field".into(), Value::from("x"))])
        .set_primary_key("test_model_id");
    assert_eq!(
        WRITER.render(&query).unwrap().sql,
        "INSERT INTO \"test_models\" (\"text_field\") VALUES ($1) RETURNING \"test_model_id\""
    );
}

#[test]
fn create_table_uses_bigserial() {
    let columns = [
        ColumnDef::primary_key("test_model_id"),
        ColumnDef::new("integer_field", Value::Int64(None)),
        ColumnDef::new("date_field", Value::Timestamp(None)),
        ColumnDef {
            references: Some(("others", "other_id")),
            ..ColumnDef::new("other_id", Value::Int64(None))
        },
    ];
    let rendered = WRITER.render_create_table("test_models", &columns).unwrap();
    assert_eq!(
        rendered.sql,
        indoc! {r#"
            CREATE TABLE "test_models" (
            "test_model_id" BIGSERIAL PRIMARY KEY,
            "integer_field" BIGINT,
            "date_field" TIMESTAMP,
            "other_id" BIGINT REFERENCES "others"("other_id")
            )"#}
    );
}

#[test]
fn locking_select() {
    let mut query = VirtualQuery::lock(TableRef::new("test_models", ""));
    query.condition("test_model_id", Operator::Equals, 1i64);
    assert_eq!(
        WRITER.render(&query).unwrap().sql,
        "SELECT * FROM \"test_models\" WHERE \"test_model_id\" = $1 FOR UPDATE"
    );
}
