mod resource {
    pub mod models;
}

use resource::models::{TestModel, TestModelLabeled, TestModelStructured, database};
use strata::Model;

#[test]
fn search_on_an_empty_table_counts_zero() {
    let mut db = database();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 0);
}

#[test]
fn save_without_a_key_inserts_and_assigns_one() {
    let mut db = database();
    let mut model = TestModel::sample();
    assert_eq!(model.id(), None);
    model.save(&mut db).unwrap();
    let id = model.id().expect("insert assigns a primary key");
    assert!(id > 0);
    assert_eq!(model.integer_field, Some(1234567));
    assert_eq!(model.text_field.as_deref(), Some("Feh"));
    assert_eq!(model.date_field.as_deref(), Some("2015-02-09 15:33:00"));
}

#[test]
fn exec_one_finds_by_primary_key() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 1);

    let found = TestModel::search(&mut db)
        .where_eq("test_model_id", model.id().unwrap())
        .exec_one()
        .unwrap()
        .expect("the row exists");
    assert_eq!(found, model);
    assert_eq!(found.test_model_id, Some(1));
}

#[test]
fn exec_one_returns_none_when_nothing_matches() {
    let mut db = database();
    TestModel::sample().save(&mut db).unwrap();
    for missing in [-1i64, 0] {
        let found = TestModel::search(&mut db)
            .where_eq("test_model_id", missing)
            .exec_one()
            .unwrap();
        assert!(found.is_none(), "id {missing} must not match");
    }
}

#[test]
fn get_by_id_and_get_all() {
    let mut db = database();
    let mut first = TestModel::sample();
    first.save(&mut db).unwrap();
    let mut second = TestModel::sample();
    second.text_field = Some("second".into());
    second.save(&mut db).unwrap();

    let found = TestModel::get_by_id(&mut db, first.id().unwrap())
        .unwrap()
        .expect("the row exists");
    assert_eq!(found, first);
    assert!(TestModel::get_by_id(&mut db, -1).unwrap().is_none());
    assert_eq!(TestModel::get_all(&mut db).unwrap().len(), 2);
}

#[test]
fn save_with_a_key_updates_in_place() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.text_field = Some("Before".into());
    model.save(&mut db).unwrap();
    let id = model.id().unwrap();

    let mut reload = TestModel::get_by_id(&mut db, id).unwrap().unwrap();
    assert_eq!(reload.text_field.as_deref(), Some("Before"));

    reload.text_field = Some("After".into());
    reload.save(&mut db).unwrap();
    assert_eq!(reload.id(), Some(id), "update leaves the key unchanged");

    let reload_again = TestModel::get_by_id(&mut db, id).unwrap().unwrap();
    assert_eq!(reload_again.text_field.as_deref(), Some("After"));
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 1);
}

#[test]
fn scalar_fields_round_trip_exactly() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();
    let reloaded = TestModel::get_by_id(&mut db, model.id().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.integer_field, Some(1234567));
    assert_eq!(reloaded.text_field.as_deref(), Some("Feh"));
    assert_eq!(reloaded.date_field.as_deref(), Some("2015-02-09 15:33:00"));
}

#[test]
fn structured_fields_come_back_as_json_text() {
    let mut db = database();
    let mut model = TestModelStructured::default();
    model.payload = serde_json::json!({"a": 1, "b": ["x", null]});
    model.save(&mut db).unwrap();

    let reloaded = TestModelStructured::get_by_id(&mut db, model.id().unwrap())
        .unwrap()
        .unwrap();
    // The canonical text representation comes back, not the structure.
    assert_eq!(
        reloaded.payload,
        serde_json::Value::String(r#"{"a":1,"b":["x",null]}"#.into())
    );
    assert_ne!(reloaded.payload, serde_json::json!({"a": 1, "b": ["x", null]}));
}

#[test]
fn delete_removes_the_row() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();
    let id = model.id().unwrap();

    model.delete(&mut db).unwrap();
    assert!(TestModel::get_by_id(&mut db, id).unwrap().is_none());
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 0);
}

#[test]
fn label_precedence() {
    let mut model = TestModelLabeled::default();
    model.set_id(1);
    assert_eq!(model.get_label(), "No label for TestModelLabeled ID 1");

    model.description = Some("a description".into());
    assert_eq!(model.get_label(), "a description");

    model.name = Some("a name".into());
    assert_eq!(model.get_label(), "a name");

    model.title = Some("the title".into());
    assert_eq!(model.get_label(), "the title");
}

#[test]
fn slugs_round_trip() {
    let mut db = database();
    let mut model = TestModelLabeled::default();
    model.title = Some("Hello World!".into());
    model.save(&mut db).unwrap();
    let slug = model.get_slug();
    assert_eq!(slug, format!("{}-hello-world", model.id().unwrap()));

    let found = TestModelLabeled::get_by_slug(&mut db, &slug)
        .unwrap()
        .expect("slug resolves");
    assert_eq!(found.title.as_deref(), Some("Hello World!"));
    assert!(TestModelLabeled::get_by_slug(&mut db, "nope").unwrap().is_none());
}

#[test]
fn ordering_and_limits() {
    let mut db = database();
    for value in [3i64, 1, 2] {
        let mut model = TestModel::sample();
        model.integer_field = Some(value);
        model.save(&mut db).unwrap();
    }
    let rows = TestModel::search(&mut db)
        .order("integer_field", strata::Order::Desc)
        .exec()
        .unwrap();
    let values: Vec<i64> = rows.iter().filter_map(|m| m.integer_field).collect();
    assert_eq!(values, [3, 2, 1]);

    let rows = TestModel::search(&mut db)
        .order("integer_field", strata::Order::Asc)
        .limit(2)
        .offset(1)
        .exec()
        .unwrap();
    let values: Vec<i64> = rows.iter().filter_map(|m| m.integer_field).collect();
    assert_eq!(values, [2, 3]);
}

#[test]
fn reload_reflects_storage() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();

    // A stale copy sees the update after reload.
    let mut stale = TestModel::get_by_id(&mut db, model.id().unwrap())
        .unwrap()
        .unwrap();
    model.text_field = Some("changed".into());
    model.save(&mut db).unwrap();
    assert_eq!(stale.text_field.as_deref(), Some("Feh"));
    assert!(stale.reload(&mut db).unwrap());
    assert_eq!(stale.text_field.as_deref(), Some("changed"));

    model.delete(&mut db).unwrap();
    assert!(!stale.reload(&mut db).unwrap());
}

#[test]
fn to_json_exports_the_row() {
    let mut model = TestModel::sample();
    model.set_id(9);
    let json = model.to_json();
    assert_eq!(json["test_model_id"], serde_json::json!(9));
    assert_eq!(json["integer_field"], serde_json::json!(1234567));
    assert_eq!(json["text_field"], serde_json::json!("Feh"));
}

#[test]
fn table_alias_derivation() {
    assert_eq!(TestModel::table_alias(), "tm");
    assert_eq!(TestModelStructured::table_alias(), "tms");
}
