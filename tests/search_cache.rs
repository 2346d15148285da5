mod resource {
    pub mod models;
}

use resource::models::{TestModel, database};
use strata::{Model, Operator, TableRef, VirtualQuery};

#[test]
fn identical_searches_share_a_cache_entry() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();

    let first = TestModel::search(&mut db)
        .where_eq("integer_field", 1234567i64)
        .exec()
        .unwrap();
    let hits_before = db.cache_stats().unwrap().hits;
    let second = TestModel::search(&mut db)
        .where_eq("integer_field", 1234567i64)
        .exec()
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(db.cache_stats().unwrap().hits, hits_before + 1);
}

#[test]
fn cached_responses_are_flagged() {
    let mut db = database();
    TestModel::sample().save(&mut db).unwrap();

    let mut query = VirtualQuery::select(TableRef::new("test_models", ""));
    query.condition("integer_field", Operator::Greater, 0i64);
    let first = db.run(&query).unwrap();
    assert!(!first.is_from_cache());
    let second = db.run(&query).unwrap();
    assert!(second.is_from_cache());
    assert_eq!(first.rows(), second.rows());
}

#[test]
fn differently_shaped_searches_do_not_collide() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();

    let all = TestModel::search(&mut db).exec().unwrap();
    let none = TestModel::search(&mut db)
        .where_eq("integer_field", -5i64)
        .exec()
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(none.len(), 0);
}

#[test]
fn deleting_invalidates_cached_searches() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();

    let cached = TestModel::search(&mut db).exec().unwrap();
    assert_eq!(cached.len(), 1);

    model.delete(&mut db).unwrap();
    let after = TestModel::search(&mut db).exec().unwrap();
    assert_eq!(after.len(), 0, "a write must invalidate the cached search");
}

/// Every write entry point must leave the cache unable to serve stale
/// rows: insert, update, delete, passthru, table drop.
#[test]
fn no_write_path_skips_invalidation() {
    let mut db = database();
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();

    // insert
    let count = TestModel::search(&mut db).count().unwrap();
    let mut second = TestModel::sample();
    second.save(&mut db).unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), count + 1);

    // update
    let found = TestModel::search(&mut db)
        .where_eq("text_field", "renamed")
        .exec()
        .unwrap();
    assert_eq!(found.len(), 0);
    second.text_field = Some("renamed".into());
    second.save(&mut db).unwrap();
    let found = TestModel::search(&mut db)
        .where_eq("text_field", "renamed")
        .exec()
        .unwrap();
    assert_eq!(found.len(), 1);

    // delete
    let count = TestModel::search(&mut db).count().unwrap();
    second.delete(&mut db).unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), count - 1);

    // passthru (unclassifiable, clears everything)
    let count = TestModel::search(&mut db).count().unwrap();
    db.passthru("DELETE FROM \"test_models\"").exec().unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 0);
    assert_ne!(count, 0);

    // table drop and re-provision
    TestModel::sample().save(&mut db).unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 1);
    db.delete_table::<TestModel>().unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 0);
}

#[test]
fn instances_are_independent() {
    let mut first = database();
    let mut second = database();
    TestModel::sample().save(&mut first).unwrap();
    // Separate in-memory databases, separate caches.
    assert_eq!(TestModel::search(&mut second).count().unwrap(), 0);
    assert_eq!(TestModel::search(&mut first).count().unwrap(), 1);
}

#[test]
fn caching_is_optional() {
    let mut db = strata::connect(strata::ConnectOptions::sqlite_in_memory()).unwrap();
    assert!(!db.use_cache());
    assert!(db.cache_stats().is_none());
    let mut model = TestModel::sample();
    model.save(&mut db).unwrap();
    assert_eq!(TestModel::search(&mut db).count().unwrap(), 1);
}
