//! Schema trees, page caches and table admin running against the store

mod common;

use common::{big_store, store};
use nosql_core::{DdlSink, MetadataSource, NosqlError, RowSource, TableLimits, Ttl};
use nosql_memory::Operation;
use nosql_results::{RowStream, TablePageCache, TableSnapshot, split_first};
use nosql_schema::{BuildInput, Datamodel, DdlGenerator, FieldType, SchemaBuilder, SchemaElement, TableAdmin};
use std::sync::Arc;

fn live_model(store: &Arc<nosql_memory::MemoryStore>) -> Datamodel {
    let source: Arc<dyn MetadataSource> = store.clone();
    SchemaBuilder::build("shop", BuildInput::Live(source)).unwrap()
}

#[test]
fn test_tables_load_on_first_access() {
    let store = store();
    let mut model = live_model(&store);
    let schema = model.schema_named("shop").unwrap();
    assert_eq!(model[schema].table_names(), vec!["customers", "orders"]);

    let orders = model.table_by_path("shop", "orders").unwrap();
    assert!(model[orders].is_fetched());
    let shard = model.shard_key(orders).unwrap();
    assert_eq!(model.group_names(&shard), vec!["customer"]);
    let pk = model.primary_key(orders).unwrap();
    assert_eq!(model.group_names(&pk), vec!["customer", "oid"]);

    let customers = model.table_named(schema, "customers").unwrap();
    assert!(!model[customers].is_fetched());
}

#[test]
fn test_index_terms_from_store() {
    let store = store();
    let mut model = live_model(&store);
    let customers = model.table_by_path("shop", "customers").unwrap();
    assert_eq!(model[customers].field_count(), 3);
    let by_city = model.index_named(customers, "by_city").unwrap();
    let term = model.index_fields(by_city).unwrap()[0];
    assert_eq!(term.name(), "address.city");
    assert_eq!(term.field_type(), FieldType::String);
}

#[test]
fn test_describe_failure_surfaces_and_retries() {
    let store = store();
    let mut model = live_model(&store);
    store.fail_next(Operation::DescribeTable, "metadata service unavailable");

    let err = model.table_by_path("shop", "orders").unwrap_err();
    assert!(matches!(err, NosqlError::BackingStore(_)));
    let orders = model.table_by_path("shop", "orders").unwrap();
    assert_eq!(model[orders].field_count(), 3);
}

#[test]
fn test_generated_ddl_round_trips() {
    let store = store();
    let mut model = live_model(&store);
    let orders = model.table_by_path("shop", "orders").unwrap();
    let create = DdlGenerator::create_table(&model, orders).unwrap();

    store.execute_ddl("DROP TABLE orders").unwrap();
    store.execute_ddl(&create).unwrap();

    let schema = model.schema_named("shop").unwrap();
    SchemaBuilder::recursive_refresh(&mut model, schema).unwrap();
    let orders = model.table_named(schema, "orders").unwrap();
    assert_eq!(model[orders].field_names(), vec!["customer", "oid", "total"]);
    let shard = model.shard_key(orders).unwrap();
    assert_eq!(model.group_names(&shard), vec!["customer"]);
    let total = model.field_named(orders, "total").unwrap();
    assert_eq!(model[total].default_value(), Some("0"));
}

#[test]
fn test_admin_changes_reach_store_and_model() {
    let store = store();
    let mut model = live_model(&store);
    let schema = model.schema_named("shop").unwrap();
    let customers = model.table_by_path("shop", "customers").unwrap();
    let admin = TableAdmin::new(store.clone());

    let age = SchemaBuilder::new_field(&mut model, None, "age", false).unwrap();
    model.field_mut(age).unwrap().set_field_type(FieldType::Integer);
    admin.add_column(&mut model, customers, age).unwrap();
    admin.create_index(&mut model, customers, "by_age", &["age"]).unwrap();
    admin.set_ttl(&mut model, customers, Ttl::days(30)).unwrap();
    admin
        .set_limits(&mut model, customers, TableLimits::new(10, 10, 1))
        .unwrap();

    assert_eq!(
        store.statements(),
        vec![
            "ALTER TABLE customers (ADD age INTEGER)",
            "CREATE INDEX IF NOT EXISTS by_age ON customers (age)",
            "ALTER TABLE customers USING TTL 30 DAYS",
            "LIMITS customers READ 10 WRITE 10 STORAGE 1",
        ]
    );

    // A fresh model built from the store sees the same table.
    let mut fresh = live_model(&store);
    let reloaded = fresh.table_by_path("shop", "customers").unwrap();
    assert_eq!(fresh[reloaded].field_names(), model[customers].field_names());
    assert_eq!(fresh[reloaded].index_names(), model[customers].index_names());
    assert_eq!(fresh[reloaded].ttl(), Some(Ttl::days(30)));
    assert_eq!(fresh[reloaded].limits(), TableLimits::new(10, 10, 1));
    assert_eq!(model[schema].table_count(), 2);
}

#[test]
fn test_rejected_admin_change_leaves_model() {
    let store = store();
    let mut model = live_model(&store);
    let customers = model.table_by_path("shop", "customers").unwrap();
    let admin = TableAdmin::new(store.clone());
    store.fail_next(Operation::ExecuteDdl, "quota exceeded");

    assert!(admin.drop_column(&mut model, customers, "name").is_err());
    assert!(model[customers].has_field("name"));
}

mod paging_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn browse(store: &Arc<nosql_memory::MemoryStore>, model: &mut Datamodel) -> TablePageCache {
        let table = model.table_by_path("shop", "customers").unwrap();
        let snapshot = TableSnapshot::of(model, table).unwrap();
        let rows = RowStream::submit(store.as_ref(), "SELECT * FROM customers").unwrap();
        let mut cache = TablePageCache::new(10).unwrap();
        cache.set_result(rows.into_boxed(), snapshot);
        cache
    }

    #[test]
    fn test_twenty_five_rows_in_pages_of_ten() {
        let store = big_store(25, 4);
        let mut model = live_model(&store);
        let mut cache = browse(&store, &mut model);

        let mut sizes = Vec::new();
        while cache.next_page(false).unwrap() {
            sizes.push(cache.current_page().unwrap().len());
        }
        assert_eq!(sizes, vec![10, 10, 5]);
        assert!(!cache.has_next_page());
        assert!(cache.prev_page());
        assert_eq!(cache.current_page_number(), 2);
    }

    #[test]
    fn test_collection_mode_hoists_primary_key() {
        let store = store();
        let mut model = live_model(&store);
        let mut cache = browse(&store, &mut model);
        cache.next_page(true).unwrap();
        let first = cache.current_page().unwrap().rows()[0].row().to_json();
        assert_eq!(
            first,
            serde_json::json!({"id": 1, "Rowdata": {"name": "Ada", "address": {"city": "London"}}})
        );
    }

    #[test]
    fn test_split_first_detects_empty_tables() {
        let store = store();
        let rows = RowStream::submit(store.as_ref(), "SELECT * FROM orders").unwrap();
        assert!(split_first(rows.into_boxed()).unwrap().is_none());

        let rows = RowStream::submit(store.as_ref(), "SELECT * FROM customers").unwrap();
        let rows = split_first(rows.into_boxed()).unwrap().unwrap();
        assert_eq!(rows.count(), 3);
    }

    #[test]
    fn test_submit_failure() {
        let store = store();
        store.fail_next(Operation::Submit, "throttled");
        assert!(matches!(
            store.submit("SELECT * FROM customers").err(),
            Some(NosqlError::BackingStore(_))
        ));
    }
}
