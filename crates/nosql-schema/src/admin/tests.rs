use super::*;
use crate::{BuildInput, FieldType, SchemaElement};
use parking_lot::Mutex;
use serde_json::json;

#[derive(Default)]
struct RecordingSink {
    statements: Mutex<Vec<String>>,
    limits: Mutex<Vec<(String, TableLimits)>>,
    fail: Mutex<bool>,
}

impl DdlSink for RecordingSink {
    fn execute_ddl(&self, statement: &str) -> Result<()> {
        if *self.fail.lock() {
            return Err(NosqlError::backing_store("statement rejected"));
        }
        self.statements.lock().push(statement.to_string());
        Ok(())
    }

    fn set_table_limits(&self, table: &str, limits: &TableLimits) -> Result<()> {
        if *self.fail.lock() {
            return Err(NosqlError::backing_store("limits rejected"));
        }
        self.limits.lock().push((table.to_string(), *limits));
        Ok(())
    }
}

struct Fixture {
    sink: Arc<RecordingSink>,
    admin: TableAdmin,
    model: Datamodel,
    schema: SchemaId,
    users: TableId,
}

fn fixture() -> Fixture {
    let description = json!({"schemas": [{"name": "s", "tables": [{
        "name": "users",
        "primaryKey": ["id"],
        "fields": [{"name": "id", "type": "integer"}, {"name": "name", "type": "string"}]
    }]}]});
    let model = SchemaBuilder::build("m", BuildInput::Description(&description)).unwrap();
    let schema = model.schema_named("s").unwrap();
    let users = model.table_named(schema, "users").unwrap();
    let sink = Arc::new(RecordingSink::default());
    let admin = TableAdmin::new(sink.clone());
    Fixture {
        sink,
        admin,
        model,
        schema,
        users,
    }
}

impl Fixture {
    fn statements(&self) -> Vec<String> {
        self.sink.statements.lock().clone()
    }

    fn fail(&self) {
        *self.sink.fail.lock() = true;
    }
}

mod table_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detached_orders(model: &mut Datamodel) -> TableId {
        let table = SchemaBuilder::new_table(model, None, "orders", false).unwrap();
        let id = SchemaBuilder::new_field(model, Some(table), "oid", false).unwrap();
        let f = model.field_mut(id).unwrap();
        f.set_field_type(FieldType::Long);
        f.set_primary_key(true);
        f.set_shard_key(true);
        f.set_nullable(false);
        table
    }

    #[test]
    fn test_create_table_attaches_after_ddl() {
        let mut fx = fixture();
        let orders = detached_orders(&mut fx.model);

        fx.admin.create_table(&mut fx.model, fx.schema, orders).unwrap();
        assert_eq!(
            fx.statements(),
            vec!["CREATE TABLE IF NOT EXISTS orders (oid LONG NOT NULL, PRIMARY KEY(oid))"]
        );
        assert_eq!(fx.model.table_named(fx.schema, "orders").unwrap(), orders);
        assert!(fx.model[orders].is_fetched());
    }

    #[test]
    fn test_create_table_failure_leaves_schema_alone() {
        let mut fx = fixture();
        let orders = detached_orders(&mut fx.model);
        fx.fail();

        let err = fx.admin.create_table(&mut fx.model, fx.schema, orders).unwrap_err();
        assert!(matches!(err, NosqlError::BackingStore(_)));
        assert_eq!(fx.model[fx.schema].table_names(), vec!["users"]);
    }

    #[test]
    fn test_create_existing_table_is_duplicate() {
        let mut fx = fixture();
        let table = SchemaBuilder::new_table(&mut fx.model, None, "USERS", false).unwrap();
        let err = fx.admin.create_table(&mut fx.model, fx.schema, table).unwrap_err();
        assert!(err.is_duplicate());
        assert!(fx.statements().is_empty());
    }

    #[test]
    fn test_drop_table() {
        let mut fx = fixture();
        fx.admin.drop_table(&mut fx.model, fx.schema, "Users").unwrap();
        assert_eq!(fx.statements(), vec!["DROP TABLE IF EXISTS users"]);
        assert_eq!(fx.model[fx.schema].table_count(), 0);
    }

    #[test]
    fn test_drop_unknown_table() {
        let mut fx = fixture();
        let err = fx.admin.drop_table(&mut fx.model, fx.schema, "ghost").unwrap_err();
        assert!(err.is_no_such_element());
        assert!(fx.statements().is_empty());
    }

    #[test]
    fn test_ttl_and_limits() {
        let mut fx = fixture();
        fx.admin.set_ttl(&mut fx.model, fx.users, Ttl::hours(3)).unwrap();
        fx.admin
            .set_limits(&mut fx.model, fx.users, TableLimits::new(10, 5, 2))
            .unwrap();

        assert_eq!(fx.statements(), vec!["ALTER TABLE users USING TTL 3 HOURS"]);
        assert_eq!(
            *fx.sink.limits.lock(),
            vec![("users".to_string(), TableLimits::new(10, 5, 2))]
        );
        assert_eq!(fx.model[fx.users].ttl(), Some(Ttl::hours(3)));
        assert_eq!(fx.model[fx.users].write_limit(), 5);
    }

    #[test]
    fn test_failed_limits_keep_model() {
        let mut fx = fixture();
        fx.fail();
        assert!(fx
            .admin
            .set_limits(&mut fx.model, fx.users, TableLimits::new(1, 1, 1))
            .is_err());
        assert!(fx.model[fx.users].limits().is_unset());
    }
}

mod column_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_column() {
        let mut fx = fixture();
        let field = SchemaBuilder::new_field(&mut fx.model, None, "age", false).unwrap();
        fx.model.field_mut(field).unwrap().set_field_type(FieldType::Integer);

        fx.admin.add_column(&mut fx.model, fx.users, field).unwrap();
        assert_eq!(fx.statements(), vec!["ALTER TABLE users (ADD age INTEGER)"]);
        assert_eq!(fx.model[fx.users].field_names(), vec!["id", "name", "age"]);
        assert_eq!(fx.model[field].owner(), Some(fx.users));
    }

    #[test]
    fn test_add_existing_column_is_duplicate() {
        let mut fx = fixture();
        let field = SchemaBuilder::new_field(&mut fx.model, None, "NAME", false).unwrap();
        assert!(fx.admin.add_column(&mut fx.model, fx.users, field).unwrap_err().is_duplicate());
        assert!(fx.statements().is_empty());
    }

    #[test]
    fn test_drop_column() {
        let mut fx = fixture();
        fx.admin.drop_column(&mut fx.model, fx.users, "name").unwrap();
        assert_eq!(fx.statements(), vec!["ALTER TABLE users (DROP name)"]);
        assert_eq!(fx.model[fx.users].field_names(), vec!["id"]);
    }

    #[test]
    fn test_primary_key_column_cannot_be_dropped() {
        let mut fx = fixture();
        let err = fx.admin.drop_column(&mut fx.model, fx.users, "id").unwrap_err();
        assert!(matches!(err, NosqlError::InvalidArgument(_)));
        assert!(fx.statements().is_empty());
    }

    #[test]
    fn test_failed_drop_keeps_column() {
        let mut fx = fixture();
        fx.fail();
        assert!(fx.admin.drop_column(&mut fx.model, fx.users, "name").is_err());
        assert!(fx.model[fx.users].has_field("name"));
    }
}

mod index_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_and_drop_index() {
        let mut fx = fixture();
        let index = fx
            .admin
            .create_index(&mut fx.model, fx.users, "by_name", &["name"])
            .unwrap();
        let name = fx.model.field_named(fx.users, "name").unwrap();
        assert_eq!(fx.model[index].fields().ids(), &[name]);
        assert!(fx.model[name].is_index_key());

        fx.admin.drop_index(&mut fx.model, fx.users, "BY_NAME").unwrap();
        assert_eq!(
            fx.statements(),
            vec![
                "CREATE INDEX IF NOT EXISTS by_name ON users (name)",
                "DROP INDEX IF EXISTS by_name ON users",
            ]
        );
        assert_eq!(fx.model[fx.users].index_count(), 0);
        assert!(!fx.model[name].is_index_key());
    }

    #[test]
    fn test_index_on_unknown_column() {
        let mut fx = fixture();
        let err = fx
            .admin
            .create_index(&mut fx.model, fx.users, "bad", &["nope"])
            .unwrap_err();
        assert!(err.is_no_such_element());
        assert!(fx.statements().is_empty());
    }

    #[test]
    fn test_failed_index_is_not_added() {
        let mut fx = fixture();
        fx.fail();
        assert!(fx
            .admin
            .create_index(&mut fx.model, fx.users, "by_name", &["name"])
            .is_err());
        assert_eq!(fx.model[fx.users].index_count(), 0);
    }
}
