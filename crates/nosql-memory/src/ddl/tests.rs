use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_create_table_with_shard_key_and_ttl() {
    let statement = parse(
        "CREATE TABLE IF NOT EXISTS users (a INTEGER NOT NULL DEFAULT 0, b STRING, \
         note STRING DEFAULT \"say \\\"hi\\\"\", blob BINARY(16), \
         PRIMARY KEY(SHARD(a), b)) USING TTL 5 DAYS",
    )
    .unwrap();
    let Statement::CreateTable {
        if_not_exists,
        table,
    } = statement
    else {
        panic!("expected CREATE TABLE");
    };
    assert!(if_not_exists);
    assert_eq!(
        table,
        json!({
            "name": "users",
            "primaryKey": ["a", "b"],
            "fields": [
                {"name": "a", "type": "INTEGER", "nullable": false, "default": 0},
                {"name": "b", "type": "STRING", "nullable": true},
                {"name": "note", "type": "STRING", "nullable": true, "default": "say \"hi\""},
                {"name": "blob", "type": "FIXED_BINARY", "size": 16, "nullable": true}
            ],
            "indexes": [],
            "shardKey": ["a"],
            "ttl": {"value": 5, "unit": "DAYS"}
        })
    );
}

#[test]
fn test_complex_type_parameters_are_skipped() {
    let Statement::CreateTable { table, .. } =
        parse("CREATE TABLE t (k LONG, tags ARRAY(STRING), PRIMARY KEY(k))").unwrap()
    else {
        panic!("expected CREATE TABLE");
    };
    assert_eq!(table["fields"][1], json!({"name": "tags", "type": "ARRAY", "nullable": true}));
    assert!(table.get("shardKey").is_none());
}

#[test]
fn test_alter_statements() {
    assert_eq!(
        parse("ALTER TABLE t (ADD c LONG)").unwrap(),
        Statement::AddColumn {
            table: "t".into(),
            field: json!({"name": "c", "type": "LONG", "nullable": true}),
        }
    );
    assert_eq!(
        parse("alter table t (drop c);").unwrap(),
        Statement::DropColumn {
            table: "t".into(),
            column: "c".into(),
        }
    );
    assert_eq!(
        parse("ALTER TABLE t USING TTL 3 HOURS").unwrap(),
        Statement::AlterTtl {
            table: "t".into(),
            ttl: json!({"value": 3, "unit": "HOURS"}),
        }
    );
}

#[test]
fn test_drop_and_index_statements() {
    assert_eq!(
        parse("DROP TABLE IF EXISTS t").unwrap(),
        Statement::DropTable {
            if_exists: true,
            name: "t".into(),
        }
    );
    assert_eq!(
        parse("CREATE INDEX idx ON t (a, info.city)").unwrap(),
        Statement::CreateIndex {
            if_not_exists: false,
            table: "t".into(),
            index: json!({"name": "idx", "fields": ["a", "info.city"]}),
        }
    );
    assert_eq!(
        parse("DROP INDEX IF EXISTS idx ON t").unwrap(),
        Statement::DropIndex {
            if_exists: true,
            table: "t".into(),
            name: "idx".into(),
        }
    );
}

#[test]
fn test_rejected_statements() {
    for statement in [
        "SELECT * FROM t",
        "CREATE TABLE t (a LONG",
        "ALTER TABLE t (RENAME a)",
        "ALTER TABLE t USING TTL soon DAYS",
        "DROP TABLE t extra",
        "CREATE TABLE t (a STRING DEFAULT 'open",
    ] {
        let err = parse(statement).unwrap_err();
        assert!(matches!(err, NosqlError::BackingStore(_)), "{statement}: {err:?}");
    }
}
