//! Shared fixtures for in-memory store tests

#![allow(dead_code)]

use indoc::indoc;
use nosql_memory::MemoryStore;
use std::sync::Arc;

pub const FIXTURE: &str = indoc! {r#"
    {
      "namespace": "shop",
      "tables": [
        {
          "name": "customers",
          "primaryKey": ["id"],
          "fields": [
            {"name": "id", "type": "INTEGER"},
            {"name": "name", "type": "STRING"},
            {"name": "address", "type": "JSON"}
          ],
          "indexes": [{"name": "by_city", "fields": ["address.city"], "types": ["STRING"]}]
        },
        {
          "name": "orders",
          "primaryKey": ["customer", "oid"],
          "shardKey": ["customer"],
          "fields": [
            {"name": "customer", "type": "INTEGER"},
            {"name": "oid", "type": "LONG"},
            {"name": "total", "type": "DOUBLE", "default": 0}
          ]
        }
      ],
      "rows": {
        "customers": [
          {"id": 1, "name": "Ada", "address": {"city": "London"}},
          {"id": 2, "name": "Grace", "address": {"city": "Arlington"}},
          {"id": 3, "name": "Edsger", "address": {"city": "Austin"}}
        ]
      }
    }
"#};

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_json(FIXTURE).expect("fixture parses"))
}

/// A store with `count` rows in `customers`, served `batch_size` at a time
pub fn big_store(count: i64, batch_size: usize) -> Arc<MemoryStore> {
    let store = MemoryStore::from_json(FIXTURE)
        .expect("fixture parses")
        .with_batch_size(batch_size);
    store
        .insert_rows(
            "customers",
            (4..4 + count - 3).map(|id| {
                nosql_core::Row::new()
                    .with("id", id)
                    .with("name", format!("customer {id}"))
            }),
        )
        .expect("customers exists");
    Arc::new(store)
}
