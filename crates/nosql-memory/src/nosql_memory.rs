//! NoSQL Memory - a simulated store
//!
//! `MemoryStore` keeps tables as JSON descriptions plus rows and
//! implements `MetadataSource`, `RowSource` and `DdlSink`. It interprets
//! the DDL the schema browser generates, serves `SELECT * FROM t` scans in
//! configurable batches, records every statement it applies, and can be
//! told to fail specific calls.

mod ddl;
mod query;
mod store;

pub use store::{DEFAULT_BATCH_SIZE, MemoryStore, Operation, StoreFixture};
