//! NoSQL Schema - the schema element tree and everything that fills it
//!
//! This crate provides:
//! - `NamedContainer` - ordered, case-insensitive name-unique collections
//! - `Datamodel` - the arena-backed tree of schemas, tables, fields and indexes
//! - `SchemaBuilder` - element factories, JSON description parsing and
//!   lazy population from a live metadata source
//! - `DdlGenerator` - DDL text for tables, columns, indexes and TTL
//! - `TableAdmin` - sends DDL and limit changes to a store and mirrors them
//!   into the model

mod admin;
mod builder;
pub mod container;
mod ddl;
mod element;
mod model;
mod shared;

pub use admin::TableAdmin;
pub use builder::{BuildInput, SchemaBuilder};
pub use container::{Named, NamedContainer};
pub use ddl::DdlGenerator;
pub use element::{
    ElementHeader, FieldId, IndexId, Member, ModelRoot, SchemaElement, SchemaId, TableId,
};
pub use model::{Datamodel, Field, FieldGroup, FieldType, Index, Schema, Table};
pub use shared::{SharedDatamodel, new_shared_model};
