//! NoSQL Core - shared abstractions for the NoSQL schema browser
//!
//! This crate provides the types every other crate depends on:
//!
//! - `NosqlError` - the error taxonomy used across the workspace
//! - `Row` - one result row as an ordered column map
//! - `RowSource`, `MetadataSource`, `DdlSink` - the narrow contracts the
//!   core calls into a vendor driver through
//! - `LazyChain` - a multi-batch iterator fed by a numbered callback
//! - `ConnectionProfile` / `ProfileRegistry` - deployment flavors and the
//!   factories that build them from property maps

mod error;
pub mod iter;
pub mod profile;
mod store;
mod types;

pub use error::*;
pub use iter::{BoxIter, LazyChain, pushback};
pub use profile::{
    CloudProfile, ConnectionProfile, OnPremProfile, ProfileKind, ProfileRegistry, PropertyMap,
    PropertySpec, SimulatedProfile,
};
pub use store::*;
pub use types::*;
