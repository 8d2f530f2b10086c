//! Backing-store contracts
//!
//! The core never talks to a database directly. A vendor driver (or the
//! in-memory simulator) implements these three narrow traits and the
//! schema builder, page cache and table admin service call through them.
//!
//! All methods are blocking. Callers that own a UI thread are expected to
//! run them on a worker thread; every trait is `Send + Sync` for that
//! reason.

use crate::{Result, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a submitted query whose results arrive in batches
pub trait QueryHandle: Send {
    /// Whether the most recent batch was the last one
    fn is_final(&self) -> bool;

    /// Fetch the rows of the next batch (one round-trip)
    fn next_batch(&mut self) -> Result<Vec<Row>>;
}

/// Source of query result rows
pub trait RowSource: Send + Sync {
    /// Submit a query and return a handle over its result batches
    fn submit(&self, query: &str) -> Result<Box<dyn QueryHandle>>;
}

/// Source of table metadata
///
/// `describe_table` returns the same JSON table node shape that
/// `SchemaBuilder` parses from a static description.
pub trait MetadataSource: Send + Sync {
    /// Namespace the tables live in
    fn namespace(&self) -> &str {
        DEFAULT_NAMESPACE
    }

    /// Names of all tables visible to this connection
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Structured description of one table
    fn describe_table(&self, name: &str) -> Result<serde_json::Value>;
}

/// Sink for DDL statements and table limit updates
pub trait DdlSink: Send + Sync {
    /// Execute one DDL statement
    fn execute_ddl(&self, statement: &str) -> Result<()>;

    /// Update the throughput and storage limits of a table
    fn set_table_limits(&self, table: &str, limits: &TableLimits) -> Result<()>;
}

/// Namespace used when a store does not report one
pub const DEFAULT_NAMESPACE: &str = "sysdefault";

/// Throughput and storage limits of a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLimits {
    /// Read throughput in KB/s
    pub read_units: u32,
    /// Write throughput in KB/s
    pub write_units: u32,
    /// Storage in GB
    #[serde(rename = "storageGB")]
    pub storage_gb: u32,
}

impl TableLimits {
    pub fn new(read_units: u32, write_units: u32, storage_gb: u32) -> Self {
        Self {
            read_units,
            write_units,
            storage_gb,
        }
    }

    /// Whether no limit has been set
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// Unit of a table's time-to-live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TtlUnit {
    #[default]
    Days,
    Hours,
}

impl TtlUnit {
    /// Parse a unit name, ignoring case and a trailing plural `s`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().trim_end_matches('S') {
            "DAY" => Some(TtlUnit::Days),
            "HOUR" => Some(TtlUnit::Hours),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TtlUnit::Days => "DAYS",
            TtlUnit::Hours => "HOURS",
        }
    }
}

impl fmt::Display for TtlUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-to-live of a table's rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ttl {
    pub value: u32,
    pub unit: TtlUnit,
}

impl Ttl {
    pub fn days(value: u32) -> Self {
        Self {
            value,
            unit: TtlUnit::Days,
        }
    }

    pub fn hours(value: u32) -> Self {
        Self {
            value,
            unit: TtlUnit::Hours,
        }
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
