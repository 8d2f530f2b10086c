//! Error types for the NoSQL schema browser

use std::fmt;
use thiserror::Error;

/// Kind of element an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Datamodel,
    Schema,
    Table,
    Field,
    Index,
    Profile,
    Element,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Datamodel => "datamodel",
            ElementKind::Schema => "schema",
            ElementKind::Table => "table",
            ElementKind::Field => "field",
            ElementKind::Index => "index",
            ElementKind::Profile => "profile",
            ElementKind::Element => "element",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for schema, paging and backing-store operations
#[derive(Error, Debug)]
pub enum NosqlError {
    /// A child with the same (case-insensitive) name already exists and
    /// overwrite was not requested. `name` is the existing element's name.
    #[error("Duplicate {kind}: {name}")]
    DuplicateElement { kind: ElementKind, name: String },

    #[error("No such {kind}: {name}")]
    NoSuchElement { kind: ElementKind, name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid input: {message} (input: {input})")]
    InvalidInput { message: String, input: String },

    #[error("Backing store error: {0}")]
    BackingStore(String),

    #[error("No page has been materialized yet")]
    NoCurrentPage,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Longest input excerpt carried by `NosqlError::InvalidInput`
pub const INPUT_EXCERPT_LIMIT: usize = 200;

impl NosqlError {
    pub fn duplicate(kind: ElementKind, name: impl Into<String>) -> Self {
        NosqlError::DuplicateElement {
            kind,
            name: name.into(),
        }
    }

    pub fn no_such(kind: ElementKind, name: impl Into<String>) -> Self {
        NosqlError::NoSuchElement {
            kind,
            name: name.into(),
        }
    }

    /// Positional lookup miss, rendered as `#<index>`
    pub fn no_such_index(kind: ElementKind, index: usize) -> Self {
        NosqlError::NoSuchElement {
            kind,
            name: format!("#{index}"),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        NosqlError::InvalidArgument(message.into())
    }

    /// Build an `InvalidInput` error quoting a bounded excerpt of `input`
    pub fn invalid_input(message: impl Into<String>, input: &str) -> Self {
        NosqlError::InvalidInput {
            message: message.into(),
            input: excerpt(input),
        }
    }

    pub fn backing_store(message: impl Into<String>) -> Self {
        NosqlError::BackingStore(message.into())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, NosqlError::DuplicateElement { .. })
    }

    pub fn is_no_such_element(&self) -> bool {
        matches!(self, NosqlError::NoSuchElement { .. })
    }
}

fn excerpt(input: &str) -> String {
    if input.chars().count() <= INPUT_EXCERPT_LIMIT {
        return input.to_string();
    }
    let mut cut: String = input.chars().take(INPUT_EXCERPT_LIMIT).collect();
    cut.push_str("...");
    cut
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, NosqlError>;
