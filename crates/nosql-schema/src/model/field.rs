//! Field (column) model

use crate::element::{ElementHeader, SchemaElement, TableId};
use crate::container::Named;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Boolean,
    Integer,
    Long,
    Double,
    Number,
    Float,
    Enum,
    #[default]
    String,
    Binary,
    FixedBinary,
    Timestamp,
    Array,
    Map,
    Json,
    Record,
}

impl FieldType {
    pub const ALL: [FieldType; 15] = [
        FieldType::Boolean,
        FieldType::Integer,
        FieldType::Long,
        FieldType::Double,
        FieldType::Number,
        FieldType::Float,
        FieldType::Enum,
        FieldType::String,
        FieldType::Binary,
        FieldType::FixedBinary,
        FieldType::Timestamp,
        FieldType::Array,
        FieldType::Map,
        FieldType::Json,
        FieldType::Record,
    ];

    /// Parse a type name, ignoring case and `_`/`-` separators
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.ident().replace('_', "") == normalized)
    }

    /// Canonical identifier, e.g. `FIXED_BINARY`
    pub fn ident(&self) -> &'static str {
        match self {
            FieldType::Boolean => "BOOLEAN",
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Double => "DOUBLE",
            FieldType::Number => "NUMBER",
            FieldType::Float => "FLOAT",
            FieldType::Enum => "ENUM",
            FieldType::String => "STRING",
            FieldType::Binary => "BINARY",
            FieldType::FixedBinary => "FIXED_BINARY",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Array => "ARRAY",
            FieldType::Map => "MAP",
            FieldType::Json => "JSON",
            FieldType::Record => "RECORD",
        }
    }

    /// Keyword used in DDL; fixed binary is `BINARY(size)`
    pub fn ddl_keyword(&self) -> &'static str {
        match self {
            FieldType::FixedBinary => "BINARY",
            other => other.ident(),
        }
    }

    /// Whether default values of this type are written as quoted strings
    pub fn quotes_default(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Timestamp)
    }

    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            FieldType::Array | FieldType::Map | FieldType::Record | FieldType::Json
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ident())
    }
}

/// A typed column descriptor
///
/// Key membership is a property of the field itself; the primary-key and
/// shard-key groups of a table are computed from these flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) header: ElementHeader<TableId>,
    field_type: FieldType,
    nullable: bool,
    default_value: Option<String>,
    primary_key: bool,
    shard_key: bool,
    index_key: bool,
    size_syntax: Option<String>,
    index_term: bool,
}

impl Field {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            header: ElementHeader::new(name),
            field_type: FieldType::default(),
            nullable: true,
            default_value: None,
            primary_key: false,
            shard_key: false,
            index_key: false,
            size_syntax: None,
            index_term: false,
        }
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn set_field_type(&mut self, field_type: FieldType) {
        self.field_type = field_type;
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    pub fn has_default(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn set_default_value(&mut self, value: Option<String>) {
        self.default_value = value;
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn set_primary_key(&mut self, primary_key: bool) {
        self.primary_key = primary_key;
    }

    pub fn is_shard_key(&self) -> bool {
        self.shard_key
    }

    pub fn set_shard_key(&mut self, shard_key: bool) {
        self.shard_key = shard_key;
    }

    pub fn is_index_key(&self) -> bool {
        self.index_key
    }

    pub fn set_index_key(&mut self, index_key: bool) {
        self.index_key = index_key;
    }

    /// Size or precision suffix, e.g. `(16)` for `BINARY(16)`
    pub fn size_syntax(&self) -> Option<&str> {
        self.size_syntax.as_deref()
    }

    pub fn set_size_syntax(&mut self, syntax: Option<String>) {
        self.size_syntax = syntax;
    }

    /// Whether this field exists only as an index term (e.g. `info.age`)
    /// and not as a column of its table
    pub fn is_index_term(&self) -> bool {
        self.index_term
    }

    pub(crate) fn mark_index_term(&mut self) {
        self.index_term = true;
        self.index_key = true;
    }

    /// Type with its size/precision suffix, as written in DDL
    pub fn type_syntax(&self) -> String {
        match &self.size_syntax {
            Some(syntax) => format!("{}{}", self.field_type.ddl_keyword(), syntax),
            None => self.field_type.ddl_keyword().to_string(),
        }
    }
}

impl SchemaElement for Field {
    type Owner = TableId;

    fn header(&self) -> &ElementHeader<TableId> {
        &self.header
    }
}

impl Named for Field {
    fn name(&self) -> &str {
        Field::name(self)
    }
}
