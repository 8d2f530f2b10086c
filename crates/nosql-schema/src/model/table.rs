//! Table model

use crate::container::{Named, NamedContainer};
use crate::element::{ElementHeader, FieldId, IndexId, Member, SchemaElement, SchemaId};
use nosql_core::{ElementKind, TableLimits, Ttl};

/// A table: ordered fields, indexes, limits and time-to-live
#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) header: ElementHeader<SchemaId>,
    pub(crate) fields: NamedContainer<Member<FieldId>>,
    pub(crate) indexes: NamedContainer<Member<IndexId>>,
    /// Fields that exist only as index terms; owned by this table but not
    /// among its columns
    pub(crate) index_terms: Vec<FieldId>,
    limits: TableLimits,
    ttl: Option<Ttl>,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            header: ElementHeader::new(name),
            fields: NamedContainer::new(ElementKind::Field),
            indexes: NamedContainer::new(ElementKind::Index),
            index_terms: Vec::new(),
            limits: TableLimits::default(),
            ttl: None,
        }
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    /// Number of columns; index-only terms are not counted
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    /// Column ids in declaration order
    pub fn field_ids(&self) -> Vec<FieldId> {
        self.fields.iter().map(|m| m.id).collect()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.names()
    }

    pub fn index_ids(&self) -> Vec<IndexId> {
        self.indexes.iter().map(|m| m.id).collect()
    }

    pub fn index_names(&self) -> Vec<String> {
        self.indexes.names()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn limits(&self) -> TableLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: TableLimits) {
        self.limits = limits;
    }

    pub fn read_limit(&self) -> u32 {
        self.limits.read_units
    }

    pub fn set_read_limit(&mut self, kb_per_second: u32) {
        self.limits.read_units = kb_per_second;
    }

    pub fn write_limit(&self) -> u32 {
        self.limits.write_units
    }

    pub fn set_write_limit(&mut self, kb_per_second: u32) {
        self.limits.write_units = kb_per_second;
    }

    pub fn storage_limit(&self) -> u32 {
        self.limits.storage_gb
    }

    pub fn set_storage_limit(&mut self, gigabytes: u32) {
        self.limits.storage_gb = gigabytes;
    }

    pub fn ttl(&self) -> Option<Ttl> {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Option<Ttl>) {
        self.ttl = ttl;
    }
}

impl SchemaElement for Table {
    type Owner = SchemaId;

    fn header(&self) -> &ElementHeader<SchemaId> {
        &self.header
    }
}

impl Named for Table {
    fn name(&self) -> &str {
        Table::name(self)
    }
}
