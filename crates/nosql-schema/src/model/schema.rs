//! Schema (namespace) model

use crate::container::{Named, NamedContainer};
use crate::element::{ElementHeader, Member, ModelRoot, SchemaElement, TableId};
use nosql_core::{ElementKind, MetadataSource};
use std::fmt;
use std::sync::Arc;

/// A namespace of tables
///
/// A table whose name is in the container is *known*; it is *fetched* once
/// its fields and indexes have been loaded. Schemas built from a live
/// connection keep the metadata source so tables can be loaded on first
/// access.
#[derive(Clone)]
pub struct Schema {
    pub(crate) header: ElementHeader<ModelRoot>,
    pub(crate) tables: NamedContainer<Member<TableId>>,
    pub(crate) source: Option<Arc<dyn MetadataSource>>,
}

impl Schema {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            header: ElementHeader::new(name),
            tables: NamedContainer::new(ElementKind::Table),
            source: None,
        }
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Whether a table of this name has been seen
    pub fn is_known(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Known table names in lexicographic order
    pub fn table_names(&self) -> Vec<String> {
        let mut names = self.tables.names();
        names.sort();
        names
    }

    /// Table ids in insertion order
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.iter().map(|m| m.id).collect()
    }

    /// Whether tables are loaded on demand from a live connection
    pub fn is_live(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<&Arc<dyn MetadataSource>> {
        self.source.as_ref()
    }

    pub(crate) fn set_source(&mut self, source: Option<Arc<dyn MetadataSource>>) {
        self.source = source;
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("header", &self.header)
            .field("tables", &self.tables)
            .field("live", &self.source.is_some())
            .finish()
    }
}

impl SchemaElement for Schema {
    type Owner = ModelRoot;

    fn header(&self) -> &ElementHeader<ModelRoot> {
        &self.header
    }
}

impl Named for Schema {
    fn name(&self) -> &str {
        Schema::name(self)
    }
}
