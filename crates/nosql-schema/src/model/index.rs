//! Field groups and indexes

use crate::container::Named;
use crate::element::{ElementHeader, FieldId, SchemaElement, TableId};
use crate::model::Field;
use nosql_core::{NosqlError, Result};

/// Ordered, duplicate-free list of fields of one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGroup {
    table: Option<TableId>,
    fields: Vec<FieldId>,
}

impl FieldGroup {
    pub fn new(table: TableId) -> Self {
        Self {
            table: Some(table),
            fields: Vec::new(),
        }
    }

    pub(crate) fn detached() -> Self {
        Self::default()
    }

    pub(crate) fn from_ids(table: TableId, fields: Vec<FieldId>) -> Self {
        Self {
            table: Some(table),
            fields,
        }
    }

    /// Table every member belongs to
    pub fn table(&self) -> Option<TableId> {
        self.table
    }

    pub(crate) fn bind(&mut self, table: TableId) {
        self.table = Some(table);
    }

    /// Append a field
    ///
    /// The field must be owned by this group's table. Adding a field that
    /// is already a member is a no-op and returns `false`.
    pub fn add(&mut self, id: FieldId, field: &Field) -> Result<bool> {
        let Some(table) = self.table else {
            return Err(NosqlError::invalid_argument(format!(
                "cannot add field '{}' to a group that belongs to no table",
                field.name()
            )));
        };
        if field.owner() != Some(table) {
            return Err(NosqlError::invalid_argument(format!(
                "field '{}' belongs to a different table",
                field.name()
            )));
        }
        if self.fields.contains(&id) {
            return Ok(false);
        }
        self.fields.push(id);
        Ok(true)
    }

    pub fn remove(&mut self, id: FieldId) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| *f != id);
        before != self.fields.len()
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.fields.contains(&id)
    }

    pub fn position(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|f| *f == id)
    }

    pub fn ids(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<FieldId> {
        self.fields.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.iter().copied()
    }
}

/// A named, ordered list of fields backed by a database index
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub(crate) header: ElementHeader<TableId>,
    pub(crate) group: FieldGroup,
}

impl Index {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            header: ElementHeader::new(name),
            group: FieldGroup::detached(),
        }
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    /// Indexed fields in index order
    pub fn fields(&self) -> &FieldGroup {
        &self.group
    }

    pub fn field_count(&self) -> usize {
        self.group.len()
    }
}

impl SchemaElement for Index {
    type Owner = TableId;

    fn header(&self) -> &ElementHeader<TableId> {
        &self.header
    }
}

impl Named for Index {
    fn name(&self) -> &str {
        Index::name(self)
    }
}
