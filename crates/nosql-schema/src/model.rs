//! Schema element tree
//!
//! A `Datamodel` is the root of the tree and the arena that owns every
//! element in it. Schemas, tables, fields and indexes are stored in slot
//! maps and addressed by typed ids; containers hold their children's ids by
//! name and children hold their owner's id.
//!
//! Detached elements (created but not attached to an owner) are allowed.
//! A field, for example, can exist without a table while an index
//! definition is being parsed.

mod field;
mod index;
mod schema;
mod table;

pub use field::{Field, FieldType};
pub use index::{FieldGroup, Index};
pub use schema::Schema;
pub use table::Table;

use crate::container::{Named, NamedContainer, validate_name};
use crate::element::{
    ElementHeader, FieldId, IndexId, Member, ModelRoot, SchemaElement, SchemaId, TableId,
};
use nosql_core::{ElementKind, NosqlError, Result};
use slotmap::SlotMap;
use std::fmt::Debug;

/// Root of a schema tree and owner of all its elements
#[derive(Debug, Clone)]
pub struct Datamodel {
    header: ElementHeader<ModelRoot>,
    members: NamedContainer<Member<SchemaId>>,
    schemas: SlotMap<SchemaId, Schema>,
    tables: SlotMap<TableId, Table>,
    fields: SlotMap<FieldId, Field>,
    indexes: SlotMap<IndexId, Index>,
}

impl Datamodel {
    /// Create an empty datamodel
    pub fn new(name: &str) -> Result<Self> {
        validate_name(ElementKind::Datamodel, name)?;
        Ok(Self {
            header: ElementHeader::new(name),
            members: NamedContainer::new(ElementKind::Schema),
            schemas: SlotMap::with_key(),
            tables: SlotMap::with_key(),
            fields: SlotMap::with_key(),
            indexes: SlotMap::with_key(),
        })
    }

    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub(crate) fn set_fetched(&mut self, fetched: bool) {
        self.header.set_fetched(fetched);
    }

    // ========== Arena access ==========

    pub fn get_schema(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id)
    }

    pub fn get_table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn get_field(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(id)
    }

    pub fn get_index(&self, id: IndexId) -> Option<&Index> {
        self.indexes.get(id)
    }

    pub fn table_mut(&mut self, id: TableId) -> Result<&mut Table> {
        self.tables.get_mut(id).ok_or_else(|| stale(ElementKind::Table, id))
    }

    pub fn field_mut(&mut self, id: FieldId) -> Result<&mut Field> {
        self.fields.get_mut(id).ok_or_else(|| stale(ElementKind::Field, id))
    }

    pub(crate) fn schema_mut(&mut self, id: SchemaId) -> Result<&mut Schema> {
        self.schemas
            .get_mut(id)
            .ok_or_else(|| stale(ElementKind::Schema, id))
    }

    fn schema_ref(&self, id: SchemaId) -> Result<&Schema> {
        self.schemas.get(id).ok_or_else(|| stale(ElementKind::Schema, id))
    }

    fn table_ref(&self, id: TableId) -> Result<&Table> {
        self.tables.get(id).ok_or_else(|| stale(ElementKind::Table, id))
    }

    fn field_ref(&self, id: FieldId) -> Result<&Field> {
        self.fields.get(id).ok_or_else(|| stale(ElementKind::Field, id))
    }

    fn index_ref(&self, id: IndexId) -> Result<&Index> {
        self.indexes.get(id).ok_or_else(|| stale(ElementKind::Index, id))
    }

    // ========== Detached creation ==========

    pub(crate) fn create_schema(&mut self, name: &str) -> Result<SchemaId> {
        validate_name(ElementKind::Schema, name)?;
        Ok(self.schemas.insert(Schema::new(name)))
    }

    pub(crate) fn create_table(&mut self, name: &str) -> Result<TableId> {
        validate_name(ElementKind::Table, name)?;
        Ok(self.tables.insert(Table::new(name)))
    }

    pub(crate) fn create_field(&mut self, name: &str) -> Result<FieldId> {
        validate_name(ElementKind::Field, name)?;
        Ok(self.fields.insert(Field::new(name)))
    }

    pub(crate) fn create_index(&mut self, name: &str) -> Result<IndexId> {
        validate_name(ElementKind::Index, name)?;
        Ok(self.indexes.insert(Index::new(name)))
    }

    /// Drop a table that was created but never attached
    pub(crate) fn discard_detached_table(&mut self, table: TableId) {
        if self.tables.get(table).is_some_and(|t| t.owner().is_none()) {
            self.tables.remove(table);
        }
    }

    pub(crate) fn discard_detached_field(&mut self, field: FieldId) {
        if self.fields.get(field).is_some_and(|f| f.owner().is_none()) {
            self.fields.remove(field);
        }
    }

    pub(crate) fn discard_detached_index(&mut self, index: IndexId) {
        if self.indexes.get(index).is_some_and(|i| i.owner().is_none()) {
            self.indexes.remove(index);
        }
    }

    pub(crate) fn discard_detached_schema(&mut self, schema: SchemaId) {
        if self.schemas.get(schema).is_some_and(|s| s.owner().is_none()) {
            self.schemas.remove(schema);
        }
    }

    // ========== Schemas ==========

    /// Attach a schema to this datamodel
    pub fn add_schema(&mut self, schema: SchemaId, overwrite: bool) -> Result<()> {
        let (name, owner) = {
            let s = self.schema_ref(schema)?;
            (s.name().to_string(), s.owner())
        };
        check_owner(ElementKind::Schema, &name, owner, ModelRoot)?;
        let replaced = self.members.add(Member::new(name, schema), overwrite)?;
        self.schemas[schema].header.set_owner(Some(ModelRoot));
        if let Some(old) = replaced.filter(|old| old.id != schema) {
            self.purge_schema(old.id);
        }
        Ok(())
    }

    pub fn schema_named(&self, name: &str) -> Result<SchemaId> {
        self.members.get(name).map(|m| m.id)
    }

    pub fn schema_at(&self, index: usize) -> Result<SchemaId> {
        self.members.get_at(index).map(|m| m.id)
    }

    pub fn schema_ids(&self) -> Vec<SchemaId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn schema_names(&self) -> Vec<String> {
        self.members.names()
    }

    pub fn schema_count(&self) -> usize {
        self.members.len()
    }

    /// Detach a schema and drop it with all its tables
    pub fn remove_schema(&mut self, name: &str) -> Result<()> {
        let member = self.members.remove(name)?;
        self.purge_schema(member.id);
        Ok(())
    }

    // ========== Tables ==========

    /// Attach a table to a schema
    pub fn add_table(&mut self, schema: SchemaId, table: TableId, overwrite: bool) -> Result<()> {
        let (name, owner) = {
            let t = self.table_ref(table)?;
            (t.name().to_string(), t.owner())
        };
        check_owner(ElementKind::Table, &name, owner, schema)?;
        let replaced = self
            .schema_mut(schema)?
            .tables
            .add(Member::new(name, table), overwrite)?;
        self.tables[table].header.set_owner(Some(schema));
        if let Some(old) = replaced.filter(|old| old.id != table) {
            self.purge_table(old.id);
        }
        Ok(())
    }

    /// Look up a known table without fetching it
    pub fn table_named(&self, schema: SchemaId, name: &str) -> Result<TableId> {
        self.schema_ref(schema)?.tables.get(name).map(|m| m.id)
    }

    pub fn table_at(&self, schema: SchemaId, index: usize) -> Result<TableId> {
        self.schema_ref(schema)?.tables.get_at(index).map(|m| m.id)
    }

    /// Look up a table, loading its details from the schema's metadata
    /// source if it has not been fetched yet
    pub fn load_table(&mut self, schema: SchemaId, name: &str) -> Result<TableId> {
        let table = self.table_named(schema, name)?;
        let needs_fetch = !self.tables[table].is_fetched() && self.schemas[schema].is_live();
        if needs_fetch {
            tracing::debug!(schema = %self.schemas[schema].name(), table = %name, "loading table on first access");
            crate::SchemaBuilder::refresh_table(self, table)?;
        }
        Ok(table)
    }

    /// Look up `schema.table` by name, loading the table if needed
    pub fn table_by_path(&mut self, schema: &str, table: &str) -> Result<TableId> {
        let schema = self.schema_named(schema)?;
        self.load_table(schema, table)
    }

    /// Detach a table and drop it with its fields and indexes
    pub fn remove_table(&mut self, schema: SchemaId, name: &str) -> Result<()> {
        let member = self.schema_mut(schema)?.tables.remove(name)?;
        self.purge_table(member.id);
        Ok(())
    }

    pub fn remove_all_tables(&mut self, schema: SchemaId) -> Result<()> {
        let members = self.schema_mut(schema)?.tables.clear();
        for member in members {
            self.purge_table(member.id);
        }
        Ok(())
    }

    // ========== Fields ==========

    /// Attach a field to a table as its last column
    pub fn add_field(&mut self, table: TableId, field: FieldId, overwrite: bool) -> Result<()> {
        let (name, owner) = {
            let f = self.field_ref(field)?;
            (f.name().to_string(), f.owner())
        };
        check_owner(ElementKind::Field, &name, owner, table)?;
        let replaced = self
            .table_mut(table)?
            .fields
            .add(Member::new(name, field), overwrite)?;
        self.fields[field].header.set_owner(Some(table));
        if let Some(old) = replaced.filter(|old| old.id != field) {
            self.purge_field(table, old.id);
        }
        Ok(())
    }

    pub fn field_named(&self, table: TableId, name: &str) -> Result<FieldId> {
        self.table_ref(table)?.fields.get(name).map(|m| m.id)
    }

    pub fn field_at(&self, table: TableId, index: usize) -> Result<FieldId> {
        self.table_ref(table)?.fields.get_at(index).map(|m| m.id)
    }

    /// Columns of a table in declaration order
    pub fn table_fields(&self, table: TableId) -> Result<Vec<&Field>> {
        let t = self.table_ref(table)?;
        Ok(t.fields.iter().map(|m| &self.fields[m.id]).collect())
    }

    /// Detach a column, dropping it from any index that lists it
    pub fn remove_field(&mut self, table: TableId, name: &str) -> Result<()> {
        let member = self.table_mut(table)?.fields.remove(name)?;
        self.purge_field(table, member.id);
        Ok(())
    }

    /// Primary-key fields in declaration order
    pub fn primary_key(&self, table: TableId) -> Result<FieldGroup> {
        self.project(table, Field::is_primary_key)
    }

    /// Shard-key fields in declaration order
    pub fn shard_key(&self, table: TableId) -> Result<FieldGroup> {
        self.project(table, Field::is_shard_key)
    }

    fn project(&self, table: TableId, keep: fn(&Field) -> bool) -> Result<FieldGroup> {
        let t = self.table_ref(table)?;
        let ids = t
            .fields
            .iter()
            .map(|m| m.id)
            .filter(|id| keep(&self.fields[*id]))
            .collect();
        Ok(FieldGroup::from_ids(table, ids))
    }

    /// Names of the fields in a group, in group order
    pub fn group_names(&self, group: &FieldGroup) -> Vec<String> {
        group
            .iter()
            .filter_map(|id| self.fields.get(id))
            .map(|f| f.name().to_string())
            .collect()
    }

    // ========== Indexes ==========

    /// Attach an index to a table
    pub fn add_index(&mut self, table: TableId, index: IndexId, overwrite: bool) -> Result<()> {
        let (name, owner) = {
            let i = self.index_ref(index)?;
            (i.name().to_string(), i.owner())
        };
        check_owner(ElementKind::Index, &name, owner, table)?;
        let replaced = self
            .table_mut(table)?
            .indexes
            .add(Member::new(name, index), overwrite)?;
        let attached = &mut self.indexes[index];
        attached.header.set_owner(Some(table));
        attached.group.bind(table);
        if let Some(old) = replaced.filter(|old| old.id != index) {
            self.purge_index(table, old.id);
        }
        Ok(())
    }

    pub fn index_named(&self, table: TableId, name: &str) -> Result<IndexId> {
        self.table_ref(table)?.indexes.get(name).map(|m| m.id)
    }

    pub fn index_at(&self, table: TableId, index: usize) -> Result<IndexId> {
        self.table_ref(table)?.indexes.get_at(index).map(|m| m.id)
    }

    pub fn table_indexes(&self, table: TableId) -> Result<Vec<&Index>> {
        let t = self.table_ref(table)?;
        Ok(t.indexes.iter().map(|m| &self.indexes[m.id]).collect())
    }

    /// Indexed fields of an index, in index order
    pub fn index_fields(&self, index: IndexId) -> Result<Vec<&Field>> {
        let i = self.index_ref(index)?;
        Ok(i.group.iter().filter_map(|id| self.fields.get(id)).collect())
    }

    /// Append a field to an index; the field must belong to the index's table
    pub fn add_index_field(&mut self, index: IndexId, field: FieldId) -> Result<bool> {
        let f = self
            .fields
            .get(field)
            .ok_or_else(|| stale(ElementKind::Field, field))?;
        let i = self
            .indexes
            .get_mut(index)
            .ok_or_else(|| stale(ElementKind::Index, index))?;
        let added = i.group.add(field, f)?;
        if added {
            self.fields[field].set_index_key(true);
        }
        Ok(added)
    }

    /// Create a field that exists only as an index term of `table`
    ///
    /// The field is owned by the table but is not one of its columns, so it
    /// does not count towards `Table::field_count`.
    pub(crate) fn add_index_term(&mut self, table: TableId, name: &str) -> Result<FieldId> {
        self.table_ref(table)?;
        let field = self.create_field(name)?;
        let f = &mut self.fields[field];
        f.header.set_owner(Some(table));
        f.mark_index_term();
        self.tables[table].index_terms.push(field);
        Ok(field)
    }

    /// Detach an index and drop it with its index-only terms
    pub fn remove_index(&mut self, table: TableId, name: &str) -> Result<()> {
        let member = self.table_mut(table)?.indexes.remove(name)?;
        self.purge_index(table, member.id);
        Ok(())
    }

    /// Drop every column, index term and index of a table
    pub fn remove_all_children(&mut self, table: TableId) -> Result<()> {
        let t = self.table_mut(table)?;
        let fields = t.fields.clear();
        let indexes = t.indexes.clear();
        let terms = std::mem::take(&mut t.index_terms);
        for member in indexes {
            self.indexes.remove(member.id);
        }
        for id in fields.into_iter().map(|m| m.id).chain(terms) {
            self.fields.remove(id);
        }
        Ok(())
    }

    // ========== Fetch state ==========

    pub(crate) fn mark_schema_fetched(&mut self, schema: SchemaId) {
        if let Some(s) = self.schemas.get_mut(schema) {
            s.header.set_fetched(true);
        }
    }

    /// Mark a table and everything under it as fetched
    pub(crate) fn mark_table_fetched(&mut self, table: TableId) {
        let Some(t) = self.tables.get_mut(table) else {
            return;
        };
        t.header.set_fetched(true);
        let fields: Vec<FieldId> = t.fields.iter().map(|m| m.id).chain(t.index_terms.iter().copied()).collect();
        let indexes: Vec<IndexId> = t.indexes.iter().map(|m| m.id).collect();
        for id in fields {
            self.fields[id].header.set_fetched(true);
        }
        for id in indexes {
            self.indexes[id].header.set_fetched(true);
        }
    }

    // ========== Purging ==========

    fn purge_schema(&mut self, schema: SchemaId) {
        if let Some(s) = self.schemas.remove(schema) {
            for member in s.tables.iter() {
                self.purge_table(member.id);
            }
        }
    }

    fn purge_table(&mut self, table: TableId) {
        if self.remove_all_children(table).is_ok() {
            self.tables.remove(table);
        }
    }

    fn purge_index(&mut self, table: TableId, index: IndexId) {
        let Some(removed) = self.indexes.remove(index) else {
            return;
        };
        for field in removed.group.iter() {
            let t = &mut self.tables[table];
            if let Some(pos) = t.index_terms.iter().position(|id| *id == field) {
                t.index_terms.remove(pos);
                self.fields.remove(field);
            } else if !self.is_indexed(table, field) {
                if let Some(f) = self.fields.get_mut(field) {
                    f.set_index_key(false);
                }
            }
        }
    }

    fn purge_field(&mut self, table: TableId, field: FieldId) {
        if let Some(t) = self.tables.get(table) {
            for member in t.indexes.iter() {
                self.indexes[member.id].group.remove(field);
            }
        }
        self.fields.remove(field);
    }

    fn is_indexed(&self, table: TableId, field: FieldId) -> bool {
        self.tables.get(table).is_some_and(|t| {
            t.indexes
                .iter()
                .any(|m| self.indexes[m.id].group.contains(field))
        })
    }
}

impl SchemaElement for Datamodel {
    type Owner = ModelRoot;

    fn header(&self) -> &ElementHeader<ModelRoot> {
        &self.header
    }
}

impl Named for Datamodel {
    fn name(&self) -> &str {
        Datamodel::name(self)
    }
}

impl std::ops::Index<SchemaId> for Datamodel {
    type Output = Schema;

    fn index(&self, id: SchemaId) -> &Schema {
        &self.schemas[id]
    }
}

impl std::ops::Index<TableId> for Datamodel {
    type Output = Table;

    fn index(&self, id: TableId) -> &Table {
        &self.tables[id]
    }
}

impl std::ops::Index<FieldId> for Datamodel {
    type Output = Field;

    fn index(&self, id: FieldId) -> &Field {
        &self.fields[id]
    }
}

impl std::ops::Index<IndexId> for Datamodel {
    type Output = Index;

    fn index(&self, id: IndexId) -> &Index {
        &self.indexes[id]
    }
}

/// A child may only be attached while detached or to its current owner
fn check_owner<O: Copy + Eq>(
    kind: ElementKind,
    name: &str,
    current: Option<O>,
    expected: O,
) -> Result<()> {
    match current {
        Some(owner) if owner != expected => Err(NosqlError::invalid_argument(format!(
            "{kind} '{name}' already belongs to another owner"
        ))),
        _ => Ok(()),
    }
}

fn stale(kind: ElementKind, id: impl Debug) -> NosqlError {
    NosqlError::no_such(kind, format!("{id:?}"))
}

#[cfg(test)]
mod tests;
