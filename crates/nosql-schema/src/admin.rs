//! Table administration through a DDL sink
//!
//! Each operation validates against the model, sends its statement to the
//! store and only then applies the change to the model. A failed statement
//! leaves the model as it was.

use crate::builder::SchemaBuilder;
use crate::ddl::DdlGenerator;
use crate::element::{FieldId, IndexId, SchemaId, TableId};
use crate::model::Datamodel;
use nosql_core::{DdlSink, ElementKind, NosqlError, Result, TableLimits, Ttl};
use std::sync::Arc;
use tracing::info;

pub struct TableAdmin {
    sink: Arc<dyn DdlSink>,
}

impl TableAdmin {
    pub fn new(sink: Arc<dyn DdlSink>) -> Self {
        Self { sink }
    }

    fn execute(&self, statement: &str) -> Result<()> {
        self.sink.execute_ddl(statement)?;
        info!(%statement, "executed DDL");
        Ok(())
    }

    /// Create a detached table in the store and attach it to `schema`
    pub fn create_table(&self, model: &mut Datamodel, schema: SchemaId, table: TableId) -> Result<()> {
        let name = table_name(model, table)?;
        let s = model
            .get_schema(schema)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Schema, format!("{schema:?}")))?;
        if s.is_known(&name) {
            return Err(NosqlError::duplicate(ElementKind::Table, name));
        }
        let statement = DdlGenerator::create_table(model, table)?;
        self.execute(&statement)?;
        model.add_table(schema, table, false)?;
        model.mark_table_fetched(table);
        Ok(())
    }

    pub fn drop_table(&self, model: &mut Datamodel, schema: SchemaId, name: &str) -> Result<()> {
        let table = model.table_named(schema, name)?;
        let name = table_name(model, table)?;
        self.execute(&DdlGenerator::drop_table(&name))?;
        model.remove_table(schema, &name)
    }

    /// Add a detached field to `table` as a new column
    pub fn add_column(&self, model: &mut Datamodel, table: TableId, field: FieldId) -> Result<()> {
        let table_name = table_name(model, table)?;
        let f = model
            .get_field(field)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Field, format!("{field:?}")))?;
        if model[table].has_field(f.name()) {
            return Err(NosqlError::duplicate(ElementKind::Field, f.name()));
        }
        let statement = DdlGenerator::add_column_statement(&table_name, f);
        self.execute(&statement)?;
        model.add_field(table, field, false)?;
        model.field_mut(field)?.header.set_fetched(true);
        Ok(())
    }

    pub fn drop_column(&self, model: &mut Datamodel, table: TableId, column: &str) -> Result<()> {
        let table_name = table_name(model, table)?;
        let field = model.field_named(table, column)?;
        let f = &model[field];
        if f.is_primary_key() {
            return Err(NosqlError::invalid_argument(format!(
                "cannot drop primary key column '{}'",
                f.name()
            )));
        }
        let column = f.name().to_string();
        self.execute(&DdlGenerator::drop_column(&table_name, &column))?;
        model.remove_field(table, &column)
    }

    /// Create an index over existing columns of `table`
    pub fn create_index(
        &self,
        model: &mut Datamodel,
        table: TableId,
        name: &str,
        columns: &[&str],
    ) -> Result<IndexId> {
        let table_name = table_name(model, table)?;
        if columns.is_empty() {
            return Err(NosqlError::invalid_argument(format!("index '{name}' has no fields")));
        }
        if let Ok(existing) = model.index_named(table, name) {
            return Err(NosqlError::duplicate(ElementKind::Index, model[existing].name()));
        }
        let fields = columns
            .iter()
            .map(|c| model.field_named(table, c))
            .collect::<Result<Vec<_>>>()?;

        let statement = DdlGenerator::create_index_statement(&table_name, name, columns);
        self.execute(&statement)?;

        let index = SchemaBuilder::new_index(model, Some(table), name, false)?;
        for field in fields {
            model.add_index_field(index, field)?;
        }
        model.mark_table_fetched(table);
        Ok(index)
    }

    pub fn drop_index(&self, model: &mut Datamodel, table: TableId, name: &str) -> Result<()> {
        let table_name = table_name(model, table)?;
        let index = model.index_named(table, name)?;
        let name = model[index].name().to_string();
        self.execute(&DdlGenerator::drop_index(&table_name, &name))?;
        model.remove_index(table, &name)
    }

    pub fn set_ttl(&self, model: &mut Datamodel, table: TableId, ttl: Ttl) -> Result<()> {
        let table_name = table_name(model, table)?;
        self.execute(&DdlGenerator::alter_ttl(&table_name, ttl))?;
        model.table_mut(table)?.set_ttl(Some(ttl));
        Ok(())
    }

    pub fn set_limits(&self, model: &mut Datamodel, table: TableId, limits: TableLimits) -> Result<()> {
        let table_name = table_name(model, table)?;
        self.sink.set_table_limits(&table_name, &limits)?;
        info!(table = %table_name, ?limits, "updated table limits");
        model.table_mut(table)?.set_limits(limits);
        Ok(())
    }
}

fn table_name(model: &Datamodel, table: TableId) -> Result<String> {
    model
        .get_table(table)
        .map(|t| t.name().to_string())
        .ok_or_else(|| NosqlError::no_such(ElementKind::Table, format!("{table:?}")))
}

#[cfg(test)]
mod tests;
