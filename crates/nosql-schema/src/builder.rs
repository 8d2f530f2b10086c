//! Construction and refresh of schema trees
//!
//! `SchemaBuilder` creates empty elements, builds whole datamodels from a
//! JSON description or a live metadata source, and re-reads tables from
//! that source on demand.

mod description;

use crate::element::{FieldId, IndexId, SchemaElement, SchemaId, TableId};
use crate::model::{Datamodel, FieldType};
use description::{TableSpec, schema_nodes};
use nosql_core::{ElementKind, MetadataSource, NosqlError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a datamodel is built from
pub enum BuildInput<'a> {
    /// An already parsed description, populated eagerly
    Description(&'a Value),
    /// Description text, parsed and populated eagerly
    Json(&'a str),
    /// A live metadata source; tables are known by name and loaded lazily
    Live(Arc<dyn MetadataSource>),
}

impl std::fmt::Debug for BuildInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildInput::Description(_) => f.write_str("Description"),
            BuildInput::Json(_) => f.write_str("Json"),
            BuildInput::Live(source) => write!(f, "Live({})", source.namespace()),
        }
    }
}

pub struct SchemaBuilder;

impl SchemaBuilder {
    // ========== Factories ==========

    pub fn new_datamodel(name: &str) -> Result<Datamodel> {
        Datamodel::new(name)
    }

    /// Create a schema and attach it to `model`
    pub fn new_schema(model: &mut Datamodel, name: &str, overwrite: bool) -> Result<SchemaId> {
        let schema = model.create_schema(name)?;
        if let Err(e) = model.add_schema(schema, overwrite) {
            model.discard_detached_schema(schema);
            return Err(e);
        }
        Ok(schema)
    }

    /// Create a table, attached to `schema` when one is given
    pub fn new_table(
        model: &mut Datamodel,
        schema: Option<SchemaId>,
        name: &str,
        overwrite: bool,
    ) -> Result<TableId> {
        let table = model.create_table(name)?;
        if let Some(schema) = schema {
            if let Err(e) = model.add_table(schema, table, overwrite) {
                model.discard_detached_table(table);
                return Err(e);
            }
        }
        Ok(table)
    }

    /// Create a field, attached to `table` as its last column when given
    pub fn new_field(
        model: &mut Datamodel,
        table: Option<TableId>,
        name: &str,
        overwrite: bool,
    ) -> Result<FieldId> {
        let field = model.create_field(name)?;
        if let Some(table) = table {
            if let Err(e) = model.add_field(table, field, overwrite) {
                model.discard_detached_field(field);
                return Err(e);
            }
        }
        Ok(field)
    }

    pub fn new_index(
        model: &mut Datamodel,
        table: Option<TableId>,
        name: &str,
        overwrite: bool,
    ) -> Result<IndexId> {
        let index = model.create_index(name)?;
        if let Some(table) = table {
            if let Err(e) = model.add_index(table, index, overwrite) {
                model.discard_detached_index(index);
                return Err(e);
            }
        }
        Ok(index)
    }

    // ========== Build ==========

    /// Build a datamodel named `model_name`
    ///
    /// Descriptions are parsed in one pass and every element comes back
    /// fetched. A live source produces a single schema named after the
    /// source's namespace whose tables are known by name only; they are
    /// loaded by `Datamodel::load_table` or one of the refresh calls.
    ///
    /// Failure is atomic: on error no datamodel is returned.
    #[instrument(skip(input), fields(input = ?input))]
    pub fn build(model_name: &str, input: BuildInput<'_>) -> Result<Datamodel> {
        match input {
            BuildInput::Description(value) => Self::build_from_description(model_name, value),
            BuildInput::Json(text) => {
                let value: Value = serde_json::from_str(text).map_err(|e| {
                    NosqlError::invalid_input(format!("description is not valid JSON: {e}"), text)
                })?;
                Self::build_from_description(model_name, &value)
            }
            BuildInput::Live(source) => Self::build_live(model_name, source),
        }
    }

    fn build_from_description(model_name: &str, value: &Value) -> Result<Datamodel> {
        let mut model = Datamodel::new(model_name)?;
        Self::populate_model(&mut model, value).map_err(|e| {
            wrap_parse_error(&format!("cannot build datamodel '{model_name}'"), e, value)
        })?;
        model.set_fetched(true);
        info!(
            model = %model_name,
            schemas = model.schema_count(),
            "built datamodel from description"
        );
        Ok(model)
    }

    fn populate_model(model: &mut Datamodel, value: &Value) -> Result<()> {
        for (schema_name, table_nodes) in schema_nodes(value)? {
            let specs = table_nodes
                .into_iter()
                .map(TableSpec::parse)
                .collect::<Result<Vec<_>>>()?;
            let schema = Self::new_schema(model, &schema_name, false)?;
            for spec in &specs {
                let table = Self::new_table(model, Some(schema), &spec.name, false)?;
                Self::apply_table(model, table, spec)?;
                model.mark_table_fetched(table);
            }
            model.mark_schema_fetched(schema);
        }
        Ok(())
    }

    fn build_live(model_name: &str, source: Arc<dyn MetadataSource>) -> Result<Datamodel> {
        let mut model = Datamodel::new(model_name)?;
        let schema = Self::new_schema(&mut model, source.namespace(), false)?;
        model.schema_mut(schema)?.set_source(Some(source));
        Self::refresh_schema(&mut model, schema)?;
        model.set_fetched(true);
        info!(
            model = %model_name,
            schema = %model[schema].name(),
            tables = model[schema].table_count(),
            "built live datamodel"
        );
        Ok(model)
    }

    /// Replace the contents of `table` with a parsed table description
    ///
    /// The description is validated before the table is touched; on error
    /// the table keeps its previous contents.
    pub fn populate_table(model: &mut Datamodel, table: TableId, node: &Value) -> Result<()> {
        let name = model
            .get_table(table)
            .map(|t| t.name().to_string())
            .ok_or_else(|| NosqlError::no_such(ElementKind::Table, format!("{table:?}")))?;
        let context = format!("cannot load table '{name}'");
        let spec = TableSpec::parse(node).map_err(|e| wrap_parse_error(&context, e, node))?;

        // Apply to a throwaway table first so the live one is only cleared
        // once the description is known to fit.
        let mut scratch = Datamodel::new(&name)?;
        let scratch_table = Self::new_table(&mut scratch, None, &name, false)?;
        Self::apply_table(&mut scratch, scratch_table, &spec)
            .map_err(|e| wrap_parse_error(&context, e, node))?;

        model.remove_all_children(table)?;
        Self::apply_table(model, table, &spec)?;
        model.mark_table_fetched(table);
        Ok(())
    }

    fn apply_table(model: &mut Datamodel, table: TableId, spec: &TableSpec) -> Result<()> {
        for pk in &spec.primary_key {
            let field = Self::ensure_field(model, table, pk)?;
            let field = model.field_mut(field)?;
            field.set_primary_key(true);
            field.set_nullable(false);
        }

        for field_spec in &spec.fields {
            let id = Self::ensure_field(model, table, &field_spec.name)?;
            let field = model.field_mut(id)?;
            field.set_field_type(field_spec.field_type);
            field.set_nullable(field_spec.nullable && !field.is_primary_key());
            field.set_default_value(field_spec.default_value.clone());
            field.set_size_syntax(field_spec.size_syntax.clone());
        }

        let shard_key = spec.shard_key.as_ref().unwrap_or(&spec.primary_key);
        for sk in shard_key {
            let id = model.field_named(table, sk)?;
            model.field_mut(id)?.set_shard_key(true);
        }

        for index_spec in &spec.indexes {
            let index = Self::new_index(model, Some(table), &index_spec.name, false)?;
            for (position, term) in index_spec.fields.iter().enumerate() {
                let field = match model.field_named(table, term) {
                    Ok(id) => id,
                    Err(_) => {
                        let field_type = index_spec
                            .declared_type(position)
                            .or_else(|| root_column_type(model, table, term))
                            .unwrap_or(FieldType::Json);
                        let id = model.add_index_term(table, term)?;
                        model.field_mut(id)?.set_field_type(field_type);
                        id
                    }
                };
                model.add_index_field(index, field)?;
            }
        }

        let t = model.table_mut(table)?;
        t.set_ttl(spec.ttl);
        if let Some(limits) = spec.limits {
            t.set_limits(limits);
        }
        Ok(())
    }

    fn ensure_field(model: &mut Datamodel, table: TableId, name: &str) -> Result<FieldId> {
        match model.field_named(table, name) {
            Ok(id) => Ok(id),
            Err(_) => Self::new_field(model, Some(table), name, false),
        }
    }

    // ========== Refresh ==========

    /// Re-read the table list of a live schema
    ///
    /// Tables that appeared in the store are added unfetched; tables that
    /// vanished are dropped. Schemas without a source are only marked
    /// fetched.
    #[instrument(skip(model))]
    pub fn refresh_schema(model: &mut Datamodel, schema: SchemaId) -> Result<()> {
        let source = model
            .get_schema(schema)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Schema, format!("{schema:?}")))?
            .source()
            .cloned();
        let Some(source) = source else {
            model.mark_schema_fetched(schema);
            return Ok(());
        };
        let names = source.list_tables()?;

        for known in model[schema].table_names() {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&known)) {
                debug!(table = %known, "table no longer in store");
                model.remove_table(schema, &known)?;
            }
        }
        for name in &names {
            if !model[schema].is_known(name) {
                Self::new_table(model, Some(schema), name, false)?;
            }
        }
        model.mark_schema_fetched(schema);
        debug!(tables = names.len(), "refreshed schema");
        Ok(())
    }

    /// Re-describe a table from its schema's source and rebuild its
    /// fields and indexes
    ///
    /// A table whose schema has no source keeps its contents.
    #[instrument(skip(model))]
    pub fn refresh_table(model: &mut Datamodel, table: TableId) -> Result<()> {
        let Some((name, source)) = Self::table_source(model, table)? else {
            model.mark_table_fetched(table);
            return Ok(());
        };
        let node = source.describe_table(&name)?;
        Self::populate_table(model, table, &node)
    }

    /// Re-read one column's attributes from its table's description
    pub fn refresh_field(model: &mut Datamodel, field: FieldId) -> Result<()> {
        let f = model
            .get_field(field)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Field, format!("{field:?}")))?;
        let field_name = f.name().to_string();
        let Some(table) = f.owner() else {
            return Err(NosqlError::invalid_argument(format!(
                "field '{field_name}' does not belong to a table"
            )));
        };
        if f.is_index_term() {
            return Ok(());
        }
        let Some((table_name, source)) = Self::table_source(model, table)? else {
            return Ok(());
        };
        let node = source.describe_table(&table_name)?;
        let spec = TableSpec::parse(&node).map_err(|e| {
            wrap_parse_error(&format!("cannot load table '{table_name}'"), e, &node)
        })?;
        let field_spec = spec
            .field(&field_name)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Field, &field_name))?;
        let primary_key = spec
            .primary_key
            .iter()
            .any(|pk| pk.eq_ignore_ascii_case(&field_name));
        let shard_key = spec
            .shard_key
            .as_ref()
            .unwrap_or(&spec.primary_key)
            .iter()
            .any(|sk| sk.eq_ignore_ascii_case(&field_name));

        let f = model.field_mut(field)?;
        f.set_field_type(field_spec.field_type);
        f.set_primary_key(primary_key);
        f.set_shard_key(shard_key);
        f.set_nullable(field_spec.nullable && !primary_key);
        f.set_default_value(field_spec.default_value.clone());
        f.set_size_syntax(field_spec.size_syntax.clone());
        f.header.set_fetched(true);
        Ok(())
    }

    /// Refresh a schema and then every table it currently holds
    pub fn recursive_refresh(model: &mut Datamodel, schema: SchemaId) -> Result<()> {
        Self::refresh_schema(model, schema)?;
        for table in model[schema].table_ids() {
            Self::refresh_table(model, table)?;
        }
        Ok(())
    }

    /// Refresh every schema of a datamodel, recursively
    pub fn recursive_refresh_model(model: &mut Datamodel) -> Result<()> {
        for schema in model.schema_ids() {
            Self::recursive_refresh(model, schema)?;
        }
        model.set_fetched(true);
        Ok(())
    }

    fn table_source(
        model: &Datamodel,
        table: TableId,
    ) -> Result<Option<(String, Arc<dyn MetadataSource>)>> {
        let t = model
            .get_table(table)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Table, format!("{table:?}")))?;
        let Some(schema) = t.owner() else {
            return Err(NosqlError::invalid_argument(format!(
                "table '{}' does not belong to a schema",
                t.name()
            )));
        };
        Ok(model
            .get_schema(schema)
            .and_then(|s| s.source().cloned())
            .map(|source| (t.name().to_string(), source)))
    }
}

/// Type of the column an index path such as `address.city` starts from
fn root_column_type(model: &Datamodel, table: TableId, term: &str) -> Option<FieldType> {
    let root = term.split(['.', '[', '(']).next()?.trim();
    let id = model.field_named(table, root).ok()?;
    model.get_field(id).map(|f| f.field_type())
}

/// Fold any failure while reading a description into one `InvalidInput`
/// quoting the description
fn wrap_parse_error(context: &str, error: NosqlError, input: &Value) -> NosqlError {
    let message = match error {
        NosqlError::InvalidInput { message, .. } => message,
        other => other.to_string(),
    };
    NosqlError::invalid_input(format!("{context}: {message}"), &input.to_string())
}
