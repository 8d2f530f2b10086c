//! DDL statement generation
//!
//! Statements follow the NoSQL table DDL: `CREATE TABLE ... PRIMARY KEY
//! (SHARD(..), ..) USING TTL n DAYS`, `ALTER TABLE t (ADD ..)`, and
//! `CREATE INDEX .. ON t (..)`. Identifiers are emitted as-is.

use crate::element::{FieldId, IndexId, SchemaElement, TableId};
use crate::model::{Datamodel, Field};
use nosql_core::{ElementKind, NosqlError, Result, Ttl};

/// Generates DDL text for elements of a datamodel
pub struct DdlGenerator;

impl DdlGenerator {
    /// `CREATE TABLE IF NOT EXISTS` for a table and all its columns
    ///
    /// The shard key is spelled out with `SHARD(..)` only when it is a
    /// proper subset of the primary key.
    pub fn create_table(model: &Datamodel, table: TableId) -> Result<String> {
        let t = model
            .get_table(table)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Table, format!("{table:?}")))?;
        let primary_key = model.group_names(&model.primary_key(table)?);
        if primary_key.is_empty() {
            return Err(NosqlError::invalid_argument(format!(
                "table '{}' has no primary key",
                t.name()
            )));
        }
        let shard_key = model.group_names(&model.shard_key(table)?);

        let mut parts: Vec<String> = model
            .table_fields(table)?
            .into_iter()
            .map(Self::column_definition)
            .collect();
        parts.push(Self::primary_key_clause(&primary_key, &shard_key));

        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} ({})", t.name(), parts.join(", "));
        if let Some(ttl) = t.ttl() {
            sql.push_str(&format!(" USING TTL {ttl}"));
        }
        Ok(sql)
    }

    fn primary_key_clause(primary_key: &[String], shard_key: &[String]) -> String {
        if shard_key.is_empty() || shard_key.len() >= primary_key.len() {
            return format!("PRIMARY KEY({})", primary_key.join(", "));
        }
        let rest: Vec<&str> = primary_key
            .iter()
            .filter(|pk| !shard_key.iter().any(|sk| sk.eq_ignore_ascii_case(pk)))
            .map(String::as_str)
            .collect();
        if rest.is_empty() {
            format!("PRIMARY KEY(SHARD({}))", shard_key.join(", "))
        } else {
            format!("PRIMARY KEY(SHARD({}), {})", shard_key.join(", "), rest.join(", "))
        }
    }

    pub fn drop_table(table: &str) -> String {
        format!("DROP TABLE IF EXISTS {table}")
    }

    /// `ALTER TABLE .. (ADD ..)` for a column of its owning table
    pub fn add_column(model: &Datamodel, field: FieldId) -> Result<String> {
        let f = model
            .get_field(field)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Field, format!("{field:?}")))?;
        let table = f
            .owner()
            .and_then(|t| model.get_table(t))
            .ok_or_else(|| {
                NosqlError::invalid_argument(format!("field '{}' does not belong to a table", f.name()))
            })?;
        Ok(Self::add_column_statement(table.name(), f))
    }

    pub fn add_column_statement(table: &str, field: &Field) -> String {
        format!("ALTER TABLE {table} (ADD {})", Self::column_definition(field))
    }

    pub fn drop_column(table: &str, column: &str) -> String {
        format!("ALTER TABLE {table} (DROP {column})")
    }

    pub fn alter_ttl(table: &str, ttl: Ttl) -> String {
        format!("ALTER TABLE {table} USING TTL {ttl}")
    }

    /// `CREATE INDEX IF NOT EXISTS` for an attached index
    pub fn create_index(model: &Datamodel, index: IndexId) -> Result<String> {
        let i = model
            .get_index(index)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Index, format!("{index:?}")))?;
        let table = i
            .owner()
            .and_then(|t| model.get_table(t))
            .ok_or_else(|| {
                NosqlError::invalid_argument(format!("index '{}' does not belong to a table", i.name()))
            })?;
        if i.fields().is_empty() {
            return Err(NosqlError::invalid_argument(format!(
                "index '{}' has no fields",
                i.name()
            )));
        }
        let fields = model.group_names(i.fields());
        Ok(Self::create_index_statement(table.name(), i.name(), &fields))
    }

    pub fn create_index_statement(table: &str, index: &str, fields: &[impl AsRef<str>]) -> String {
        let fields: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {table} ({})",
            fields.join(", ")
        )
    }

    pub fn drop_index(table: &str, index: &str) -> String {
        format!("DROP INDEX IF EXISTS {index} ON {table}")
    }

    /// Column definition as used in `CREATE TABLE` and `ADD`
    pub fn column_definition(field: &Field) -> String {
        let mut sql = format!("{} {}", field.name(), field.type_syntax());
        if !field.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = field.default_value() {
            sql.push_str(" DEFAULT ");
            if field.field_type().quotes_default() {
                sql.push('"');
                sql.push_str(&default.replace('\\', "\\\\").replace('"', "\\\""));
                sql.push('"');
            } else {
                sql.push_str(default);
            }
        }
        sql
    }
}
