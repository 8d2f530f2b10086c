//! Parsing of JSON table descriptions
//!
//! Parsing is done in full before anything in the tree is touched, so a
//! malformed description never leaves a half-populated table behind.

use crate::model::FieldType;
use nosql_core::{NosqlError, Result, TableLimits, Ttl, TtlUnit};
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableSpec {
    pub name: String,
    pub primary_key: Vec<String>,
    /// `None` when the description has no `shardKey`, meaning the shard
    /// key is the whole primary key
    pub shard_key: Option<Vec<String>>,
    pub fields: Vec<FieldSpec>,
    pub indexes: Vec<IndexSpec>,
    pub ttl: Option<Ttl>,
    pub limits: Option<TableLimits>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub size_syntax: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndexSpec {
    pub name: String,
    pub fields: Vec<String>,
    /// Declared type per term, used for terms that are not table columns
    pub types: Vec<Option<FieldType>>,
}

impl TableSpec {
    pub(crate) fn parse(node: &Value) -> Result<Self> {
        let obj = as_object(node, "table")?;
        let name = required_str(obj, "name", "table", node)?.to_string();
        let ctx = format!("table '{name}'");

        let fields = required_array(obj, "fields", &ctx, node)?
            .iter()
            .enumerate()
            .map(|(i, f)| FieldSpec::parse(f, &format!("{ctx}: fields[{i}]")))
            .collect::<Result<Vec<_>>>()?;
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.to_lowercase()) {
                return Err(invalid(&ctx, format!("field '{}' is declared twice", field.name), node));
            }
        }

        let primary_key = optional_array(obj, "primaryKey", &ctx, node)?
            .map(|a| string_list(a, "primaryKey", &ctx, node))
            .transpose()?
            .unwrap_or_default();
        for pk in &primary_key {
            if !seen.contains(&pk.to_lowercase()) {
                return Err(invalid(&ctx, format!("primaryKey references undeclared field '{pk}'"), node));
            }
        }

        let shard_key = optional_array(obj, "shardKey", &ctx, node)?
            .map(|a| string_list(a, "shardKey", &ctx, node))
            .transpose()?;
        if let Some(shard_key) = &shard_key {
            for sk in shard_key {
                if !primary_key.iter().any(|pk| pk.eq_ignore_ascii_case(sk)) {
                    return Err(invalid(&ctx, format!("shardKey field '{sk}' is not part of the primary key"), node));
                }
            }
        }

        let indexes = optional_array(obj, "indexes", &ctx, node)?
            .map(|a| {
                a.iter()
                    .enumerate()
                    .map(|(i, n)| IndexSpec::parse(n, &format!("{ctx}: indexes[{i}]")))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();
        let mut index_names = HashSet::new();
        for index in &indexes {
            if !index_names.insert(index.name.to_lowercase()) {
                return Err(invalid(&ctx, format!("index '{}' is declared twice", index.name), node));
            }
        }

        let ttl = match obj.get("ttl") {
            None | Some(Value::Null) => None,
            Some(v) => Some(parse_ttl(v).ok_or_else(|| {
                invalid(&ctx, "property 'ttl' must be {\"value\": n, \"unit\": \"DAYS\"|\"HOURS\"} or \"n DAYS\"", node)
            })?),
        };

        let limits = match obj.get("limits") {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value::<TableLimits>(v.clone()).map_err(|e| {
                invalid(&ctx, format!("property 'limits' is malformed: {e}"), node)
            })?),
        };

        Ok(Self {
            name,
            primary_key,
            shard_key,
            fields,
            indexes,
            ttl,
            limits,
        })
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

impl FieldSpec {
    fn parse(node: &Value, ctx: &str) -> Result<Self> {
        let obj = as_object(node, ctx)?;
        let name = required_str(obj, "name", ctx, node)?.to_string();
        let type_name = required_str(obj, "type", ctx, node)?;
        let field_type = FieldType::from_name(type_name).ok_or_else(|| {
            invalid(ctx, format!("property 'type' has unknown value '{type_name}'"), node)
        })?;
        let nullable = match obj.get("nullable") {
            None | Some(Value::Null) => true,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(invalid(ctx, "property 'nullable' must be a boolean", node)),
        };
        let default_value = match obj.get("default") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
            Some(_) => return Err(invalid(ctx, "property 'default' must be a scalar", node)),
        };
        let size_syntax = match obj.get("size").or_else(|| obj.get("precision")) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(format!("({n})")),
            Some(Value::String(s)) if s.starts_with('(') => Some(s.clone()),
            Some(Value::String(s)) => Some(format!("({s})")),
            Some(_) => return Err(invalid(ctx, "property 'size' must be a number or a string", node)),
        };
        Ok(Self {
            name,
            field_type,
            nullable,
            default_value,
            size_syntax,
        })
    }
}

impl IndexSpec {
    fn parse(node: &Value, ctx: &str) -> Result<Self> {
        let obj = as_object(node, ctx)?;
        let name = required_str(obj, "name", ctx, node)?.to_string();
        let fields = string_list(required_array(obj, "fields", ctx, node)?, "fields", ctx, node)?;
        if fields.is_empty() {
            return Err(invalid(ctx, format!("index '{name}' has no fields"), node));
        }
        let types = match optional_array(obj, "types", ctx, node)? {
            None => Vec::new(),
            Some(types) => types
                .iter()
                .map(|t| match t {
                    Value::Null => Ok(None),
                    Value::String(s) => FieldType::from_name(s).map(Some).ok_or_else(|| {
                        invalid(ctx, format!("property 'types' has unknown value '{s}'"), node)
                    }),
                    _ => Err(invalid(ctx, "property 'types' must contain only strings", node)),
                })
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(Self {
            name,
            fields,
            types,
        })
    }

    pub(crate) fn declared_type(&self, position: usize) -> Option<FieldType> {
        self.types.get(position).copied().flatten()
    }
}

/// Parse a datamodel description into `(schema name, table nodes)` pairs
pub(crate) fn schema_nodes(node: &Value) -> Result<Vec<(String, Vec<&Value>)>> {
    let obj = as_object(node, "datamodel")?;
    let schemas = required_array(obj, "schemas", "datamodel", node)?;
    schemas
        .iter()
        .enumerate()
        .map(|(i, schema)| {
            let ctx = format!("schemas[{i}]");
            let sobj = as_object(schema, &ctx)?;
            let name = required_str(sobj, "name", &ctx, schema)?.to_string();
            let tables = optional_array(sobj, "tables", &ctx, schema)?
                .map(|t| t.iter().collect())
                .unwrap_or_default();
            Ok((name, tables))
        })
        .collect()
}

fn parse_ttl(value: &Value) -> Option<Ttl> {
    match value {
        Value::Object(obj) => {
            let amount = u32::try_from(obj.get("value")?.as_u64()?).ok()?;
            let unit = match obj.get("unit") {
                None => TtlUnit::Days,
                Some(u) => TtlUnit::from_name(u.as_str()?)?,
            };
            Some(Ttl { value: amount, unit })
        }
        Value::String(s) => {
            let mut parts = s.split_whitespace();
            let amount = parts.next()?.parse().ok()?;
            let unit = match parts.next() {
                None => TtlUnit::Days,
                Some(u) => TtlUnit::from_name(u)?,
            };
            Some(Ttl { value: amount, unit })
        }
        _ => None,
    }
}

fn as_object<'a>(node: &'a Value, ctx: &str) -> Result<&'a Map<String, Value>> {
    node.as_object()
        .ok_or_else(|| invalid(ctx, "expected a JSON object", node))
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    ctx: &str,
    node: &Value,
) -> Result<&'a str> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(invalid(ctx, format!("property '{key}' must not be empty"), node)),
        Some(_) => Err(invalid(ctx, format!("property '{key}' must be a string"), node)),
        None => Err(invalid(ctx, format!("property '{key}' is required"), node)),
    }
}

fn required_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    ctx: &str,
    node: &Value,
) -> Result<&'a Vec<Value>> {
    optional_array(obj, key, ctx, node)?
        .ok_or_else(|| invalid(ctx, format!("property '{key}' is required"), node))
}

fn optional_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    ctx: &str,
    node: &Value,
) -> Result<Option<&'a Vec<Value>>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(a)) => Ok(Some(a)),
        Some(_) => Err(invalid(ctx, format!("property '{key}' must be an array"), node)),
    }
}

fn string_list(values: &[Value], key: &str, ctx: &str, node: &Value) -> Result<Vec<String>> {
    values
        .iter()
        .map(|v| {
            match v.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
                Some(_) => Err(invalid(ctx, format!("property '{key}' must not contain empty names"), node)),
                None => Err(invalid(ctx, format!("property '{key}' must contain only strings"), node)),
            }
        })
        .collect()
}

fn invalid(ctx: &str, message: impl AsRef<str>, node: &Value) -> NosqlError {
    NosqlError::invalid_input(format!("{ctx}: {}", message.as_ref()), &node.to_string())
}
