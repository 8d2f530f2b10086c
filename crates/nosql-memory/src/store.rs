//! The in-memory store
//!
//! Tables live in a case-insensitive map of JSON descriptions plus their
//! rows. The store serves all three collaborator contracts, so a schema
//! tree, a page cache and a table admin service can all run against it
//! without a server.

use crate::ddl::{self, Statement};
use crate::query::{MemoryHandle, parse_scan};
use indexmap::IndexMap;
use nosql_core::{
    DEFAULT_NAMESPACE, DdlSink, MetadataSource, NosqlError, QueryHandle, Result, Row, RowSource,
    TableLimits,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use unicase::UniCase;

/// Rows per batch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// A store call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTables,
    DescribeTable,
    Submit,
    Fetch,
    ExecuteDdl,
    SetLimits,
}

/// Queued failures per operation, consumed one per call
#[derive(Debug, Default)]
pub(crate) struct Failures {
    pending: Mutex<HashMap<Operation, VecDeque<String>>>,
}

impl Failures {
    fn inject(&self, operation: Operation, message: String) {
        self.pending
            .lock()
            .entry(operation)
            .or_default()
            .push_back(message);
    }

    pub(crate) fn check(&self, operation: Operation) -> Result<()> {
        match self
            .pending
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(message) => {
                debug!(?operation, %message, "injected failure");
                Err(NosqlError::backing_store(message))
            }
            None => Ok(()),
        }
    }
}

/// Serialized form of a store's contents
///
/// `tables` holds table description nodes as `SchemaBuilder` parses them;
/// `rows` maps table names to their rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFixture {
    pub namespace: Option<String>,
    pub tables: Vec<Value>,
    pub rows: IndexMap<String, Vec<Row>>,
}

#[derive(Debug)]
struct TableState {
    description: Value,
    rows: Vec<Row>,
}

pub struct MemoryStore {
    namespace: String,
    tables: RwLock<IndexMap<UniCase<String>, TableState>>,
    batch_size: usize,
    failures: Arc<Failures>,
    statements: Mutex<Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            tables: RwLock::new(IndexMap::new()),
            batch_size: DEFAULT_BATCH_SIZE,
            failures: Arc::new(Failures::default()),
            statements: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn from_fixture(fixture: StoreFixture) -> Result<Self> {
        let store = Self::new(
            fixture
                .namespace
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        );
        for table in fixture.tables {
            store.add_table(table)?;
        }
        for (table, rows) in fixture.rows {
            store.insert_rows(&table, rows).map_err(|_| {
                NosqlError::invalid_input(format!("rows given for unknown table '{table}'"), &table)
            })?;
        }
        Ok(store)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let fixture: StoreFixture = serde_json::from_str(text).map_err(|e| {
            NosqlError::invalid_input(format!("store fixture is not valid: {e}"), text)
        })?;
        Self::from_fixture(fixture)
    }

    /// Load a fixture file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let store = Self::from_json(&text)?;
        info!(path = %path.display(), tables = store.table_count(), "loaded store fixture");
        Ok(store)
    }

    /// Serve query results in batches of `batch_size` rows (at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Add a table from its description node
    pub fn add_table(&self, description: Value) -> Result<()> {
        let name = description
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| {
                NosqlError::invalid_input("table description needs a name", &description.to_string())
            })?
            .to_string();
        let mut tables = self.tables.write();
        let key = UniCase::new(name.clone());
        if tables.contains_key(&key) {
            return Err(NosqlError::invalid_input(
                format!("table '{name}' is described twice"),
                &description.to_string(),
            ));
        }
        tables.insert(
            key,
            TableState {
                description,
                rows: Vec::new(),
            },
        );
        debug!(table = %name, "added table");
        Ok(())
    }

    pub fn insert_rows(&self, table: &str, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        let mut tables = self.tables.write();
        let state = state_mut(&mut tables, table)?;
        state.rows.extend(rows);
        Ok(())
    }

    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables
            .read()
            .get(&UniCase::new(table.to_string()))
            .map(|s| s.rows.len())
    }

    /// Limits last set for `table`, if any
    pub fn table_limits(&self, table: &str) -> Option<TableLimits> {
        let tables = self.tables.read();
        let limits = tables
            .get(&UniCase::new(table.to_string()))?
            .description
            .get("limits")?;
        serde_json::from_value(limits.clone()).ok()
    }

    /// Make the next call of `operation` fail with `message`
    ///
    /// Failures queue up; each call consumes one.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.failures.inject(operation, message.into());
    }

    /// DDL statements and limit updates applied so far, in order
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    /// Queries submitted so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Current contents as a fixture
    pub fn snapshot(&self) -> StoreFixture {
        let tables = self.tables.read();
        StoreFixture {
            namespace: Some(self.namespace.clone()),
            tables: tables.values().map(|s| s.description.clone()).collect(),
            rows: tables
                .iter()
                .filter(|(_, s)| !s.rows.is_empty())
                .map(|(name, s)| (name.to_string(), s.rows.clone()))
                .collect(),
        }
    }

    fn apply(&self, statement: Statement) -> Result<()> {
        let mut tables = self.tables.write();
        match statement {
            Statement::CreateTable {
                if_not_exists,
                table,
            } => {
                let name = table["name"].as_str().unwrap_or_default().to_string();
                let key = UniCase::new(name.clone());
                if tables.contains_key(&key) {
                    return if if_not_exists {
                        Ok(())
                    } else {
                        Err(NosqlError::backing_store(format!("table already exists: {name}")))
                    };
                }
                tables.insert(
                    key,
                    TableState {
                        description: table,
                        rows: Vec::new(),
                    },
                );
            }
            Statement::DropTable { if_exists, name } => {
                let removed = tables.shift_remove(&UniCase::new(name.clone()));
                if removed.is_none() && !if_exists {
                    return Err(NosqlError::backing_store(format!("table not found: {name}")));
                }
            }
            Statement::AddColumn { table, field } => {
                let state = state_mut(&mut tables, &table)?;
                let column = field["name"].as_str().unwrap_or_default().to_string();
                let fields = array_mut(&mut state.description, "fields")?;
                if fields.iter().any(|f| is_named(f, &column)) {
                    return Err(NosqlError::backing_store(format!(
                        "column already exists: {table}.{column}"
                    )));
                }
                fields.push(field);
            }
            Statement::DropColumn { table, column } => {
                let state = state_mut(&mut tables, &table)?;
                if names_in(&state.description["primaryKey"]).any(|pk| pk.eq_ignore_ascii_case(&column)) {
                    return Err(NosqlError::backing_store(format!(
                        "cannot drop primary key column: {table}.{column}"
                    )));
                }
                let indexed = array_mut(&mut state.description, "indexes")?
                    .iter()
                    .any(|index| names_in(&index["fields"]).any(|f| f.eq_ignore_ascii_case(&column)));
                if indexed {
                    return Err(NosqlError::backing_store(format!(
                        "column is indexed: {table}.{column}"
                    )));
                }
                let fields = array_mut(&mut state.description, "fields")?;
                let before = fields.len();
                fields.retain(|f| !is_named(f, &column));
                if fields.len() == before {
                    return Err(NosqlError::backing_store(format!(
                        "column not found: {table}.{column}"
                    )));
                }
                for row in &mut state.rows {
                    let present = row.column_names().into_iter().find(|c| c.eq_ignore_ascii_case(&column));
                    if let Some(present) = present {
                        row.remove(&present);
                    }
                }
            }
            Statement::AlterTtl { table, ttl } => {
                let state = state_mut(&mut tables, &table)?;
                state.description["ttl"] = ttl;
            }
            Statement::CreateIndex {
                if_not_exists,
                table,
                index,
            } => {
                let state = state_mut(&mut tables, &table)?;
                let name = index["name"].as_str().unwrap_or_default().to_string();
                let indexes = array_mut(&mut state.description, "indexes")?;
                if indexes.iter().any(|i| is_named(i, &name)) {
                    return if if_not_exists {
                        Ok(())
                    } else {
                        Err(NosqlError::backing_store(format!("index already exists: {name}")))
                    };
                }
                indexes.push(index);
            }
            Statement::DropIndex {
                if_exists,
                table,
                name,
            } => {
                let state = state_mut(&mut tables, &table)?;
                let indexes = array_mut(&mut state.description, "indexes")?;
                let before = indexes.len();
                indexes.retain(|i| !is_named(i, &name));
                if indexes.len() == before && !if_exists {
                    return Err(NosqlError::backing_store(format!("index not found: {name}")));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("namespace", &self.namespace)
            .field("tables", &self.table_count())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl MetadataSource for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        self.failures.check(Operation::ListTables)?;
        Ok(self
            .tables
            .read()
            .values()
            .filter_map(|s| s.description["name"].as_str().map(str::to_string))
            .collect())
    }

    fn describe_table(&self, name: &str) -> Result<Value> {
        self.failures.check(Operation::DescribeTable)?;
        let tables = self.tables.read();
        tables
            .get(&UniCase::new(name.to_string()))
            .map(|s| s.description.clone())
            .ok_or_else(|| NosqlError::backing_store(format!("table not found: {name}")))
    }
}

impl RowSource for MemoryStore {
    fn submit(&self, query: &str) -> Result<Box<dyn QueryHandle>> {
        self.failures.check(Operation::Submit)?;
        self.queries.lock().push(query.to_string());
        let scan = parse_scan(query)?;
        let tables = self.tables.read();
        let state = tables
            .get(&UniCase::new(scan.table.clone()))
            .ok_or_else(|| NosqlError::backing_store(format!("table not found: {}", scan.table)))?;
        let rows: Vec<Row> = match scan.limit {
            Some(limit) => state.rows.iter().take(limit).cloned().collect(),
            None => state.rows.clone(),
        };
        debug!(table = %scan.table, rows = rows.len(), batch_size = self.batch_size, "scanning table");
        Ok(Box::new(MemoryHandle::new(
            rows,
            self.batch_size,
            self.failures.clone(),
        )))
    }
}

impl DdlSink for MemoryStore {
    fn execute_ddl(&self, statement: &str) -> Result<()> {
        self.failures.check(Operation::ExecuteDdl)?;
        let parsed = ddl::parse(statement)?;
        let table = parsed.table_name().to_string();
        self.apply(parsed)?;
        self.statements.lock().push(statement.to_string());
        info!(%table, %statement, "applied DDL");
        Ok(())
    }

    fn set_table_limits(&self, table: &str, limits: &TableLimits) -> Result<()> {
        self.failures.check(Operation::SetLimits)?;
        let value = serde_json::to_value(limits)?;
        {
            let mut tables = self.tables.write();
            let state = state_mut(&mut tables, table)?;
            state.description["limits"] = value;
        }
        self.statements.lock().push(format!(
            "LIMITS {table} READ {} WRITE {} STORAGE {}",
            limits.read_units, limits.write_units, limits.storage_gb
        ));
        info!(%table, ?limits, "applied table limits");
        Ok(())
    }
}

fn state_mut<'a>(
    tables: &'a mut IndexMap<UniCase<String>, TableState>,
    table: &str,
) -> Result<&'a mut TableState> {
    tables
        .get_mut(&UniCase::new(table.to_string()))
        .ok_or_else(|| NosqlError::backing_store(format!("table not found: {table}")))
}

fn array_mut<'a>(description: &'a mut Value, key: &str) -> Result<&'a mut Vec<Value>> {
    description
        .as_object_mut()
        .ok_or_else(|| NosqlError::backing_store("table description is not an object"))?
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| NosqlError::backing_store(format!("table property '{key}' is not an array")))
}

fn is_named(node: &Value, name: &str) -> bool {
    node["name"]
        .as_str()
        .is_some_and(|n| n.eq_ignore_ascii_case(name))
}

fn names_in(list: &Value) -> impl Iterator<Item = &str> {
    list.as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}
