//! Shared fixtures for result paging tests

#![allow(dead_code)]

use nosql_core::{NosqlError, QueryHandle, Result, Row, RowSource};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Row source that serves `total` numbered rows in batches of `batch_size`
/// and can be told to fail a given batch
pub struct ScriptedSource {
    pub total: usize,
    pub batch_size: usize,
    pub fail_batch: Option<usize>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(total: usize, batch_size: usize) -> Self {
        Self {
            total,
            batch_size,
            fail_batch: None,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_at(mut self, batch: usize) -> Self {
        self.fail_batch = Some(batch);
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

impl RowSource for ScriptedSource {
    fn submit(&self, query: &str) -> Result<Box<dyn QueryHandle>> {
        self.log.lock().push(format!("submit {query}"));
        let rows: Vec<Row> = (1..=self.total)
            .map(|n| Row::new().with("id", n as i64).with("name", format!("row {n}")))
            .collect();
        let batches: VecDeque<Vec<Row>> = rows
            .chunks(self.batch_size)
            .map(<[Row]>::to_vec)
            .collect();
        Ok(Box::new(ScriptedHandle {
            batches,
            fetched: 0,
            fail_batch: self.fail_batch,
            log: self.log.clone(),
        }))
    }
}

struct ScriptedHandle {
    batches: VecDeque<Vec<Row>>,
    fetched: usize,
    fail_batch: Option<usize>,
    log: Arc<Mutex<Vec<String>>>,
}

impl QueryHandle for ScriptedHandle {
    fn is_final(&self) -> bool {
        self.batches.is_empty()
    }

    fn next_batch(&mut self) -> Result<Vec<Row>> {
        let batch = self.fetched;
        self.fetched += 1;
        self.log.lock().push(format!("batch {batch}"));
        if self.fail_batch == Some(batch) {
            self.fail_batch = None;
            return Err(NosqlError::backing_store(format!("batch {batch} timed out")));
        }
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}

pub fn ids(rows: &[nosql_results::TableRow]) -> Vec<i64> {
    rows.iter()
        .filter_map(|r| r.row().get("id").and_then(|v| v.as_i64()))
        .collect()
}
