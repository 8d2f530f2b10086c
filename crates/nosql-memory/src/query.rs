//! Query handling for the in-memory store
//!
//! Only full-table scans are understood:
//! `SELECT * FROM <table> [LIMIT <n>]`, with an optional trailing `;`.

use crate::store::Failures;
use crate::Operation;
use nosql_core::{NosqlError, QueryHandle, Result, Row};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scan {
    pub table: String,
    pub limit: Option<usize>,
}

pub(crate) fn parse_scan(query: &str) -> Result<Scan> {
    let words: Vec<&str> = query.trim().trim_end_matches(';').split_whitespace().collect();
    let unsupported = || NosqlError::backing_store(format!("unsupported query: {query}"));
    match words.as_slice() {
        [select, star, from, table] if is_scan(select, star, from) => Ok(Scan {
            table: table.to_string(),
            limit: None,
        }),
        [select, star, from, table, limit, n]
            if is_scan(select, star, from) && limit.eq_ignore_ascii_case("LIMIT") =>
        {
            let n = n.parse().map_err(|_| unsupported())?;
            Ok(Scan {
                table: table.to_string(),
                limit: Some(n),
            })
        }
        _ => Err(unsupported()),
    }
}

fn is_scan(select: &str, star: &str, from: &str) -> bool {
    select.eq_ignore_ascii_case("SELECT") && star == "*" && from.eq_ignore_ascii_case("FROM")
}

/// Serves a snapshot of a table's rows in fixed-size batches
pub(crate) struct MemoryHandle {
    rows: VecDeque<Row>,
    batch_size: usize,
    last: bool,
    failures: Arc<Failures>,
}

impl MemoryHandle {
    pub(crate) fn new(rows: Vec<Row>, batch_size: usize, failures: Arc<Failures>) -> Self {
        Self {
            rows: rows.into(),
            batch_size: batch_size.max(1),
            last: false,
            failures,
        }
    }
}

impl QueryHandle for MemoryHandle {
    fn is_final(&self) -> bool {
        self.last
    }

    fn next_batch(&mut self) -> Result<Vec<Row>> {
        self.failures.check(Operation::Fetch)?;
        let take = self.batch_size.min(self.rows.len());
        let batch: Vec<Row> = self.rows.drain(..take).collect();
        self.last = self.rows.is_empty();
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        assert_eq!(
            parse_scan("select * from Users;").unwrap(),
            Scan {
                table: "Users".into(),
                limit: None
            }
        );
        assert_eq!(
            parse_scan("SELECT * FROM t LIMIT 5").unwrap().limit,
            Some(5)
        );
    }

    #[test]
    fn test_other_queries_are_rejected() {
        for query in ["SELECT a FROM t", "DELETE FROM t", "SELECT * FROM t LIMIT x", ""] {
            assert!(matches!(parse_scan(query), Err(NosqlError::BackingStore(_))));
        }
    }

    #[test]
    fn test_handle_batches() {
        let rows = (0..5).map(|n| Row::new().with("n", n)).collect();
        let mut handle = MemoryHandle::new(rows, 2, Arc::new(Failures::default()));
        let sizes: Vec<usize> = (0..3).map(|_| handle.next_batch().unwrap().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(handle.is_final());
    }

    #[test]
    fn test_empty_scan_is_one_final_batch() {
        let mut handle = MemoryHandle::new(Vec::new(), 10, Arc::new(Failures::default()));
        assert!(handle.next_batch().unwrap().is_empty());
        assert!(handle.is_final());
    }
}
