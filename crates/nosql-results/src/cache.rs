//! Table page cache
//!
//! Pages are cut from the row stream on demand and kept. Moving forward
//! past the last materialized page pulls the next `page_size` rows; moving
//! back replays pages that already exist. Page numbers are 1-based and 0
//! means no page has been shown yet.

use crate::page::{TablePage, collection_row};
use crate::stream::RowIter;
use nosql_core::{ElementKind, NosqlError, Result, Row};
use nosql_schema::{Datamodel, TableId};
use std::iter::Peekable;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// What the cache needs to know about the table being browsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    pub name: String,
    /// Primary-key column names in key order
    pub primary_key: Vec<String>,
}

impl TableSnapshot {
    pub fn new(name: impl Into<String>, primary_key: Vec<String>) -> Self {
        Self {
            name: name.into(),
            primary_key,
        }
    }

    pub fn of(model: &Datamodel, table: TableId) -> Result<Self> {
        let t = model
            .get_table(table)
            .ok_or_else(|| NosqlError::no_such(ElementKind::Table, format!("{table:?}")))?;
        let primary_key = model.group_names(&model.primary_key(table)?);
        Ok(Self::new(t.name(), primary_key))
    }
}

pub struct TablePageCache {
    page_size: usize,
    pages: Vec<TablePage>,
    current_page_number: usize,
    rows: Option<Peekable<RowIter>>,
    /// Rows pulled by a page fetch that failed part way
    pending: Vec<Row>,
    table: TableSnapshot,
}

impl TablePageCache {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(NosqlError::invalid_argument("page size must be at least 1"));
        }
        Ok(Self {
            page_size,
            pages: Vec::new(),
            current_page_number: 0,
            rows: None,
            pending: Vec::new(),
            table: TableSnapshot::default(),
        })
    }

    /// Drop every page and start over on a new result
    pub fn set_result(&mut self, rows: RowIter, table: TableSnapshot) {
        debug!(table = %table.name, "binding new result");
        self.pages.clear();
        self.pending.clear();
        self.current_page_number = 0;
        self.rows = Some(rows.peekable());
        self.table = table;
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the size of pages materialized from now on
    ///
    /// Pages already cut keep their length.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(NosqlError::invalid_argument("page size must be at least 1"));
        }
        self.page_size = page_size;
        Ok(())
    }

    pub fn table(&self) -> &TableSnapshot {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    pub fn current_page_number(&self) -> usize {
        self.current_page_number
    }

    pub fn pages(&self) -> &[TablePage] {
        &self.pages
    }

    /// Whether `next_page` would move forward
    ///
    /// May fetch a batch from the store to find out whether the stream has
    /// more rows.
    pub fn has_next_page(&mut self) -> bool {
        if self.current_page_number < self.pages.len() || !self.pending.is_empty() {
            return true;
        }
        self.rows.as_mut().is_some_and(|rows| rows.peek().is_some())
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page_number > 1
    }

    /// Move to the next page, materializing it if needed
    ///
    /// With `collection_mode` set, newly fetched rows are reshaped with
    /// `collection_row`; pages that already exist keep their shape.
    /// Returns `Ok(false)` when there is nothing to move to. A failed fetch
    /// returns the error and leaves the current page where it was; the
    /// rows read before the failure are kept for the next attempt.
    pub fn next_page(&mut self, collection_mode: bool) -> Result<bool> {
        if self.current_page_number < self.pages.len() {
            self.current_page_number += 1;
            return Ok(true);
        }
        let Some(rows) = self.rows.as_mut() else {
            return Ok(false);
        };

        let mut batch = std::mem::take(&mut self.pending);
        while batch.len() < self.page_size {
            match rows.next() {
                Some(Ok(row)) => batch.push(row),
                Some(Err(e)) => {
                    self.pending = batch;
                    return Err(e);
                }
                None => break,
            }
        }
        if batch.is_empty() {
            return Ok(false);
        }

        if collection_mode {
            batch = batch
                .into_iter()
                .map(|row| collection_row(row, &self.table.primary_key))
                .collect();
        }
        let number = self.pages.len() + 1;
        debug!(table = %self.table.name, page = number, rows = batch.len(), "materialized page");
        self.pages.push(TablePage::new(number, batch));
        self.current_page_number = number;
        Ok(true)
    }

    /// Step back one page; never fetches
    pub fn prev_page(&mut self) -> bool {
        if self.has_prev_page() {
            self.current_page_number -= 1;
            true
        } else {
            false
        }
    }

    /// The page being shown
    pub fn current_page(&self) -> Result<&TablePage> {
        match self.current_page_number {
            0 => Err(NosqlError::NoCurrentPage),
            n => self.pages.get(n - 1).ok_or(NosqlError::NoCurrentPage),
        }
    }

    /// Column headers of the current page, taken from its first row
    pub fn column_names(&self) -> Result<Vec<String>> {
        Ok(self.current_page()?.column_names())
    }
}

impl std::fmt::Debug for TablePageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePageCache")
            .field("table", &self.table.name)
            .field("page_size", &self.page_size)
            .field("pages", &self.pages.len())
            .field("current_page_number", &self.current_page_number)
            .finish()
    }
}
