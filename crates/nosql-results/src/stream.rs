//! Row streams over batched query results

use nosql_core::{BoxIter, LazyChain, QueryHandle, Result, Row, RowSource, pushback};
use std::fmt;
use std::iter;
use tracing::{debug, warn};

/// Sendable stream of rows, each possibly a backing-store failure
pub type RowIter = BoxIter<'static, Result<Row>>;

type BatchFetch = Box<dyn FnMut(usize) -> Option<RowIter> + Send>;

/// The rows of a query, fetched one batch per round-trip as they are
/// consumed
///
/// The stream ends after the batch the handle reports as final. A failed
/// fetch is yielded as an `Err`; the handle is kept, so pulling again
/// retries the batch.
pub struct RowStream {
    chain: LazyChain<BatchFetch, RowIter>,
}

impl RowStream {
    pub fn from_handle(handle: Box<dyn QueryHandle>) -> Self {
        let mut handle = Some(handle);
        let fetch: BatchFetch = Box::new(move |batch| {
            let h = handle.as_mut()?;
            match h.next_batch() {
                Ok(rows) => {
                    let last = h.is_final();
                    debug!(batch, rows = rows.len(), last, "fetched result batch");
                    if last {
                        handle = None;
                    }
                    Some(Box::new(rows.into_iter().map(Ok)) as RowIter)
                }
                Err(e) => {
                    warn!(batch, error = %e, "result batch fetch failed");
                    Some(Box::new(iter::once(Err(e))) as RowIter)
                }
            }
        });
        Self {
            chain: LazyChain::new(fetch),
        }
    }

    /// Submit `query` and stream its rows
    pub fn submit(source: &dyn RowSource, query: &str) -> Result<Self> {
        debug!(%query, "submitting query");
        Ok(Self::from_handle(source.submit(query)?))
    }

    /// A stream over rows that are already in memory, as one batch
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut rows = Some(rows);
        let fetch: BatchFetch = Box::new(move |_| {
            rows.take()
                .map(|rows| Box::new(rows.into_iter().map(Ok)) as RowIter)
        });
        Self {
            chain: LazyChain::new(fetch),
        }
    }

    /// Number of batches requested from the store so far
    pub fn batches_requested(&self) -> usize {
        self.chain.requested()
    }

    pub fn into_boxed(self) -> RowIter {
        Box::new(self)
    }
}

impl Iterator for RowStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chain.next()
    }
}

impl fmt::Debug for RowStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("chain", &self.chain)
            .finish()
    }
}

/// Pull the first item of `rows` to see whether there is anything at all
///
/// Returns `Ok(None)` for an empty stream, the error if the first fetch
/// failed, and otherwise a stream that still yields every row, the first
/// one included.
pub fn split_first(mut rows: RowIter) -> Result<Option<RowIter>> {
    match rows.next() {
        None => Ok(None),
        Some(Err(e)) => Err(e),
        Some(Ok(first)) => Ok(Some(Box::new(pushback(Ok(first), rows)) as RowIter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosql_core::NosqlError;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    struct Batches {
        batches: VecDeque<Result<Vec<Row>>>,
        last: bool,
    }

    impl QueryHandle for Batches {
        fn is_final(&self) -> bool {
            self.last
        }

        fn next_batch(&mut self) -> Result<Vec<Row>> {
            let batch = self.batches.pop_front().unwrap_or_else(|| Ok(Vec::new()));
            self.last = self.batches.is_empty();
            batch
        }
    }

    fn row(n: i64) -> Row {
        Row::new().with("n", n)
    }

    fn handle(batches: Vec<Result<Vec<Row>>>) -> Box<dyn QueryHandle> {
        Box::new(Batches {
            batches: batches.into(),
            last: false,
        })
    }

    fn numbers(stream: impl Iterator<Item = Result<Row>>) -> Vec<i64> {
        stream
            .map(|r| r.unwrap().get("n").and_then(|v| v.as_i64()).unwrap())
            .collect()
    }

    #[test]
    fn test_batches_are_flattened_in_order() {
        let stream = RowStream::from_handle(handle(vec![
            Ok(vec![row(1), row(2)]),
            Ok(vec![]),
            Ok(vec![row(3)]),
        ]));
        assert_eq!(numbers(stream), vec![1, 2, 3]);
    }

    #[test]
    fn test_batches_are_fetched_lazily() {
        let mut stream = RowStream::from_handle(handle(vec![
            Ok(vec![row(1), row(2)]),
            Ok(vec![row(3)]),
        ]));
        assert_eq!(stream.batches_requested(), 0);
        stream.next();
        stream.next();
        assert_eq!(stream.batches_requested(), 1);
        stream.next();
        assert_eq!(stream.batches_requested(), 2);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_failed_batch_does_not_end_the_stream() {
        let mut stream = RowStream::from_handle(handle(vec![
            Ok(vec![row(1)]),
            Err(NosqlError::backing_store("timeout")),
            Ok(vec![row(2)]),
        ]));
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(stream.next(), Some(Err(NosqlError::BackingStore(_)))));
        assert_eq!(numbers(stream), vec![2]);
    }

    #[test]
    fn test_split_first_keeps_every_row() {
        let rows = RowStream::from_rows(vec![row(1), row(2)]).into_boxed();
        let rows = split_first(rows).unwrap().unwrap();
        assert_eq!(numbers(rows), vec![1, 2]);
    }

    #[test]
    fn test_split_first_of_empty_stream() {
        let rows = RowStream::from_rows(Vec::new()).into_boxed();
        assert!(split_first(rows).unwrap().is_none());
    }
}
