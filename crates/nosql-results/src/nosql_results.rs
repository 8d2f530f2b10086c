//! NoSQL Results - paging over query results
//!
//! A query's batches are flattened into a single `RowStream`, which a
//! `TablePageCache` cuts into fixed-size pages. Pages are materialized
//! once, moving forward only, and can be revisited backwards without
//! touching the store again.

mod cache;
mod page;
mod stream;

pub use cache::{DEFAULT_PAGE_SIZE, TablePageCache, TableSnapshot};
pub use page::{ROW_DATA_KEY, TablePage, TableRow, collection_row};
pub use stream::{RowIter, RowStream, split_first};
