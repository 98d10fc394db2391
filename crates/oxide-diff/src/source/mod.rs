//! Data sources the comparator reads from.
//!
//! A [`DataSource`] answers the introspection questions the metadata model
//! needs and streams rows in primary-key order. Connection set-up and
//! lifecycle belong to the implementation, not to the diff engine.

pub mod memory;
pub mod mysql;

pub use memory::{MemorySource, MemoryTable};
pub use mysql::MySqlSource;

use indexmap::IndexMap;

use crate::error::Result;
use crate::schema::{Column, KeyPart};
use crate::value::Value;

/// Column values of one row, in result-set column order.
pub type RowData = IndexMap<String, Value>;

/// A forward-only, finite sequence of rows.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<RowData>> + 'a>;

/// Introspection and row retrieval for one side of a comparison.
pub trait DataSource {
    /// Table names in the engine's native enumeration order.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of a table in declaration order.
    fn describe_columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Key parts of a table, ordered by index name then ordinal position.
    fn describe_keys(&self, table: &str) -> Result<Vec<KeyPart>>;

    /// Rows of a table, ascending by `order_by` under [`crate::value::compare`].
    ///
    /// String columns must be ordered bytewise, not by a server collation.
    fn query_rows(&self, table: &str, order_by: &[&Column]) -> Result<RowStream<'_>>;

    /// Runs arbitrary SQL and returns the affected row count.
    ///
    /// Only fixture set-up uses this; the comparator itself never writes.
    fn execute(&self, sql: &str) -> Result<u64>;
}
