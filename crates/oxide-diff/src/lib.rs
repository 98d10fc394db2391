//! Schema and data diffing for MySQL databases.
//!
//! `oxide-diff` compares a source database with a target database and
//! produces the SQL statements that turn the source into the target:
//! - `ALTER TABLE`, `DROP TABLE` and `CREATE TABLE` for structural changes
//! - `INSERT`, `UPDATE` and `DELETE` for row changes, found with a
//!   primary-key ordered merge of both tables
//!
//! # Architecture
//!
//! - **Schema** - Tables, columns and keys read through a [`source::DataSource`]
//! - **Value ordering** - Total order over primary-key and cell values
//! - **Autodetector** - Diffs table definitions
//! - **Data diff** - Merge-joins row streams
//! - **Dialect** - Renders statements
//! - **Comparator** - Runs everything and yields statements lazily
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_diff::prelude::*;
//!
//! let config = CompareConfig::load("config.json")?;
//! let source = Database::load(MySqlSource::connect(&config.source)?)?;
//! let target = Database::load(MySqlSource::connect(&config.target)?)?;
//!
//! for statement in Comparator::new(&source, &target, MySqlDialect::new()).statements() {
//!     println!("{}", statement?);
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Compare the two databases of a config file
//! oxide-diff --config config.json
//!
//! # Compare two servers by URL, schema only
//! oxide-diff --source mysql://root@localhost/app_old --target mysql://root@localhost/app_new --schema-only
//! ```

pub mod autodetector;
pub mod compare;
pub mod config;
pub mod data_diff;
pub mod dialect;
pub mod error;
pub mod schema;
pub mod source;
pub mod sqltest;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::autodetector::{Autodetector, KeyModification, SchemaChange, TableDiff};
    pub use crate::compare::{Comparator, DiffOptions};
    pub use crate::config::{CompareConfig, DatabaseConfig};
    pub use crate::data_diff::{DataChange, DataDiff};
    pub use crate::dialect::{DiffDialect, MySqlDialect};
    pub use crate::error::{DiffError, Result};
    pub use crate::schema::{Column, Database, Key, KeyKind, KeyPart, Row, Table};
    pub use crate::source::{DataSource, MemorySource, MemoryTable, MySqlSource, RowData};
    pub use crate::sqltest::SqlTest;
    pub use crate::value::Value;
}
