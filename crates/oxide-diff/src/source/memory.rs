//! In-memory data source.

use std::cmp::Ordering;

use crate::error::{DiffError, Result};
use crate::schema::{Column, KeyPart};
use crate::source::{DataSource, RowData, RowStream};
use crate::value::{self, Value};

/// A table held in memory: metadata plus unordered rows.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    /// Table name.
    pub name: String,
    /// Column definitions in declaration order.
    pub columns: Vec<Column>,
    /// Flat key parts.
    pub key_parts: Vec<KeyPart>,
    /// Row data.
    pub rows: Vec<RowData>,
}

impl MemoryTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            key_parts: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index over the given columns, in order.
    #[must_use]
    pub fn key(mut self, index: &str, columns: &[&str]) -> Self {
        for (seq, column) in (1u32..).zip(columns) {
            self.key_parts.push(KeyPart::new(index, seq, *column));
        }
        self
    }

    /// Adds a row given values in column declaration order.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the number of columns.
    #[must_use]
    pub fn row(mut self, values: Vec<Value>) -> Self {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "row arity must match column count"
        );
        let data = self
            .columns
            .iter()
            .map(|c| c.name.clone())
            .zip(values)
            .collect();
        self.rows.push(data);
        self
    }
}

/// A data source backed by in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: Vec<MemoryTable>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn table(mut self, table: MemoryTable) -> Self {
        self.tables.push(table);
        self
    }

    fn get(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DiffError::DataSource(format!("table '{name}' does not exist")))
    }
}

impl DataSource for MemorySource {
    fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    fn describe_columns(&self, table: &str) -> Result<Vec<Column>> {
        Ok(self.get(table)?.columns.clone())
    }

    fn describe_keys(&self, table: &str) -> Result<Vec<KeyPart>> {
        let mut parts = self.get(table)?.key_parts.clone();
        parts.sort_by(|a, b| a.index.cmp(&b.index).then(a.seq.cmp(&b.seq)));
        Ok(parts)
    }

    fn query_rows(&self, table: &str, order_by: &[&Column]) -> Result<RowStream<'_>> {
        let table = self.get(table)?;
        let missing = order_by
            .iter()
            .find(|c| table.columns.iter().all(|t| t.name != c.name));
        if let Some(missing) = missing {
            return Err(DiffError::MissingColumn {
                table: table.name.clone(),
                column: missing.name.clone(),
            });
        }

        // sort_by cannot fail; keep the first comparison error and report it.
        let mut rows: Vec<&RowData> = table.rows.iter().collect();
        let mut failure = None;
        rows.sort_by(|a, b| {
            for column in order_by {
                let left = a.get(&column.name).unwrap_or(&Value::Null);
                let right = b.get(&column.name).unwrap_or(&Value::Null);
                match value::compare(&column.native_type, left, right) {
                    Ok(Ordering::Equal) => continue,
                    Ok(ordering) => return ordering,
                    Err(e) => {
                        failure.get_or_insert(e);
                        return Ordering::Equal;
                    }
                }
            }
            Ordering::Equal
        });
        if let Some(e) = failure {
            return Err(e);
        }

        Ok(Box::new(rows.into_iter().cloned().map(Ok::<_, DiffError>)))
    }

    fn execute(&self, _sql: &str) -> Result<u64> {
        Err(DiffError::DataSource(
            "in-memory sources cannot execute SQL".to_string(),
        ))
    }
}
