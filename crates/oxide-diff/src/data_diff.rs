//! Data differ.
//!
//! Walks the rows of a source and a target table in lock-step primary-key
//! order (a sorted merge-join) and classifies every key as present on both
//! sides, target-only, or source-only. Both streams must already be sorted
//! ascending by the primary key, and both tables must share the same primary
//! key definition.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{DiffError, Result};
use crate::schema::{Row, Table};
use crate::source::{RowData, RowStream};
use crate::value;

/// A row-level change turning the source table into the target table.
#[derive(Debug, Clone)]
pub enum DataChange<'a> {
    /// A target row the source lacks.
    Insert(Row<'a>),
    /// A row present on both sides with differing values.
    Update {
        /// The source row, as it is now.
        source: Row<'a>,
        /// The target row, as it should become.
        target: Row<'a>,
        /// Columns whose values differ, in the target row's column order.
        columns: Vec<String>,
    },
    /// A source row the target lacks.
    Delete(Row<'a>),
}

/// Orders a source row against a target row by primary key.
///
/// Columns are compared left to right; the first unequal column decides.
/// `Less` means the source row sorts before the target row.
pub fn compare_primary_keys(
    source_table: &Table,
    source: &RowData,
    target_table: &Table,
    target: &RowData,
) -> Result<Ordering> {
    for (source_col, target_col) in source_table.primary_key().zip(target_table.primary_key()) {
        let left = source.get(&source_col.name).unwrap_or(&value::Value::Null);
        let right = target.get(&target_col.name).unwrap_or(&value::Value::Null);
        let ordering = value::compare(&source_col.native_type, left, right)?;
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

/// Columns of the target row whose values differ from the source row.
///
/// A column the source row lacks counts as changed. So does a column whose
/// type changed and whose values no longer fit one family.
pub fn compare_rows(source: &Row<'_>, target: &Row<'_>) -> Result<Vec<String>> {
    let mut changed = Vec::new();
    for (name, target_value) in &target.data {
        let Some(source_value) = source.value(name) else {
            changed.push(name.clone());
            continue;
        };
        let native_type = target.native_type(name)?;
        let retyped = source.native_type(name).is_ok_and(|t| t != native_type);
        match value::compare(native_type, source_value, target_value) {
            Ok(Ordering::Equal) => {}
            Ok(_) => changed.push(name.clone()),
            Err(DiffError::IncomparableValues { .. }) if retyped => {
                debug!(column = %name, "Values differ in type family");
                changed.push(name.clone());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(changed)
}

/// Counts of emitted changes, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDiffStats {
    /// Rows inserted.
    pub inserts: usize,
    /// Rows updated.
    pub updates: usize,
    /// Rows deleted.
    pub deletes: usize,
    /// Rows present on both sides and identical.
    pub unchanged: usize,
}

/// Merge-join iterator over two ordered row streams.
///
/// Runs until both streams are exhausted. The first error ends the iteration.
pub struct DataDiff<'a> {
    source_table: &'a Table,
    target_table: &'a Table,
    source_rows: RowStream<'a>,
    target_rows: RowStream<'a>,
    source_row: Option<RowData>,
    target_row: Option<RowData>,
    previous: Ordering,
    finished: bool,
    stats: DataDiffStats,
}

impl std::fmt::Debug for DataDiff<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataDiff")
            .field("source_table", &self.source_table.name)
            .field("target_table", &self.target_table.name)
            .field("previous", &self.previous)
            .field("finished", &self.finished)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<'a> DataDiff<'a> {
    /// Creates a merge over two streams sorted by primary key.
    #[must_use]
    pub fn new(
        source_table: &'a Table,
        source_rows: RowStream<'a>,
        target_table: &'a Table,
        target_rows: RowStream<'a>,
    ) -> Self {
        Self {
            source_table,
            target_table,
            source_rows,
            target_rows,
            source_row: None,
            target_row: None,
            previous: Ordering::Equal,
            finished: false,
            stats: DataDiffStats::default(),
        }
    }

    /// Changes emitted so far.
    #[must_use]
    pub fn stats(&self) -> DataDiffStats {
        self.stats
    }

    /// Advances the merge by one pair of cursor positions.
    ///
    /// Returns `None` both for identical pairs and at the end; `finished`
    /// tells them apart.
    fn step(&mut self) -> Result<Option<DataChange<'a>>> {
        // After `Greater` the source row is still waiting for its match.
        if self.previous != Ordering::Greater {
            self.source_row = self.source_rows.next().transpose()?;
        }
        // After `Less` the target row is still waiting for its match.
        if self.previous != Ordering::Less {
            self.target_row = self.target_rows.next().transpose()?;
        }

        let ordering = match (&self.source_row, &self.target_row) {
            (None, None) => {
                self.finished = true;
                debug!(
                    table = %self.target_table.name,
                    inserts = self.stats.inserts,
                    updates = self.stats.updates,
                    deletes = self.stats.deletes,
                    unchanged = self.stats.unchanged,
                    "Data diff complete"
                );
                return Ok(None);
            }
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(source), Some(target)) => {
                compare_primary_keys(self.source_table, source, self.target_table, target)?
            }
        };
        self.previous = ordering;

        let change = match ordering {
            Ordering::Equal => {
                let source = Row::new(self.source_table, self.source_row.take().unwrap_or_default());
                let target = Row::new(self.target_table, self.target_row.take().unwrap_or_default());
                let columns = compare_rows(&source, &target)?;
                if columns.is_empty() {
                    self.stats.unchanged += 1;
                    None
                } else {
                    self.stats.updates += 1;
                    Some(DataChange::Update {
                        source,
                        target,
                        columns,
                    })
                }
            }
            Ordering::Greater => {
                self.stats.inserts += 1;
                self.target_row
                    .take()
                    .map(|data| DataChange::Insert(Row::new(self.target_table, data)))
            }
            Ordering::Less => {
                self.stats.deletes += 1;
                self.source_row
                    .take()
                    .map(|data| DataChange::Delete(Row::new(self.source_table, data)))
            }
        };
        Ok(change)
    }
}

impl<'a> Iterator for DataDiff<'a> {
    type Item = Result<DataChange<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.step() {
                Ok(Some(change)) => return Some(Ok(change)),
                Ok(None) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use crate::value::Value;

    fn table() -> Table {
        Table::new(
            "T",
            vec![
                Column::new("id", "int(11)").primary_key(),
                Column::new("name", "varchar(32)"),
            ],
            vec![],
        )
        .unwrap()
    }

    fn rows(rows: &[(i64, &str)]) -> RowStream<'static> {
        let rows: Vec<Result<RowData>> = rows
            .iter()
            .map(|(id, name)| {
                let mut data = RowData::new();
                data.insert("id".to_string(), Value::Int(*id));
                data.insert("name".to_string(), Value::from(*name));
                Ok(data)
            })
            .collect();
        Box::new(rows.into_iter())
    }

    fn summarize(changes: Vec<DataChange<'_>>) -> Vec<String> {
        changes
            .into_iter()
            .map(|c| match c {
                DataChange::Insert(row) => format!("+{:?}", row.data["id"]),
                DataChange::Delete(row) => format!("-{:?}", row.data["id"]),
                DataChange::Update {
                    target, columns, ..
                } => format!("~{:?}{columns:?}", target.data["id"]),
            })
            .collect()
    }

    fn run(source: &[(i64, &str)], target: &[(i64, &str)]) -> Vec<String> {
        let t = table();
        let diff = DataDiff::new(&t, rows(source), &t, rows(target));
        summarize(diff.collect::<Result<Vec<_>>>().unwrap())
    }

    #[test]
    fn test_identical_streams() {
        assert!(run(&[(1, "a"), (2, "b")], &[(1, "a"), (2, "b")]).is_empty());
        assert!(run(&[], &[]).is_empty());
    }

    #[test]
    fn test_interleaved_changes() {
        let changes = run(
            &[(1, "a"), (2, "b"), (4, "d"), (6, "f")],
            &[(2, "B"), (3, "c"), (4, "d"), (7, "g")],
        );
        assert_eq!(
            changes,
            vec![
                "-Int(1)",
                "~Int(2)[\"name\"]",
                "+Int(3)",
                "-Int(6)",
                "+Int(7)",
            ]
        );
    }

    #[test]
    fn test_one_side_empty() {
        assert_eq!(run(&[], &[(1, "a"), (2, "b")]), vec!["+Int(1)", "+Int(2)"]);
        assert_eq!(run(&[(1, "a"), (2, "b")], &[]), vec!["-Int(1)", "-Int(2)"]);
    }

    #[test]
    fn test_no_iteration_cap() {
        let source: Vec<(i64, &str)> = (0..500).map(|i| (i * 2, "x")).collect();
        let target: Vec<(i64, &str)> = (0..500).map(|i| (i * 2 + 1, "x")).collect();
        let changes = run(&source, &target);
        assert_eq!(changes.len(), 1000);
        assert_eq!(changes.iter().filter(|c| c.starts_with('+')).count(), 500);
    }

    #[test]
    fn test_stats() {
        let t = table();
        let mut diff = DataDiff::new(
            &t,
            rows(&[(1, "a"), (2, "b"), (3, "c")]),
            &t,
            rows(&[(2, "b"), (3, "C"), (4, "d")]),
        );
        assert_eq!(diff.by_ref().count(), 3);
        assert_eq!(
            diff.stats(),
            DataDiffStats {
                inserts: 1,
                updates: 1,
                deletes: 1,
                unchanged: 1,
            }
        );
    }

    #[test]
    fn test_stream_error_stops_iteration() {
        let t = table();
        let failing: RowStream<'static> = Box::new(
            vec![Err(DiffError::DataSource("connection lost".to_string()))].into_iter(),
        );
        let mut diff = DataDiff::new(&t, failing, &t, rows(&[(1, "a")]));
        assert!(matches!(diff.next(), Some(Err(DiffError::DataSource(_)))));
        assert!(diff.next().is_none());
    }

    #[test]
    fn test_compare_rows_detects_missing_source_column() {
        let t = table();
        let mut source = RowData::new();
        source.insert("id".to_string(), Value::Int(1));
        let mut target = source.clone();
        target.insert("name".to_string(), Value::from("x"));

        let changed = compare_rows(&Row::new(&t, source), &Row::new(&t, target)).unwrap();
        assert_eq!(changed, vec!["name"]);
    }

    #[test]
    fn test_compare_rows_unsupported_type() {
        let t = Table::new(
            "T",
            vec![
                Column::new("id", "int").primary_key(),
                Column::new("at", "datetime"),
            ],
            vec![],
        )
        .unwrap();
        let mut data = RowData::new();
        data.insert("id".to_string(), Value::Int(1));
        data.insert("at".to_string(), Value::Null);

        let result = compare_rows(&Row::new(&t, data.clone()), &Row::new(&t, data));
        assert!(matches!(result, Err(DiffError::UnsupportedType(_))));
    }

    fn coded(native_type: &str) -> Table {
        Table::new(
            "T",
            vec![
                Column::new("id", "int").primary_key(),
                Column::new("code", native_type),
            ],
            vec![],
        )
        .unwrap()
    }

    fn code_row(code: Value) -> RowData {
        let mut data = RowData::new();
        data.insert("id".to_string(), Value::Int(1));
        data.insert("code".to_string(), code);
        data
    }

    #[test]
    fn test_compare_rows_across_type_families() {
        let (old, new) = (coded("int"), coded("varchar(8)"));
        let source = Row::new(&old, code_row(Value::Int(7)));
        let target = Row::new(&new, code_row(Value::from("x7")));
        assert_eq!(compare_rows(&source, &target).unwrap(), vec!["code"]);

        let widened = coded("bigint");
        let target = Row::new(&widened, code_row(Value::Int(7)));
        assert!(compare_rows(&source, &target).unwrap().is_empty());
    }

    #[test]
    fn test_compare_rows_mismatched_values_same_type() {
        let t = coded("int");
        let source = Row::new(&t, code_row(Value::Int(7)));
        let target = Row::new(&t, code_row(Value::from("7")));
        assert!(matches!(
            compare_rows(&source, &target),
            Err(DiffError::IncomparableValues { .. })
        ));
    }

    fn named_rows(names: &[&str]) -> RowStream<'static> {
        let rows: Vec<Result<RowData>> = names
            .iter()
            .map(|name| {
                let mut data = RowData::new();
                data.insert("name".to_string(), Value::from(*name));
                Ok(data)
            })
            .collect();
        Box::new(rows.into_iter())
    }

    #[test]
    fn test_string_keys_merge_bytewise() {
        let t = Table::new(
            "T",
            vec![Column::new("name", "varchar(8)").primary_key()],
            vec![],
        )
        .unwrap();
        let diff = DataDiff::new(&t, named_rows(&["B", "a"]), &t, named_rows(&["B"]));
        let changes: Vec<String> = diff
            .collect::<Result<Vec<_>>>()
            .unwrap()
            .into_iter()
            .map(|c| match c {
                DataChange::Delete(row) => format!("-{:?}", row.data["name"]),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(changes, vec![format!("-{:?}", Value::from("a"))]);
    }
}
