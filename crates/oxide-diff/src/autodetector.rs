//! Schema differ.
//!
//! Compares the table definitions of two databases and reports the structural
//! changes needed to turn the source into the target: whole tables to create
//! or drop, and per-table column and key deltas.

use tracing::debug;

use crate::schema::{Column, Database, Key, Table};

/// A key to drop from the source table or add from the target table.
#[derive(Debug, Clone, Copy)]
pub enum KeyModification<'a> {
    /// Drop a source key.
    Drop(&'a Key),
    /// Add a target key.
    Add(&'a Key),
}

impl<'a> KeyModification<'a> {
    /// The key being dropped or added.
    #[must_use]
    pub fn key(&self) -> &'a Key {
        match self {
            Self::Drop(key) | Self::Add(key) => key,
        }
    }
}

/// Column and key deltas between two same-named tables.
#[derive(Debug, Clone, Default)]
pub struct TableDiff<'a> {
    /// Source columns missing on the target, in source order.
    pub deletions: Vec<&'a Column>,
    /// Target definitions of changed columns, in source order.
    pub changes: Vec<&'a Column>,
    /// Target columns missing on the source, in target order.
    pub additions: Vec<&'a Column>,
    /// Key drops and adds, drops of a redefined key directly followed by its add.
    pub key_modifications: Vec<KeyModification<'a>>,
}

impl TableDiff<'_> {
    /// Returns true if the tables are structurally identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty()
            && self.changes.is_empty()
            && self.additions.is_empty()
            && self.key_modifications.is_empty()
    }
}

/// A structural change to a database.
#[derive(Debug, Clone)]
pub enum SchemaChange<'a> {
    /// The table exists on both sides but differs.
    Alter {
        /// Target table (its name and definitions are rendered).
        table: &'a Table,
        /// The deltas.
        diff: TableDiff<'a>,
    },
    /// The table exists only on the source.
    Drop(&'a Table),
    /// The table exists only on the target.
    Create(&'a Table),
}

/// Detects schema changes between two databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autodetector;

impl Autodetector {
    /// Creates a new autodetector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Lazily yields the changes turning `from` into `to`.
    ///
    /// Source tables come first in source order (alters and drops), then
    /// target-only tables in target order (creates). Identical tables yield
    /// nothing.
    pub fn diff<'a>(
        self,
        from: &'a Database,
        to: &'a Database,
    ) -> impl Iterator<Item = SchemaChange<'a>> + 'a {
        let existing = from.tables().iter().filter_map(move |from_table| {
            let Some(to_table) = to.table(&from_table.name) else {
                return Some(SchemaChange::Drop(from_table));
            };
            let diff = self.diff_table(from_table, to_table);
            if diff.is_empty() {
                None
            } else {
                Some(SchemaChange::Alter {
                    table: to_table,
                    diff,
                })
            }
        });

        let created = to
            .tables()
            .iter()
            .filter(move |t| from.table(&t.name).is_none())
            .map(SchemaChange::Create);

        existing.chain(created)
    }

    /// Compares two same-named tables.
    #[must_use]
    pub fn diff_table<'a>(self, from: &'a Table, to: &'a Table) -> TableDiff<'a> {
        let mut diff = TableDiff::default();

        for from_col in &from.columns {
            match to.column(&from_col.name) {
                Some(to_col) if from_col.differs_from(to_col) => diff.changes.push(to_col),
                Some(_) => {}
                None => diff.deletions.push(from_col),
            }
        }

        diff.additions = to
            .columns
            .iter()
            .filter(|c| from.column(&c.name).is_none())
            .collect();

        diff.key_modifications = self.diff_keys(from, to);

        if !diff.is_empty() {
            debug!(
                table = %to.name,
                dropped = diff.deletions.len(),
                changed = diff.changes.len(),
                added = diff.additions.len(),
                keys = diff.key_modifications.len(),
                "Table definition differs"
            );
        }

        diff
    }

    /// Compares the keys of two tables by index name.
    #[must_use]
    pub fn diff_keys<'a>(self, from: &'a Table, to: &'a Table) -> Vec<KeyModification<'a>> {
        let mut modifications = Vec::new();

        for from_key in &from.keys {
            match to.key(&from_key.name) {
                Some(to_key) if !from_key.same_definition(to_key) => {
                    modifications.push(KeyModification::Drop(from_key));
                    modifications.push(KeyModification::Add(to_key));
                }
                Some(_) => {}
                None => modifications.push(KeyModification::Drop(from_key)),
            }
        }

        for to_key in &to.keys {
            if from.key(&to_key.name).is_none() {
                modifications.push(KeyModification::Add(to_key));
            }
        }

        modifications
    }
}
