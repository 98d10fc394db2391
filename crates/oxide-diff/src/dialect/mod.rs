//! SQL rendering.
//!
//! A dialect turns metadata and diff results into statement text. Builders
//! are pure: they never touch a database. Every statement is a single line
//! terminated by `;`.

mod mysql;

pub use mysql::MySqlDialect;

use crate::autodetector::{KeyModification, TableDiff};
use crate::schema::{Column, Key, KeyKind, Row, Table};
use crate::value::Value;

/// Trait for engine-specific SQL generation.
pub trait DiffDialect {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column or index name).
    fn quote_identifier(&self, name: &str) -> String;

    /// Render a value as a SQL literal.
    fn literal(&self, value: &Value) -> String;

    /// Generates a column definition.
    fn column_definition(&self, column: &Column) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            column.native_type
        );
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if column.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        sql
    }

    /// Comma-separated, quoted column list of a key.
    fn key_columns(&self, key: &Key) -> String {
        self.quote_list(key.column_names())
    }

    /// Generates an inline key definition for `CREATE TABLE`.
    fn key_definition(&self, key: &Key) -> String {
        match key.kind {
            KeyKind::Primary => format!("PRIMARY KEY ({})", self.key_columns(key)),
            KeyKind::Unique => format!(
                "UNIQUE KEY {} ({})",
                self.quote_identifier(&key.name),
                self.key_columns(key)
            ),
            KeyKind::Multiple => format!(
                "KEY {} ({})",
                self.quote_identifier(&key.name),
                self.key_columns(key)
            ),
        }
    }

    /// Generates an `ALTER TABLE` clause for a key drop or add.
    fn key_modification(&self, modification: &KeyModification<'_>) -> String {
        match *modification {
            KeyModification::Drop(key) if key.is_primary() => "DROP PRIMARY KEY".to_string(),
            KeyModification::Drop(key) => format!("DROP KEY {}", self.quote_identifier(&key.name)),
            KeyModification::Add(key) => match key.kind {
                KeyKind::Primary => format!("ADD PRIMARY KEY ({})", self.key_columns(key)),
                KeyKind::Multiple => format!(
                    "ADD INDEX {} ({})",
                    self.quote_identifier(&key.name),
                    self.key_columns(key)
                ),
                KeyKind::Unique => format!(
                    "ADD CONSTRAINT {} UNIQUE KEY ({})",
                    self.quote_identifier(&key.name),
                    self.key_columns(key)
                ),
            },
        }
    }

    /// Generates `CREATE TABLE` with all columns and keys inline.
    fn create_table(&self, table: &Table) -> String {
        let definitions: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c))
            .chain(table.keys.iter().map(|k| self.key_definition(k)))
            .collect();
        format!(
            "CREATE TABLE {} ({});",
            self.quote_identifier(&table.name),
            definitions.join(",")
        )
    }

    /// Generates `ALTER TABLE`: drops, changes, adds, then key modifications.
    fn alter_table(&self, table: &Table, diff: &TableDiff<'_>) -> String {
        let drops = diff
            .deletions
            .iter()
            .map(|c| format!("DROP {}", self.quote_identifier(&c.name)));
        let changes = diff.changes.iter().map(|c| {
            format!(
                "CHANGE {} {}",
                self.quote_identifier(&c.name),
                self.column_definition(c)
            )
        });
        let adds = diff
            .additions
            .iter()
            .map(|c| format!("ADD {}", self.column_definition(c)));
        let keys = diff
            .key_modifications
            .iter()
            .map(|m| self.key_modification(m));

        let clauses: Vec<String> = drops.chain(changes).chain(adds).chain(keys).collect();
        format!(
            "ALTER TABLE {} {};",
            self.quote_identifier(&table.name),
            clauses.join(",")
        )
    }

    /// Generates `DROP TABLE`.
    fn drop_table(&self, table: &Table) -> String {
        format!("DROP TABLE {};", self.quote_identifier(&table.name))
    }

    /// Generates `INSERT` of a full row across the table's declared columns.
    fn insert(&self, row: &Row<'_>) -> String {
        let columns = self.quote_list(row.table.columns.iter().map(|c| c.name.as_str()));
        let values: Vec<String> = row
            .table
            .columns
            .iter()
            .map(|c| self.literal(row.value(&c.name).unwrap_or(&Value::Null)))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.quote_identifier(&row.table.name),
            columns,
            values.join(",")
        )
    }

    /// Generates `UPDATE` setting exactly `columns` to the target row's values.
    ///
    /// The row is identified by the target's primary key. Without a primary key
    /// the source row's full contents identify it instead.
    fn update(&self, target: &Row<'_>, columns: &[String], source: &Row<'_>) -> String {
        let sets: Vec<String> = columns
            .iter()
            .map(|name| {
                format!(
                    "{}={}",
                    self.quote_identifier(name),
                    self.literal(target.value(name).unwrap_or(&Value::Null))
                )
            })
            .collect();
        let identity = if target.table.primary_key().next().is_some() {
            target
        } else {
            source
        };
        format!(
            "UPDATE {} SET {} {};",
            self.quote_identifier(&target.table.name),
            sets.join(","),
            self.row_predicate(identity)
        )
    }

    /// Generates `DELETE` keyed on the row's primary key.
    fn delete(&self, row: &Row<'_>) -> String {
        format!(
            "DELETE FROM {} {};",
            self.quote_identifier(&row.table.name),
            self.row_predicate(row)
        )
    }

    /// `WHERE` clause identifying a row by its primary key.
    ///
    /// A table without a primary key is matched on every column, limited to
    /// one row so duplicates are handled one statement at a time.
    fn row_predicate(&self, row: &Row<'_>) -> String {
        let mut columns: Vec<&Column> = row.table.primary_key().collect();
        let keyless = columns.is_empty();
        if keyless {
            columns = row.table.columns.iter().collect();
        }
        let terms: Vec<String> = columns
            .iter()
            .map(|c| {
                let name = self.quote_identifier(&c.name);
                match row.value(&c.name).unwrap_or(&Value::Null) {
                    Value::Null => format!("{name} IS NULL"),
                    value => format!("{name}={}", self.literal(value)),
                }
            })
            .collect();
        let mut sql = format!("WHERE {}", terms.join(" AND "));
        if keyless {
            sql.push_str(" LIMIT 1");
        }
        sql
    }

    /// Expression a row scan sorts `column` by.
    fn sort_key(&self, column: &Column) -> String {
        self.quote_identifier(&column.name)
    }

    /// Generates the row scan used by data diffing.
    fn select_rows(&self, table: &str, order_by: &[&Column]) -> String {
        let mut sql = format!("SELECT * FROM {}", self.quote_identifier(table));
        if !order_by.is_empty() {
            let keys: Vec<String> = order_by.iter().map(|c| self.sort_key(c)).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(","));
        }
        sql
    }

    /// Quotes and comma-joins identifiers.
    fn quote_list<'n>(&self, names: impl Iterator<Item = &'n str>) -> String {
        names
            .map(|n| self.quote_identifier(n))
            .collect::<Vec<_>>()
            .join(",")
    }
}
