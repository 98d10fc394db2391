//! Schema metadata model.
//!
//! These types describe a database as introspection reported it: tables,
//! their columns in declaration order, and their keys. They are built once per
//! comparison run and never mutated afterwards.

use tracing::{debug, info};

use crate::error::{DiffError, Result};
use crate::source::{DataSource, RowData, RowStream};

/// Classification of an index, or of a column's strongest index membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// The table's primary key.
    Primary,
    /// A uniqueness constraint.
    Unique,
    /// A non-unique index.
    Multiple,
}

impl KeyKind {
    /// Parses the `Key` flag of a MySQL column description (`PRI`, `UNI`, `MUL`).
    ///
    /// An empty flag means the column leads no index.
    #[must_use]
    pub fn from_column_flag(flag: &str) -> Option<Self> {
        match flag.trim() {
            "PRI" => Some(Self::Primary),
            "UNI" => Some(Self::Unique),
            "MUL" => Some(Self::Multiple),
            _ => None,
        }
    }
}

/// A column as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Key classification, `None` when the column leads no index.
    pub key: Option<KeyKind>,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Whether this column auto-increments.
    pub auto_increment: bool,
    /// Engine type string, e.g. `int(11)`.
    pub native_type: String,
}

impl Column {
    /// Creates a nullable, unkeyed column.
    #[must_use]
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            nullable: true,
            auto_increment: false,
            native_type: native_type.into(),
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the key classification.
    #[must_use]
    pub fn key(mut self, kind: KeyKind) -> Self {
        self.key = Some(kind);
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary_key(self) -> Self {
        self.not_null().key(KeyKind::Primary)
    }

    /// Sets the column to auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Returns true if the column belongs to the primary key.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.key == Some(KeyKind::Primary)
    }

    /// Returns true when the definitions differ in anything an `ALTER TABLE ... CHANGE`
    /// would have to fix.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.auto_increment != other.auto_increment
            || self.nullable != other.nullable
            || self.native_type != other.native_type
    }
}

/// One column's participation in one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPart {
    /// Index name.
    pub index: String,
    /// 1-based position within the index.
    pub seq: u32,
    /// Referenced column.
    pub column: String,
}

impl KeyPart {
    /// Creates a key part.
    #[must_use]
    pub fn new(index: impl Into<String>, seq: u32, column: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            seq,
            column: column.into(),
        }
    }
}

/// An index: its ordered parts and classification.
#[derive(Debug, Clone)]
pub struct Key {
    /// Index name.
    pub name: String,
    /// Classification taken from the first part's column.
    pub kind: KeyKind,
    /// Parts in ordinal order.
    pub parts: Vec<KeyPart>,
}

impl Key {
    /// Returns true if this is the primary key.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.kind == KeyKind::Primary
    }

    /// Returns the names of the indexed columns in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.column.as_str())
    }

    /// Structural equality used by the schema differ. The index name is not compared.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.parts.len() == other.parts.len()
            && self
                .parts
                .iter()
                .zip(&other.parts)
                .all(|(a, b)| a.seq == b.seq && a.column == b.column)
    }

    /// Groups consecutive parts by index name, keeping first-seen order.
    ///
    /// Each key takes the classification of its first part's column. A key
    /// whose first column leads no index, or a primary key containing a
    /// non-primary column, is rejected.
    pub fn group(table: &str, columns: &[Column], parts: Vec<KeyPart>) -> Result<Vec<Self>> {
        let mut grouped: Vec<(String, Vec<KeyPart>)> = Vec::new();
        for part in parts {
            match grouped.iter_mut().find(|(name, _)| *name == part.index) {
                Some((_, existing)) => existing.push(part),
                None => grouped.push((part.index.clone(), vec![part])),
            }
        }

        grouped
            .into_iter()
            .map(|(name, parts)| {
                let invalid = |reason: String| DiffError::InvalidKey {
                    table: table.to_string(),
                    key: name.clone(),
                    reason,
                };

                let mut kinds = Vec::with_capacity(parts.len());
                for part in &parts {
                    let column = columns
                        .iter()
                        .find(|c| c.name == part.column)
                        .ok_or_else(|| invalid(format!("unknown column '{}'", part.column)))?;
                    kinds.push(column.key);
                }

                let kind = kinds[0].ok_or_else(|| {
                    invalid(format!(
                        "first column '{}' carries no key classification",
                        parts[0].column
                    ))
                })?;

                if kind == KeyKind::Primary && kinds.iter().any(|k| *k != Some(KeyKind::Primary))
                {
                    return Err(invalid(
                        "primary key spans a column not classified as primary".to_string(),
                    ));
                }

                Ok(Self { name, kind, parts })
            })
            .collect()
    }
}

/// A table: columns in declaration order and keys.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Column definitions in declaration order.
    pub columns: Vec<Column>,
    /// Index definitions.
    pub keys: Vec<Key>,
}

impl Table {
    /// Builds a table from its described columns and flat key parts.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, parts: Vec<KeyPart>) -> Result<Self> {
        let name = name.into();
        let keys = Key::group(&name, &columns, parts)?;
        Ok(Self {
            name,
            columns,
            keys,
        })
    }

    /// Gets a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets a key by index name.
    #[must_use]
    pub fn key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name == name)
    }

    /// Primary key columns in declaration order. This is the row sort key.
    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary())
    }
}

/// One tuple of a table.
#[derive(Debug, Clone)]
pub struct Row<'t> {
    /// Table the row was read from.
    pub table: &'t Table,
    /// Column values keyed by column name.
    pub data: RowData,
}

impl<'t> Row<'t> {
    /// Creates a row.
    #[must_use]
    pub fn new(table: &'t Table, data: RowData) -> Self {
        Self { table, data }
    }

    /// Value of a column, if the row carries it.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&crate::value::Value> {
        self.data.get(column)
    }

    /// Native type of a column of this row's table.
    pub fn native_type(&self, column: &str) -> Result<&str> {
        self.table
            .column(column)
            .map(|c| c.native_type.as_str())
            .ok_or_else(|| DiffError::MissingColumn {
                table: self.table.name.clone(),
                column: column.to_string(),
            })
    }
}

/// A database: its tables, plus the data source they were read from.
pub struct Database {
    source: Box<dyn DataSource>,
    tables: Vec<Table>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Introspects every table the source lists.
    pub fn load(source: impl DataSource + 'static) -> Result<Self> {
        let source: Box<dyn DataSource> = Box::new(source);
        let names = source.list_tables()?;
        info!(tables = names.len(), "Introspecting database");

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = source.describe_columns(&name)?;
            let parts = source.describe_keys(&name)?;
            debug!(table = %name, columns = columns.len(), key_parts = parts.len(), "Described table");
            tables.push(Table::new(name, columns, parts)?);
        }

        Ok(Self { source, tables })
    }

    /// All tables in introspection order.
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Gets a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Streams a table's rows ordered by its primary key.
    pub fn rows<'a>(&'a self, table: &Table) -> Result<RowStream<'a>> {
        let order_by: Vec<&Column> = table.primary_key().collect();
        self.source.query_rows(&table.name, &order_by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "int(11)").primary_key().auto_increment(),
            Column::new("tenant", "int(11)").primary_key(),
            Column::new("email", "varchar(64)").key(KeyKind::Unique),
            Column::new("name", "varchar(32)").key(KeyKind::Multiple),
            Column::new("age", "int(11)"),
        ]
    }

    #[test]
    fn test_key_kind_from_flag() {
        assert_eq!(KeyKind::from_column_flag("PRI"), Some(KeyKind::Primary));
        assert_eq!(KeyKind::from_column_flag("UNI"), Some(KeyKind::Unique));
        assert_eq!(KeyKind::from_column_flag("MUL"), Some(KeyKind::Multiple));
        assert_eq!(KeyKind::from_column_flag(""), None);
    }

    #[test]
    fn test_group_keys_preserves_first_seen_order() {
        let parts = vec![
            KeyPart::new("PRIMARY", 1, "id"),
            KeyPart::new("PRIMARY", 2, "tenant"),
            KeyPart::new("by_name", 1, "name"),
            KeyPart::new("by_name", 2, "age"),
            KeyPart::new("email", 1, "email"),
        ];
        let keys = Key::group("users", &columns(), parts).unwrap();

        let names: Vec<&str> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["PRIMARY", "by_name", "email"]);
        assert_eq!(keys[0].kind, KeyKind::Primary);
        assert_eq!(keys[1].kind, KeyKind::Multiple);
        assert_eq!(keys[2].kind, KeyKind::Unique);
        assert_eq!(keys[1].column_names().collect::<Vec<_>>(), vec!["name", "age"]);
    }

    #[test]
    fn test_group_rejects_unclassified_first_column() {
        let parts = vec![KeyPart::new("by_age", 1, "age")];
        let result = Key::group("users", &columns(), parts);
        assert!(matches!(result, Err(DiffError::InvalidKey { key, .. }) if key == "by_age"));
    }

    #[test]
    fn test_group_rejects_mixed_primary_key() {
        let parts = vec![
            KeyPart::new("PRIMARY", 1, "id"),
            KeyPart::new("PRIMARY", 2, "age"),
        ];
        assert!(matches!(
            Key::group("users", &columns(), parts),
            Err(DiffError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_group_rejects_unknown_column() {
        let parts = vec![KeyPart::new("PRIMARY", 1, "missing")];
        assert!(matches!(
            Key::group("users", &columns(), parts),
            Err(DiffError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_key_definition_ignores_name() {
        let cols = columns();
        let a = Key::group("t", &cols, vec![KeyPart::new("a", 1, "name")]).unwrap();
        let b = Key::group("t", &cols, vec![KeyPart::new("b", 1, "name")]).unwrap();
        let c = Key::group("t", &cols, vec![KeyPart::new("a", 1, "email")]).unwrap();
        assert!(a[0].same_definition(&b[0]));
        assert!(!a[0].same_definition(&c[0]));
    }

    #[test]
    fn test_table_lookups() {
        let table = Table::new(
            "users",
            columns(),
            vec![
                KeyPart::new("PRIMARY", 1, "id"),
                KeyPart::new("PRIMARY", 2, "tenant"),
            ],
        )
        .unwrap();

        assert!(table.column("email").is_some());
        assert!(table.column("nope").is_none());
        assert!(table.key("PRIMARY").is_some());
        assert!(table.key("email").is_none());
        let primary: Vec<&str> = table.primary_key().map(|c| c.name.as_str()).collect();
        assert_eq!(primary, vec!["id", "tenant"]);
    }

    #[test]
    fn test_column_differs_from() {
        let base = Column::new("name", "varchar(32)");
        assert!(!base.differs_from(&base.clone().key(KeyKind::Multiple)));
        assert!(base.differs_from(&base.clone().not_null()));
        assert!(base.differs_from(&Column::new("name", "varchar(64)")));
        assert!(base.differs_from(&base.clone().auto_increment()));
    }
}
