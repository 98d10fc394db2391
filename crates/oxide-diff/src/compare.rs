//! Diff orchestration.
//!
//! Runs the schema differ and then the data differ across every table of two
//! databases and renders the results as one lazy sequence of statements.

use tracing::info;

use crate::autodetector::{Autodetector, SchemaChange};
use crate::data_diff::{DataChange, DataDiff};
use crate::dialect::DiffDialect;
use crate::error::Result;
use crate::schema::{Database, Table};
use crate::source::RowStream;

/// Which parts of the comparison to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Emit DDL for table and column differences.
    pub schema: bool,
    /// Emit DML for row differences.
    pub data: bool,
    /// Insert the rows of tables that only exist on the target.
    pub populate_created_tables: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            schema: true,
            data: true,
            populate_created_tables: true,
        }
    }
}

impl DiffOptions {
    /// Schema statements only.
    #[must_use]
    pub fn schema_only() -> Self {
        Self {
            data: false,
            ..Self::default()
        }
    }

    /// Data statements only.
    #[must_use]
    pub fn data_only() -> Self {
        Self {
            schema: false,
            ..Self::default()
        }
    }

    /// Sets whether target-only tables are populated.
    #[must_use]
    pub fn populate_created_tables(mut self, populate: bool) -> Self {
        self.populate_created_tables = populate;
        self
    }
}

/// Compares a source database against a target database.
#[derive(Debug)]
pub struct Comparator<'a, D> {
    source: &'a Database,
    target: &'a Database,
    dialect: D,
    options: DiffOptions,
}

impl<'a, D: DiffDialect + Clone + 'a> Comparator<'a, D> {
    /// Creates a comparator with default options.
    pub fn new(source: &'a Database, target: &'a Database, dialect: D) -> Self {
        Self {
            source,
            target,
            dialect,
            options: DiffOptions::default(),
        }
    }

    /// Sets the options.
    #[must_use]
    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// The statements turning the source into the target, in order.
    ///
    /// 1. `ALTER TABLE` / `DROP TABLE` for source tables, in source order.
    /// 2. `CREATE TABLE` for target-only tables, in target order.
    /// 3. Row changes for tables on both sides, in source order.
    /// 4. `INSERT`s for target-only tables, in target order.
    ///
    /// Nothing is read until the sequence is consumed. The first error is
    /// the last item.
    pub fn statements(&self) -> impl Iterator<Item = Result<String>> + 'a {
        let source = self.source;
        let target = self.target;
        let options = self.options;
        let dialect = self.dialect.clone();
        info!(
            dialect = dialect.name(),
            schema = options.schema,
            data = options.data,
            "Comparing databases"
        );

        let schema = options
            .schema
            .then(|| {
                let dialect = dialect.clone();
                Autodetector::new()
                    .diff(source, target)
                    .map(move |change| Ok(render_schema_change(&dialect, &change)))
            })
            .into_iter()
            .flatten();

        let common = options
            .data
            .then(|| {
                let dialect = dialect.clone();
                source
                    .tables()
                    .iter()
                    .filter_map(move |s| target.table(&s.name).map(|t| (s, t)))
                    .flat_map(move |(s, t)| {
                        info!(table = %s.name, "Comparing table data");
                        data_statements(dialect.clone(), s, source.rows(s), t, target.rows(t))
                    })
            })
            .into_iter()
            .flatten();

        let created = (options.data && options.populate_created_tables)
            .then(|| {
                target
                    .tables()
                    .iter()
                    .filter(move |t| source.table(&t.name).is_none())
                    .flat_map(move |t| {
                        info!(table = %t.name, "Populating created table");
                        let empty: RowStream<'a> = Box::new(std::iter::empty());
                        data_statements(dialect.clone(), t, Ok(empty), t, target.rows(t))
                    })
            })
            .into_iter()
            .flatten();

        FailFast::new(schema.chain(common).chain(created))
    }
}

/// Renders one schema change.
pub fn render_schema_change<D: DiffDialect>(dialect: &D, change: &SchemaChange<'_>) -> String {
    match change {
        SchemaChange::Alter { table, diff } => dialect.alter_table(table, diff),
        SchemaChange::Drop(table) => dialect.drop_table(table),
        SchemaChange::Create(table) => dialect.create_table(table),
    }
}

/// Renders one row change.
pub fn render_data_change<D: DiffDialect>(dialect: &D, change: &DataChange<'_>) -> String {
    match change {
        DataChange::Insert(row) => dialect.insert(row),
        DataChange::Delete(row) => dialect.delete(row),
        DataChange::Update {
            source,
            target,
            columns,
        } => dialect.update(target, columns, source),
    }
}

fn data_statements<'a, D: DiffDialect + 'a>(
    dialect: D,
    source_table: &'a Table,
    source_rows: Result<RowStream<'a>>,
    target_table: &'a Table,
    target_rows: Result<RowStream<'a>>,
) -> Box<dyn Iterator<Item = Result<String>> + 'a> {
    let (source_rows, target_rows) = match (source_rows, target_rows) {
        (Ok(s), Ok(t)) => (s, t),
        (Err(e), _) | (_, Err(e)) => return Box::new(std::iter::once(Err(e))),
    };
    Box::new(
        DataDiff::new(source_table, source_rows, target_table, target_rows)
            .map(move |change| change.map(|c| render_data_change(&dialect, &c))),
    )
}

/// Ends an iterator of results after its first error.
#[derive(Debug)]
pub struct FailFast<I> {
    inner: I,
    failed: bool,
}

impl<I> FailFast<I> {
    /// Wraps an iterator.
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            failed: false,
        }
    }
}

impl<I, T> Iterator for FailFast<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next()?;
        self.failed = item.is_err();
        Some(item)
    }
}
