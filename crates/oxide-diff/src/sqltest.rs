//! SQL acceptance-test fixtures.
//!
//! A `.sqltest` file sets up two databases and states the statements the
//! comparison must produce:
//!
//! ```text
//! <both>
//!     create table T (id integer auto_increment, name varchar(32), primary key (id));
//! <new>
//!     insert into T (name) values ('abc');
//! <expected>
//!     INSERT INTO `T` (`id`,`name`) VALUES (1,'abc');
//! ```
//!
//! `<both>` runs on both databases, then `<old>` on the source and `<new>` on
//! the target. Without `<expected>`, the `<new>` section is the expected
//! output. Blank lines and lines starting with `#` are ignored.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DiffError, Result};
use crate::source::DataSource;

/// A parsed fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlTest {
    /// Fixture name, the file stem.
    pub name: String,
    /// SQL run on both databases.
    pub both: Option<String>,
    /// SQL run on the source only.
    pub old: Option<String>,
    /// SQL run on the target only.
    pub new: Option<String>,
    /// Expected comparison output.
    pub expected: Option<String>,
}

/// Result of checking produced statements against a fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Output matched.
    Passed,
    /// Output differed.
    Failed {
        /// Expected statements.
        expected: Vec<String>,
        /// Produced statements.
        actual: Vec<String>,
    },
}

impl Verification {
    /// Returns true if the output matched.
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Clone, Copy)]
enum Section {
    Both,
    Old,
    New,
    Expected,
}

impl Section {
    fn from_directive(line: &str) -> Option<Self> {
        match line {
            "<both>" => Some(Self::Both),
            "<old>" => Some(Self::Old),
            "<new>" => Some(Self::New),
            "<expected>" => Some(Self::Expected),
            _ => None,
        }
    }
}

impl SqlTest {
    /// Parses fixture text. `name` is used in error messages.
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        let mut test = Self {
            name: name.to_string(),
            ..Self::default()
        };
        let mut section = None;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(next) = Section::from_directive(line) {
                section = Some(next);
                continue;
            }
            let Some(current) = section else {
                return Err(DiffError::Fixture {
                    path: PathBuf::from(name),
                    line: index + 1,
                    message: "SQL before the first <directive>".to_string(),
                });
            };
            let body = test.section_mut(current).get_or_insert_with(String::new);
            body.push_str(line);
            body.push('\n');
        }

        for body in [&mut test.both, &mut test.old, &mut test.new, &mut test.expected]
            .into_iter()
            .flatten()
        {
            let trimmed = body.trim_end().len();
            body.truncate(trimmed);
        }

        if test.new.is_none() && test.expected.is_none() {
            return Err(DiffError::Fixture {
                path: PathBuf::from(name),
                line: 0,
                message: "one of <new> or <expected> is required".to_string(),
            });
        }

        Ok(test)
    }

    /// Reads and parses a fixture file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&name, &text).map_err(|e| match e {
            DiffError::Fixture { line, message, .. } => DiffError::Fixture {
                path: path.to_path_buf(),
                line,
                message,
            },
            other => other,
        })
    }

    fn section_mut(&mut self, section: Section) -> &mut Option<String> {
        match section {
            Section::Both => &mut self.both,
            Section::Old => &mut self.old,
            Section::New => &mut self.new,
            Section::Expected => &mut self.expected,
        }
    }

    /// The statements the comparison must produce, one per line.
    #[must_use]
    pub fn expected_statements(&self) -> Vec<String> {
        self.expected
            .as_deref()
            .or(self.new.as_deref())
            .map(non_blank_lines)
            .unwrap_or_default()
    }

    /// Runs the set-up SQL: `both` on each side, `old` on the source, `new`
    /// on the target.
    pub fn setup(&self, source: &dyn DataSource, target: &dyn DataSource) -> Result<()> {
        if let Some(sql) = &self.both {
            for side in [source, target] {
                debug!(test = %self.name, sql = %sql, "Running <both>");
                side.execute(sql)?;
            }
        }
        if let Some(sql) = &self.old {
            debug!(test = %self.name, sql = %sql, "Running <old>");
            source.execute(sql)?;
        }
        if let Some(sql) = &self.new {
            debug!(test = %self.name, sql = %sql, "Running <new>");
            target.execute(sql)?;
        }
        Ok(())
    }

    /// Compares produced statements with the expected ones, line for line.
    pub fn verify<S: AsRef<str>>(&self, actual: &[S]) -> Verification {
        let expected = self.expected_statements();
        let actual: Vec<String> = actual
            .iter()
            .flat_map(|s| non_blank_lines(s.as_ref()))
            .collect();
        if expected == actual {
            Verification::Passed
        } else {
            Verification::Failed { expected, actual }
        }
    }
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
