//! MySQL dialect.
//!
//! Identifiers are quoted with backticks. String literals use the server's
//! default backslash escaping, the same rules the MySQL client libraries
//! apply when interpolating parameters.

use std::fmt::Write as _;

use crate::schema::Column;
use crate::value::{TypeFamily, Value};

use super::DiffDialect;

/// MySQL rendering rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn escape_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for c in s.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\x1a' => out.push_str("\\Z"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                c => out.push(c),
            }
        }
        out.push('\'');
        out
    }
}

impl DiffDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// String keys sort on their bytes. Collations fold case and accents,
    /// which would disagree with the merge's ordering.
    fn sort_key(&self, column: &Column) -> String {
        let name = self.quote_identifier(&column.name);
        match TypeFamily::of(&column.native_type) {
            Ok(TypeFamily::String) => format!("CAST({name} AS BINARY)"),
            _ => name,
        }
    }

    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Int(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Float(v) if v.is_finite() => v.to_string(),
            // MySQL has no literal for NaN or infinity.
            Value::Float(_) => "NULL".to_string(),
            Value::Decimal(v) => v.clone(),
            Value::Text(v) => Self::escape_string(v),
            Value::Bytes(v) => {
                let mut hex = String::with_capacity(v.len() * 2 + 3);
                hex.push_str("X'");
                for b in v {
                    let _ = write!(hex, "{b:02X}");
                }
                hex.push('\'');
                hex
            }
            Value::Date(v) => format!("'{v}'"),
            Value::Time(v) => format!("'{v}'"),
            Value::DateTime(v) => format!("'{v}'"),
        }
    }
}
