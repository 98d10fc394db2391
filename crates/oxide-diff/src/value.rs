//! Cell values and the ordering rules used to merge rows.
//!
//! Ordering is only defined for the integer and variable-length string
//! families. Primary keys of any other type make a merge-join impossible,
//! so [`compare`] fails with [`DiffError::UnsupportedType`] for them.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{DiffError, Result};

/// A single cell read from a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Fixed-point decimal, kept in its textual form.
    Decimal(String),
    /// Character data.
    Text(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Native type families that have an ordering rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    /// `tinyint` through `bigint`, signed or unsigned.
    Integer,
    /// `varchar` and the `text` types.
    String,
}

impl TypeFamily {
    /// Classifies a native type string such as `int(11) unsigned` or `varchar(32)`.
    pub fn of(native_type: &str) -> Result<Self> {
        let lowered = native_type.trim().to_ascii_lowercase();
        let base = lowered
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        match base {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => {
                Ok(Self::Integer)
            }
            "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" => Ok(Self::String),
            _ => Err(DiffError::UnsupportedType(native_type.to_string())),
        }
    }
}

/// Orders `a` relative to `b`, treating both as values of `native_type`.
///
/// `Less` means `a` sorts before `b`. NULL sorts before everything else.
pub fn compare(native_type: &str, a: &Value, b: &Value) -> Result<Ordering> {
    let family = TypeFamily::of(native_type)?;

    match (a, b) {
        (Value::Null, Value::Null) => return Ok(Ordering::Equal),
        (Value::Null, _) => return Ok(Ordering::Less),
        (_, Value::Null) => return Ok(Ordering::Greater),
        _ => {}
    }

    let ordering = match family {
        TypeFamily::Integer => integer(a).zip(integer(b)).map(|(x, y)| x.cmp(&y)),
        TypeFamily::String => match (a, b) {
            (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
            _ => None,
        },
    };

    ordering.ok_or_else(|| DiffError::IncomparableValues {
        native_type: native_type.to_string(),
        left: format!("{a:?}"),
        right: format!("{b:?}"),
    })
}

fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(i128::from(*v)),
        Value::UInt(v) => Some(i128::from(*v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_families() {
        assert_eq!(TypeFamily::of("int(11)").unwrap(), TypeFamily::Integer);
        assert_eq!(TypeFamily::of("INT").unwrap(), TypeFamily::Integer);
        assert_eq!(
            TypeFamily::of("bigint(20) unsigned").unwrap(),
            TypeFamily::Integer
        );
        assert_eq!(TypeFamily::of("varchar(32)").unwrap(), TypeFamily::String);
        assert_eq!(TypeFamily::of("mediumtext").unwrap(), TypeFamily::String);
    }

    #[test]
    fn test_unsupported_types() {
        for native in ["datetime", "decimal(10,2)", "char(4)", "blob", "intx"] {
            assert!(matches!(
                TypeFamily::of(native),
                Err(DiffError::UnsupportedType(t)) if t == native
            ));
        }
        assert!(matches!(
            compare("datetime", &Value::Null, &Value::Null),
            Err(DiffError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_compare_integers() {
        let cmp = |a: i64, b: i64| compare("int(11)", &a.into(), &b.into()).unwrap();
        assert_eq!(cmp(1, 2), Ordering::Less);
        assert_eq!(cmp(2, 2), Ordering::Equal);
        assert_eq!(cmp(-3, -4), Ordering::Greater);
    }

    #[test]
    fn test_compare_mixed_sign_storage() {
        let big = Value::UInt(u64::MAX);
        assert_eq!(
            compare("bigint unsigned", &Value::Int(-1), &big).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare("bigint", &Value::UInt(7), &Value::Int(7)).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_strings() {
        let cmp = |a: &str, b: &str| compare("varchar(32)", &a.into(), &b.into()).unwrap();
        assert_eq!(cmp("abc", "abd"), Ordering::Less);
        assert_eq!(cmp("abc", "abc"), Ordering::Equal);
        assert_eq!(cmp("b", "abc"), Ordering::Greater);
        assert_eq!(cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(
            compare("int", &Value::Null, &Value::Int(i64::MIN)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            compare("text", &Value::from("x"), &Value::Null).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            compare("text", &Value::Null, &Value::Null).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn test_incomparable_values() {
        let result = compare("int", &Value::Int(1), &Value::from("1"));
        assert!(matches!(result, Err(DiffError::IncomparableValues { .. })));
    }

    #[test]
    fn test_ordering_is_antisymmetric_and_transitive() {
        let values: Vec<Value> = vec![
            Value::Null,
            Value::Int(-5),
            Value::Int(0),
            Value::UInt(0),
            Value::Int(3),
            Value::UInt(10),
        ];
        for a in &values {
            for b in &values {
                let ab = compare("int", a, b).unwrap();
                let ba = compare("int", b, a).unwrap();
                assert_eq!(ab, ba.reverse());
                for c in &values {
                    let bc = compare("int", b, c).unwrap();
                    if ab != Ordering::Greater && bc != Ordering::Greater {
                        assert_ne!(compare("int", a, c).unwrap(), Ordering::Greater);
                    }
                }
            }
        }
    }
}
