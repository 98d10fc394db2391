//! Connection configuration.
//!
//! The config file is JSON with one entry per side:
//!
//! ```json
//! {
//!   "db1": { "host": "localhost", "user": "root", "pass": "", "dbname": "app_old" },
//!   "db2": { "host": "localhost", "user": "root", "pass": "", "dbname": "app_new" }
//! }
//! ```
//!
//! `source`/`target` are accepted as well as `db1`/`db2`.

use std::path::Path;

use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

use crate::error::Result;

fn default_port() -> u16 {
    3306
}

/// Connection settings for one MySQL database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// User name.
    pub user: String,
    /// Password.
    #[serde(default, alias = "password")]
    pub pass: String,
    /// Database (schema) name.
    #[serde(alias = "database")]
    pub dbname: String,
}

impl DatabaseConfig {
    /// Builds sqlx connect options for this database.
    #[must_use]
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.pass)
            .database(&self.dbname)
    }

    /// Returns a copy pointing at another database on the same server.
    #[must_use]
    pub fn with_dbname(&self, dbname: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            ..self.clone()
        }
    }
}

/// The two sides of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompareConfig {
    /// The database to be transformed.
    #[serde(alias = "db1")]
    pub source: DatabaseConfig,
    /// The database whose shape and contents are wanted.
    #[serde(alias = "db2")]
    pub target: DatabaseConfig,
}

impl CompareConfig {
    /// Parses a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::DiffError;

    const LEGACY: &str = r#"{
        "db1": {"host": "localhost", "user": "root", "pass": "secret", "dbname": "sqltests_1"},
        "db2": {"host": "db.internal", "port": 3307, "user": "root", "pass": "", "dbname": "sqltests_2"}
    }"#;

    #[test]
    fn test_legacy_keys() {
        let config = CompareConfig::from_json(LEGACY).unwrap();
        assert_eq!(config.source.dbname, "sqltests_1");
        assert_eq!(config.source.port, 3306);
        assert_eq!(config.source.pass, "secret");
        assert_eq!(config.target.host, "db.internal");
        assert_eq!(config.target.port, 3307);
    }

    #[test]
    fn test_named_keys() {
        let config = CompareConfig::from_json(
            r#"{
                "source": {"host": "a", "user": "u", "database": "one"},
                "target": {"host": "b", "user": "u", "password": "p", "database": "two"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.source.pass, "");
        assert_eq!(config.target.pass, "p");
        assert_eq!(config.target.dbname, "two");
    }

    #[test]
    fn test_missing_side() {
        let result = CompareConfig::from_json(r#"{"db1": {"host": "a", "user": "u", "dbname": "x"}}"#);
        assert!(matches!(result, Err(DiffError::Serialization(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LEGACY.as_bytes()).unwrap();

        let config = CompareConfig::load(file.path()).unwrap();
        assert_eq!(config.target.dbname, "sqltests_2");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = CompareConfig::load(dir.path().join("nope.json"));
        assert!(matches!(result, Err(DiffError::Io(_))));
    }

    #[test]
    fn test_with_dbname() {
        let config = CompareConfig::from_json(LEGACY).unwrap();
        let other = config.source.with_dbname("information_schema");
        assert_eq!(other.dbname, "information_schema");
        assert_eq!(other.host, config.source.host);
    }
}
