//! oxide-diff CLI
//!
//! Prints the SQL that turns one MySQL database into another.

use std::io::Write;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_diff::prelude::*;

/// Schema and data diffing for MySQL databases.
#[derive(Parser)]
#[command(name = "oxide-diff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file with the two databases (`db1`/`db2` or `source`/`target`).
    #[arg(short, long, env = "OXIDE_DIFF_CONFIG", conflicts_with_all = ["source", "target"])]
    config: Option<PathBuf>,

    /// Source database URL (the database to transform).
    #[arg(long, env = "OXIDE_DIFF_SOURCE", requires = "target")]
    source: Option<String>,

    /// Target database URL (the database to match).
    #[arg(long, env = "OXIDE_DIFF_TARGET", requires = "source")]
    target: Option<String>,

    /// Only emit schema statements.
    #[arg(long, conflicts_with = "data_only")]
    schema_only: bool,

    /// Only emit data statements.
    #[arg(long)]
    data_only: bool,

    /// Create target-only tables empty instead of inserting their rows.
    #[arg(long)]
    no_populate: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> DiffOptions {
        let options = if self.schema_only {
            DiffOptions::schema_only()
        } else if self.data_only {
            DiffOptions::data_only()
        } else {
            DiffOptions::default()
        };
        options.populate_created_tables(!self.no_populate)
    }

    fn connect(&self) -> anyhow::Result<(MySqlSource, MySqlSource)> {
        if let Some(path) = &self.config {
            let config = CompareConfig::load(path)?;
            return Ok((
                MySqlSource::connect(&config.source)?,
                MySqlSource::connect(&config.target)?,
            ));
        }
        match (&self.source, &self.target) {
            (Some(source), Some(target)) => Ok((
                MySqlSource::connect_url(source)?,
                MySqlSource::connect_url(target)?,
            )),
            _ => bail!("either --config or both --source and --target are required"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only SQL.
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let (source, target) = cli.connect()?;
    let source = Database::load(source)?;
    let target = Database::load(target)?;

    let comparator =
        Comparator::new(&source, &target, MySqlDialect::new()).with_options(cli.options());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    for statement in comparator.statements() {
        writeln!(out, "{}", statement?)?;
        count += 1;
    }
    out.flush()?;

    info!(statements = count, "Comparison complete");
    Ok(())
}
