//! Command-line interface for loading electoral boundaries.
//!
//! Three subcommands share one configuration model: `import` writes a
//! boundary collection into the store, `find-missing` reports source
//! boundaries the store lacks, and `check-geometry` explains why features
//! fail repair. Options can come from CLI flags, configuration files, or
//! `RIDINGS_*` environment variables.
#![forbid(unsafe_code)]

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use ridings_core::{RepairSettings, SqliteBoundaryStore, StoreConfig};

mod check;
mod error;
mod import;
mod missing;
mod report;

pub use error::CliError;

use check::CheckGeometryArgs;
use import::ImportArgs;
use missing::FindMissingArgs;

const ARG_SOURCE: &str = "source";
const ARG_DATABASE: &str = "database";
const ARG_STATEMENT_TIMEOUT: &str = "statement-timeout";
const ARG_REPAIR_TIMEOUT: &str = "repair-timeout";
const ARG_TOLERANCE: &str = "tolerance";
const ARG_ONLY: &str = "only";
const ENV_IMPORT_SOURCE: &str = "RIDINGS_CMDS_IMPORT_SOURCE";
const ENV_FIND_MISSING_SOURCE: &str = "RIDINGS_CMDS_FIND_MISSING_SOURCE";
const ENV_CHECK_GEOMETRY_SOURCE: &str = "RIDINGS_CMDS_CHECK_GEOMETRY_SOURCE";

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "ridings.db";

/// Run the ridings CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Import(args) => import::run_import(args, &mut stdout),
        Command::FindMissing(args) => missing::run_find_missing(args, &mut stdout),
        Command::CheckGeometry(args) => check::run_check_geometry(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ridings",
    about = "Load electoral district boundaries into a spatial store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Repair and store every boundary of a feature collection.
    Import(ImportArgs),
    /// List source boundaries absent from the store, with near matches.
    FindMissing(FindMissingArgs),
    /// Run every repair strategy on features without storing them.
    CheckGeometry(CheckGeometryArgs),
}

fn require_source(source: Option<Utf8PathBuf>, env: &'static str) -> Result<Utf8PathBuf, CliError> {
    source.ok_or(CliError::MissingArgument {
        field: ARG_SOURCE,
        env,
    })
}

/// Seconds of zero disable the statement deadline.
fn store_config(database: Option<Utf8PathBuf>, statement_timeout: Option<u64>) -> StoreConfig {
    let path = database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));
    let config = StoreConfig::new(path);
    match statement_timeout {
        Some(0) => config.with_statement_timeout(None),
        Some(seconds) => config.with_statement_timeout(Some(Duration::from_secs(seconds))),
        None => config,
    }
}

fn repair_settings(
    tolerance: Option<f64>,
    repair_timeout: Option<u64>,
) -> Result<RepairSettings, CliError> {
    let mut settings = RepairSettings::default();
    if let Some(tolerance) = tolerance {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(CliError::InvalidArgument {
                field: ARG_TOLERANCE,
                reason: "tolerance must be a finite, non-negative number of degrees",
            });
        }
        settings = settings.with_tolerance(tolerance);
    }
    match repair_timeout {
        Some(0) => Err(CliError::InvalidArgument {
            field: ARG_REPAIR_TIMEOUT,
            reason: "repair timeout must be at least one second",
        }),
        Some(seconds) => Ok(settings.with_deadline(Duration::from_secs(seconds))),
        None => Ok(settings),
    }
}

fn open_store(config: &StoreConfig) -> Result<SqliteBoundaryStore, CliError> {
    ridings_fs::ensure_parent_dir(config.path()).map_err(|source| CliError::PrepareDatabase {
        path: config.path().to_path_buf(),
        source,
    })?;
    Ok(SqliteBoundaryStore::open(config)?)
}

/// Read-only commands must not conjure an empty store from a mistyped path.
fn open_existing_store(config: &StoreConfig) -> Result<SqliteBoundaryStore, CliError> {
    Ok(SqliteBoundaryStore::open_existing(config)?)
}

#[cfg(test)]
mod tests;
