//! Error types emitted by the ridings CLI.
//!
//! Per-feature failures never reach this type; they are part of the reports
//! each command prints.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ridings_core::{SqliteStoreError, StoreError};
use ridings_data::{ImportError, InputError};
use thiserror::Error;

/// Errors emitted by the ridings CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A numeric option is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Flag name.
        field: &'static str,
        /// What is wrong with the value.
        reason: &'static str,
    },
    /// The boundary file could not be read.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The database directory could not be created.
    #[error("failed to prepare database directory for {path}: {source}")]
    PrepareDatabase {
        /// Database location.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Opening the boundary store failed.
    #[error(transparent)]
    OpenStore(#[from] SqliteStoreError),
    /// The import could not finish.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// Reading from the store failed.
    #[error("failed to query boundary store: {0}")]
    Store(#[from] StoreError),
    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}
