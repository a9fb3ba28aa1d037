//! `find-missing` command: compare a collection with the store.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridings_core::{IdentityResolver, StoreConfig};
use ridings_data::{MissingReport, find_missing, read_feature_collection};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_STATEMENT_TIMEOUT, CliError, ENV_FIND_MISSING_SOURCE, open_existing_store,
    report, require_source, store_config,
};

/// CLI arguments for the `find-missing` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "find-missing",
    long_about = "List boundaries of a feature collection that are absent \
                 from the store. Stored boundaries in the same province with \
                 a similar name are shown as candidates; nothing is changed \
                 and the database must already exist.",
    about = "Report boundaries missing from the store"
)]
#[ortho_config(prefix = "RIDINGS")]
pub(crate) struct FindMissingArgs {
    /// Path to the GeoJSON feature collection.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
    /// SQLite database holding the boundaries.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Per-statement deadline in seconds; 0 disables it.
    #[arg(long = ARG_STATEMENT_TIMEOUT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) statement_timeout: Option<u64>,
}

impl FindMissingArgs {
    pub(crate) fn into_config(self) -> Result<FindMissingConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FindMissingConfig::try_from(merged)
    }
}

/// Resolved `find-missing` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FindMissingConfig {
    pub(crate) source: Utf8PathBuf,
    pub(crate) store: StoreConfig,
}

impl TryFrom<FindMissingArgs> for FindMissingConfig {
    type Error = CliError;

    fn try_from(args: FindMissingArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            source: require_source(args.source, ENV_FIND_MISSING_SOURCE)?,
            store: store_config(args.database, args.statement_timeout),
        })
    }
}

pub(crate) fn run_find_missing(args: FindMissingArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_find_missing(&config, writer).map(|_| ())
}

pub(crate) fn execute_find_missing(
    config: &FindMissingConfig,
    writer: &mut dyn Write,
) -> Result<MissingReport, CliError> {
    let features = read_feature_collection(&config.source)?;
    let store = open_existing_store(&config.store)?;
    let missing = find_missing(&features, &store, &IdentityResolver::federal())?;
    report::write_missing_report(writer, &missing).map_err(CliError::WriteReport)?;
    Ok(missing)
}
