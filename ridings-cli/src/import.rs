//! `import` command: repair and store a boundary collection.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridings_core::{RepairSettings, StoreConfig};
use ridings_data::{FeatureScope, ImportReport, Importer, read_feature_collection};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATABASE, ARG_ONLY, ARG_REPAIR_TIMEOUT, ARG_STATEMENT_TIMEOUT, ARG_TOLERANCE, CliError,
    ENV_IMPORT_SOURCE, open_store, repair_settings, report, require_source, store_config,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Resolve, repair and store every boundary of a feature \
                 collection. Features that cannot be repaired or stored are \
                 skipped and listed in the summary.",
    about = "Import a boundary feature collection"
)]
#[ortho_config(prefix = "RIDINGS")]
pub(crate) struct ImportArgs {
    /// Path to the GeoJSON feature collection.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
    /// SQLite database receiving the boundaries.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Per-statement deadline in seconds; 0 disables it.
    #[arg(long = ARG_STATEMENT_TIMEOUT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) statement_timeout: Option<u64>,
    /// Per-feature repair deadline in seconds.
    #[arg(long = ARG_REPAIR_TIMEOUT, value_name = "seconds")]
    #[serde(default)]
    pub(crate) repair_timeout: Option<u64>,
    /// Simplification tolerance in degrees.
    #[arg(long = ARG_TOLERANCE, value_name = "degrees")]
    #[serde(default)]
    pub(crate) tolerance: Option<f64>,
    /// Restrict the run to these source codes (comma separated).
    #[arg(long = ARG_ONLY, value_name = "codes", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) only: Vec<String>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImportConfig {
    pub(crate) source: Utf8PathBuf,
    pub(crate) store: StoreConfig,
    pub(crate) settings: RepairSettings,
    pub(crate) scope: FeatureScope,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let source = require_source(args.source, ENV_IMPORT_SOURCE)?;
        Ok(Self {
            source,
            store: store_config(args.database, args.statement_timeout),
            settings: repair_settings(args.tolerance, args.repair_timeout)?,
            scope: FeatureScope::from_codes(args.only),
        })
    }
}

pub(crate) fn run_import(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_import(&config, writer).map(|_| ())
}

pub(crate) fn execute_import(
    config: &ImportConfig,
    writer: &mut dyn Write,
) -> Result<ImportReport, CliError> {
    let features = read_feature_collection(&config.source)?;
    let mut store = open_store(&config.store)?;
    info!("importing {} into {}", config.source, config.store.path());
    let report = Importer::new(config.settings)
        .with_scope(config.scope.clone())
        .import(&features, &mut store)?;
    report::write_import_report(writer, &report).map_err(CliError::WriteReport)?;
    Ok(report)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ImportConfig, CliError> {
    let merged = ImportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ImportConfig::try_from(merged)
}
