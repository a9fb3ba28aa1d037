//! `check-geometry` command: diagnose features without storing them.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use ridings_core::{IdentityResolver, RepairChain, RepairSettings};
use ridings_data::{FeatureDiagnosis, FeatureScope, diagnose_features, read_feature_collection};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ONLY, ARG_REPAIR_TIMEOUT, ARG_TOLERANCE, CliError, ENV_CHECK_GEOMETRY_SOURCE,
    repair_settings, report, require_source,
};

/// CLI arguments for the `check-geometry` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "check-geometry",
    long_about = "Run every repair strategy on the features of a collection \
                 and report which ones produce valid geometry. Useful for \
                 investigating features that fail import.",
    about = "Diagnose boundary geometry"
)]
#[ortho_config(prefix = "RIDINGS")]
pub(crate) struct CheckGeometryArgs {
    /// Path to the GeoJSON feature collection.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) source: Option<Utf8PathBuf>,
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

impl CheckGeometryArgs {
    pub(crate) fn into_config(self) -> Result<CheckGeometryConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CheckGeometryConfig::try_from(merged)
    }
}

/// Resolved `check-geometry` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CheckGeometryConfig {
    pub(crate) source: Utf8PathBuf,
    pub(crate) settings: RepairSettings,
    pub(crate) scope: FeatureScope,
}

impl TryFrom<CheckGeometryArgs> for CheckGeometryConfig {
    type Error = CliError;

    fn try_from(args: CheckGeometryArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            source: require_source(args.source, ENV_CHECK_GEOMETRY_SOURCE)?,
            settings: repair_settings(args.tolerance, args.repair_timeout)?,
            scope: FeatureScope::from_codes(args.only),
        })
    }
}

pub(crate) fn run_check_geometry(
    args: CheckGeometryArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_check_geometry(&config, writer).map(|_| ())
}

pub(crate) fn execute_check_geometry(
    config: &CheckGeometryConfig,
    writer: &mut dyn Write,
) -> Result<Vec<FeatureDiagnosis>, CliError> {
    let features = read_feature_collection(&config.source)?;
    let diagnoses = diagnose_features(
        &features,
        &IdentityResolver::federal(),
        &RepairChain::new(config.settings),
        &config.scope,
    );
    report::write_diagnoses(writer, &diagnoses).map_err(CliError::WriteReport)?;
    Ok(diagnoses)
}
