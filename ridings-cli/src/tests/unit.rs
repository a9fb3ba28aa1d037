//! Focused unit tests covering configuration resolution.

use super::*;
use crate::check::{CheckGeometryArgs, CheckGeometryConfig};
use crate::import::{ImportArgs, ImportConfig, config_from_layers_for_test};
use crate::missing::{FindMissingArgs, FindMissingConfig};
use ridings_core::{DEFAULT_STATEMENT_TIMEOUT, DEFAULT_SIMPLIFY_TOLERANCE};
use ridings_data::FeatureScope;
use rstest::rstest;

#[rstest]
fn import_without_source_errors() {
    let err = ImportConfig::try_from(ImportArgs::default()).expect_err("missing source should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_SOURCE);
            assert_eq!(env, ENV_IMPORT_SOURCE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case::find_missing(
    FindMissingConfig::try_from(FindMissingArgs::default()).map(|_| ()),
    ENV_FIND_MISSING_SOURCE
)]
#[case::check_geometry(
    CheckGeometryConfig::try_from(CheckGeometryArgs::default()).map(|_| ()),
    ENV_CHECK_GEOMETRY_SOURCE
)]
fn other_commands_name_their_source_variable(
    #[case] outcome: Result<(), CliError>,
    #[case] expected_env: &'static str,
) {
    match outcome {
        Err(CliError::MissingArgument { env, .. }) => assert_eq!(env, expected_env),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn import_defaults_fill_the_store_and_repair_settings() {
    let args = ImportArgs {
        source: Some(Utf8PathBuf::from("ridings.geojson")),
        ..ImportArgs::default()
    };
    let config = ImportConfig::try_from(args).expect("config should build");
    assert_eq!(config.store.path().as_str(), DEFAULT_DATABASE);
    assert_eq!(config.store.statement_timeout(), Some(DEFAULT_STATEMENT_TIMEOUT));
    assert!((config.settings.tolerance - DEFAULT_SIMPLIFY_TOLERANCE).abs() < f64::EPSILON);
    assert_eq!(config.settings.deadline, None);
    assert_eq!(config.scope, FeatureScope::All);
}

#[rstest]
fn import_options_are_applied() {
    let args = ImportArgs {
        source: Some(Utf8PathBuf::from("ridings.geojson")),
        database: Some(Utf8PathBuf::from("data/boundaries.db")),
        statement_timeout: Some(0),
        repair_timeout: Some(30),
        tolerance: Some(0.01),
        only: vec!["35082".to_owned(), "62001".to_owned()],
    };
    let config = ImportConfig::try_from(args).expect("config should build");
    assert_eq!(config.store.path().as_str(), "data/boundaries.db");
    assert_eq!(config.store.statement_timeout(), None);
    assert_eq!(config.settings.deadline, Some(Duration::from_secs(30)));
    assert!((config.settings.tolerance - 0.01).abs() < f64::EPSILON);
    assert_eq!(config.scope, FeatureScope::from_codes(["35082", "62001"]));
}

#[rstest]
#[case(Some(-0.5), None, ARG_TOLERANCE)]
#[case(Some(f64::NAN), None, ARG_TOLERANCE)]
#[case(None, Some(0), ARG_REPAIR_TIMEOUT)]
fn invalid_repair_options_are_rejected(
    #[case] tolerance: Option<f64>,
    #[case] repair_timeout: Option<u64>,
    #[case] expected: &'static str,
) {
    let err = repair_settings(tolerance, repair_timeout).expect_err("invalid option");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "source": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": "from-file.db",
            "tolerance": 0.5,
        }),
        None,
    );
    composer.push_environment(json!({
        "source": "from-env.geojson",
        "database": "from-env.db",
    }));
    composer.push_cli(json!({
        "database": "from-cli.db",
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.source.as_str(), "from-env.geojson");
    assert_eq!(config.store.path().as_str(), "from-cli.db");
    assert!((config.settings.tolerance - 0.5).abs() < f64::EPSILON);
}
