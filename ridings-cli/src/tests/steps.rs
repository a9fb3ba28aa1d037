//! Behavioural coverage for the CLI commands.

use super::helpers::{Workspace, output_text};
use super::*;
use crate::import::{ImportArgs, run_import};
use crate::missing::{FindMissingArgs, run_find_missing};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

struct CommandWorld {
    workspace: Workspace,
    source: RefCell<Option<Utf8PathBuf>>,
    import: RefCell<Option<Result<String, CliError>>>,
    missing: RefCell<Option<String>>,
}

impl CommandWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            source: RefCell::new(None),
            import: RefCell::new(None),
            missing: RefCell::new(None),
        }
    }

    fn import_output(&self) -> String {
        match self.import.borrow().as_ref() {
            Some(Ok(text)) => text.clone(),
            Some(Err(err)) => panic!("import failed: {err}"),
            None => panic!("import has not run"),
        }
    }
}

#[fixture]
fn command_world() -> CommandWorld {
    CommandWorld::new()
}

#[given("a boundary collection with an unrepairable feature")]
fn collection(#[from(command_world)] world: &CommandWorld) {
    world.source.replace(Some(world.workspace.source()));
}

#[given("no source path is configured")]
fn no_source(#[from(command_world)] world: &CommandWorld) {
    world.source.replace(None);
}

#[when("I run the import command")]
fn run_import_command(#[from(command_world)] world: &CommandWorld) {
    let args = ImportArgs {
        source: world.source.borrow().clone(),
        database: Some(world.workspace.database()),
        ..ImportArgs::default()
    };
    let mut output: Vec<u8> = Vec::new();
    let outcome = run_import(args, &mut output).map(|()| output_text(output));
    world.import.replace(Some(outcome));
}

#[when("I run the find-missing command")]
fn run_find_missing_command(#[from(command_world)] world: &CommandWorld) {
    let args = FindMissingArgs {
        source: world.source.borrow().clone(),
        database: Some(world.workspace.database()),
        statement_timeout: None,
    };
    let mut output: Vec<u8> = Vec::new();
    run_find_missing(args, &mut output).expect("find-missing should succeed");
    world.missing.replace(Some(output_text(output)));
}

#[then("the import summary lists one failed feature")]
fn import_summary(#[from(command_world)] world: &CommandWorld) {
    let text = world.import_output();
    assert!(text.contains("  failed: 1\n"), "{text}");
    assert!(text.contains("  boundaries in store: 2\n"), "{text}");
}

#[then("the missing report lists only the unrepairable feature")]
fn missing_report(#[from(command_world)] world: &CommandWorld) {
    let text = world.missing.borrow().clone().expect("find-missing has run");
    assert!(text.contains("Missing boundaries: 1 of 4"), "{text}");
    assert!(text.contains("  Broken Riding, Quebec [24001]\n"), "{text}");
    assert!(!text.contains("  Bowtie Riding"), "{text}");
}

#[then("the command fails because the source is missing")]
fn source_missing(#[from(command_world)] world: &CommandWorld) {
    let outcome = world.import.borrow();
    match outcome.as_ref() {
        Some(Err(CliError::MissingArgument { field, env })) => {
            assert_eq!(*field, ARG_SOURCE);
            assert_eq!(*env, ENV_IMPORT_SOURCE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
    assert!(!world.workspace.database().is_file());
}

#[scenario(path = "tests/features/commands.feature", index = 0)]
fn import_then_find_missing(#[from(command_world)] world: CommandWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/commands.feature", index = 1)]
fn import_requires_source(#[from(command_world)] world: CommandWorld) {
    let _ = world;
}
