//! Behaviour-driven step definitions driving the loader command scenarios.

use super::helpers::{MemoryConnector, TEST_DSN, Workspace, run_args};
use super::*;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

/// Aggregates command scenario state so each step only needs a single world
/// argument.
#[derive(Debug)]
struct CommandWorld {
    workspace: Workspace,
    connector: MemoryConnector,
    csv: RefCell<Option<Utf8PathBuf>>,
    outcome: RefCell<Option<(Result<(), CliError>, String)>>,
}

impl CommandWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            connector: MemoryConnector::new(),
            csv: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn run_load_normalized(&self, extra: &[&str]) {
        let csv = self.csv.borrow().clone().expect("export path chosen");
        let mut args = vec!["--dsn", TEST_DSN, "load-normalized", "--csv", csv.as_str()];
        args.extend_from_slice(extra);
        let outcome = run_args(&args, &self.connector);
        self.outcome.replace(Some(outcome));
    }
}

#[fixture]
fn world() -> CommandWorld {
    CommandWorld::new()
}

#[given("a townland export on disk")]
fn export_on_disk(#[from(world)] world: &CommandWorld) {
    let csv = world.workspace.townland_csv();
    world.csv.replace(Some(csv));
}

#[given("no townland export on disk")]
fn export_missing(#[from(world)] world: &CommandWorld) {
    let csv = world.workspace.path("townlands.csv");
    assert!(!csv.exists(), "expected the export to be absent");
    world.csv.replace(Some(csv));
}

#[when("I run load-normalized with the export")]
fn run_with_export(#[from(world)] world: &CommandWorld) {
    world.run_load_normalized(&[]);
}

#[when("I run load-normalized with a batch size of 0")]
fn run_with_zero_batch(#[from(world)] world: &CommandWorld) {
    world.run_load_normalized(&["--batch", "0"]);
}

#[then("the command reports two townlands in one county")]
fn reports_summary(#[from(world)] world: &CommandWorld) {
    let borrowed = world.outcome.borrow();
    let (result, stdout) = borrowed.as_ref().expect("command ran");
    assert!(result.is_ok(), "expected success, found {result:?}");
    assert!(stdout.starts_with("Done. Processed rows: 2. Townlands written: 2."));
    assert!(stdout.contains("Unique counties: 1."));
}

#[then("the command fails with a setup error")]
fn fails_with_setup_error(#[from(world)] world: &CommandWorld) {
    let borrowed = world.outcome.borrow();
    let (result, stdout) = borrowed.as_ref().expect("command ran");
    match result {
        Err(err) => assert_eq!(err.exit_code(), EXIT_SETUP_FAILURE),
        Ok(()) => panic!("expected a setup failure, found success: {stdout}"),
    }
    assert!(stdout.is_empty());
}

#[then("the database is never opened")]
fn database_untouched(#[from(world)] world: &CommandWorld) {
    assert_eq!(world.connector.connections(), 0);
}

macro_rules! register_command_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/load_commands.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CommandWorld) {
            let _ = world;
        }
    };
}

register_command_scenario!(loading_the_export, "loading the townland export");
register_command_scenario!(rejecting_missing_export, "rejecting a missing export");
register_command_scenario!(rejecting_zero_batch, "rejecting a zero batch size");
