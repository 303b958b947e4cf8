//! Behaviour-driven step definitions driving the editing subcommands.

use super::helpers::{RecordingStoreBuilder, SequenceFile, sample_stops};
use super::*;
use crate::edit::{run_check_with, run_edit_with};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use std::cell::RefCell;
use stopline_core::test_support::StoreCall;
use stopline_core::{LegPlacement, LegType, OrderId, RouteStoreError};

#[derive(Debug)]
struct CommandWorld {
    file: SequenceFile,
    builder: RefCell<RecordingStoreBuilder>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl CommandWorld {
    fn new() -> Self {
        Self {
            file: SequenceFile::new(),
            builder: RefCell::new(RecordingStoreBuilder::default()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    /// Run `subcommand` against the world's sequence file with `flags`.
    fn run(&self, subcommand: &str, flags: &[&str]) {
        let mut invocation = vec![
            "stopline".to_owned(),
            subcommand.to_owned(),
            self.file.path().as_str().to_owned(),
        ];
        invocation.extend(flags.iter().map(|flag| (*flag).to_owned()));

        let builder = self.builder.borrow();
        let mut buffer = self.stdout.borrow_mut();
        let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
        let outcome = parsed.and_then(|cli| match cli.command {
            Command::Check(args) => args
                .into_config()
                .and_then(|config| run_check_with(&config, &mut *buffer)),
            Command::MoveStop(args) => args
                .into_config()
                .and_then(|config| run_edit_with(&config, &*builder, &mut *buffer)),
            Command::MoveLeg(args) => args
                .into_config()
                .and_then(|config| run_edit_with(&config, &*builder, &mut *buffer)),
            Command::RemoveLeg(args) => args
                .into_config()
                .and_then(|config| run_edit_with(&config, &*builder, &mut *buffer)),
        });
        self.result.replace(Some(outcome));
    }

    fn output(&self) -> Value {
        serde_json::from_slice(&self.stdout.borrow()).expect("output should be JSON")
    }

    fn expect_success(&self) {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
    }
}

#[fixture]
fn world() -> CommandWorld {
    CommandWorld::new()
}

#[given("a sequence file with stops A, B and C where C delivers the order picked up at A")]
fn sequence_file(#[from(world)] world: &CommandWorld) {
    world.file.write_stops(&sample_stops());
}

#[given("a route service that records writes")]
fn recording_service(#[from(world)] world: &CommandWorld) {
    world.builder.replace(RecordingStoreBuilder::default());
}

#[given("a route service that is unavailable")]
fn unavailable_service(#[from(world)] world: &CommandWorld) {
    world
        .builder
        .replace(RecordingStoreBuilder::failing(RouteStoreError::Network {
            url: "http://localhost:8080/orders/O2/unroute".to_owned(),
            message: "connection refused".to_owned(),
        }));
}

#[when("I check the sequence")]
fn check_sequence(#[from(world)] world: &CommandWorld) {
    world.run("check", &[]);
}

#[when("I move the second stop to the front")]
fn move_second_stop(#[from(world)] world: &CommandWorld) {
    world.run("move-stop", &["--from", "1", "--to", "0"]);
}

#[when("I move the third stop to the front")]
fn move_third_stop(#[from(world)] world: &CommandWorld) {
    world.run("move-stop", &["--from", "2", "--to", "0"]);
}

#[when("I move the pickup of O2 into a stop of its own at the front")]
fn separate_pickup(#[from(world)] world: &CommandWorld) {
    world.run(
        "move-leg",
        &["--order", "O2", "--leg", "pickup", "--to", "0", "--separate"],
    );
}

#[when("I remove the pickup of O2 for route r1")]
fn remove_pickup(#[from(world)] world: &CommandWorld) {
    world.run(
        "remove-leg",
        &["--order", "O2", "--leg", "pickup", "--route-id", "r1"],
    );
}

#[then("the command prints a valid sequence of 3 stops")]
fn prints_valid_sequence(#[from(world)] world: &CommandWorld) {
    world.expect_success();
    let output = world.output();
    assert_eq!(output["outcome"], "valid");
    let positions: Vec<_> = output["sequence"]
        .as_array()
        .expect("sequence should be a list")
        .iter()
        .map(|stop| stop["position"].clone())
        .collect();
    assert_eq!(positions, vec![json!(1), json!(2), json!(3)]);
}

#[then("the output shows stop B first with positions 2 to 1 and 1 to 2")]
fn shows_stop_moved(#[from(world)] world: &CommandWorld) {
    world.expect_success();
    let output = world.output();
    assert_eq!(output["outcome"], "stop_moved");
    assert_eq!(output["persisted"], false);
    assert_eq!(output["sequence"][0]["customer_id"], "B");
    assert_eq!(
        output["record"],
        json!({
            "kind": "stop_positions",
            "changes": [
                {"customer_id": "B", "previous_position": 2, "new_position": 1},
                {"customer_id": "A", "previous_position": 1, "new_position": 2},
            ],
        })
    );
}

#[then("the command is rejected and prints nothing")]
fn command_rejected(#[from(world)] world: &CommandWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::EditRejected { action } => assert_eq!(*action, "move-stop"),
        other => panic!("expected EditRejected, found {other:?}"),
    }
    assert!(world.stdout.borrow().is_empty());
}

#[then("the output records the new stop for O2 and the shifted pickup of O1")]
fn records_new_stop(#[from(world)] world: &CommandWorld) {
    world.expect_success();
    let output = world.output();
    assert_eq!(output["outcome"], "leg_created");
    assert_eq!(
        output["record"],
        json!({
            "kind": "leg_positions",
            "legs": [
                {"order_id": "O2", "leg_type": "pickup", "position": 1},
                {"order_id": "O1", "leg_type": "pickup", "position": 2},
            ],
        })
    );
    assert_eq!(output["sequence"].as_array().map(Vec::len), Some(3));
}

#[then("the route service receives the detach followed by the shifted delivery")]
fn receives_detach_then_delivery(#[from(world)] world: &CommandWorld) {
    world.expect_success();
    let builder = world.builder.borrow();
    let configs = builder.configs.borrow();
    let [config] = configs.as_slice() else {
        panic!("expected one store to be built, got {configs:?}");
    };
    assert_eq!(config.route_id, "r1");
    assert_eq!(config.base_url, "http://localhost:8080");
    assert_eq!(
        builder.store.calls(),
        vec![
            StoreCall::Detach {
                order_id: OrderId::new("O2"),
                leg_type: LegType::Pickup,
            },
            StoreCall::Legs(vec![LegPlacement {
                order_id: OrderId::new("O1"),
                leg_type: LegType::Delivery,
                position: 2,
            }]),
        ]
    );
}

#[then("the output shows the edit as persisted")]
fn shows_persisted(#[from(world)] world: &CommandWorld) {
    let output = world.output();
    assert_eq!(output["outcome"], "leg_removed");
    assert_eq!(output["persisted"], true);
}

#[then("the command fails with a persistence error")]
fn fails_with_persistence_error(#[from(world)] world: &CommandWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    assert!(
        matches!(error, CliError::Persist(RouteStoreError::Network { .. })),
        "expected a persistence error, found {error:?}"
    );
}

#[then("the output shows the edit as not persisted")]
fn shows_not_persisted(#[from(world)] world: &CommandWorld) {
    let output = world.output();
    assert_eq!(output["outcome"], "leg_removed");
    assert_eq!(output["persisted"], false);
    assert_eq!(output["sequence"].as_array().map(Vec::len), Some(2));
}

macro_rules! register_command_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/edit_commands.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CommandWorld) {
            let _ = world;
        }
    };
}

register_command_scenario!(check_valid_sequence, "checking a valid sequence");
register_command_scenario!(move_stop_to_front, "moving a stop to the front");
register_command_scenario!(
    reject_delivery_ahead_of_pickup,
    "refusing to move a delivery ahead of its pickup"
);
register_command_scenario!(separate_leg_stop, "giving a leg a stop of its own");
register_command_scenario!(persist_removed_leg, "persisting a removed leg");
register_command_scenario!(failed_write, "reporting a failed write");
