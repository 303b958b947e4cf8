//! Command-line interface for editing stop sequences offline.
//!
//! Each subcommand reads a JSON sequence snapshot, applies one edit through
//! [`stopline_core::RouteEditor`] and prints the resulting sequence with the
//! record of what was (or would be) written to the route service. Passing
//! `--store-url`/`--route-id` (or their `STOPLINE_CMDS_*` environment
//! equivalents) persists the edit through
//! [`stopline_data::remote::HttpRouteStore`].
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod args;
mod edit;
mod error;

pub use error::CliError;

use args::{CheckArgs, MoveLegArgs, MoveStopArgs, RemoveLegArgs};
use edit::{run_check, run_edit};

const ARG_SEQUENCE: &str = "sequence";
const ARG_FROM: &str = "from";
const ARG_TO: &str = "to";
const ARG_ORDER: &str = "order";
const ARG_LEG: &str = "leg";
const ARG_SEPARATE: &str = "separate";
const ARG_STORE_URL: &str = "store-url";
const ARG_ROUTE_ID: &str = "route-id";

const ENV_CHECK_SEQUENCE: &str = "STOPLINE_CMDS_CHECK_SEQUENCE_PATH";
const ENV_MOVE_STOP_SEQUENCE: &str = "STOPLINE_CMDS_MOVE_STOP_SEQUENCE_PATH";
const ENV_MOVE_STOP_FROM: &str = "STOPLINE_CMDS_MOVE_STOP_FROM";
const ENV_MOVE_STOP_TO: &str = "STOPLINE_CMDS_MOVE_STOP_TO";
const ENV_MOVE_STOP_ROUTE_ID: &str = "STOPLINE_CMDS_MOVE_STOP_ROUTE_ID";
const ENV_MOVE_LEG_SEQUENCE: &str = "STOPLINE_CMDS_MOVE_LEG_SEQUENCE_PATH";
const ENV_MOVE_LEG_ORDER: &str = "STOPLINE_CMDS_MOVE_LEG_ORDER";
const ENV_MOVE_LEG_LEG: &str = "STOPLINE_CMDS_MOVE_LEG_LEG";
const ENV_MOVE_LEG_TO: &str = "STOPLINE_CMDS_MOVE_LEG_TO";
const ENV_MOVE_LEG_ROUTE_ID: &str = "STOPLINE_CMDS_MOVE_LEG_ROUTE_ID";
const ENV_REMOVE_LEG_SEQUENCE: &str = "STOPLINE_CMDS_REMOVE_LEG_SEQUENCE_PATH";
const ENV_REMOVE_LEG_ORDER: &str = "STOPLINE_CMDS_REMOVE_LEG_ORDER";
const ENV_REMOVE_LEG_LEG: &str = "STOPLINE_CMDS_REMOVE_LEG_LEG";
const ENV_REMOVE_LEG_ROUTE_ID: &str = "STOPLINE_CMDS_REMOVE_LEG_ROUTE_ID";

/// Run the stopline CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when arguments or configuration are invalid, the
/// sequence cannot be loaded, the edit is refused or persisting it fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Check(args) => run_check(&args.into_config()?),
        Command::MoveStop(args) => run_edit(&args.into_config()?),
        Command::MoveLeg(args) => run_edit(&args.into_config()?),
        Command::RemoveLeg(args) => run_edit(&args.into_config()?),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "stopline",
    about = "Inspect and edit precedence-constrained stop sequences",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a sequence snapshot.
    Check(CheckArgs),
    /// Move a whole stop to another slot.
    MoveStop(MoveStopArgs),
    /// Move one pickup or delivery leg to another stop or a new one.
    MoveLeg(MoveLegArgs),
    /// Take a leg out of the sequence.
    RemoveLeg(RemoveLegArgs),
}

#[cfg(test)]
mod tests;
