//! Subcommand arguments and the configuration they resolve to.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use stopline_core::{LegDrag, LegType, OrderId};
use stopline_data::remote::HttpRouteStoreConfig;

use crate::{
    ARG_FROM, ARG_LEG, ARG_ORDER, ARG_ROUTE_ID, ARG_SEPARATE, ARG_SEQUENCE, ARG_STORE_URL, ARG_TO,
    CliError, ENV_CHECK_SEQUENCE, ENV_MOVE_LEG_LEG, ENV_MOVE_LEG_ORDER, ENV_MOVE_LEG_ROUTE_ID,
    ENV_MOVE_LEG_SEQUENCE, ENV_MOVE_LEG_TO, ENV_MOVE_STOP_FROM, ENV_MOVE_STOP_ROUTE_ID,
    ENV_MOVE_STOP_SEQUENCE, ENV_MOVE_STOP_TO, ENV_REMOVE_LEG_LEG, ENV_REMOVE_LEG_ORDER,
    ENV_REMOVE_LEG_ROUTE_ID, ENV_REMOVE_LEG_SEQUENCE,
};

/// CLI arguments for the `check` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "check",
    long_about = "Load a JSON sequence snapshot and verify that every stop \
                 holds at least one leg, no leg is listed twice and every \
                 pickup comes before its delivery.",
    about = "Validate a sequence snapshot"
)]
#[ortho_config(prefix = "STOPLINE")]
pub(crate) struct CheckArgs {
    /// Path to a JSON file holding the stop list.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) sequence_path: Option<Utf8PathBuf>,
}

impl CheckArgs {
    pub(crate) fn into_config(self) -> Result<CheckConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CheckConfig::try_from(merged)
    }
}

/// Resolved `check` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckConfig {
    pub(crate) sequence_path: Utf8PathBuf,
}

impl TryFrom<CheckArgs> for CheckConfig {
    type Error = CliError;

    fn try_from(args: CheckArgs) -> Result<Self, Self::Error> {
        let sequence_path = args.sequence_path.ok_or(CliError::MissingArgument {
            field: ARG_SEQUENCE,
            env: ENV_CHECK_SEQUENCE,
        })?;
        Ok(Self { sequence_path })
    }
}

/// CLI arguments for the `move-stop` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "move-stop",
    long_about = "Move the stop at a zero-based index to another slot. The \
                 move is refused when it would put a delivery ahead of its \
                 pickup.",
    about = "Move a whole stop"
)]
#[ortho_config(prefix = "STOPLINE")]
pub(crate) struct MoveStopArgs {
    /// Path to a JSON file holding the stop list.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) sequence_path: Option<Utf8PathBuf>,
    /// Zero-based index of the stop to move.
    #[arg(long = ARG_FROM, value_name = "index")]
    #[serde(default)]
    pub(crate) from: Option<usize>,
    /// Zero-based slot to drop the stop at, counted before the move.
    #[arg(long = ARG_TO, value_name = "index")]
    #[serde(default)]
    pub(crate) to: Option<usize>,
    /// Base URL of the route service to persist the edit to.
    #[arg(long = ARG_STORE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) store_url: Option<String>,
    /// Route the sequence belongs to.
    #[arg(long = ARG_ROUTE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) route_id: Option<String>,
}

impl MoveStopArgs {
    pub(crate) fn into_config(self) -> Result<EditConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        EditConfig::try_from(merged)
    }
}

impl TryFrom<MoveStopArgs> for EditConfig {
    type Error = CliError;

    fn try_from(args: MoveStopArgs) -> Result<Self, Self::Error> {
        let sequence_path = args.sequence_path.ok_or(CliError::MissingArgument {
            field: ARG_SEQUENCE,
            env: ENV_MOVE_STOP_SEQUENCE,
        })?;
        let from = args.from.ok_or(CliError::MissingArgument {
            field: ARG_FROM,
            env: ENV_MOVE_STOP_FROM,
        })?;
        let to = args.to.ok_or(CliError::MissingArgument {
            field: ARG_TO,
            env: ENV_MOVE_STOP_TO,
        })?;
        let store = StoreConfig::resolve(args.store_url, args.route_id, ENV_MOVE_STOP_ROUTE_ID)?;
        Ok(Self {
            sequence_path,
            request: EditRequest::MoveStop { from, to },
            store,
        })
    }
}

/// CLI arguments for the `move-leg` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "move-leg",
    long_about = "Drop a routed pickup or delivery at a zero-based stop \
                 index. The leg joins the stop there when it serves the same \
                 customer; otherwise, or with --separate, it gets a stop of \
                 its own inserted at that index.",
    about = "Move a single leg"
)]
#[ortho_config(prefix = "STOPLINE")]
pub(crate) struct MoveLegArgs {
    /// Path to a JSON file holding the stop list.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) sequence_path: Option<Utf8PathBuf>,
    /// Order whose leg is moved.
    #[arg(long = ARG_ORDER, value_name = "id")]
    #[serde(default)]
    pub(crate) order: Option<String>,
    /// Which leg of the order to move.
    #[arg(long = ARG_LEG, value_name = "pickup|delivery")]
    #[serde(default)]
    pub(crate) leg: Option<LegType>,
    /// Zero-based stop index to drop the leg at.
    #[arg(long = ARG_TO, value_name = "index")]
    #[serde(default)]
    pub(crate) to: Option<usize>,
    /// Never merge into an existing stop.
    #[arg(
        long = ARG_SEPARATE,
        value_name = "bool",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) separate: Option<bool>,
    /// Base URL of the route service to persist the edit to.
    #[arg(long = ARG_STORE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) store_url: Option<String>,
    /// Route the sequence belongs to.
    #[arg(long = ARG_ROUTE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) route_id: Option<String>,
}

impl MoveLegArgs {
    pub(crate) fn into_config(self) -> Result<EditConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        EditConfig::try_from(merged)
    }
}

impl TryFrom<MoveLegArgs> for EditConfig {
    type Error = CliError;

    fn try_from(args: MoveLegArgs) -> Result<Self, Self::Error> {
        let sequence_path = args.sequence_path.ok_or(CliError::MissingArgument {
            field: ARG_SEQUENCE,
            env: ENV_MOVE_LEG_SEQUENCE,
        })?;
        let order = args.order.ok_or(CliError::MissingArgument {
            field: ARG_ORDER,
            env: ENV_MOVE_LEG_ORDER,
        })?;
        let leg_type = args.leg.ok_or(CliError::MissingArgument {
            field: ARG_LEG,
            env: ENV_MOVE_LEG_LEG,
        })?;
        let to = args.to.ok_or(CliError::MissingArgument {
            field: ARG_TO,
            env: ENV_MOVE_LEG_TO,
        })?;
        let mut drag = LegDrag::new(order, leg_type);
        if args.separate.unwrap_or(false) {
            drag = drag.separate();
        }
        let store = StoreConfig::resolve(args.store_url, args.route_id, ENV_MOVE_LEG_ROUTE_ID)?;
        Ok(Self {
            sequence_path,
            request: EditRequest::MoveLeg { drag, to },
            store,
        })
    }
}

/// CLI arguments for the `remove-leg` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "remove-leg",
    long_about = "Take a pickup or delivery out of the sequence. A stop left \
                 without legs is dropped and the stops after it move up.",
    about = "Remove a single leg"
)]
#[ortho_config(prefix = "STOPLINE")]
pub(crate) struct RemoveLegArgs {
    /// Path to a JSON file holding the stop list.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) sequence_path: Option<Utf8PathBuf>,
    /// Order whose leg is removed.
    #[arg(long = ARG_ORDER, value_name = "id")]
    #[serde(default)]
    pub(crate) order: Option<String>,
    /// Which leg of the order to remove.
    #[arg(long = ARG_LEG, value_name = "pickup|delivery")]
    #[serde(default)]
    pub(crate) leg: Option<LegType>,
    /// Base URL of the route service to persist the edit to.
    #[arg(long = ARG_STORE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) store_url: Option<String>,
    /// Route the sequence belongs to.
    #[arg(long = ARG_ROUTE_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) route_id: Option<String>,
}

impl RemoveLegArgs {
    pub(crate) fn into_config(self) -> Result<EditConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        EditConfig::try_from(merged)
    }
}

impl TryFrom<RemoveLegArgs> for EditConfig {
    type Error = CliError;

    fn try_from(args: RemoveLegArgs) -> Result<Self, Self::Error> {
        let sequence_path = args.sequence_path.ok_or(CliError::MissingArgument {
            field: ARG_SEQUENCE,
            env: ENV_REMOVE_LEG_SEQUENCE,
        })?;
        let order = args.order.ok_or(CliError::MissingArgument {
            field: ARG_ORDER,
            env: ENV_REMOVE_LEG_ORDER,
        })?;
        let leg_type = args.leg.ok_or(CliError::MissingArgument {
            field: ARG_LEG,
            env: ENV_REMOVE_LEG_LEG,
        })?;
        let store = StoreConfig::resolve(args.store_url, args.route_id, ENV_REMOVE_LEG_ROUTE_ID)?;
        Ok(Self {
            sequence_path,
            request: EditRequest::RemoveLeg {
                order_id: OrderId::new(order),
                leg_type,
            },
            store,
        })
    }
}

/// One edit to apply to the loaded sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EditRequest {
    MoveStop { from: usize, to: usize },
    MoveLeg { drag: LegDrag, to: usize },
    RemoveLeg { order_id: OrderId, leg_type: LegType },
}

impl EditRequest {
    /// Subcommand name, used in error messages.
    pub(crate) const fn action(&self) -> &'static str {
        match self {
            Self::MoveStop { .. } => "move-stop",
            Self::MoveLeg { .. } => "move-leg",
            Self::RemoveLeg { .. } => "remove-leg",
        }
    }
}

/// Route service to persist an edit to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreConfig {
    pub(crate) base_url: String,
    pub(crate) route_id: String,
}

impl StoreConfig {
    /// Persistence is enabled as soon as either option is set; the route id
    /// is then mandatory and the URL falls back to the store default.
    fn resolve(
        store_url: Option<String>,
        route_id: Option<String>,
        route_env: &'static str,
    ) -> Result<Option<Self>, CliError> {
        if store_url.is_none() && route_id.is_none() {
            return Ok(None);
        }
        let route_id = route_id.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_ID,
            env: route_env,
        })?;
        let base_url = store_url.unwrap_or_else(|| HttpRouteStoreConfig::default().base_url);
        Ok(Some(Self { base_url, route_id }))
    }
}

/// Resolved configuration shared by the editing subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EditConfig {
    /// Path to the JSON sequence snapshot.
    pub(crate) sequence_path: Utf8PathBuf,
    /// Edit to apply.
    pub(crate) request: EditRequest,
    /// Where to persist the edit, if anywhere.
    pub(crate) store: Option<StoreConfig>,
}

#[cfg(test)]
pub(crate) fn move_stop_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<EditConfig, CliError> {
    let merged = MoveStopArgs::merge_from_layers(layers).map_err(CliError::from)?;
    EditConfig::try_from(merged)
}
