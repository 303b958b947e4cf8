//! Loading sequences, applying edits and reporting the result.

use std::io::{BufReader, Write};

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use log::{debug, info, warn};
use serde::Serialize;
use stopline_core::{
    EditError, EditOutcome, LegPlacement, LegType, OrderId, PositionChange, RouteEditor,
    RouteStore, RouteStoreError, Sequence, Stop,
};
use stopline_data::remote::{HttpRouteStore, HttpRouteStoreConfig};

use crate::CliError;
use crate::args::{CheckConfig, EditConfig, EditRequest, StoreConfig};

/// Builds the route store an edit is persisted through.
pub(crate) trait RouteStoreBuilder {
    fn build(&self, config: &StoreConfig) -> Result<Box<dyn RouteStore>, CliError>;
}

pub(crate) struct DefaultRouteStoreBuilder;

impl RouteStoreBuilder for DefaultRouteStoreBuilder {
    fn build(&self, config: &StoreConfig) -> Result<Box<dyn RouteStore>, CliError> {
        let store_config =
            HttpRouteStoreConfig::new(config.base_url.clone()).with_route_id(config.route_id.clone());
        let store =
            HttpRouteStore::with_config(store_config).map_err(|source| CliError::BuildRouteStore {
                base_url: config.base_url.clone(),
                source,
            })?;
        Ok(Box::new(store))
    }
}

/// Accepts every write without sending it anywhere.
struct OfflineStore;

impl RouteStore for OfflineStore {
    fn reposition_stops(&self, _changes: &[PositionChange]) -> Result<(), RouteStoreError> {
        Ok(())
    }

    fn reposition_legs(&self, _placements: &[LegPlacement]) -> Result<(), RouteStoreError> {
        Ok(())
    }

    fn detach_leg(&self, _order_id: &OrderId, _leg_type: LegType) -> Result<(), RouteStoreError> {
        Ok(())
    }
}

/// How the command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OutcomeKind {
    Valid,
    NoOp,
    StopMoved,
    LegMerged,
    LegCreated,
    LegRemoved,
}

/// Writes the route service receives for an applied edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum PersistenceRecord {
    StopPositions {
        changes: Vec<PositionChange>,
    },
    LegPositions {
        legs: Vec<LegPlacement>,
    },
    Unroute {
        order_id: OrderId,
        leg_type: LegType,
        legs: Vec<LegPlacement>,
    },
}

impl PersistenceRecord {
    fn from_outcome(outcome: &EditOutcome) -> Option<Self> {
        match outcome {
            EditOutcome::NoOp | EditOutcome::Rejected => None,
            EditOutcome::StopMoved(mapping) => Some(Self::StopPositions {
                changes: mapping.changed().cloned().collect(),
            }),
            EditOutcome::LegMerged(report) | EditOutcome::LegCreated(report) => {
                Some(Self::LegPositions {
                    legs: report.placements.clone(),
                })
            }
            EditOutcome::LegRemoved(removal) => Some(Self::Unroute {
                order_id: removal.leg.order_id.clone(),
                leg_type: removal.leg.leg_type,
                legs: removal.report.placements.clone(),
            }),
        }
    }
}

/// Document printed by every subcommand.
#[derive(Debug, Serialize)]
pub(crate) struct CommandOutput<'a> {
    pub(crate) outcome: OutcomeKind,
    pub(crate) persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) record: Option<PersistenceRecord>,
    pub(crate) sequence: &'a Sequence,
}

pub(super) fn run_check(config: &CheckConfig) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_check_with(config, &mut stdout)
}

pub(super) fn run_check_with(config: &CheckConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let sequence = load_sequence(&config.sequence_path)?;
    info!(
        "{} holds a valid sequence of {} stops",
        config.sequence_path,
        sequence.len()
    );
    write_output(
        writer,
        &CommandOutput {
            outcome: OutcomeKind::Valid,
            persisted: false,
            record: None,
            sequence: &sequence,
        },
    )
}

pub(super) fn run_edit(config: &EditConfig) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let builder = DefaultRouteStoreBuilder;
    run_edit_with(config, &builder, &mut stdout)
}

pub(super) fn run_edit_with(
    config: &EditConfig,
    builder: &dyn RouteStoreBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let sequence = load_sequence(&config.sequence_path)?;
    let store: Box<dyn RouteStore> = match &config.store {
        Some(store_config) => builder.build(store_config)?,
        None => Box::new(OfflineStore),
    };
    let mut editor = RouteEditor::new(sequence, store.as_ref());
    let (outcome, failure) = match apply(&mut editor, &config.request) {
        Ok(outcome) => (outcome, None),
        Err(EditError::Persist { outcome, source }) => (*outcome, Some(source)),
        Err(err @ EditError::Drag(_)) => return Err(CliError::Edit(err)),
    };

    let kind = match &outcome {
        EditOutcome::Rejected => {
            return Err(CliError::EditRejected {
                action: config.request.action(),
            });
        }
        EditOutcome::NoOp => OutcomeKind::NoOp,
        EditOutcome::StopMoved(_) => OutcomeKind::StopMoved,
        EditOutcome::LegMerged(_) => OutcomeKind::LegMerged,
        EditOutcome::LegCreated(_) => OutcomeKind::LegCreated,
        EditOutcome::LegRemoved(_) => OutcomeKind::LegRemoved,
    };
    let persisted = config.store.is_some() && failure.is_none() && outcome.is_applied();
    debug!("{} finished as {kind:?} (persisted: {persisted})", config.request.action());

    write_output(
        writer,
        &CommandOutput {
            outcome: kind,
            persisted,
            record: PersistenceRecord::from_outcome(&outcome),
            sequence: editor.sequence(),
        },
    )?;
    failure.map_or(Ok(()), |source| Err(CliError::Persist(source)))
}

fn apply<S: RouteStore>(
    editor: &mut RouteEditor<S>,
    request: &EditRequest,
) -> Result<EditOutcome, EditError> {
    match request {
        EditRequest::MoveStop { from, to } => editor.move_stop(*from, *to),
        EditRequest::MoveLeg { drag, to } => editor.move_leg(drag, *to),
        EditRequest::RemoveLeg { order_id, leg_type } => editor.remove_leg(order_id, *leg_type),
    }
}

/// Loads a JSON stop list from disk and checks its invariants.
///
/// Positions recorded in the file are ignored; stops are renumbered in list
/// order before validation.
pub(super) fn load_sequence(path: &Utf8Path) -> Result<Sequence, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::OpenSequence {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let reader = BufReader::new(file);
    let stops: Vec<Stop> =
        serde_json::from_reader(reader).map_err(|source| CliError::ParseSequence {
            path: path.to_path_buf(),
            source,
        })?;
    let sequence = Sequence::from_stops(stops);
    if let Err(source) = sequence.check_invariants() {
        warn!("rejecting sequence loaded from {path}: {source}");
        return Err(CliError::InvalidSequence {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(sequence)
}

fn write_output(writer: &mut dyn Write, output: &CommandOutput<'_>) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(output).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
