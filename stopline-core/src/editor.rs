//! Owns a sequence, routes drag events to the engine and writes results
//! through a [`RouteStore`].
//!
//! Edits are optimistic: the in-memory sequence is mutated first and the
//! store is called afterwards. A failed write is reported as
//! [`EditError::Persist`] but the local change stays applied; reconciling
//! with the backing service is left to the caller.

use log::warn;
use thiserror::Error;

use crate::leg::{Leg, LegType, OrderId};
use crate::merge::LegDrag;
use crate::mutate::{self, LegMoveOutcome, LegRemoval, MutationReport};
use crate::reorder::{PositionMapping, move_stop};
use crate::sequence::Sequence;
use crate::session::{DragError, DragEvent, DragSession, DropPreview, Dragged};
use crate::stop::Stop;
use crate::store::{RouteStore, RouteStoreError};

/// Result of an edit that reached the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing changed.
    NoOp,
    /// The edit was refused by validation; nothing changed.
    Rejected,
    /// A stop moved.
    StopMoved(PositionMapping),
    /// A leg joined an existing stop.
    LegMerged(MutationReport),
    /// A leg was given a new stop.
    LegCreated(MutationReport),
    /// A leg left the sequence.
    LegRemoved(LegRemoval),
}

impl EditOutcome {
    /// Whether the sequence changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::NoOp | Self::Rejected)
    }
}

impl From<LegMoveOutcome> for EditOutcome {
    fn from(outcome: LegMoveOutcome) -> Self {
        match outcome {
            LegMoveOutcome::NoOp => Self::NoOp,
            LegMoveOutcome::Rejected => Self::Rejected,
            LegMoveOutcome::Merged(report) => Self::LegMerged(report),
            LegMoveOutcome::Created(report) => Self::LegCreated(report),
        }
    }
}

/// Reply to a [`DragEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorResponse {
    /// A drag began.
    Started,
    /// Hover feedback for the current target.
    Preview(DropPreview),
    /// The drop was processed.
    Dropped(EditOutcome),
    /// The drag ended without a drop.
    Ended,
}

/// Errors from [`RouteEditor`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The event did not fit the drag protocol.
    #[error(transparent)]
    Drag(#[from] DragError),
    /// The local edit was applied but writing it to the store failed.
    #[error("edit applied locally but not persisted: {source}")]
    Persist {
        /// The edit that is now in the local sequence.
        outcome: Box<EditOutcome>,
        /// Store failure.
        #[source]
        source: RouteStoreError,
    },
}

/// Editing front end for one route.
///
/// # Examples
///
/// ```
/// use stopline_core::merge::LegDrag;
/// use stopline_core::{
///     DragEvent, EditOutcome, EditorResponse, Leg, LegPlacement, LegType,
///     OrderId, PositionChange, RouteEditor, RouteStore, RouteStoreError, Sequence, Stop,
/// };
///
/// struct NullStore;
///
/// impl RouteStore for NullStore {
///     fn reposition_stops(&self, _: &[PositionChange]) -> Result<(), RouteStoreError> { Ok(()) }
///     fn reposition_legs(&self, _: &[LegPlacement]) -> Result<(), RouteStoreError> { Ok(()) }
///     fn detach_leg(&self, _: &OrderId, _: LegType) -> Result<(), RouteStoreError> { Ok(()) }
/// }
///
/// let sequence = Sequence::from_stops(vec![
///     Stop::from_leg(Leg::new("O1", LegType::Pickup).with_order_customer("C1")),
///     Stop::from_leg(Leg::new("O2", LegType::Pickup).with_order_customer("C2")),
/// ]);
/// let mut editor = RouteEditor::new(sequence, NullStore);
/// editor.handle(DragEvent::StartStop { index: 1 })?;
/// let response = editor.handle(DragEvent::Drop { target_index: 0 })?;
/// assert!(matches!(response, EditorResponse::Dropped(EditOutcome::StopMoved(_))));
/// # Ok::<(), stopline_core::EditError>(())
/// ```
#[derive(Debug)]
pub struct RouteEditor<S> {
    sequence: Sequence,
    session: DragSession,
    store: S,
}

impl<S: RouteStore> RouteEditor<S> {
    /// Edit `sequence`, persisting through `store`.
    pub fn new(sequence: Sequence, store: S) -> Self {
        Self {
            sequence,
            session: DragSession::new(),
            store,
        }
    }

    /// Current sequence.
    #[must_use]
    pub const fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Current drag state.
    #[must_use]
    pub const fn session(&self) -> &DragSession {
        &self.session
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the editor, returning the sequence.
    #[must_use]
    pub fn into_sequence(self) -> Sequence {
        self.sequence
    }

    /// Process one drag event.
    ///
    /// A drop always ends the drag, whatever its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Drag`] for events that do not fit the current
    /// drag state and [`EditError::Persist`] when an applied drop could not
    /// be written to the store.
    pub fn handle(&mut self, event: DragEvent) -> Result<EditorResponse, EditError> {
        match event {
            DragEvent::StartLeg(drag) => {
                self.session.start(Dragged::Leg(drag))?;
                Ok(EditorResponse::Started)
            }
            DragEvent::StartStop { index } => {
                self.session.start(Dragged::Stop { index })?;
                Ok(EditorResponse::Started)
            }
            DragEvent::Enter { target_index } => Ok(EditorResponse::Preview(
                self.session.enter(target_index, &self.sequence)?,
            )),
            DragEvent::Drop { target_index } => {
                let outcome = match self.session.take_for_drop()? {
                    Dragged::Stop { index } => self.move_stop(index, target_index)?,
                    Dragged::Leg(drag) => self.move_leg(&drag, target_index)?,
                };
                Ok(EditorResponse::Dropped(outcome))
            }
            DragEvent::End => {
                self.session.end();
                Ok(EditorResponse::Ended)
            }
        }
    }

    /// Move the stop at `source_index` to `target_index`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Persist`] when the store rejects the new
    /// positions; the move stays applied.
    pub fn move_stop(
        &mut self,
        source_index: usize,
        target_index: usize,
    ) -> Result<EditOutcome, EditError> {
        let outcome = match move_stop(&mut self.sequence, source_index, target_index) {
            None => EditOutcome::Rejected,
            Some(mapping) if mapping.is_identity() => EditOutcome::NoOp,
            Some(mapping) => EditOutcome::StopMoved(mapping),
        };
        self.persist(outcome)
    }

    /// Drop a routed leg at `target_index`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Persist`] when the store rejects the new leg
    /// positions; the move stays applied.
    pub fn move_leg(
        &mut self,
        drag: &LegDrag,
        target_index: usize,
    ) -> Result<EditOutcome, EditError> {
        let outcome = mutate::move_leg(&mut self.sequence, drag, target_index);
        self.persist(outcome.into())
    }

    /// Route a leg that is not in the sequence yet.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Persist`] when the store rejects the new leg
    /// positions; the insertion stays applied.
    pub fn insert_leg(
        &mut self,
        leg: Leg,
        target_index: usize,
        force_separate: bool,
    ) -> Result<EditOutcome, EditError> {
        let outcome = mutate::insert_leg(&mut self.sequence, leg, target_index, force_separate);
        self.persist(outcome.into())
    }

    /// Take a leg out of the sequence and mark it unrouted.
    ///
    /// Removing a leg that is not routed is rejected without calling the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Persist`] when the store rejects the change; the
    /// removal stays applied.
    pub fn remove_leg(
        &mut self,
        order_id: &OrderId,
        leg_type: LegType,
    ) -> Result<EditOutcome, EditError> {
        let outcome = mutate::remove_leg(&mut self.sequence, order_id, leg_type)
            .map_or(EditOutcome::Rejected, EditOutcome::LegRemoved);
        self.persist(outcome)
    }

    /// Install a fresh snapshot from the upstream route source.
    ///
    /// Any drag in progress is cancelled, since its indices referred to the
    /// old snapshot. Returns the stops that were replaced.
    pub fn replace_sequence(&mut self, stops: Vec<Stop>) -> Vec<Stop> {
        self.session.end();
        self.sequence.replace(stops)
    }

    fn persist(&self, outcome: EditOutcome) -> Result<EditOutcome, EditError> {
        match self.write(&outcome) {
            Ok(()) => Ok(outcome),
            Err(source) => {
                warn!("failed to persist route edit: {source}");
                Err(EditError::Persist {
                    outcome: Box::new(outcome),
                    source,
                })
            }
        }
    }

    fn write(&self, outcome: &EditOutcome) -> Result<(), RouteStoreError> {
        match outcome {
            EditOutcome::NoOp | EditOutcome::Rejected => Ok(()),
            EditOutcome::StopMoved(mapping) => {
                let changes: Vec<_> = mapping.changed().cloned().collect();
                self.store.reposition_stops(&changes)
            }
            EditOutcome::LegMerged(report) | EditOutcome::LegCreated(report) => {
                self.store.reposition_legs(&report.placements)
            }
            EditOutcome::LegRemoved(removal) => {
                self.store
                    .detach_leg(&removal.leg.order_id, removal.leg.leg_type)?;
                if removal.report.placements.is_empty() {
                    Ok(())
                } else {
                    self.store.reposition_legs(&removal.report.placements)
                }
            }
        }
    }
}
