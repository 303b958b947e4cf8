//! Single-item drag state.
//!
//! A [`DragSession`] holds whatever the user is currently dragging, at most
//! one leg or one stop. It never touches the sequence: hovering produces a
//! [`DropPreview`] from the same validators the mutators use, and dropping
//! hands the dragged item back to the caller to apply.

use log::debug;
use thiserror::Error;

use crate::merge::{LegDrag, MergeDecision, decide};
use crate::precedence::{validate_merge_target, validate_stop_move};
use crate::sequence::Sequence;

/// The item currently in drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dragged {
    /// A leg, identified by order and leg type.
    Leg(LegDrag),
    /// A whole stop, identified by its index when the drag began.
    Stop {
        /// Zero-based index of the stop.
        index: usize,
    },
}

/// Input message driving a [`RouteEditor`](crate::RouteEditor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    /// Begin dragging a leg.
    StartLeg(LegDrag),
    /// Begin dragging the stop at `index`.
    StartStop {
        /// Zero-based index of the stop.
        index: usize,
    },
    /// The dragged item hovers over `target_index`.
    Enter {
        /// Zero-based drop slot; `len` means the end.
        target_index: usize,
    },
    /// The dragged item is released over `target_index`.
    Drop {
        /// Zero-based drop slot; `len` means the end.
        target_index: usize,
    },
    /// The drag ended without a drop.
    End,
}

/// What releasing the dragged item at a target would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPreview {
    /// The item would stay where it is.
    NoOp,
    /// The drop would be refused.
    Rejected,
    /// The leg would join the stop at the target.
    Merge,
    /// The leg would get a stop of its own at the target.
    CreateStop,
    /// The stop would move to the target.
    MoveStop,
}

/// Drag protocol violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    /// A drag is already in progress.
    #[error("a drag is already in progress")]
    AlreadyDragging,
    /// No drag is in progress.
    #[error("no drag is in progress")]
    NotDragging,
}

/// Holds the item in drag, if any.
///
/// # Examples
///
/// ```
/// use stopline_core::merge::LegDrag;
/// use stopline_core::{DragError, DragSession, Dragged, LegType};
///
/// let mut session = DragSession::default();
/// session.start(Dragged::Stop { index: 0 })?;
/// assert_eq!(
///     session.start(Dragged::Leg(LegDrag::new("O1", LegType::Pickup))),
///     Err(DragError::AlreadyDragging)
/// );
/// assert!(session.end().is_some());
/// assert!(!session.is_active());
/// # Ok::<(), DragError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    current: Option<Dragged>,
}

impl DragSession {
    /// An idle session.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Whether something is being dragged.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// The item in drag.
    #[must_use]
    pub const fn current(&self) -> Option<&Dragged> {
        self.current.as_ref()
    }

    /// Begin dragging `item`.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::AlreadyDragging`] when a drag is in progress; the
    /// existing drag is kept.
    pub fn start(&mut self, item: Dragged) -> Result<(), DragError> {
        if self.current.is_some() {
            return Err(DragError::AlreadyDragging);
        }
        debug!("drag started: {item:?}");
        self.current = Some(item);
        Ok(())
    }

    /// Preview dropping the dragged item at `target_index`.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::NotDragging`] when nothing is in drag.
    pub fn enter(&self, target_index: usize, sequence: &Sequence) -> Result<DropPreview, DragError> {
        let item = self.current.as_ref().ok_or(DragError::NotDragging)?;
        Ok(preview(item, target_index, sequence))
    }

    /// Release the dragged item for a drop, ending the drag.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::NotDragging`] when nothing is in drag.
    pub fn take_for_drop(&mut self) -> Result<Dragged, DragError> {
        self.current.take().ok_or(DragError::NotDragging)
    }

    /// End the drag without dropping, returning what was dragged.
    pub fn end(&mut self) -> Option<Dragged> {
        let ended = self.current.take();
        if ended.is_some() {
            debug!("drag ended without drop");
        }
        ended
    }
}

/// What dropping `item` at `target_index` would do to `sequence`.
#[must_use]
pub fn preview(item: &Dragged, target_index: usize, sequence: &Sequence) -> DropPreview {
    match item {
        Dragged::Stop { index } => {
            if *index == target_index || index.checked_add(1) == Some(target_index) {
                if *index < sequence.len() {
                    DropPreview::NoOp
                } else {
                    DropPreview::Rejected
                }
            } else if validate_stop_move(sequence, *index, target_index) {
                DropPreview::MoveStop
            } else {
                DropPreview::Rejected
            }
        }
        Dragged::Leg(drag) => match decide(sequence, drag, target_index) {
            None => DropPreview::Rejected,
            Some(MergeDecision::NoOp) => DropPreview::NoOp,
            Some(_) if !validate_merge_target(sequence, &drag.order_id, drag.leg_type, target_index) => {
                DropPreview::Rejected
            }
            Some(MergeDecision::Merge) => DropPreview::Merge,
            Some(MergeDecision::CreateStop) => DropPreview::CreateStop,
        },
    }
}
