//! Leg-level mutators: remove, merge, materialise a new stop, insert.
//!
//! The `apply_*` functions assume their gate has already passed and only
//! refuse structurally impossible requests. [`move_leg`] and [`insert_leg`]
//! run the validator and merge decision first and are what callers normally
//! use. Every successful call leaves the sequence renumbered, with no empty
//! stops, and returns a [`MutationReport`] listing the legs whose stored
//! position needs updating.

use std::collections::HashMap;

use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::leg::{Leg, LegKey, LegType, OrderId};
use crate::merge::{LegDrag, MergeDecision, decide, decide_for_leg};
use crate::precedence::{locate_stop_containing_leg, validate_merge_target};
use crate::sequence::Sequence;
use crate::stop::Stop;

/// Where a leg sits after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegPlacement {
    /// Owning order.
    pub order_id: OrderId,
    /// Pickup or delivery.
    pub leg_type: LegType,
    /// One-based position of the leg's stop.
    pub position: usize,
}

/// Persistence record of a leg mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MutationReport {
    /// Every leg of the stops the mutation touched (the stop the leg landed
    /// in and a surviving source stop), plus legs shifted by an insertion or
    /// prune, in sequence order.
    pub placements: Vec<LegPlacement>,
    /// Position of the stop the moved leg ended up in.
    pub landed_at: Option<usize>,
    /// Whether the source stop emptied and was spliced out.
    pub pruned: bool,
}

impl MutationReport {
    /// Collect every leg of the `touched` stops (post-mutation indices) and
    /// every other leg whose stop position changed.
    fn diff(
        before: &HashMap<LegKey, usize>,
        sequence: &Sequence,
        touched: &[usize],
        landed_index: Option<usize>,
        pruned: bool,
    ) -> Self {
        let placements = sequence
            .iter()
            .enumerate()
            .flat_map(|(index, stop)| {
                let whole_stop = touched.contains(&index);
                stop.legs().map(move |leg| (leg, stop.position, whole_stop))
            })
            .filter(|(leg, position, whole_stop)| {
                *whole_stop || before.get(&leg.key()) != Some(position)
            })
            .map(|(leg, position, _)| LegPlacement {
                order_id: leg.order_id.clone(),
                leg_type: leg.leg_type,
                position,
            })
            .collect();
        Self {
            placements,
            landed_at: landed_index.map(|index| index + 1),
            pruned,
        }
    }
}

/// A leg taken out of the sequence entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegRemoval {
    /// The removed leg.
    pub leg: Leg,
    /// Legs shifted by pruning the emptied stop.
    pub report: MutationReport,
}

/// Result of dropping a leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegMoveOutcome {
    /// The leg was dropped where it already is.
    NoOp,
    /// The drop was refused; the sequence is untouched.
    Rejected,
    /// The leg joined an existing stop.
    Merged(MutationReport),
    /// The leg was given a stop of its own.
    Created(MutationReport),
}

impl LegMoveOutcome {
    /// The mutation report, when the sequence changed.
    #[must_use]
    pub const fn report(&self) -> Option<&MutationReport> {
        match self {
            Self::Merged(report) | Self::Created(report) => Some(report),
            Self::NoOp | Self::Rejected => None,
        }
    }
}

/// Remove the leg from the sequence entirely.
///
/// Returns `None` when the leg is not routed.
pub fn remove_leg(
    sequence: &mut Sequence,
    order_id: &OrderId,
    leg_type: LegType,
) -> Option<LegRemoval> {
    let source = locate_stop_containing_leg(sequence, order_id, leg_type)?;
    let before = sequence.leg_positions();
    let leg = sequence
        .get_mut(source)?
        .bucket_mut(leg_type)
        .remove(order_id)?;
    let pruned = sequence.prune_if_empty(source);
    sequence.renumber();
    info!("removed {leg_type} of order {order_id} from position {}", source + 1);
    let touched: &[usize] = if pruned { &[] } else { &[source] };
    let report = MutationReport::diff(&before, sequence, touched, None, pruned);
    Some(LegRemoval { leg, report })
}

/// Move the leg into the existing stop at `target_index`.
///
/// Returns `None` when the leg is not routed, the target is its own stop or
/// not a stop at all, or the target already lists a leg of this order and
/// type.
pub fn apply_merge(
    sequence: &mut Sequence,
    order_id: &OrderId,
    leg_type: LegType,
    target_index: usize,
) -> Option<MutationReport> {
    let source = locate_stop_containing_leg(sequence, order_id, leg_type)?;
    if source == target_index || sequence.get(target_index)?.contains_leg(order_id, leg_type) {
        return None;
    }
    let before = sequence.leg_positions();
    let leg = sequence
        .get_mut(source)?
        .bucket_mut(leg_type)
        .remove(order_id)?;
    sequence.get_mut(target_index)?.bucket_mut(leg_type).push(leg);

    // No insertion happened, so the source index is still current.
    let pruned = sequence.prune_if_empty(source);
    let landed = if pruned && source < target_index {
        target_index - 1
    } else {
        target_index
    };
    sequence.renumber();
    info!(
        "merged {leg_type} of order {order_id} into position {}",
        landed + 1
    );
    let touched = if pruned {
        vec![landed]
    } else {
        vec![source, landed]
    };
    Some(MutationReport::diff(
        &before,
        sequence,
        &touched,
        Some(landed),
        pruned,
    ))
}

/// Move the leg into a new stop inserted at `target_index`.
///
/// The new stop takes its customer and display fields from the leg (see
/// [`Stop::from_leg`]). Returns `None` when the leg is not routed or the
/// target is its own stop.
pub fn apply_create_stop(
    sequence: &mut Sequence,
    order_id: &OrderId,
    leg_type: LegType,
    target_index: usize,
) -> Option<MutationReport> {
    let source = locate_stop_containing_leg(sequence, order_id, leg_type)?;
    if source == target_index {
        return None;
    }
    let before = sequence.leg_positions();
    let leg = sequence
        .get_mut(source)?
        .bucket_mut(leg_type)
        .remove(order_id)?;
    let inserted = sequence.insert(target_index, Stop::from_leg(leg));

    // The insertion pushed everything from `inserted` onwards one slot right.
    let shifted_source = if source > target_index {
        source + 1
    } else {
        source
    };
    let pruned = sequence.prune_if_empty(shifted_source);
    let landed = if pruned && shifted_source < inserted {
        inserted - 1
    } else {
        inserted
    };
    sequence.renumber();
    info!(
        "moved {leg_type} of order {order_id} into a new stop at position {}",
        landed + 1
    );
    let touched = if pruned {
        vec![landed]
    } else {
        vec![shifted_source, landed]
    };
    Some(MutationReport::diff(
        &before,
        sequence,
        &touched,
        Some(landed),
        pruned,
    ))
}

/// Drop a routed leg at `target_index`, merging or creating a stop as the
/// merge decision dictates.
///
/// # Examples
/// ```
/// use stopline_core::merge::LegDrag;
/// use stopline_core::mutate::{move_leg, LegMoveOutcome};
/// use stopline_core::{Leg, LegType, Sequence, Stop};
///
/// let mut sequence = Sequence::from_stops(vec![
///     Stop::from_leg(Leg::new("O1", LegType::Pickup).with_order_customer("C1")),
///     Stop::from_leg(Leg::new("O2", LegType::Pickup).with_order_customer("C2")),
/// ]);
/// let outcome = move_leg(&mut sequence, &LegDrag::new("O1", LegType::Pickup), 2);
/// assert!(matches!(outcome, LegMoveOutcome::Created(_)));
/// assert_eq!(sequence.len(), 2);
/// ```
pub fn move_leg(sequence: &mut Sequence, drag: &LegDrag, target_index: usize) -> LegMoveOutcome {
    let Some(decision) = decide(sequence, drag, target_index) else {
        debug!(
            "{} of order {} is not routed",
            drag.leg_type, drag.order_id
        );
        return LegMoveOutcome::Rejected;
    };
    if decision == MergeDecision::NoOp {
        return LegMoveOutcome::NoOp;
    }
    if !validate_merge_target(sequence, &drag.order_id, drag.leg_type, target_index) {
        debug!(
            "rejected drop of {} of order {} at index {target_index}",
            drag.leg_type, drag.order_id
        );
        return LegMoveOutcome::Rejected;
    }
    let applied = match decision {
        MergeDecision::Merge => {
            apply_merge(sequence, &drag.order_id, drag.leg_type, target_index)
                .map(LegMoveOutcome::Merged)
        }
        MergeDecision::CreateStop | MergeDecision::NoOp => {
            apply_create_stop(sequence, &drag.order_id, drag.leg_type, target_index)
                .map(LegMoveOutcome::Created)
        }
    };
    applied.unwrap_or(LegMoveOutcome::Rejected)
}

/// Route a leg that is not in the sequence yet.
///
/// The leg merges into the stop at `target_index` when the merge decision
/// allows it and otherwise gets a new stop there. Legs that are already
/// routed are rejected; move them with [`move_leg`] instead.
pub fn insert_leg(
    sequence: &mut Sequence,
    leg: Leg,
    target_index: usize,
    force_separate: bool,
) -> LegMoveOutcome {
    if locate_stop_containing_leg(sequence, &leg.order_id, leg.leg_type).is_some() {
        debug!(
            "{} of order {} is already routed",
            leg.leg_type, leg.order_id
        );
        return LegMoveOutcome::Rejected;
    }
    if !validate_merge_target(sequence, &leg.order_id, leg.leg_type, target_index) {
        return LegMoveOutcome::Rejected;
    }
    let before = sequence.leg_positions();
    let key = leg.key();
    let decision = decide_for_leg(sequence, &leg, target_index, force_separate);
    let merged = decision == MergeDecision::Merge && target_index < sequence.len();
    let landed = if merged {
        if let Some(target) = sequence.get_mut(target_index) {
            target.bucket_mut(leg.leg_type).push(leg);
        }
        target_index
    } else {
        sequence.insert(target_index, Stop::from_leg(leg))
    };
    sequence.renumber();
    info!("routed {key} at position {}", landed + 1);
    let report = MutationReport::diff(&before, sequence, &[landed], Some(landed), false);
    if merged {
        LegMoveOutcome::Merged(report)
    } else {
        LegMoveOutcome::Created(report)
    }
}
