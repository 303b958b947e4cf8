//! Pickup-before-delivery checks for proposed moves.
//!
//! Every function here is a pure predicate over a borrowed [`Sequence`]. A
//! `false` result means "reject the operation and leave the sequence alone";
//! constraint violations are never reported as errors.
//!
//! Indices are zero-based. A `target_index` equal to `sequence.len()` means
//! "drop at the end".

use crate::leg::{LegType, OrderId};
use crate::sequence::Sequence;
use crate::stop::Stop;

/// Index of the first stop holding the `leg_type` leg of `order_id`.
///
/// # Examples
/// ```
/// use stopline_core::precedence::locate_stop_containing_leg;
/// use stopline_core::{Leg, LegType, OrderId, Sequence, Stop};
///
/// let sequence = Sequence::from_stops(vec![
///     Stop::from_leg(Leg::new("O1", LegType::Pickup)),
///     Stop::from_leg(Leg::new("O1", LegType::Delivery)),
/// ]);
/// let order = OrderId::new("O1");
/// assert_eq!(locate_stop_containing_leg(&sequence, &order, LegType::Delivery), Some(1));
/// assert_eq!(locate_stop_containing_leg(&sequence, &OrderId::new("O2"), LegType::Pickup), None);
/// ```
#[must_use]
pub fn locate_stop_containing_leg(
    sequence: &Sequence,
    order_id: &OrderId,
    leg_type: LegType,
) -> Option<usize> {
    sequence
        .iter()
        .position(|stop| stop.contains_leg(order_id, leg_type))
}

/// Whether dropping the leg at `target_index` would leave it where it is.
///
/// A leg that is not in the sequence is never a no-op.
#[must_use]
pub fn is_no_op_drop(
    sequence: &Sequence,
    order_id: &OrderId,
    leg_type: LegType,
    target_index: usize,
) -> bool {
    locate_stop_containing_leg(sequence, order_id, leg_type) == Some(target_index)
}

/// Whether placing the leg at `target_index` keeps it on the correct side of
/// its counterpart.
///
/// A pickup must land strictly before its delivery and a delivery strictly
/// after its pickup. When the counterpart is not routed the leg is
/// unconstrained.
#[must_use]
pub fn validate_leg_placement(
    sequence: &Sequence,
    order_id: &OrderId,
    leg_type: LegType,
    target_index: usize,
) -> bool {
    let Some(counterpart) = locate_stop_containing_leg(sequence, order_id, leg_type.counterpart())
    else {
        return true;
    };
    precedes_counterpart(leg_type, target_index, counterpart)
}

/// Whether merging the leg into the stop at `target_index` is allowed.
///
/// On top of [`validate_leg_placement`], every leg already resident in the
/// target stop must still sit on the correct side of its own counterpart
/// when evaluated at `target_index`. Append positions only need the
/// placement check.
#[must_use]
pub fn validate_merge_target(
    sequence: &Sequence,
    order_id: &OrderId,
    leg_type: LegType,
    target_index: usize,
) -> bool {
    if !validate_leg_placement(sequence, order_id, leg_type, target_index) {
        return false;
    }
    let Some(target) = sequence.get(target_index) else {
        return true;
    };
    residents_stay_ordered(sequence, target, target_index)
}

fn residents_stay_ordered(sequence: &Sequence, target: &Stop, target_index: usize) -> bool {
    target.legs().all(|resident| {
        locate_stop_containing_leg(sequence, &resident.order_id, resident.leg_type.counterpart())
            .is_none_or(|counterpart| {
                precedes_counterpart(resident.leg_type, target_index, counterpart)
            })
    })
}

/// Whether moving the stop at `source_index` to `target_index` keeps every
/// one of its legs on the correct side of its counterpart.
///
/// The move is simulated on indices only: the stop is removed, then
/// reinserted at `target_index`, or one slot earlier when the target lies
/// after the source. Counterparts are then looked up in the simulated order.
#[must_use]
pub fn validate_stop_move(sequence: &Sequence, source_index: usize, target_index: usize) -> bool {
    let Some(moving) = sequence.get(source_index) else {
        return false;
    };
    let simulated = simulate_stop_move(sequence.len(), source_index, target_index);
    let Some(final_index) = simulated.iter().position(|&index| index == source_index) else {
        return false;
    };
    moving.legs().all(|leg| {
        locate_stop_containing_leg(sequence, &leg.order_id, leg.leg_type.counterpart())
            .and_then(|original| simulated.iter().position(|&index| index == original))
            .is_none_or(|counterpart| precedes_counterpart(leg.leg_type, final_index, counterpart))
    })
}

/// Original indices in the order they would occupy after the move.
pub(crate) fn simulate_stop_move(len: usize, source_index: usize, target_index: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if source_index >= len {
        return order;
    }
    let moved = order.remove(source_index);
    let insert_at = reinsertion_index(len, source_index, target_index);
    order.insert(insert_at.min(order.len()), moved);
    order
}

/// Where a stop lands once removed from `source_index` of a sequence of
/// `len` stops.
pub(crate) const fn reinsertion_index(len: usize, source_index: usize, target_index: usize) -> usize {
    if target_index >= len {
        len - 1
    } else if target_index > source_index {
        target_index - 1
    } else {
        target_index
    }
}

/// Whether a `leg_type` leg at `index` is correctly ordered against its
/// counterpart at `counterpart`.
const fn precedes_counterpart(leg_type: LegType, index: usize, counterpart: usize) -> bool {
    match leg_type {
        LegType::Pickup => index < counterpart,
        LegType::Delivery => index > counterpart,
    }
}
