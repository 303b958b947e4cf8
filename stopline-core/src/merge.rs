//! Merge-into-existing-stop versus create-new-stop decisions for legs.

use log::debug;

use crate::leg::{Leg, LegType, OrderId};
use crate::precedence::{is_no_op_drop, locate_stop_containing_leg};
use crate::sequence::Sequence;

/// A leg picked up by the input layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegDrag {
    /// Owning order.
    pub order_id: OrderId,
    /// Pickup or delivery.
    pub leg_type: LegType,
    /// Never merge, even into a stop of the same customer.
    pub force_separate: bool,
}

impl LegDrag {
    /// Drag a leg, allowing merges.
    #[must_use]
    pub fn new(order_id: impl Into<OrderId>, leg_type: LegType) -> Self {
        Self {
            order_id: order_id.into(),
            leg_type,
            force_separate: false,
        }
    }

    /// Drag a leg that must end up in a stop of its own.
    #[must_use]
    pub const fn separate(mut self) -> Self {
        self.force_separate = true;
        self
    }
}

/// What dropping a leg at a target index should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// The leg is already at the target; do nothing.
    NoOp,
    /// Append the leg to the stop at the target index.
    Merge,
    /// Build a new stop for the leg at the target index.
    CreateStop,
}

/// Decide how to drop a routed leg at `target_index`.
///
/// Returns `None` when the dragged leg is not in the sequence.
///
/// # Examples
/// ```
/// use stopline_core::merge::{decide, LegDrag, MergeDecision};
/// use stopline_core::{Leg, LegType, Sequence, Stop};
///
/// let sequence = Sequence::from_stops(vec![
///     Stop::from_leg(Leg::new("O1", LegType::Pickup).with_order_customer("C1")),
///     Stop::from_leg(Leg::new("O2", LegType::Pickup).with_order_customer("C1")),
/// ]);
/// let drag = LegDrag::new("O1", LegType::Pickup);
/// assert_eq!(decide(&sequence, &drag, 0), Some(MergeDecision::NoOp));
/// assert_eq!(decide(&sequence, &drag, 1), Some(MergeDecision::Merge));
/// assert_eq!(decide(&sequence, &drag.clone().separate(), 1), Some(MergeDecision::CreateStop));
/// assert_eq!(decide(&sequence, &drag, 2), Some(MergeDecision::CreateStop));
/// ```
#[must_use]
pub fn decide(sequence: &Sequence, drag: &LegDrag, target_index: usize) -> Option<MergeDecision> {
    let current = locate_stop_containing_leg(sequence, &drag.order_id, drag.leg_type)?;
    if is_no_op_drop(sequence, &drag.order_id, drag.leg_type, target_index) {
        return Some(MergeDecision::NoOp);
    }
    let leg = sequence
        .get(current)?
        .bucket(drag.leg_type)
        .get(&drag.order_id)?;
    Some(decide_for_leg(sequence, leg, target_index, drag.force_separate))
}

/// Decide whether `leg` merges into the stop at `target_index` or gets a new
/// stop there.
///
/// Never returns [`MergeDecision::NoOp`]: dropping a routed leg on its own
/// stop is caught by [`is_no_op_drop`] first, as [`decide`] does.
#[must_use]
pub fn decide_for_leg(
    sequence: &Sequence,
    leg: &Leg,
    target_index: usize,
    force_separate: bool,
) -> MergeDecision {
    let Some(target) = sequence.get(target_index) else {
        return MergeDecision::CreateStop;
    };
    if target.contains_leg(&leg.order_id, leg.leg_type) {
        debug!(
            "suppressing duplicate {} of order {} at index {target_index}",
            leg.leg_type, leg.order_id
        );
        return MergeDecision::CreateStop;
    }
    let same_customer = leg
        .effective_customer_id()
        .is_some_and(|customer| target.customer_id.as_ref() == Some(customer));
    if same_customer && !force_separate {
        MergeDecision::Merge
    } else {
        MergeDecision::CreateStop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{customer_pickup, delivery, pickup, stop};
    use rstest::rstest;

    #[rstest]
    fn unrouted_leg_has_no_decision() {
        let sequence = Sequence::from_stops(vec![stop("C1", &[pickup("O1")], &[])]);
        assert_eq!(
            decide(&sequence, &LegDrag::new("O2", LegType::Pickup), 0),
            None
        );
    }

    #[rstest]
    #[case::own_stop(1, false, MergeDecision::NoOp)]
    #[case::own_stop_forced_apart(1, true, MergeDecision::NoOp)]
    #[case::other_stop(0, false, MergeDecision::Merge)]
    #[case::append(2, false, MergeDecision::CreateStop)]
    fn no_op_follows_drop_validator(
        #[case] target_index: usize,
        #[case] force_separate: bool,
        #[case] expected: MergeDecision,
    ) {
        let sequence = Sequence::from_stops(vec![
            stop("C1", &[customer_pickup("O2", "C1")], &[]),
            stop("C1", &[customer_pickup("O1", "C1")], &[]),
        ]);
        let mut drag = LegDrag::new("O1", LegType::Pickup);
        drag.force_separate = force_separate;
        assert_eq!(decide(&sequence, &drag, target_index), Some(expected));
        assert_eq!(
            expected == MergeDecision::NoOp,
            is_no_op_drop(&sequence, &drag.order_id, LegType::Pickup, target_index)
        );
    }

    #[rstest]
    fn duplicate_leg_never_merges() {
        // Snapshot with O1's pickup listed in two stops of the same customer.
        let sequence = Sequence::from_stops(vec![
            stop("C1", &[customer_pickup("O1", "C1")], &[]),
            stop("C1", &[customer_pickup("O1", "C1")], &[]),
        ]);
        let leg = customer_pickup("O1", "C1");
        assert_eq!(
            decide_for_leg(&sequence, &leg, 1, false),
            MergeDecision::CreateStop
        );
    }

    #[rstest]
    fn same_order_opposite_leg_is_not_a_duplicate() {
        let sequence = Sequence::from_stops(vec![stop("C1", &[], &[delivery("O1")])]);
        let leg = customer_pickup("O1", "C1");
        assert_eq!(
            decide_for_leg(&sequence, &leg, 0, false),
            MergeDecision::Merge
        );
    }

    #[rstest]
    #[case::matching_customer("C1", false, MergeDecision::Merge)]
    #[case::forced_apart("C1", true, MergeDecision::CreateStop)]
    #[case::other_customer("C2", false, MergeDecision::CreateStop)]
    fn customer_match_drives_merge(
        #[case] customer: &str,
        #[case] force_separate: bool,
        #[case] expected: MergeDecision,
    ) {
        let sequence = Sequence::from_stops(vec![
            stop("C1", &[pickup("O1")], &[]),
            stop(customer, &[pickup("O2")], &[]),
        ]);
        let leg = customer_pickup("O3", "C1");
        assert_eq!(
            decide_for_leg(&sequence, &leg, 1, force_separate),
            expected
        );
    }

    #[rstest]
    fn leg_without_customer_never_merges() {
        let sequence = Sequence::from_stops(vec![stop("C1", &[pickup("O1")], &[])]);
        let leg = Leg::new("O2", LegType::Pickup);
        assert_eq!(
            decide_for_leg(&sequence, &leg, 0, false),
            MergeDecision::CreateStop
        );
    }

    #[rstest]
    fn unrouted_leg_at_append_position_creates_stop() {
        let sequence = Sequence::from_stops(vec![stop("C1", &[pickup("O1")], &[])]);
        let leg = customer_pickup("O2", "C1");
        assert_eq!(
            decide_for_leg(&sequence, &leg, 1, false),
            MergeDecision::CreateStop
        );
    }
}
