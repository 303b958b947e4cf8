//! Stop-level moves and the position mapping they emit.

use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::leg::CustomerId;
use crate::precedence::{reinsertion_index, validate_stop_move};
use crate::sequence::Sequence;

/// Before and after positions of one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionChange {
    /// Customer served at the stop.
    pub customer_id: Option<CustomerId>,
    /// One-based position before the move.
    pub previous_position: usize,
    /// One-based position after the move.
    pub new_position: usize,
}

impl PositionChange {
    /// Whether the stop actually changed position.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        self.previous_position != self.new_position
    }
}

/// Per-stop position record produced by [`move_stop`], in post-move order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(transparent)
)]
pub struct PositionMapping {
    entries: Vec<PositionChange>,
}

impl PositionMapping {
    /// Every stop, in post-move order.
    #[must_use]
    pub fn entries(&self) -> &[PositionChange] {
        &self.entries
    }

    /// Only the stops whose position changed.
    pub fn changed(&self) -> impl Iterator<Item = &PositionChange> {
        self.entries.iter().filter(|entry| entry.is_changed())
    }

    /// Whether no stop moved.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.changed().next().is_none()
    }
}

/// Move the stop at `source_index` so it lands at `target_index`.
///
/// `target_index` follows drop semantics: the stop ends up in front of the
/// stop currently at `target_index`, and an index at or past the end appends.
/// Returns `None`, leaving the sequence untouched, when the source does not
/// exist or the move would break pickup-before-delivery ordering.
///
/// Pre-move positions are carried alongside each stop through the move, so
/// the mapping attributes them correctly even when several stops share a
/// customer.
///
/// # Examples
/// ```
/// use stopline_core::reorder::move_stop;
/// use stopline_core::{Leg, LegType, Sequence, Stop};
///
/// let mut sequence = Sequence::from_stops(vec![
///     Stop::from_leg(Leg::new("O1", LegType::Pickup).with_order_customer("C1")),
///     Stop::from_leg(Leg::new("O2", LegType::Pickup).with_order_customer("C2")),
/// ]);
/// let mapping = move_stop(&mut sequence, 1, 0).expect("move is allowed");
/// assert_eq!(mapping.changed().count(), 2);
/// assert_eq!(sequence.get(0).and_then(|stop| stop.customer_id.as_ref()).map(|id| id.as_str()), Some("C2"));
/// ```
pub fn move_stop(
    sequence: &mut Sequence,
    source_index: usize,
    target_index: usize,
) -> Option<PositionMapping> {
    if !validate_stop_move(sequence, source_index, target_index) {
        debug!("rejected move of stop {source_index} to index {target_index}");
        return None;
    }
    let original_len = sequence.len();
    let mut previous: Vec<usize> = (1..=original_len).collect();

    let stop = sequence.remove(source_index)?;
    let carried = previous.remove(source_index);
    let insert_at = reinsertion_index(original_len, source_index, target_index);
    let landed = sequence.insert(insert_at, stop);
    previous.insert(landed, carried);
    sequence.renumber();

    let entries = sequence
        .iter()
        .zip(previous)
        .map(|(stop, previous_position)| PositionChange {
            customer_id: stop.customer_id.clone(),
            previous_position,
            new_position: stop.position,
        })
        .collect();
    let mapping = PositionMapping { entries };
    if !mapping.is_identity() {
        info!(
            "moved stop from position {} to {}",
            source_index + 1,
            landed + 1
        );
    }
    Some(mapping)
}
