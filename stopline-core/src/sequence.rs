//! The ordered stop list and its structural invariants.
//!
//! Every mutator leaves a [`Sequence`] dense (positions `1..=N`), free of
//! empty stops and with each order's pickup strictly before its delivery.
//! Snapshots arriving from the upstream route source are checked with
//! [`Sequence::check_invariants`] rather than trusted.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leg::{LegKey, LegType, OrderId};
use crate::stop::Stop;

/// First invariant violation found in a sequence snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A stop's position is not its index plus one.
    #[error("stop at index {index} has position {position}")]
    PositionMismatch {
        /// Zero-based index of the stop.
        index: usize,
        /// Position recorded on the stop.
        position: usize,
    },
    /// A stop holds no legs.
    #[error("stop at position {position} holds no legs")]
    EmptyStop {
        /// Position of the empty stop.
        position: usize,
    },
    /// A bucket's recorded count disagrees with its leg list.
    #[error("{leg_type} count at position {position} is {count} but {actual} legs are listed")]
    CountMismatch {
        /// Position of the stop.
        position: usize,
        /// Bucket that disagrees.
        leg_type: LegType,
        /// Recorded count.
        count: usize,
        /// Number of listed legs.
        actual: usize,
    },
    /// A leg appears in more than one place.
    #[error("{key} is listed more than once (positions {first} and {second})")]
    DuplicateLeg {
        /// Duplicated leg.
        key: LegKey,
        /// Position of the first occurrence.
        first: usize,
        /// Position of the repeated occurrence.
        second: usize,
    },
    /// A leg is filed in the other leg type's bucket.
    #[error("{key} is filed under the {bucket} bucket at position {position}")]
    MisfiledLeg {
        /// Misfiled leg.
        key: LegKey,
        /// Bucket the leg was found in.
        bucket: LegType,
        /// Position of the stop.
        position: usize,
    },
    /// An order's delivery does not come strictly after its pickup.
    #[error(
        "order {order_id} is picked up at position {pickup_position} \
         but delivered at position {delivery_position}"
    )]
    PrecedenceViolation {
        /// Offending order.
        order_id: OrderId,
        /// Position of the pickup stop.
        pickup_position: usize,
        /// Position of the delivery stop.
        delivery_position: usize,
    },
}

/// An ordered list of stops.
///
/// # Examples
/// ```
/// use stopline_core::{Leg, LegType, Sequence, Stop};
///
/// let sequence = Sequence::from_stops(vec![
///     Stop::from_leg(Leg::new("O1", LegType::Pickup)),
///     Stop::from_leg(Leg::new("O1", LegType::Delivery)),
/// ]);
/// assert_eq!(sequence.len(), 2);
/// assert_eq!(sequence.get(1).map(|stop| stop.position), Some(2));
/// assert!(sequence.check_invariants().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(transparent)
)]
pub struct Sequence {
    stops: Vec<Stop>,
}

impl Sequence {
    /// Create an empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self { stops: Vec::new() }
    }

    /// Adopt a snapshot of stops, renumbering their positions.
    #[must_use]
    pub fn from_stops(stops: Vec<Stop>) -> Self {
        let mut sequence = Self { stops };
        sequence.renumber();
        sequence
    }

    /// Swap in a fresh snapshot, returning the previous stops.
    pub fn replace(&mut self, stops: Vec<Stop>) -> Vec<Stop> {
        let previous = std::mem::replace(&mut self.stops, stops);
        self.renumber();
        previous
    }

    /// Number of stops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Whether the sequence has no stops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Stop at zero-based `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    /// Stops in order.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Iterate over the stops in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Stop> {
        self.stops.iter()
    }

    /// Consume the sequence, yielding its stops.
    #[must_use]
    pub fn into_stops(self) -> Vec<Stop> {
        self.stops
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Stop> {
        self.stops.get_mut(index)
    }

    /// Insert at `index`, appending when `index` is past the end.
    pub(crate) fn insert(&mut self, index: usize, stop: Stop) -> usize {
        let at = index.min(self.stops.len());
        self.stops.insert(at, stop);
        at
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Stop> {
        (index < self.stops.len()).then(|| self.stops.remove(index))
    }

    /// Splice out the stop at `index` when it holds no legs.
    pub(crate) fn prune_if_empty(&mut self, index: usize) -> bool {
        if self.stops.get(index).is_some_and(Stop::is_empty) {
            self.stops.remove(index);
            true
        } else {
            false
        }
    }

    /// Set every stop's position to its index plus one.
    pub fn renumber(&mut self) {
        for (index, stop) in self.stops.iter_mut().enumerate() {
            stop.position = index + 1;
        }
    }

    /// Position of every routed leg, keyed by leg identity.
    ///
    /// When a leg is listed more than once the first occurrence wins, which
    /// matches how the validators locate legs.
    #[must_use]
    pub fn leg_positions(&self) -> HashMap<LegKey, usize> {
        let mut positions = HashMap::new();
        for stop in &self.stops {
            for leg in stop.legs() {
                positions.entry(leg.key()).or_insert(stop.position);
            }
        }
        positions
    }

    /// Report the first violated structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`SequenceError`] found, scanning stops in order.
    pub fn check_invariants(&self) -> Result<(), SequenceError> {
        let mut seen: HashMap<LegKey, usize> = HashMap::new();
        for (index, stop) in self.stops.iter().enumerate() {
            if stop.position != index + 1 {
                return Err(SequenceError::PositionMismatch {
                    index,
                    position: stop.position,
                });
            }
            for leg_type in [LegType::Pickup, LegType::Delivery] {
                check_bucket(stop, leg_type, &mut seen)?;
            }
            if stop.is_empty() {
                return Err(SequenceError::EmptyStop {
                    position: stop.position,
                });
            }
        }
        check_precedence(&seen)
    }
}

fn check_bucket(
    stop: &Stop,
    leg_type: LegType,
    seen: &mut HashMap<LegKey, usize>,
) -> Result<(), SequenceError> {
    let bucket = stop.bucket(leg_type);
    if bucket.count() != bucket.legs().len() {
        return Err(SequenceError::CountMismatch {
            position: stop.position,
            leg_type,
            count: bucket.count(),
            actual: bucket.legs().len(),
        });
    }
    for leg in bucket.legs() {
        let key = leg.key();
        if leg.leg_type != leg_type {
            return Err(SequenceError::MisfiledLeg {
                key,
                bucket: leg_type,
                position: stop.position,
            });
        }
        if let Some(first) = seen.get(&key) {
            return Err(SequenceError::DuplicateLeg {
                key,
                first: *first,
                second: stop.position,
            });
        }
        seen.insert(key, stop.position);
    }
    Ok(())
}

fn check_precedence(seen: &HashMap<LegKey, usize>) -> Result<(), SequenceError> {
    let mut pickups: Vec<(&OrderId, usize)> = seen
        .iter()
        .filter(|(key, _)| key.leg_type == LegType::Pickup)
        .map(|(key, &position)| (&key.order_id, position))
        .collect();
    // Report the earliest violation so the outcome does not depend on map order.
    pickups.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));
    for (order_id, pickup_position) in pickups {
        let delivery_key = LegKey::new(order_id.clone(), LegType::Delivery);
        if let Some(&delivery_position) = seen.get(&delivery_key)
            && pickup_position >= delivery_position
        {
            return Err(SequenceError::PrecedenceViolation {
                order_id: order_id.clone(),
                pickup_position,
                delivery_position,
            });
        }
    }
    Ok(())
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Stop;
    type IntoIter = std::slice::Iter<'a, Stop>;

    fn into_iter(self) -> Self::IntoIter {
        self.stops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{delivery, pickup, stop};
    use rstest::rstest;

    #[rstest]
    fn renumber_restores_dense_positions() {
        let mut first = stop("C1", &[pickup("O1")], &[]);
        first.position = 7;
        let mut second = stop("C2", &[], &[delivery("O1")]);
        second.position = 7;
        let sequence = Sequence::from_stops(vec![first, second]);
        let positions: Vec<_> = sequence.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[rstest]
    fn detects_position_gap() {
        let sequence = Sequence {
            stops: vec![{
                let mut s = stop("C1", &[pickup("O1")], &[]);
                s.position = 2;
                s
            }],
        };
        assert_eq!(
            sequence.check_invariants(),
            Err(SequenceError::PositionMismatch {
                index: 0,
                position: 2
            })
        );
    }

    #[rstest]
    fn detects_empty_stop() {
        let sequence = Sequence::from_stops(vec![stop("C1", &[], &[])]);
        assert_eq!(
            sequence.check_invariants(),
            Err(SequenceError::EmptyStop { position: 1 })
        );
    }

    #[rstest]
    fn detects_duplicate_leg_across_stops() {
        let sequence = Sequence::from_stops(vec![
            stop("C1", &[pickup("O1")], &[]),
            stop("C2", &[pickup("O1")], &[]),
        ]);
        assert!(matches!(
            sequence.check_invariants(),
            Err(SequenceError::DuplicateLeg {
                first: 1,
                second: 2,
                ..
            })
        ));
    }

    #[rstest]
    fn detects_misfiled_leg() {
        let sequence = Sequence::from_stops(vec![stop("C1", &[delivery("O1")], &[])]);
        assert!(matches!(
            sequence.check_invariants(),
            Err(SequenceError::MisfiledLeg {
                bucket: LegType::Pickup,
                ..
            })
        ));
    }

    #[rstest]
    #[case::delivery_first(vec![
        stop("C2", &[], &[delivery("O1")]),
        stop("C1", &[pickup("O1")], &[]),
    ])]
    #[case::same_stop(vec![stop("C1", &[pickup("O1")], &[delivery("O1")])])]
    fn detects_precedence_violation(#[case] stops: Vec<Stop>) {
        let sequence = Sequence::from_stops(stops);
        assert!(matches!(
            sequence.check_invariants(),
            Err(SequenceError::PrecedenceViolation { .. })
        ));
    }

    #[rstest]
    fn accepts_orders_with_one_routed_leg() {
        let sequence = Sequence::from_stops(vec![
            stop("C1", &[pickup("O1")], &[delivery("O9")]),
            stop("C2", &[pickup("O2")], &[delivery("O1")]),
        ]);
        assert_eq!(sequence.check_invariants(), Ok(()));
    }

    #[rstest]
    fn leg_positions_are_one_based() {
        let sequence = Sequence::from_stops(vec![
            stop("C1", &[pickup("O1")], &[]),
            stop("C2", &[], &[delivery("O1")]),
        ]);
        let positions = sequence.leg_positions();
        assert_eq!(positions.get(&LegKey::new("O1", LegType::Pickup)), Some(&1));
        assert_eq!(positions.get(&LegKey::new("O1", LegType::Delivery)), Some(&2));
    }

    #[rstest]
    fn replace_renumbers_new_snapshot() {
        let mut sequence = Sequence::from_stops(vec![stop("C1", &[pickup("O1")], &[])]);
        let previous = sequence.replace(vec![
            stop("C3", &[pickup("O3")], &[]),
            stop("C4", &[pickup("O4")], &[]),
        ]);
        assert_eq!(previous.len(), 1);
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.get(1).map(|s| s.position), Some(2));
    }
}
