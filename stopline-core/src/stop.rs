//! Stops and the leg buckets they hold.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::leg::{Contact, CustomerId, Leg, LegType, OrderId};

/// Display name given to a stop created from a leg with no name.
pub const PLACEHOLDER_NAME: &str = "New Customer";

/// Address given to a stop created from a leg with no address.
pub const PLACEHOLDER_ADDRESS: &str = "Unknown Address";

/// Ordered legs of one type held by a stop.
///
/// `count` mirrors `legs.len()`; the mutating methods keep the two in step.
/// Snapshots decoded from the wire may disagree, which
/// [`Sequence::check_invariants`](crate::Sequence::check_invariants) reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Bucket {
    count: usize,
    legs: Vec<Leg>,
}

impl Bucket {
    /// Build a bucket from legs, deriving the count.
    #[must_use]
    pub fn from_legs(legs: Vec<Leg>) -> Self {
        Self {
            count: legs.len(),
            legs,
        }
    }

    /// Recorded number of legs.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Legs in bucket order.
    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Whether the bucket holds no legs.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether a leg of `order_id` is present.
    #[must_use]
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.legs.iter().any(|leg| &leg.order_id == order_id)
    }

    /// Look up the leg of `order_id`.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<&Leg> {
        self.legs.iter().find(|leg| &leg.order_id == order_id)
    }

    /// Append a leg and bump the count.
    pub(crate) fn push(&mut self, leg: Leg) {
        self.legs.push(leg);
        self.count = self.legs.len();
    }

    /// Remove the leg of `order_id`, decrementing the count.
    pub(crate) fn remove(&mut self, order_id: &OrderId) -> Option<Leg> {
        let index = self.legs.iter().position(|leg| &leg.order_id == order_id)?;
        let leg = self.legs.remove(index);
        self.count = self.legs.len();
        Some(leg)
    }
}

/// A sequence position bundling the legs served at one location.
///
/// # Examples
/// ```
/// use stopline_core::{Leg, LegType, Stop};
///
/// let stop = Stop::from_leg(Leg::new("O1", LegType::Pickup).with_order_customer("C1"));
/// assert_eq!(stop.pickup.count(), 1);
/// assert!(stop.delivery.is_empty());
/// assert_eq!(stop.contact.name.as_deref(), Some("New Customer"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stop {
    /// Customer served at this stop.
    #[cfg_attr(feature = "serde", serde(default))]
    pub customer_id: Option<CustomerId>,
    /// One-based position in the sequence.
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: usize,
    /// Legs collected here.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pickup: Bucket,
    /// Legs dropped off here.
    #[cfg_attr(feature = "serde", serde(default, rename = "deliver"))]
    pub delivery: Bucket,
    /// Display fields mirrored from the leg that defined the stop.
    #[cfg_attr(feature = "serde", serde(default))]
    pub contact: Contact,
}

impl Stop {
    /// Create an empty stop for `customer_id`.
    ///
    /// Empty stops never survive a mutation; callers are expected to add
    /// legs before handing the stop to a [`Sequence`](crate::Sequence).
    #[must_use]
    pub fn new(customer_id: Option<CustomerId>, contact: Contact) -> Self {
        Self {
            customer_id,
            position: 0,
            pickup: Bucket::default(),
            delivery: Bucket::default(),
            contact,
        }
    }

    /// Materialise a stop holding only `leg`.
    ///
    /// Display fields come from the leg, falling back to the order and then
    /// to [`PLACEHOLDER_NAME`] and [`PLACEHOLDER_ADDRESS`].
    #[must_use]
    pub fn from_leg(leg: Leg) -> Self {
        let mut contact = leg.effective_contact();
        contact.name.get_or_insert_with(|| PLACEHOLDER_NAME.to_owned());
        contact
            .address
            .get_or_insert_with(|| PLACEHOLDER_ADDRESS.to_owned());
        let mut stop = Self::new(leg.effective_customer_id().cloned(), contact);
        stop.bucket_mut(leg.leg_type).push(leg);
        stop
    }

    /// Add legs of one type, returning the stop for chaining.
    #[must_use]
    pub fn with_legs(mut self, leg_type: LegType, legs: impl IntoIterator<Item = Leg>) -> Self {
        let bucket = self.bucket_mut(leg_type);
        for leg in legs {
            bucket.push(leg);
        }
        self
    }

    /// Bucket for `leg_type`.
    #[must_use]
    pub const fn bucket(&self, leg_type: LegType) -> &Bucket {
        match leg_type {
            LegType::Pickup => &self.pickup,
            LegType::Delivery => &self.delivery,
        }
    }

    pub(crate) const fn bucket_mut(&mut self, leg_type: LegType) -> &mut Bucket {
        match leg_type {
            LegType::Pickup => &mut self.pickup,
            LegType::Delivery => &mut self.delivery,
        }
    }

    /// Combined leg count of both buckets.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.pickup.count() + self.delivery.count()
    }

    /// Whether the stop holds no legs at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Whether a leg of `order_id` and `leg_type` is present.
    #[must_use]
    pub fn contains_leg(&self, order_id: &OrderId, leg_type: LegType) -> bool {
        self.bucket(leg_type).contains(order_id)
    }

    /// Every leg, pickups first.
    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.pickup.legs().iter().chain(self.delivery.legs())
    }
}
