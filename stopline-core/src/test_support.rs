//! Fixture builders and an in-memory [`RouteStore`] used by unit and
//! behaviour tests.

use std::cell::RefCell;

use crate::{
    CustomerId, Leg, LegPlacement, LegType, OrderId, PositionChange, RouteStore, RouteStoreError,
    Stop,
};

/// Pickup leg of `order` with no customer.
pub fn pickup(order: &str) -> Leg {
    Leg::new(order, LegType::Pickup)
}

/// Delivery leg of `order` with no customer.
pub fn delivery(order: &str) -> Leg {
    Leg::new(order, LegType::Delivery)
}

/// Pickup leg of `order` attributed to `customer`.
pub fn customer_pickup(order: &str, customer: &str) -> Leg {
    pickup(order).with_customer(customer)
}

/// Delivery leg of `order` attributed to `customer`.
pub fn customer_delivery(order: &str, customer: &str) -> Leg {
    delivery(order).with_customer(customer)
}

/// Stop for `customer` holding the given legs.
///
/// Legs are filed as given, so tests can build misfiled snapshots. The
/// position is left at zero; wrap the stops in
/// [`Sequence::from_stops`](crate::Sequence::from_stops) to number them.
pub fn stop(customer: &str, pickups: &[Leg], deliveries: &[Leg]) -> Stop {
    Stop::new(Some(CustomerId::new(customer)), crate::Contact::default())
        .with_legs(LegType::Pickup, pickups.iter().cloned())
        .with_legs(LegType::Delivery, deliveries.iter().cloned())
}

/// One write received by [`RecordingRouteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// [`RouteStore::reposition_stops`].
    Stops(Vec<PositionChange>),
    /// [`RouteStore::reposition_legs`].
    Legs(Vec<LegPlacement>),
    /// [`RouteStore::detach_leg`].
    Detach {
        /// Owning order.
        order_id: OrderId,
        /// Detached leg.
        leg_type: LegType,
    },
}

/// `RouteStore` that records every call and optionally fails them all.
#[derive(Debug, Default)]
pub struct RecordingRouteStore {
    calls: RefCell<Vec<StoreCall>>,
    failure: Option<RouteStoreError>,
}

impl RecordingRouteStore {
    /// A store that records calls and then fails each with `error`.
    #[must_use]
    pub fn failing(error: RouteStoreError) -> Self {
        Self {
            calls: RefCell::default(),
            failure: Some(error),
        }
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: StoreCall) -> Result<(), RouteStoreError> {
        self.calls.borrow_mut().push(call);
        self.failure.clone().map_or(Ok(()), Err)
    }
}

impl RouteStore for RecordingRouteStore {
    fn reposition_stops(&self, changes: &[PositionChange]) -> Result<(), RouteStoreError> {
        self.record(StoreCall::Stops(changes.to_vec()))
    }

    fn reposition_legs(&self, placements: &[LegPlacement]) -> Result<(), RouteStoreError> {
        self.record(StoreCall::Legs(placements.to_vec()))
    }

    fn detach_leg(&self, order_id: &OrderId, leg_type: LegType) -> Result<(), RouteStoreError> {
        self.record(StoreCall::Detach {
            order_id: order_id.clone(),
            leg_type,
        })
    }
}
