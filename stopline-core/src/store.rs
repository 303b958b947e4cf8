//! Persistence seam for edited routes.
//!
//! The engine never talks to storage directly. After a successful mutation
//! the [`RouteEditor`](crate::RouteEditor) hands the persistence record to a
//! [`RouteStore`]. Implementations decide how the record reaches the backing
//! service; the engine only sees success or a [`RouteStoreError`].

use thiserror::Error;

use crate::leg::{LegType, OrderId};
use crate::mutate::LegPlacement;
use crate::reorder::PositionChange;

/// Errors raised while persisting an edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteStoreError {
    /// The request never produced a response.
    #[error("network error talking to {url}: {message}")]
    Network {
        /// Endpoint that was called.
        url: String,
        /// Transport failure description.
        message: String,
    },
    /// The service answered with a non-success status.
    #[error("{url} returned HTTP {status}: {message}")]
    Http {
        /// Endpoint that was called.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response description.
        message: String,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was called.
        url: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },
    /// The service accepted the request but refused the change.
    #[error("route service rejected the change: {message}")]
    Service {
        /// Reason given by the service.
        message: String,
    },
    /// The persistence record could not be serialised.
    #[error("failed to encode request: {message}")]
    Encode {
        /// Serialiser error description.
        message: String,
    },
}

/// Write edited stop and leg positions to the backing route service.
///
/// Calls are synchronous. Implementations that perform IO block the caller
/// until the write completes.
///
/// # Examples
///
/// ```
/// use stopline_core::{LegPlacement, LegType, OrderId, PositionChange, RouteStore, RouteStoreError};
///
/// struct NullStore;
///
/// impl RouteStore for NullStore {
///     fn reposition_stops(&self, _: &[PositionChange]) -> Result<(), RouteStoreError> {
///         Ok(())
///     }
///     fn reposition_legs(&self, _: &[LegPlacement]) -> Result<(), RouteStoreError> {
///         Ok(())
///     }
///     fn detach_leg(&self, _: &OrderId, _: LegType) -> Result<(), RouteStoreError> {
///         Ok(())
///     }
/// }
///
/// NullStore.detach_leg(&OrderId::new("O1"), LegType::Pickup)?;
/// # Ok::<(), RouteStoreError>(())
/// ```
pub trait RouteStore {
    /// Record new positions for stops after a stop move.
    ///
    /// Only changed entries are passed.
    fn reposition_stops(&self, changes: &[PositionChange]) -> Result<(), RouteStoreError>;

    /// Record new stop positions for legs after a leg move.
    fn reposition_legs(&self, placements: &[LegPlacement]) -> Result<(), RouteStoreError>;

    /// Mark a leg as no longer routed.
    fn detach_leg(&self, order_id: &OrderId, leg_type: LegType) -> Result<(), RouteStoreError>;
}

impl<S: RouteStore + ?Sized> RouteStore for &S {
    fn reposition_stops(&self, changes: &[PositionChange]) -> Result<(), RouteStoreError> {
        (**self).reposition_stops(changes)
    }

    fn reposition_legs(&self, placements: &[LegPlacement]) -> Result<(), RouteStoreError> {
        (**self).reposition_legs(placements)
    }

    fn detach_leg(&self, order_id: &OrderId, leg_type: LegType) -> Result<(), RouteStoreError> {
        (**self).detach_leg(order_id, leg_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingRouteStore, StoreCall};
    use rstest::rstest;

    #[rstest]
    fn reference_forwards_to_store() {
        let store = RecordingRouteStore::default();
        let by_ref = &store;
        by_ref
            .detach_leg(&OrderId::new("O1"), LegType::Delivery)
            .expect("recording store accepts writes");
        assert_eq!(
            store.calls(),
            vec![StoreCall::Detach {
                order_id: OrderId::new("O1"),
                leg_type: LegType::Delivery,
            }]
        );
    }

    #[rstest]
    fn errors_describe_endpoint() {
        let err = RouteStoreError::Http {
            url: "http://svc/routes/r1/stops/positions".to_owned(),
            status: 409,
            message: "conflict".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "http://svc/routes/r1/stops/positions returned HTTP 409: conflict"
        );
    }
}
