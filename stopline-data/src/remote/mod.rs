//! HTTP-backed route persistence.
//!
//! This module provides [`HttpRouteStore`], an implementation of
//! [`stopline_core::RouteStore`] that posts edit records to a route service
//! as JSON.
//!
//! # Architecture
//!
//! The [`RouteStore`](stopline_core::RouteStore) trait is synchronous so the
//! engine stays usable from plain event loops. The store owns a Tokio runtime
//! and blocks on each request internally.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use stopline_core::{LegType, OrderId, RouteStore};
//! use stopline_data::remote::{HttpRouteStore, HttpRouteStoreConfig};
//!
//! let config = HttpRouteStoreConfig::new("http://localhost:8080")
//!     .with_route_id("route-42")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("dispatch-board/1.0");
//! let store = HttpRouteStore::with_config(config)?;
//! store.detach_leg(&OrderId::new("O1"), LegType::Delivery)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod store;
mod wire;

#[doc(hidden)]
pub mod test_support;

pub use store::{DEFAULT_USER_AGENT, HttpRouteStore, HttpRouteStoreConfig, StoreBuildError};
