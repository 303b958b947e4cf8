//! `RouteStore` that posts edits to a route service over HTTP.

use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::Serialize;
use stopline_core::{
    LegPlacement, LegType, OrderId, PositionChange, RouteStore, RouteStoreError,
};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::wire::{LegPositionsRequest, ServiceReply, StopPositionsRequest, UnrouteRequest};

/// Errors raised while building an [`HttpRouteStore`].
#[derive(Debug, Error)]
pub enum StoreBuildError {
    /// The base URL could not be parsed.
    #[error("invalid route service URL `{url}`: {source}")]
    InvalidUrl {
        /// Rejected value.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry path segments (for example `mailto:`).
    #[error("route service URL `{0}` cannot be used as a base")]
    NotABase(String),
    /// No route identifier was configured.
    #[error("a route identifier is required")]
    MissingRouteId,
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Default user agent for route service requests.
pub const DEFAULT_USER_AGENT: &str = "stopline-store/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpRouteStore`].
#[derive(Debug, Clone)]
pub struct HttpRouteStoreConfig {
    /// Base URL of the route service (e.g., `"http://localhost:8080"`).
    pub base_url: String,
    /// Route whose stops and legs are edited.
    pub route_id: Option<String>,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpRouteStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            route_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpRouteStoreConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the route being edited.
    #[must_use]
    pub fn with_route_id(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP-backed [`RouteStore`].
///
/// Each trait call issues one JSON `POST` and blocks until the service
/// answers:
///
/// - `reposition_stops` posts `{"changes": [...]}` to
///   `{base}/routes/{route_id}/stops/positions`;
/// - `reposition_legs` posts `{"legs": [...]}` to
///   `{base}/routes/{route_id}/legs/positions`;
/// - `detach_leg` posts `{"leg_type": ...}` to `{base}/orders/{order_id}/unroute`.
///
/// Empty change lists return immediately without a request. Path segments
/// are percent-encoded.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the store blocks on its own current-thread
/// runtime. Inside a multi-threaded runtime it uses that runtime's handle
/// with [`tokio::task::block_in_place`]. Inside a `current_thread` runtime it
/// falls back to its own runtime, which can deadlock if the caller's runtime
/// drives IO this request depends on.
pub struct HttpRouteStore {
    client: Client,
    config: HttpRouteStoreConfig,
    base_url: Url,
    route_id: String,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpRouteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRouteStore")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpRouteStore {
    /// Create a store for `route_id` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client or Tokio
    /// runtime fails to build.
    pub fn new(
        base_url: impl Into<String>,
        route_id: impl Into<String>,
    ) -> Result<Self, StoreBuildError> {
        Self::with_config(HttpRouteStoreConfig::new(base_url).with_route_id(route_id))
    }

    /// Create a store with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, no route is configured, or the
    /// HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpRouteStoreConfig) -> Result<Self, StoreBuildError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| StoreBuildError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreBuildError::NotABase(config.base_url.clone()));
        }
        let route_id = config
            .route_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(StoreBuildError::MissingRouteId)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(StoreBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StoreBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            base_url,
            route_id,
            runtime,
        })
    }

    /// Configuration the store was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpRouteStoreConfig {
        &self.config
    }

    /// Build an endpoint URL below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn route_endpoint(&self, leaf: &str) -> Url {
        self.endpoint(&["routes", self.route_id.as_str(), leaf, "positions"])
    }

    /// POST `body` as JSON to `url`.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<(), RouteStoreError> {
        let url_text = url.to_string();
        debug!("POST {url_text}");
        let payload = serde_json::to_vec(body).map_err(|err| RouteStoreError::Encode {
            message: err.to_string(),
        })?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url_text))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url_text))?;
        let text = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url_text))?;
        match ServiceReply::parse(&text).error {
            Some(message) => Err(RouteStoreError::Service { message }),
            None => Ok(()),
        }
    }

    /// Convert a reqwest error to a `RouteStoreError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RouteStoreError {
        if error.is_timeout() {
            return RouteStoreError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RouteStoreError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RouteStoreError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }

    /// Drive `future` to completion from synchronous code.
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own runtime.
            _ => self.runtime.block_on(future),
        }
    }
}

impl RouteStore for HttpRouteStore {
    fn reposition_stops(&self, changes: &[PositionChange]) -> Result<(), RouteStoreError> {
        if changes.is_empty() {
            return Ok(());
        }
        let url = self.route_endpoint("stops");
        self.block_on(self.post_json(url, &StopPositionsRequest { changes }))
    }

    fn reposition_legs(&self, placements: &[LegPlacement]) -> Result<(), RouteStoreError> {
        if placements.is_empty() {
            return Ok(());
        }
        let url = self.route_endpoint("legs");
        self.block_on(self.post_json(url, &LegPositionsRequest { legs: placements }))
    }

    fn detach_leg(&self, order_id: &OrderId, leg_type: LegType) -> Result<(), RouteStoreError> {
        let url = self.endpoint(&["orders", order_id.as_str(), "unroute"]);
        self.block_on(self.post_json(url, &UnrouteRequest { leg_type }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> HttpRouteStore {
        HttpRouteStore::new("http://routes.example.com/api/", "r1").expect("store should build")
    }

    #[rstest]
    fn route_endpoints_strip_trailing_slash(store: HttpRouteStore) {
        assert_eq!(
            store.route_endpoint("stops").as_str(),
            "http://routes.example.com/api/routes/r1/stops/positions"
        );
        assert_eq!(
            store.route_endpoint("legs").as_str(),
            "http://routes.example.com/api/routes/r1/legs/positions"
        );
    }

    #[rstest]
    fn endpoints_percent_encode_identifiers(store: HttpRouteStore) {
        let url = store.endpoint(&["orders", "A/7 b", "unroute"]);
        assert_eq!(
            url.as_str(),
            "http://routes.example.com/api/orders/A%2F7%20b/unroute"
        );
    }

    #[rstest]
    #[case::unparseable("not a url")]
    #[case::relative("/routes")]
    fn rejects_invalid_base_url(#[case] base_url: &str) {
        let err = HttpRouteStore::new(base_url, "r1").expect_err("URL should be rejected");
        assert!(matches!(err, StoreBuildError::InvalidUrl { .. }), "got {err:?}");
    }

    #[rstest]
    fn rejects_non_base_url() {
        let err = HttpRouteStore::new("mailto:dispatch@example.com", "r1")
            .expect_err("URL should be rejected");
        assert!(matches!(err, StoreBuildError::NotABase(_)), "got {err:?}");
    }

    #[rstest]
    #[case::absent(None)]
    #[case::blank(Some("  "))]
    fn requires_route_id(#[case] route_id: Option<&str>) {
        let mut config = HttpRouteStoreConfig::new("http://localhost:8080");
        config.route_id = route_id.map(str::to_owned);
        let err = HttpRouteStore::with_config(config).expect_err("route id is required");
        assert!(matches!(err, StoreBuildError::MissingRouteId), "got {err:?}");
    }

    #[rstest]
    fn empty_records_skip_the_network() {
        // Nothing listens on the discard port; any request would fail.
        let store = HttpRouteStore::new("http://127.0.0.1:9", "r1").expect("store should build");
        assert_eq!(store.reposition_stops(&[]), Ok(()));
        assert_eq!(store.reposition_legs(&[]), Ok(()));
    }

    #[rstest]
    fn unreachable_service_is_a_network_error() {
        let config = HttpRouteStoreConfig::new("http://127.0.0.1:9")
            .with_route_id("r1")
            .with_timeout(Duration::from_secs(5));
        let store = HttpRouteStore::with_config(config).expect("store should build");
        let err = store
            .detach_leg(&OrderId::new("O1"), LegType::Pickup)
            .expect_err("nothing is listening");
        assert!(
            matches!(err, RouteStoreError::Network { ref url, .. } if url.ends_with("/orders/O1/unroute")),
            "got {err:?}"
        );
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpRouteStoreConfig::new("http://example.com")
            .with_route_id("r9")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.route_id.as_deref(), Some("r9"));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[rstest]
    fn default_config_targets_local_service() {
        let config = HttpRouteStoreConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.route_id.is_none());
    }
}
