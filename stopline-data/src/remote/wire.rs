//! Request and reply bodies exchanged with the route service.

use serde::{Deserialize, Serialize};
use stopline_core::{LegPlacement, LegType, PositionChange};

/// Body of `POST /routes/{route_id}/stops/positions`.
#[derive(Debug, Serialize)]
pub struct StopPositionsRequest<'a> {
    pub changes: &'a [PositionChange],
}

/// Body of `POST /routes/{route_id}/legs/positions`.
#[derive(Debug, Serialize)]
pub struct LegPositionsRequest<'a> {
    pub legs: &'a [LegPlacement],
}

/// Body of `POST /orders/{order_id}/unroute`.
#[derive(Debug, Serialize)]
pub struct UnrouteRequest {
    pub leg_type: LegType,
}

/// Optional JSON reply to a successful request.
///
/// The service may answer `2xx` with `{"error": "..."}` when it accepted the
/// request but refused the change. An empty or unrecognised body counts as
/// success.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceReply {
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceReply {
    /// Parse a reply body, treating anything unparseable as an empty reply.
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(body).unwrap_or_default()
    }
}
