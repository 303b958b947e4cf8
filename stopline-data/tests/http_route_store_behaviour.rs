//! Behavioural tests for [`HttpRouteStore`] against a loopback stub service.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use std::cell::RefCell;
use stopline_core::{CustomerId, LegType, OrderId, PositionChange, RouteStore, RouteStoreError};
use stopline_data::remote::HttpRouteStore;
use stopline_data::remote::test_support::{RecordedRequest, StubRouteService};

/// World state for HTTP store scenarios.
#[derive(Debug, Default)]
struct StoreWorld {
    service: RefCell<Option<StubRouteService>>,
    result: RefCell<Option<Result<(), RouteStoreError>>>,
}

impl StoreWorld {
    fn serve(&self, status: u16, body: &str) {
        let service = StubRouteService::start(status, body).expect("stub service should bind");
        self.service.replace(Some(service));
    }

    fn store(&self) -> HttpRouteStore {
        let guard = self.service.borrow();
        let service = guard.as_ref().expect("service must be started");
        HttpRouteStore::new(service.base_url(), "r1").expect("store should build")
    }

    fn single_request(&self) -> RecordedRequest {
        let service = self.service.take().expect("service must be started");
        let mut requests = service.finish().expect("stub service should stop cleanly");
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.remove(0)
    }
}

#[fixture]
fn world() -> StoreWorld {
    StoreWorld::default()
}

// --- Given steps ---

#[given("a route service that accepts requests")]
fn accepting_service(world: &StoreWorld) {
    world.serve(200, r#"{"status": "ok"}"#);
}

#[given("a route service that fails with status 500")]
fn failing_service(world: &StoreWorld) {
    world.serve(500, r#"{"message": "database unavailable"}"#);
}

#[given("a route service that refuses the change")]
fn refusing_service(world: &StoreWorld) {
    world.serve(200, r#"{"error": "order O5 is already delivered"}"#);
}

// --- When steps ---

#[when("stop positions for route r1 are stored")]
fn store_stop_positions(world: &StoreWorld) {
    let changes = [
        PositionChange {
            customer_id: Some(CustomerId::new("C2")),
            previous_position: 2,
            new_position: 1,
        },
        PositionChange {
            customer_id: Some(CustomerId::new("C1")),
            previous_position: 1,
            new_position: 2,
        },
    ];
    let result = world.store().reposition_stops(&changes);
    world.result.replace(Some(result));
}

#[when("the delivery of order O5 is detached")]
fn detach_delivery(world: &StoreWorld) {
    let result = world
        .store()
        .detach_leg(&OrderId::new("O5"), LegType::Delivery);
    world.result.replace(Some(result));
}

// --- Then steps ---

#[then("the service receives the changes at /routes/r1/stops/positions")]
fn receives_changes(world: &StoreWorld) {
    assert_eq!(world.result.take(), Some(Ok(())));
    let request = world.single_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/routes/r1/stops/positions");
    assert_eq!(
        request.json().expect("body should be JSON"),
        json!({"changes": [
            {"customer_id": "C2", "previous_position": 2, "new_position": 1},
            {"customer_id": "C1", "previous_position": 1, "new_position": 2},
        ]})
    );
}

#[then("the service receives the leg type at /orders/O5/unroute")]
fn receives_leg_type(world: &StoreWorld) {
    assert_eq!(world.result.take(), Some(Ok(())));
    let request = world.single_request();
    assert_eq!(request.path, "/orders/O5/unroute");
    assert_eq!(
        request.json().expect("body should be JSON"),
        json!({"leg_type": "delivery"})
    );
}

#[then("an HTTP error with status 500 is returned")]
fn http_error(world: &StoreWorld) {
    let result = world.result.take();
    assert!(
        matches!(result, Some(Err(RouteStoreError::Http { status: 500, .. }))),
        "expected HTTP 500, got {result:?}"
    );
    world.single_request();
}

#[then("a service error is returned")]
fn service_error(world: &StoreWorld) {
    let result = world.result.take();
    assert_eq!(
        result,
        Some(Err(RouteStoreError::Service {
            message: "order O5 is already delivered".to_owned(),
        }))
    );
    world.single_request();
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/http_route_store.feature", name = $title)]
        fn $fn_name(world: StoreWorld) {
            let _ = world;
        }
    };
}

register_scenario!(posting_stop_positions, "posting changed stop positions");
register_scenario!(detaching_leg, "detaching a removed leg");
register_scenario!(failing_service_reports_status, "reporting a failing service");
register_scenario!(refused_change_reports_reason, "reporting a refused change");
