use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use waypool_api::dispatcher::Dispatcher;
use waypool_api::handlers::{handle_command, ConnState};
use waypool_api::protocol::ClientCommand;
use waypool_api::sessions::SearchSessions;
use waypool_api::{app, AppState};
use waypool_booking::{BookingConfig, CapacityAllocator};
use waypool_match::{MatchConfig, MatchEngine, RideRegistry};
use waypool_routing::RoutingConfig;
use waypool_shared::GeoPoint;
use waypool_store::InMemoryStore;

fn test_state() -> AppState {
    let store = Arc::new(InMemoryStore::new());
    AppState {
        registry: Arc::new(RideRegistry::new()),
        engine: Arc::new(MatchEngine::new(MatchConfig::default())),
        dispatcher: Dispatcher::new(64),
        sessions: Arc::new(SearchSessions::new()),
        allocator: Arc::new(CapacityAllocator::new(store.clone())),
        rides: store.clone(),
        drivers: store,
        router: None,
        redis: None,
        routing_config: RoutingConfig::default(),
        booking_config: BookingConfig::default(),
    }
}

async fn start_ride(state: &AppState, ride_id: Uuid) {
    let (tx, _rx) = mpsc::unbounded_channel();
    let conn = ConnState::new(99, tx);
    let cmd: ClientCommand = serde_json::from_value(json!({
        "event": "ride:start",
        "data": {
            "ride_id": ride_id,
            "driver_id": Uuid::new_v4(),
            "driver_name": "Asha",
            "pickup": GeoPoint::new(12.905, 77.585),
            "destination": GeoPoint::new(12.95, 77.60)
        }
    }))
    .unwrap();
    handle_command(state, &conn, cmd).await;
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_lifecycle_over_rest() {
    let state = test_state();
    let app = app(state.clone());
    let ride_id = Uuid::new_v4();
    let rider_id = Uuid::new_v4();
    start_ride(&state, ride_id).await;

    // Book three of the four default seats.
    let response = app
        .clone()
        .oneshot(post(
            "/v1/bookings",
            json!({ "ride_id": ride_id, "rider_id": rider_id, "seat_count": 3, "fare": 150.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["occupied"], 3);
    assert_eq!(body["capacity"], 4);

    // Two more will not fit; the conflict carries the remaining count.
    let response = app
        .clone()
        .oneshot(post(
            "/v1/bookings",
            json!({ "ride_id": ride_id, "rider_id": Uuid::new_v4(), "seat_count": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["available"], 1);

    // Occupancy is untouched by the failed attempt.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/rides/{}/occupancy", ride_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["occupied"], 3);

    // Cancelling the booking releases exactly its seats.
    let response = app
        .clone()
        .oneshot(post(
            "/v1/bookings/cancel",
            json!({ "ride_id": ride_id, "rider_id": rider_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["occupied"], 0);
}

#[tokio::test]
async fn occupancy_correction_is_clamped() {
    let state = test_state();
    let app = app(state.clone());
    let ride_id = Uuid::new_v4();
    start_ride(&state, ride_id).await;

    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/rides/{}/occupancy", ride_id),
            json!({ "occupied": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["occupied"], 4);
}

#[tokio::test]
async fn booking_an_unknown_ride_is_not_found() {
    let state = test_state();
    let app = app(state);

    let response = app
        .oneshot(post(
            "/v1/bookings",
            json!({ "ride_id": Uuid::new_v4(), "rider_id": Uuid::new_v4(), "seat_count": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
