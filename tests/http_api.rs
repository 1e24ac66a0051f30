//! HTTP surface tests, driving the router without a socket

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{config, place, Call, FakeUpstream, Reply};
use serde_json::{json, Value};
use spontaria::http::{router, AppState};
use spontaria::{AirportAutocomplete, FlightAggregator, SharedUpstream};
use std::sync::Arc;
use tower::ServiceExt;

fn app(fake: &Arc<FakeUpstream>) -> Router {
    let upstream: SharedUpstream = fake.clone();
    let cfg = config();
    router(AppState {
        aggregator: Arc::new(FlightAggregator::new(cfg.clone(), upstream.clone()).unwrap()),
        autocomplete: Arc::new(AirportAutocomplete::new(&cfg, upstream)),
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let fake = Arc::new(FakeUpstream::new());
    let (status, body) = get(app(&fake), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_flights_without_origin_is_bad_request() {
    let fake = Arc::new(FakeUpstream::new());
    let (status, body) = get(app(&fake), "/api/flights?destination=LHR").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least one origin required");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_flights_bad_window_is_bad_request() {
    let fake = Arc::new(FakeUpstream::new());
    let (status, body) = get(app(&fake), "/api/flights?origin=JFK&depart_window=soon").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid time format"));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_flights_destination_mode_response_shape() {
    let fake = Arc::new(
        FakeUpstream::new()
            .with_prices(
                "JFK",
                "LHR",
                Reply::Items(vec![json!({
                    "origin": "JFK", "destination": "LHR", "price": 412, "airline": "BA",
                    "departure_at": "2025-08-15T19:30:00-04:00", "transfers": 0, "duration": 415,
                    "link": "/search/JFK1508LHR1"
                })]),
            )
            .with_prices("EWR", "LHR", Reply::Status(502)),
    );

    let (status, body) = get(
        app(&fake),
        "/api/flights?origin=JFK,EWR&destination=LHR&departure_date=2025-08-15",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.calls().len(), 2);
    assert_eq!(body["source"], "prices_for_dates");
    assert_eq!(body["count"], 1);

    let offer = &body["data"][0];
    assert_eq!(offer["origin"], "JFK");
    assert_eq!(offer["destinationName"], "London Heathrow");
    assert_eq!(offer["price"], 412.0);
    assert_eq!(offer["durationMinutes"], 415);
    assert_eq!(offer["airlineName"], "British Airways");
    assert_eq!(offer["direct"], true);
    assert_eq!(offer["departureAt"], "2025-08-15T19:30:00-04:00");
    assert_eq!(offer["bookingLink"], "https://www.aviasales.com/search/JFK1508LHR1");
}

#[tokio::test]
async fn test_flights_direct_only_accepts_numeric_flag() {
    let fake = Arc::new(FakeUpstream::new().with_prices(
        "JFK",
        "LHR",
        Reply::Items(vec![
            json!({"price": 300, "transfers": 1, "airline": "AA"}),
            json!({"price": 412, "transfers": 0, "airline": "BA"}),
        ]),
    ));

    let (status, body) = get(app(&fake), "/api/flights?origin=JFK&destination=LHR&direct_only=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["airlineCode"], "BA");
}

#[tokio::test]
async fn test_flights_bad_direct_only_is_json_bad_request() {
    let fake = Arc::new(FakeUpstream::new());
    let (status, body) = get(app(&fake), "/api/flights?origin=JFK&direct_only=maybe").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid parameter"));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_flights_anywhere_sorted_by_price() {
    let fake = Arc::new(FakeUpstream::new().with_special_offers(
        "BOS",
        Reply::Items(vec![
            json!({"destination": "CUN", "price": 240}),
            json!({"destination": "MIA", "price": 89}),
        ]),
    ));

    let (status, body) = get(app(&fake), "/api/flights?origin=BOS&destination=").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "special_offers");
    assert_eq!(body["data"][0]["destination"], "MIA");
    assert_eq!(body["data"][1]["destination"], "CUN");
}

#[tokio::test]
async fn test_airports_short_query() {
    let fake = Arc::new(FakeUpstream::new());
    let (status, body) = get(app(&fake), "/api/airports?q=L").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_airports_lookup() {
    let fake = Arc::new(FakeUpstream::new().with_places(vec![place(
        "airport",
        "Logan International",
        "BOS",
        Some("Boston"),
        Some("United States"),
    )]));

    let (status, body) = get(app(&fake), "/api/airports?q=boston").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fake.calls(), vec![Call::Places { term: "boston".to_string() }]);
    assert_eq!(
        body,
        json!([{"name": "Logan International", "code": "BOS", "city": "Boston"}])
    );
}

#[tokio::test]
async fn test_airports_upstream_failure_is_empty_ok() {
    let fake = Arc::new(FakeUpstream::new().with_failing_places(500));
    let (status, body) = get(app(&fake), "/api/airports?q=boston").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
