//! HTTP API tests
//!
//! Requests go through the real router with `tower::ServiceExt::oneshot`.

use autobot_common::{ContentHash, Country};
use autobot_server::api::{create_router, AppState};
use autobot_server::store::{LogOutcome, SyncLogEntry, VehicleStore};
use autobot_server::vehicle::{Vehicle, VehicleMeta};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Helper Functions
// ============================================================================

fn vehicle(reg_nr: &str, vin: &str) -> Vehicle {
    Vehicle {
        reg_nr: reg_nr.to_string(),
        vin: vin.to_string(),
        brand: "Skoda".to_string(),
        model: "Octavia".to_string(),
        fuel_type: "Diesel".to_string(),
        first_reg_date: NaiveDate::from_ymd_opt(2018, 9, 3).unwrap(),
        meta: VehicleMeta {
            hash: ContentHash::new(0),
            source: "DMR".to_string(),
            ident: 7,
            last_updated: Utc::now(),
            disabled: false,
            country: Country::Dk,
        },
    }
    .with_content_hash()
    .unwrap()
}

async fn test_app() -> (Router, Arc<VehicleStore>, Vehicle) {
    let store = Arc::new(VehicleStore::in_memory());
    let car = vehicle("XY98765", "TMBJJ7NE0J0000001");
    store.upsert(car.clone()).await.unwrap();
    (create_router(AppState::new(store.clone())), store, car)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections answer in plain text
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

// ============================================================================
// Status
// ============================================================================

#[tokio::test]
async fn test_root_reports_running() {
    let (app, _, _) = test_app().await;
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["uptime"].as_str().unwrap().ends_with('s'));
}

#[tokio::test]
async fn test_store_status() {
    let (app, store, _) = test_app().await;
    store
        .append_log(SyncLogEntry::new(LogOutcome::Completed, "synced export"))
        .await
        .unwrap();

    let (status, body) = get(&app, "/vehiclestore/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["historySize"], 1);
    assert_eq!(body["lastStatusMessage"], "synced export");
    assert!(body["lastStatusAt"].is_string());
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_lookup_by_each_key() {
    let (app, _, car) = test_app().await;
    let hash = car.hash().as_key();

    for uri in [
        format!("/lookup?hash={}", hash),
        "/lookup?country=dk&regnr=xy98765".to_string(),
        "/lookup?country=DK&vin=TMBJJ7NE0J0000001".to_string(),
    ] {
        let (status, body) = get(&app, &uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["hash"], hash);
        assert_eq!(body["regNr"], "XY98765");
        assert_eq!(body["country"], "DK");
        assert_eq!(body["firstRegDate"], "2018-09-03");
        assert_eq!(body["fuelType"], "Diesel");
    }
}

#[tokio::test]
async fn test_lookup_requires_exactly_one_key() {
    let (app, _, _) = test_app().await;

    for uri in [
        "/lookup",
        "/lookup?country=dk",
        "/lookup?country=dk&regnr=XY98765&vin=TMBJJ7NE0J0000001",
        "/lookup?hash=1&regnr=XY98765",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_lookup_requires_valid_country() {
    let (app, _, _) = test_app().await;

    let (status, _) = get(&app, "/lookup?regnr=XY98765").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app, "/lookup?country=zz&regnr=XY98765").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CONFIG_ERROR");
}

#[tokio::test]
async fn test_lookup_miss_and_bad_hash() {
    let (app, _, _) = test_app().await;

    let (status, body) = get(&app, "/lookup?country=dk&regnr=NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = get(&app, "/lookup?hash=not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "HASH_ERROR");
}

// ============================================================================
// Enable / disable
// ============================================================================

#[tokio::test]
async fn test_disable_hides_vehicle_from_lookups() {
    let (app, _, car) = test_app().await;
    let hash = car.hash().as_key();

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/vehicle",
        Some(json!({"hash": hash, "op": "disable"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["disabled"], true);

    let (status, _) = get(&app, "/lookup?country=dk&regnr=XY98765").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Hash lookups ignore the disabled flag
    let (status, _) = get(&app, &format!("/lookup?hash={}", hash)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/vehicle",
        Some(json!({"hash": hash, "op": "enable"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/lookup?country=dk&regnr=XY98765").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_patch_unknown_vehicle() {
    let (app, _, _) = test_app().await;
    let (status, body) = send(
        &app,
        Method::PATCH,
        "/vehicle",
        Some(json!({"hash": "42", "op": "disable"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_patch_rejects_unknown_op() {
    let (app, _, car) = test_app().await;
    let (status, _) = send(
        &app,
        Method::PATCH,
        "/vehicle",
        Some(json!({"hash": car.hash().as_key(), "op": "delete"})),
    )
    .await;
    assert!(status.is_client_error());
}
