//! The same merchant → customer flow driven through the HTTP router

use crate::test_utils::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hexpay_core::{Config, GeofenceStore};
use hexpay_node::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_on(db: &TempDb) -> Router {
    let mut config = Config::default_config();
    config.storage.database_path = db.path.to_string_lossy().into_owned();
    config.validation.inside_message = "inside".to_string();
    config.validation.outside_message = "outside".to_string();
    build_router(Arc::new(AppState::new(config).unwrap()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_register_then_validate_over_http() {
    init_test_logging();
    let db = TempDb::new();
    let app = app_on(&db);

    let geofence = committed_geofence(RIYADH, 9, 1, "cafe-1");
    let (status, _) = call(
        &app,
        "POST",
        "/api/v1/merchants",
        json!({
            "merchant_id": "cafe-1",
            "merchant_name": "Cafe One",
            "phone": "+966500000000",
            "h3_indices": geofence.cell_strings(),
            "h3_resolution": 9
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, inside) = call(
        &app,
        "POST",
        "/api/v1/validate/location",
        json!({"latitude": RIYADH.0, "longitude": RIYADH.1, "merchant_id": "cafe-1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inside["is_valid"], true);
    assert_eq!(inside["message"], "inside");

    let (_, outside) = call(
        &app,
        "POST",
        "/api/v1/validate/location",
        json!({"latitude": JEDDAH.0, "longitude": JEDDAH.1, "merchant_id": "cafe-1"}),
    )
    .await;
    assert_eq!(outside["is_valid"], false);
    assert_eq!(outside["message"], "outside");

    // What the service wrote is readable through the store directly
    drop(app);
    let store = db.open();
    assert_eq!(store.load("cafe-1").unwrap(), Some(geofence));
}

#[tokio::test]
async fn test_moving_the_geofence_over_http() {
    let db = TempDb::new();
    let app = app_on(&db);

    let riyadh = committed_geofence(RIYADH, 9, 0, "cafe-1");
    call(
        &app,
        "POST",
        "/api/v1/merchants",
        json!({
            "merchant_id": "cafe-1",
            "merchant_name": "Cafe One",
            "phone": "+966500000000",
            "h3_indices": riyadh.cell_strings(),
            "h3_resolution": 9
        }),
    )
    .await;

    let jeddah = committed_geofence(JEDDAH, 9, 1, "cafe-1");
    let (status, updated) = call(
        &app,
        "PUT",
        "/api/v1/merchants/cafe-1",
        json!({"h3_indices": jeddah.cell_strings()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["h3_indices"].as_array().unwrap().len(), 7);

    let (_, verdict) = call(
        &app,
        "POST",
        "/api/v1/validate/location",
        json!({"latitude": RIYADH.0, "longitude": RIYADH.1, "merchant_id": "cafe-1"}),
    )
    .await;
    assert_eq!(verdict["is_valid"], false);

    let (status, latest) = call(&app, "GET", "/api/v1/h3-data/latest", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest["merchant_id"], "cafe-1");
    assert_eq!(latest["h3_indices"], json!(jeddah.cell_strings()));
}
