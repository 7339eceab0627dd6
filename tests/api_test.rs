mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use pretty_assertions::assert_eq;
use rowing_log::api::routes::create_routes;
use rowing_log::config::AppConfig;
use serde_json::{json, Value};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

use common::{init_test_logging, lazy_pool, sample_export, send, test_app, test_pool};

#[tokio::test]
async fn test_health_check_endpoint() {
    init_test_logging();
    let app = test_app(lazy_pool());

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "rowing-log");
    // A lazy pool has opened nothing yet
    assert_eq!(body["database_pool"]["connections"], 0);
    assert_eq!(body["database_pool"]["closed"], false);
}

#[tokio::test]
async fn test_invalid_period_keys_are_rejected() {
    let app = test_app(lazy_pool());

    let (status, body) = send(&app, Method::GET, "/api/v1/periods/week/2023-35", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let (status, _) = send(&app, Method::GET, "/api/v1/periods/month/2024-13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/periods/date/14-03-2024", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/periods/year/12", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/v1/workouts/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_PATH");
}

#[tokio::test]
async fn test_manual_workout_missing_fields() {
    let app = test_app(lazy_pool());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/workouts/manual",
        Some(json!({ "workout_date": "2024-03-14", "distance_meters": 2000 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .ends_with("Date, Time, Distance, and Equipment are required fields."));
}

#[tokio::test]
async fn test_json_submission_without_data() {
    let app = test_app(lazy_pool());

    let (status, body) = send(&app, Method::POST, "/api/v1/workouts/json", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_EXPORT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/workouts/json",
        Some(json!({ "json_data": "{not json" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_EXPORT");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/workouts/json",
        Some(json!({ "json_data": { "data": { "date": "14/03/2024" } } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let config = AppConfig {
        max_content_length: 64,
        ..AppConfig::default()
    };
    let app = create_routes(lazy_pool(), &config);

    let payload = json!({ "json_data": "x".repeat(256) }).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/workouts/json")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
#[serial]
async fn test_manual_workout_lifecycle() {
    init_test_logging();
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);

    let (status, equipment) = send(&app, Method::GET, "/api/v1/equipment", None).await;
    assert_eq!(status, StatusCode::OK);
    let equipment_type_id = equipment
        .as_array()
        .and_then(|list| list.first())
        .map(|e| e["equipment_type_id"].clone())
        .unwrap();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/workouts/manual",
        Some(json!({
            "workout_date": "1999-06-15",
            "workout_time": "8:00.0",
            "distance_meters": 2000,
            "level": 5,
            "notes": "  easy  ",
            "equipment_type_id": equipment_type_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["workout_name"], "Rowing");
    assert_eq!(created["duration_seconds"], 480.0);
    assert_eq!(created["average_split_seconds_500m"], 120.0);
    // Notes are kept verbatim; only blank ones become null
    assert_eq!(created["notes"], "  easy  ");
    assert!(created["cardio_log_id"].as_str().unwrap().starts_with("manual_"));

    let workout_id = created["workout_id"].as_i64().unwrap();
    let uri = format!("/api/v1/workouts/{}", workout_id);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("{}/notes", uri),
        Some(json!({ "notes": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], Value::Null);

    let (status, day) = send(&app, Method::GET, "/api/v1/periods/date/1999-06-15", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(day["workouts"]
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w["workout_id"].as_i64() == Some(workout_id)));

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
#[serial]
async fn test_json_import_and_duplicate_detection() {
    init_test_logging();
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);

    let cardio_log_id = Uuid::new_v4().to_string();
    let export = sample_export(&cardio_log_id, "15/06/1999");

    // The export may arrive as an encoded string
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/workouts/json",
        Some(json!({ "json_data": export.to_string(), "notes": "imported" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    assert_eq!(created["samples_stored"], 18);
    assert_eq!(created["heart_rate_samples_stored"], 3);
    assert_eq!(created["workout"]["total_distance_meters"], 500.0);
    assert_eq!(created["workout"]["notes"], "imported");

    let workout_id = created["workout"]["workout_id"].as_i64().unwrap();

    let (status, duplicate) = send(
        &app,
        Method::POST,
        "/api/v1/workouts/json",
        Some(json!({ "json_data": export })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["error"], "DUPLICATE_WORKOUT");
    assert_eq!(duplicate["details"]["workout_id"].as_i64(), Some(workout_id));

    let uri = format!("/api/v1/workouts/{}", workout_id);
    let (status, detail) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["equipment_name"], "SKILLROW");
    assert_eq!(detail["charts"].as_array().unwrap().len(), 3);
    assert_eq!(detail["heart_rate"]["samples"].as_array().unwrap().len(), 3);
    // No zones in the export, so they come from the configured floors
    assert_eq!(detail["heart_rate"]["zones_derived"], true);

    let (status, week) = send(&app, Method::GET, "/api/v1/periods/week/1999-W24", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["days"].as_array().unwrap().len(), 7);

    let (status, month) = send(&app, Method::GET, "/api/v1/periods/month/1999-06", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(month["days"].as_array().unwrap().len(), 30);

    let (status, year) = send(&app, Method::GET, "/api/v1/periods/year/1999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(year["months"].as_array().unwrap().len(), 12);
    assert!(year["totals"]["meters"].as_f64().unwrap() >= 500.0);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[serial]
async fn test_rankings_and_settings() {
    init_test_logging();
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);

    let (status, rankings) = send(&app, Method::GET, "/api/v1/rankings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rankings["selected_year"], Value::Null);
    assert!(rankings["boards"].is_array());

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/rankings/settings",
        Some(json!({ "type": "distance", "value": 1234, "label": "Odd distance" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ranking_id = created["ranking_id"].as_i64().unwrap();

    let (status, board) = send(
        &app,
        Method::GET,
        &format!("/api/v1/rankings/{}/month/1999-06", ranking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["label"], "Odd distance");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/rankings/settings/{}", ranking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/rankings/settings",
        Some(json!({ "type": "pace", "value": 1, "label": "Nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/settings/per_page_workouts",
        Some(json!({ "value": "zero" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/settings/per_page_workouts",
        Some(json!({ "value": "9223372036854775807" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, setting) = send(
        &app,
        Method::PUT,
        "/api/v1/settings/per_page_workouts",
        Some(json!({ "value": "20" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(setting["value"], "20");
}

#[tokio::test]
#[serial]
async fn test_concurrent_imports_share_new_descriptors() {
    init_test_logging();
    let Some(pool) = test_pool().await else { return };
    let app = test_app(pool);

    // Both exports introduce the same never-seen descriptor
    let metric_name = format!("Drag {}", Uuid::new_v4());
    let exports: Vec<Value> = (0..2)
        .map(|_| {
            let mut export = sample_export(&Uuid::new_v4().to_string(), "16/06/1999");
            export["data"]["analitics"]["descriptor"][5]["pr"]["name"] = json!(metric_name);
            export
        })
        .collect();

    let (first, second) = tokio::join!(
        send(
            &app,
            Method::POST,
            "/api/v1/workouts/json",
            Some(json!({ "json_data": exports[0] })),
        ),
        send(
            &app,
            Method::POST,
            "/api/v1/workouts/json",
            Some(json!({ "json_data": exports[1] })),
        ),
    );

    for (status, created) in [first, second] {
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["samples_stored"], 18);
        let uri = format!("/api/v1/workouts/{}", created["workout"]["workout_id"]);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
