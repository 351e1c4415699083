//! Integration tests for event listing and quotes.
//!
//! Requires PostgreSQL; set TEST_DATABASE_URL.
//! Run with: cargo test --test events_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{create_event_with, create_test_event, get_request, json_request, parse_response_body, setup};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_list_events_includes_published_only() {
    let (app, pool) = setup().await;
    let published = create_test_event(&pool).await;
    let hidden = create_event_with(&pool, |e| e.is_published = false).await;

    let response = app.oneshot(get_request("/api/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    let slugs: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["slug"].as_str())
        .collect();
    assert!(slugs.contains(&published.slug.as_str()));
    assert!(!slugs.contains(&hidden.slug.as_str()));
}

#[tokio::test]
async fn test_get_event_by_slug() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let response = app
        .oneshot(get_request(&format!("/api/v1/events/{}", event.slug)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["id"], event.id.to_string());
    assert_eq!(body["data"]["multi_day_pricing"]["2"], 1800.0);
}

#[tokio::test]
async fn test_get_unknown_event_returns_404() {
    let (app, _pool) = setup().await;

    let response = app
        .oneshot(get_request("/api/v1/events/no-such-course"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_quote_with_accommodation() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/quote", event.slug),
            json!({ "course_days": 2, "accommodation_nights": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["base_price"], 1800.0);
    assert_eq!(body["data"]["extras"][0]["name"], "Accommodation (2 nights)");
    assert_eq!(body["data"]["extras"][0]["price"], 200.0);
    assert_eq!(body["data"]["total"], 2000.0);
}

#[tokio::test]
async fn test_quote_falls_back_to_tier_price() {
    let (app, pool) = setup().await;
    let event = create_event_with(&pool, |e| e.multi_day_pricing = None).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/quote", event.slug),
            json!({ "course_days": 1 }),
        ))
        .await
        .unwrap();
    let body = parse_response_body(response).await;

    assert_eq!(body["data"]["base_price"], 2500.0);
    assert!(body["data"]["extras"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["total"], 2500.0);
}

#[tokio::test]
async fn test_quote_rejects_out_of_range_days() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/quote", event.slug),
            json!({ "course_days": 4 }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_health_and_common_headers() {
    let (app, _pool) = setup().await;

    let request = axum::http::Request::builder()
        .uri("/api/health/live")
        .header("X-Request-ID", "req-events-1")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-events-1");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");

    let response = app.oneshot(get_request("/api/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
