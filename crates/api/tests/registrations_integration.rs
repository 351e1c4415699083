//! Integration tests for registration submission and lookup.
//!
//! Requires PostgreSQL; set TEST_DATABASE_URL.
//! Run with: cargo test --test registrations_integration

mod common;

use axum::http::{header, Method, StatusCode};
use common::{
    create_promo_code, create_test_event, get_request, json_request, parse_response_body,
    registration_payload, setup, submit_registration, test_config, unique_suffix,
};
use dental_masterclass_api::app::create_app;
use serde_json::json;
use tokio::task::JoinSet;
use tower::ServiceExt;

#[tokio::test]
async fn test_create_registration_success() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["email"] = json!("Amira.Khan.Reg@Example.com");
    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/registrations", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    let data = &body["data"];
    assert_eq!(body["success"], true);
    assert!(data["confirmation_number"].as_str().unwrap().starts_with("DM-"));
    assert_eq!(data["email"], "amira.khan.reg@example.com");
    assert_eq!(data["course_days"], 2);
    assert_eq!(data["pricing"]["base_price"], 1800.0);
    assert_eq!(data["pricing"]["total"], 1800.0);
    assert_eq!(data["pricing"]["currency"], "GBP");
    assert_eq!(data["payment_status"], "pending");
    assert_eq!(data["status"], "pending");
}

#[tokio::test]
async fn test_server_prices_extras_and_ignores_client_total() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["course_days"] = json!(3);
    payload["accommodation_type"] = json!("single");
    payload["accommodation_nights"] = json!(2);
    payload["certificate_type"] = json!("hardcopy");
    payload["materials_kit"] = json!(true);
    payload["networking_dinner"] = json!(true);
    payload["client_quote"] = json!({ "base_price": 1.0, "extras": [], "total": 1.0 });

    let body = submit_registration(&app, payload).await;
    let pricing = &body["data"]["pricing"];

    assert_eq!(pricing["base_price"], 2500.0);
    assert_eq!(pricing["accommodation"], 200.0);
    assert_eq!(pricing["certificate"], 25.0);
    assert_eq!(pricing["materials"], 150.0);
    assert_eq!(pricing["dinner"], 75.0);
    assert_eq!(pricing["food"], 0.0);
    assert_eq!(pricing["total"], 2950.0);
}

#[tokio::test]
async fn test_nights_ignored_without_accommodation() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["accommodation_nights"] = json!(3);

    let body = submit_registration(&app, payload).await;
    assert_eq!(body["data"]["pricing"]["accommodation"], 0.0);
    assert!(body["data"]["accommodation_nights"].is_null());
}

#[tokio::test]
async fn test_registration_with_percentage_promo() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;
    let code = create_promo_code(
        &app,
        json!({
            "code": format!("pct{}", unique_suffix()),
            "discount_type": "percentage",
            "discount_value": 10.0
        }),
    )
    .await;

    let mut payload = registration_payload(event.id);
    payload["promo_code"] = json!(code.to_lowercase());

    let body = submit_registration(&app, payload).await;
    assert_eq!(body["data"]["promo_code"], code);
    assert_eq!(body["data"]["pricing"]["discount"], 180.0);
    assert_eq!(body["data"]["pricing"]["total"], 1620.0);
}

#[tokio::test]
async fn test_fixed_promo_never_makes_total_negative() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;
    let code = create_promo_code(
        &app,
        json!({
            "code": format!("FIX{}", unique_suffix()),
            "discount_type": "fixed",
            "discount_value": 5000.0
        }),
    )
    .await;

    let mut payload = registration_payload(event.id);
    payload["promo_code"] = json!(code);

    let body = submit_registration(&app, payload).await;
    assert_eq!(body["data"]["pricing"]["discount"], 1800.0);
    assert_eq!(body["data"]["pricing"]["total"], 0.0);
}

#[tokio::test]
async fn test_exhausted_promo_code_is_rejected() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;
    let code = create_promo_code(
        &app,
        json!({
            "code": format!("ONCE{}", unique_suffix()),
            "discount_type": "fixed",
            "discount_value": 100.0,
            "max_uses": 1
        }),
    )
    .await;

    let mut first = registration_payload(event.id);
    first["promo_code"] = json!(code);
    submit_registration(&app, first).await;

    let mut second = registration_payload(event.id);
    second["promo_code"] = json!(code);
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/registrations", second))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "Promo code is invalid or expired");

    let status = parse_response_body(
        app.oneshot(get_request(&format!("/api/v1/promo-codes/{}", code)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status["data"]["is_valid"], false);
}

#[tokio::test]
async fn test_single_use_promo_code_redeemed_once_under_concurrency() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;
    let code = create_promo_code(
        &app,
        json!({
            "code": format!("RACE{}", unique_suffix()),
            "discount_type": "percentage",
            "discount_value": 10.0,
            "max_uses": 1
        }),
    )
    .await;

    let mut submissions = JoinSet::new();
    for _ in 0..8 {
        let mut payload = registration_payload(event.id);
        payload["promo_code"] = json!(code);
        let app = app.clone();
        submissions.spawn(async move {
            app.oneshot(json_request(Method::POST, "/api/v1/registrations", payload))
                .await
                .unwrap()
                .status()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = submissions.join_next().await {
        statuses.push(status.unwrap());
    }
    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let rejected = statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count();
    assert_eq!(created, 1, "statuses: {:?}", statuses);
    assert_eq!(rejected, 7, "statuses: {:?}", statuses);

    let current_uses: i32 =
        sqlx::query_scalar("SELECT current_uses FROM promo_codes WHERE code = $1")
            .bind(&code)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(current_uses, 1);

    let redeemed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND promo_code = $2",
    )
    .bind(event.id)
    .bind(&code)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(redeemed, 1);
}

#[tokio::test]
async fn test_unknown_promo_code_is_rejected() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["promo_code"] = json!("DOESNOTEXIST");

    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/registrations", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["first_name"] = json!("A");
    payload["email"] = json!("not-an-email");

    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/registrations", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["email", "first_name"]);
}

#[tokio::test]
async fn test_terms_must_be_accepted() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["agree_to_terms"] = json!(false);

    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/registrations", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "agree_to_terms");
}

#[tokio::test]
async fn test_accommodation_requires_nights() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut payload = registration_payload(event.id);
    payload["accommodation_type"] = json!("shared");

    let response = app
        .oneshot(json_request(Method::POST, "/api/v1/registrations", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "accommodation_nights");
}

#[tokio::test]
async fn test_unknown_event_returns_404() {
    let (app, _pool) = setup().await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/registrations",
            registration_payload(uuid::Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_registration_by_confirmation_number() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;
    let created = submit_registration(&app, registration_payload(event.id)).await;
    let confirmation = created["data"]["confirmation_number"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/registrations/{}",
            confirmation.to_lowercase()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["id"], created["data"]["id"]);

    let response = app
        .oneshot(get_request("/api/v1/registrations/DM-NOPE0000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_confirmation_numbers_are_unique() {
    let (app, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..5 {
        let body = submit_registration(&app, registration_payload(event.id)).await;
        let number = body["data"]["confirmation_number"].as_str().unwrap().to_string();
        assert!(seen.insert(number));
    }
}

#[tokio::test]
async fn test_submissions_are_rate_limited_per_client() {
    let (_, pool) = setup().await;
    let event = create_test_event(&pool).await;

    let mut config = test_config();
    config.security.rate_limit_per_minute = 1;
    let app = create_app(config, pool);

    let request = |ip: &str| {
        let mut req = json_request(
            Method::POST,
            "/api/v1/registrations",
            registration_payload(event.id),
        );
        req.headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        req
    };

    let first = app.clone().oneshot(request("203.0.113.10")).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.clone().oneshot(request("203.0.113.10")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));

    let other_client = app.oneshot(request("203.0.113.11")).await.unwrap();
    assert_eq!(other_client.status(), StatusCode::CREATED);
}
