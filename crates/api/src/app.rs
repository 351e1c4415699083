use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{admin, events, health, payments, promo_codes, registrations};
use domain::services::{MockPaymentService, PaymentService, PricingRates};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub payment: Arc<dyn PaymentService>,
    pub rates: Arc<PricingRates>,
}

impl AppState {
    /// Builds state with the payment provider named in the configuration.
    pub fn new(config: Config, pool: PgPool) -> Self {
        let payment: Arc<dyn PaymentService> = Arc::new(MockPaymentService {
            simulate_failure: config.payment.simulate_failure,
        });
        Self::with_payment(config, pool, payment)
    }

    pub fn with_payment(config: Config, pool: PgPool, payment: Arc<dyn PaymentService>) -> Self {
        Self {
            pool,
            rate_limiter: RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new),
            rates: Arc::new(config.pricing.rates()),
            config: Arc::new(config),
            payment,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    router(AppState::new(config, pool))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    // Only registration submissions are rate limited.
    let submission_routes = Router::new()
        .route(
            "/api/v1/registrations",
            post(registrations::create_registration),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:slug", get(events::get_event))
        .route("/api/v1/events/:slug/quote", post(events::quote_event))
        .route(
            "/api/v1/promo-codes/:code",
            get(promo_codes::get_promo_code_status),
        )
        .route(
            "/api/v1/registrations/:confirmation_number",
            get(registrations::get_registration),
        )
        .route(
            "/api/v1/registrations/:confirmation_number/payment",
            post(payments::start_payment),
        )
        .route(
            "/api/v1/registrations/:confirmation_number/payment/confirm",
            post(payments::confirm_payment),
        );

    let admin_routes = Router::new()
        .route("/api/v1/admin/stats", get(admin::get_stats))
        .route(
            "/api/v1/admin/registrations",
            get(admin::list_registrations),
        )
        .route(
            "/api/v1/admin/registrations/:confirmation_number",
            get(admin::get_registration).patch(admin::update_registration),
        )
        .route(
            "/api/v1/admin/registrations/:confirmation_number/refund",
            post(admin::refund_registration),
        )
        .route(
            "/api/v1/admin/promo-codes",
            get(admin::list_promo_codes).post(admin::create_promo_code),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(submission_routes)
        .merge(admin_routes)
        .with_state(state.clone())
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
}
