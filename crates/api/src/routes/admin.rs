//! Admin endpoints: registration management, statistics and promo codes.
//!
//! Mounted behind [`require_admin`](crate::middleware::require_admin).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::registrations::load_registration;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use crate::response::{created, ok, Envelope};
use domain::models::{
    AdminStats, CreatePromoCodeRequest, PaymentStatus, PromoCode, Registration,
    RegistrationListResponse, RegistrationQuery, UpdateRegistrationRequest,
};
use persistence::repositories::{PromoCodeRepository, RegistrationFilter, RegistrationRepository};
use shared::pagination::{self, Pagination};

/// Page parameters for the promo code list.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct PageQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Per page must be between 1 and 100"))]
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PromoCodeListResponse {
    pub data: Vec<PromoCode>,
    pub pagination: Pagination,
}

/// GET /api/v1/admin/stats
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<Envelope<AdminStats>>, ApiError> {
    let stats = RegistrationRepository::new(state.pool.clone())
        .stats()
        .await?;
    Ok(ok(stats))
}

/// GET /api/v1/admin/registrations
///
/// Newest first, filtered by status, payment status, event and a free-text
/// search over names, email and confirmation number.
pub async fn list_registrations(
    State(state): State<AppState>,
    Query(query): Query<RegistrationQuery>,
) -> Result<Json<Envelope<RegistrationListResponse>>, ApiError> {
    query.validate()?;
    let (page, per_page) = pagination::normalize(query.page, query.per_page);

    let filter = RegistrationFilter {
        status: query.status,
        payment_status: query.payment_status,
        event_id: query.event_id,
        search: query.search,
    };

    let repo = RegistrationRepository::new(state.pool.clone());
    let data = repo
        .list(
            &filter,
            i64::from(per_page),
            pagination::offset(page, per_page),
        )
        .await?;
    let total = repo.count(&filter).await?;

    Ok(ok(RegistrationListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// GET /api/v1/admin/registrations/:confirmation_number
pub async fn get_registration(
    State(state): State<AppState>,
    Path(confirmation_number): Path<String>,
) -> Result<Json<Envelope<Registration>>, ApiError> {
    Ok(ok(load_registration(&state, &confirmation_number).await?))
}

/// PATCH /api/v1/admin/registrations/:confirmation_number
///
/// Changes the lifecycle status (only along allowed transitions) and/or
/// replaces the admin notes.
pub async fn update_registration(
    State(state): State<AppState>,
    Path(confirmation_number): Path<String>,
    Json(request): Json<UpdateRegistrationRequest>,
) -> Result<Json<Envelope<Registration>>, ApiError> {
    request.validate()?;
    let current = load_registration(&state, &confirmation_number).await?;

    let status = request.status.filter(|next| *next != current.status);
    if let Some(next) = status {
        if !current.status.can_transition_to(next) {
            return Err(ApiError::Validation(format!(
                "Cannot change status from {} to {}",
                current.status, next
            )));
        }
    }

    let updated = RegistrationRepository::new(state.pool.clone())
        .update_admin_fields(
            &current.confirmation_number,
            current.status,
            status,
            request.admin_notes.as_deref(),
        )
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Registration was modified concurrently, please retry".to_string())
        })?;

    info!(
        confirmation_number = %updated.confirmation_number,
        from = %current.status,
        to = %updated.status,
        notes_changed = request.admin_notes.is_some(),
        "Admin updated registration"
    );

    Ok(ok(updated))
}

/// POST /api/v1/admin/registrations/:confirmation_number/refund
///
/// Refunds a completed payment in full and cancels the registration.
pub async fn refund_registration(
    State(state): State<AppState>,
    Path(confirmation_number): Path<String>,
) -> Result<Json<Envelope<Registration>>, ApiError> {
    let registration = load_registration(&state, &confirmation_number).await?;
    if registration.payment_status != PaymentStatus::Completed {
        return Err(ApiError::Conflict(format!(
            "Only completed payments can be refunded (status is {})",
            registration.payment_status
        )));
    }

    let payment_intent_id = registration.payment_intent_id.as_deref().ok_or_else(|| {
        ApiError::Internal(format!(
            "Completed registration {} has no payment intent",
            registration.confirmation_number
        ))
    })?;

    state
        .payment
        .refund(payment_intent_id, registration.pricing.total)
        .await
        .map_err(|e| {
            tracing::warn!(
                confirmation_number = %registration.confirmation_number,
                error = %e,
                "Refund failed"
            );
            ApiError::PaymentFailed("Refund could not be processed".to_string())
        })?;

    let updated = RegistrationRepository::new(state.pool.clone())
        .transition_payment(
            &registration.confirmation_number,
            PaymentStatus::Completed,
            PaymentStatus::Refunded,
            None,
        )
        .await?
        .ok_or_else(|| ApiError::Conflict("Payment status changed during refund".to_string()))?;

    metrics::record_payment_outcome("refunded");
    info!(
        confirmation_number = %updated.confirmation_number,
        amount = updated.pricing.total,
        "Admin refunded registration"
    );

    Ok(ok(updated))
}

/// GET /api/v1/admin/promo-codes
pub async fn list_promo_codes(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Envelope<PromoCodeListResponse>>, ApiError> {
    query.validate()?;
    let (page, per_page) = pagination::normalize(query.page, query.per_page);

    let repo = PromoCodeRepository::new(state.pool.clone());
    let data = repo
        .list(i64::from(per_page), pagination::offset(page, per_page))
        .await?
        .into_iter()
        .map(PromoCode::from)
        .collect();
    let total = repo.count().await?;

    Ok(ok(PromoCodeListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

/// POST /api/v1/admin/promo-codes
pub async fn create_promo_code(
    State(state): State<AppState>,
    Json(request): Json<CreatePromoCodeRequest>,
) -> Result<(StatusCode, Json<Envelope<PromoCode>>), ApiError> {
    request.validate()?;
    request.check_consistency().map_err(ApiError::Validation)?;

    let promo = PromoCodeRepository::new(state.pool.clone())
        .create(&request)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Promo code already exists".to_string()),
            other => other,
        })?;
    let promo = PromoCode::from(promo);

    info!(
        code = %promo.code,
        discount_type = %promo.discount_type,
        discount_value = promo.discount_value,
        "Admin created promo code"
    );

    Ok(created(promo))
}
