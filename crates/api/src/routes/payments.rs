//! Mock payment flow for a registration.
//!
//! `pending`/`failed` → `processing` when a payment starts, then
//! `processing` → `completed` | `failed` when the outcome is confirmed.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::registrations::load_registration;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use crate::response::{ok, Envelope};
use domain::models::{ConfirmPaymentRequest, PaymentStatus, Registration};
use persistence::repositories::{PaymentRefs, RegistrationRepository};

/// What the client needs to complete a payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StartPaymentResponse {
    pub confirmation_number: String,
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: f64,
    pub currency: String,
    pub payment_status: PaymentStatus,
}

fn stale_status() -> ApiError {
    ApiError::Conflict("Payment status changed, please reload the registration".to_string())
}

fn closed_registration(registration: &Registration) -> ApiError {
    ApiError::Conflict(format!(
        "Payment is not accepted for a {} registration",
        registration.status
    ))
}

/// POST /api/v1/registrations/:confirmation_number/payment
pub async fn start_payment(
    State(state): State<AppState>,
    Path(confirmation_number): Path<String>,
) -> Result<Json<Envelope<StartPaymentResponse>>, ApiError> {
    let registration = load_registration(&state, &confirmation_number).await?;
    if !registration.status.accepts_payment() {
        return Err(closed_registration(&registration));
    }
    let current = registration.payment_status;
    if !current.can_transition_to(PaymentStatus::Processing) {
        return Err(ApiError::Conflict(format!(
            "Payment cannot be started while {}",
            current
        )));
    }

    let intent = state
        .payment
        .create_intent(
            &registration.confirmation_number,
            &registration.email,
            registration.pricing.total,
            &registration.pricing.currency,
        )
        .await
        .map_err(|e| {
            tracing::warn!(
                confirmation_number = %registration.confirmation_number,
                error = %e,
                "Payment intent creation failed"
            );
            ApiError::PaymentFailed("Payment could not be started".to_string())
        })?;

    let updated = RegistrationRepository::new(state.pool.clone())
        .transition_payment(
            &registration.confirmation_number,
            current,
            PaymentStatus::Processing,
            Some(PaymentRefs {
                payment_intent_id: &intent.payment_intent_id,
                customer_id: &intent.customer_id,
            }),
        )
        .await?
        .ok_or_else(stale_status)?;

    tracing::info!(
        confirmation_number = %updated.confirmation_number,
        payment_intent_id = %intent.payment_intent_id,
        amount = intent.amount,
        "Payment started"
    );

    Ok(ok(StartPaymentResponse {
        confirmation_number: updated.confirmation_number,
        payment_intent_id: intent.payment_intent_id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        currency: intent.currency,
        payment_status: updated.payment_status,
    }))
}

/// POST /api/v1/registrations/:confirmation_number/payment/confirm
///
/// Records the outcome reported for a payment in progress. A successful
/// payment also confirms a pending registration; it is refused once the
/// registration is cancelled or attended, while a failure is still recorded.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(confirmation_number): Path<String>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<Envelope<Registration>>, ApiError> {
    let registration = load_registration(&state, &confirmation_number).await?;
    if registration.payment_status != PaymentStatus::Processing {
        return Err(ApiError::Conflict(format!(
            "No payment in progress (status is {})",
            registration.payment_status
        )));
    }
    if request.succeeded && !registration.status.accepts_payment() {
        return Err(closed_registration(&registration));
    }

    let (target, outcome) = if request.succeeded {
        (PaymentStatus::Completed, "completed")
    } else {
        (PaymentStatus::Failed, "failed")
    };

    let updated = RegistrationRepository::new(state.pool.clone())
        .transition_payment(
            &registration.confirmation_number,
            PaymentStatus::Processing,
            target,
            None,
        )
        .await?
        .ok_or_else(stale_status)?;

    metrics::record_payment_outcome(outcome);
    tracing::info!(
        confirmation_number = %updated.confirmation_number,
        payment_status = %updated.payment_status,
        status = %updated.status,
        "Payment outcome recorded"
    );

    Ok(ok(updated))
}
