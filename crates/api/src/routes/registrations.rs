//! Registration endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics;
use crate::response::{created, ok, Envelope};
use domain::models::{
    generate_confirmation_number, is_valid_confirmation_number, CourseEvent,
    CreateRegistrationRequest, PricingSnapshot, Registration,
};
use domain::services::{build_snapshot, Quote};
use persistence::repositories::{EventRepository, RegistrationRepository};

/// Totals closer than this are treated as equal.
const QUOTE_TOLERANCE: f64 = 0.005;

/// Field that a cross-field rule failure belongs to.
fn consistency_field(code: &str) -> &'static str {
    match code {
        "nights_required" => "accommodation_nights",
        _ => "agree_to_terms",
    }
}

/// Whether the quote the client displayed disagrees with the stored price.
///
/// The wizard quote covers the course and accommodation only; add-ons and
/// discounts are applied on the server.
fn quote_differs(client: &Quote, snapshot: &PricingSnapshot) -> bool {
    let server = snapshot.base_price + snapshot.accommodation;
    (client.total - server).abs() > QUOTE_TOLERANCE
}

/// Looks up a registration by confirmation number, 404 when unknown.
pub(crate) async fn load_registration(
    state: &AppState,
    confirmation_number: &str,
) -> Result<Registration, ApiError> {
    if !is_valid_confirmation_number(&confirmation_number.trim().to_uppercase()) {
        return Err(ApiError::NotFound("Registration not found".to_string()));
    }

    RegistrationRepository::new(state.pool.clone())
        .find_by_confirmation_number(confirmation_number)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))
}

/// POST /api/v1/registrations
///
/// Validates the payload, redeems the promo code, prices the registration on
/// the server and stores it under a fresh confirmation number.
pub async fn create_registration(
    State(state): State<AppState>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<Envelope<Registration>>), ApiError> {
    request.validate()?;
    request
        .check_consistency()
        .map_err(|e| ApiError::field(consistency_field(&e.code), e))?;

    let event = EventRepository::new(state.pool.clone())
        .find_by_id(request.event_id)
        .await?
        .map(CourseEvent::from)
        .filter(|event| event.is_published)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let repo = RegistrationRepository::new(state.pool.clone());

    let previous = repo
        .find_by_email_and_event(&request.email, event.id)
        .await?;
    if !previous.is_empty() {
        tracing::info!(
            event_id = %event.id,
            previous_registrations = previous.len(),
            "Repeat registration for the same email and event"
        );
    }

    let confirmation_number = repo
        .generate_unique_confirmation_number(|| generate_confirmation_number(Utc::now()))
        .await?;

    let (registration, promo) = repo
        .create(&request, &confirmation_number, |promo| {
            build_snapshot(&event, &request, promo, &state.rates)
        })
        .await?;

    if let Some(client_quote) = &request.client_quote {
        if quote_differs(client_quote, &registration.pricing) {
            tracing::warn!(
                confirmation_number = %registration.confirmation_number,
                client_total = client_quote.total,
                server_base = registration.pricing.base_price,
                server_accommodation = registration.pricing.accommodation,
                "Client quote differs from server pricing"
            );
            metrics::record_quote_mismatch();
        }
    }

    metrics::record_registration_created(&event.slug, promo.is_some());
    if let Some(promo) = &promo {
        metrics::record_promo_redeemed(&promo.code);
    }

    tracing::info!(
        confirmation_number = %registration.confirmation_number,
        event = %event.slug,
        total = registration.pricing.total,
        promo_code = promo.as_ref().map(|p| p.code.as_str()),
        "Registration created"
    );

    Ok(created(registration))
}

/// GET /api/v1/registrations/:confirmation_number
pub async fn get_registration(
    State(state): State<AppState>,
    Path(confirmation_number): Path<String>,
) -> Result<Json<Envelope<Registration>>, ApiError> {
    Ok(ok(load_registration(&state, &confirmation_number).await?))
}
