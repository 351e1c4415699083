//! Public promo code lookup.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::response::{ok, Envelope};
use domain::models::{PromoCode, PromoCodeStatusResponse};
use persistence::repositories::PromoCodeRepository;

/// Longest code a client may look up.
const MAX_CODE_LEN: usize = 32;

/// GET /api/v1/promo-codes/:code
///
/// Reports whether a code can be redeemed right now. Does not consume a use.
pub async fn get_promo_code_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Envelope<PromoCodeStatusResponse>>, ApiError> {
    if code.trim().is_empty() || code.len() > MAX_CODE_LEN {
        return Err(ApiError::NotFound("Promo code not found".to_string()));
    }

    let promo = PromoCodeRepository::new(state.pool.clone())
        .find_by_code(&code)
        .await?
        .map(PromoCode::from)
        .ok_or_else(|| ApiError::NotFound("Promo code not found".to_string()))?;

    Ok(ok(PromoCodeStatusResponse::from(&promo)))
}
