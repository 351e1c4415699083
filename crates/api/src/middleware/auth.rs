//! Admin API key authentication.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Why an admin request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Disabled,
    Missing,
    Invalid,
}

fn authorize(headers: &HeaderMap, admin_key_hash: &str) -> Result<(), Rejection> {
    if admin_key_hash.is_empty() {
        return Err(Rejection::Disabled);
    }

    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(Rejection::Missing)?;

    if shared::crypto::verify_api_key(presented, admin_key_hash) {
        Ok(())
    } else {
        Err(Rejection::Invalid)
    }
}

/// Guards `/api/v1/admin/*` with the configured admin key.
pub async fn require_admin(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    match authorize(req.headers(), &state.config.security.admin_api_key_hash) {
        Ok(()) => next.run(req).await,
        Err(Rejection::Disabled) => {
            ApiError::Forbidden("Admin API is disabled".into()).into_response()
        }
        Err(Rejection::Missing) => {
            ApiError::Unauthorized("Missing API key".into()).into_response()
        }
        Err(Rejection::Invalid) => {
            tracing::warn!(path = %req.uri().path(), "Rejected admin request with invalid API key");
            ApiError::Unauthorized("Invalid API key".into()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use shared::crypto::sha256_hex;

    fn headers_with(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_valid_key() {
        let hash = sha256_hex("dm_admin_key");
        assert_eq!(authorize(&headers_with("dm_admin_key"), &hash), Ok(()));
    }

    #[test]
    fn test_wrong_key() {
        let hash = sha256_hex("dm_admin_key");
        assert_eq!(
            authorize(&headers_with("dm_admin_nope"), &hash),
            Err(Rejection::Invalid)
        );
    }

    #[test]
    fn test_missing_key() {
        let hash = sha256_hex("dm_admin_key");
        assert_eq!(authorize(&HeaderMap::new(), &hash), Err(Rejection::Missing));
        assert_eq!(authorize(&headers_with(""), &hash), Err(Rejection::Missing));
    }

    #[test]
    fn test_disabled_without_hash() {
        assert_eq!(
            authorize(&headers_with("dm_admin_key"), ""),
            Err(Rejection::Disabled)
        );
    }
}
