//! Success envelope shared by all JSON endpoints.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

/// 200 with the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

/// 201 with the success envelope.
pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let Json(envelope) = ok(serde_json::json!({ "id": 1 }));
        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn test_created_status() {
        let (status, _) = created("x");
        assert_eq!(status, StatusCode::CREATED);
    }
}
