//! Application error taxonomy and HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Per-line fault reported by order placement and surfaced as `stockErrors`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StockFault {
    pub product_id: Uuid,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
}

impl StockFault {
    pub fn not_found(product_id: Uuid) -> Self {
        Self { product_id, error: "Producto no encontrado".to_string(), stock: None }
    }

    pub fn insufficient(product_id: Uuid, available: i32) -> Self {
        Self { product_id, error: "Stock insuficiente".to_string(), stock: Some(available) }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("stock validation failed for {} line(s)", .0.len())]
    Stock(Vec<StockFault>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(m) => (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response(),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response(),
            Self::Forbidden(m) => (StatusCode::FORBIDDEN, Json(json!({ "error": m }))).into_response(),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response(),
            Self::Stock(faults) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "stockErrors": faults }))).into_response()
            }
            Self::Database(e) => {
                tracing::error!(error = %e, "database operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal server error" })))
                    .into_response()
            }
            Self::Config(m) | Self::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal server error" })))
                    .into_response()
            }
        }
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_fault_serialization() {
        let id = Uuid::new_v4();
        let fault = StockFault::insufficient(id, 5);
        let value = serde_json::to_value(&fault).unwrap();
        assert_eq!(value["error"], "Stock insuficiente");
        assert_eq!(value["stock"], 5);

        let fault = StockFault::not_found(id);
        let value = serde_json::to_value(&fault).unwrap();
        assert_eq!(value["error"], "Producto no encontrado");
        assert!(value.get("stock").is_none());
    }
}
