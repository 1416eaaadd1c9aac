use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::services::ledger::LedgerError;
use crate::services::transfer::TransferError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    NotFound,
    InsufficientFunds,
    Busy,
    InternalError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Data not found".to_string()),
            ApiError::InsufficientFunds => {
                (StatusCode::BAD_REQUEST, "insufficient funds".to_string())
            }
            ApiError::Busy => (
                StatusCode::CONFLICT,
                "account is busy, retry the request".to_string(),
            ),
            ApiError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound => ApiError::NotFound,
            LedgerError::InsufficientFunds => ApiError::InsufficientFunds,
            LedgerError::Store(store) => ApiError::from(store),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::SelfTransfer | TransferError::InvalidAmount => {
                ApiError::InvalidInput(err.to_string())
            }
            TransferError::NotFound => ApiError::NotFound,
            TransferError::InsufficientFunds => ApiError::InsufficientFunds,
            TransferError::Busy => ApiError::Busy,
            TransferError::Store(store) => ApiError::from(store),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Busy => ApiError::Busy,
            other => {
                tracing::error!(error = %other, "storage failure");
                ApiError::InternalError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_rejections_map_to_client_errors() {
        assert!(matches!(
            ApiError::from(TransferError::SelfTransfer),
            ApiError::InvalidInput(_)
        ));
        assert!(matches!(
            ApiError::from(TransferError::InsufficientFunds),
            ApiError::InsufficientFunds
        ));
        assert!(matches!(
            ApiError::from(TransferError::Busy),
            ApiError::Busy
        ));
        assert!(matches!(
            ApiError::from(TransferError::NotFound),
            ApiError::NotFound
        ));
    }
}
