use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::account::{AccountView, CreateAccountRequest},
    services::ledger,
    state::AppState,
};

fn normalize_owner_name(input: &str) -> Option<String> {
    let name = input.trim();
    let length = name.chars().count();
    if !(3..=100).contains(&length) {
        return None;
    }
    Some(name.to_string())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let owner_name = match normalize_owner_name(&payload.owner_name) {
        Some(n) => n,
        None => {
            return ApiError::InvalidInput("owner_name must be 3-100 characters".to_string())
                .into_response();
        }
    };

    let balance = payload.balance.unwrap_or(Decimal::ZERO);
    if balance < Decimal::ZERO {
        return ApiError::InvalidInput("balance must not be negative".to_string())
            .into_response();
    }

    match ledger::create_account(&state.pool, owner_name, balance).await {
        Ok(account) => (StatusCode::CREATED, Json(json!({ "uid": account.id }))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match ledger::list_accounts(&state.pool, query.limit).await {
        Ok(accounts) => {
            let views: Vec<AccountView> = accounts.into_iter().map(AccountView::from).collect();
            Json(views).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> impl IntoResponse {
    match ledger::get_account(&state.pool, uid).await {
        Ok(Some(account)) => Json(AccountView::from(account)).into_response(),
        Ok(None) => ApiError::NotFound.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> impl IntoResponse {
    match ledger::delete_account(&state.pool, uid).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => ApiError::NotFound.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_name_is_trimmed_and_length_checked() {
        assert_eq!(normalize_owner_name("  alice  ").as_deref(), Some("alice"));
        assert_eq!(normalize_owner_name("al"), None);
        assert_eq!(normalize_owner_name("   "), None);
        assert_eq!(normalize_owner_name(&"x".repeat(101)), None);
        assert!(normalize_owner_name(&"x".repeat(100)).is_some());
    }
}
