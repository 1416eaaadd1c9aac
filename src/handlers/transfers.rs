use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    handlers::accounts::ListQuery,
    models::transfer::{CreateTransferRequest, Transfer, TransferResponse},
    services::transfer,
    state::AppState,
    store::{self, Criteria},
};

pub async fn create_transfer(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    match transfer::execute(
        &state.pool,
        payload.from_account,
        payload.to_account,
        payload.amount,
    )
    .await
    {
        Ok(record) => (StatusCode::CREATED, Json(TransferResponse::from(record))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match store::get_all::<Transfer>(&state.pool, query.limit).await {
        Ok(transfers) => {
            let views: Vec<TransferResponse> =
                transfers.into_iter().map(TransferResponse::from).collect();
            Json(views).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match store::get::<Transfer>(&state.pool, &Criteria::new().eq(Transfer::ID, id)).await {
        Ok(Some(record)) => Json(TransferResponse::from(record)).into_response(),
        Ok(None) => ApiError::NotFound.into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
