use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{dto::AdminBody, services::authorize_admin},
    coins::{
        dto::{BatchGrantRequest, CreateCoinRequest, UpdateMessageRequest},
        repo_types::{CoinEntry, PendingCoin},
        services,
    },
    dto::MessageResponse,
    error::{ApiJson, ApiPath, AppResult},
    state::AppState,
};

pub fn coin_routes() -> Router<AppState> {
    Router::new()
        .route("/coins", get(list_coins).post(create_coin))
        .route("/coins/pending", get(list_pending))
        .route("/coins/batch", post(batch_grant))
        .route("/coins/user/:user_id", get(list_user_coins))
        .route("/coins/user/:user_id/pending", get(list_user_pending))
        .route("/coins/:id", patch(update_message).delete(delete_coin))
        .route("/coins/:id/approve", patch(approve_coin))
        .route("/coins/:id/reject", patch(reject_coin))
}

#[instrument(skip(state, payload))]
pub async fn create_coin(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCoinRequest>,
) -> AppResult<(StatusCode, Json<CoinEntry>)> {
    let coin = services::request_coin(&state, payload.user_id, payload.task_id, payload.message).await?;
    Ok((StatusCode::CREATED, Json(coin)))
}

#[instrument(skip(state))]
pub async fn list_coins(State(state): State<AppState>) -> AppResult<Json<Vec<CoinEntry>>> {
    Ok(Json(services::list_coins(&state).await?))
}

#[instrument(skip(state))]
pub async fn list_pending(State(state): State<AppState>) -> AppResult<Json<Vec<PendingCoin>>> {
    Ok(Json(services::list_pending(&state).await?))
}

#[instrument(skip(state))]
pub async fn list_user_coins(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<CoinEntry>>> {
    Ok(Json(services::list_for_user(&state, user_id, false).await?))
}

#[instrument(skip(state))]
pub async fn list_user_pending(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<CoinEntry>>> {
    Ok(Json(services::list_for_user(&state, user_id, true).await?))
}

#[instrument(skip(state, payload))]
pub async fn approve_coin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminBody>,
) -> AppResult<Json<CoinEntry>> {
    let admin = authorize_admin(&state, payload.admin_id).await?;
    Ok(Json(services::approve(&state, id, &admin).await?))
}

#[instrument(skip(state, payload))]
pub async fn reject_coin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminBody>,
) -> AppResult<Json<CoinEntry>> {
    let admin = authorize_admin(&state, payload.admin_id).await?;
    Ok(Json(services::reject(&state, id, &admin).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateMessageRequest>,
) -> AppResult<Json<CoinEntry>> {
    Ok(Json(services::update_message(&state, id, payload.message).await?))
}

#[instrument(skip(state))]
pub async fn delete_coin(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete(&state, id).await?;
    Ok(Json(MessageResponse::new("coin request deleted")))
}

#[instrument(skip(state, payload))]
pub async fn batch_grant(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BatchGrantRequest>,
) -> AppResult<(StatusCode, Json<Vec<CoinEntry>>)> {
    let admin = authorize_admin(&state, payload.admin_id).await?;
    let granted = services::batch_grant(&state, payload.task_id, &payload.user_ids, &admin).await?;
    Ok((StatusCode::CREATED, Json(granted)))
}
