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
    dto::MessageResponse,
    error::{ApiJson, ApiPath, AppResult},
    prizes::{
        dto::{CreatePrizeRequest, RedemptionRequest, UpdatePrizeRequest},
        repo_types::{Prize, Redemption, RedemptionDetails},
        services,
    },
    state::AppState,
};

pub fn prize_routes() -> Router<AppState> {
    Router::new()
        .route("/prizes", get(list_prizes).post(create_prize))
        .route(
            "/prizes/:id",
            get(get_prize).put(update_prize).delete(delete_prize),
        )
}

pub fn redemption_routes() -> Router<AppState> {
    Router::new()
        .route("/prize-redemptions", post(request_redemption))
        .route("/prize-redemptions/pending", get(list_pending))
        .route("/prize-redemptions/user/:user_id", get(list_user_redemptions))
        .route("/prize-redemptions/:id/approve", patch(approve_redemption))
        .route("/prize-redemptions/:id/reject", patch(reject_redemption))
}

#[instrument(skip(state, payload))]
pub async fn create_prize(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePrizeRequest>,
) -> AppResult<(StatusCode, Json<Prize>)> {
    let prize = services::create_prize(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(prize)))
}

#[instrument(skip(state))]
pub async fn list_prizes(State(state): State<AppState>) -> AppResult<Json<Vec<Prize>>> {
    Ok(Json(services::list_prizes(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_prize(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Prize>> {
    Ok(Json(services::get_prize(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_prize(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePrizeRequest>,
) -> AppResult<Json<Prize>> {
    Ok(Json(services::update_prize(&state, id, payload.into()).await?))
}

#[instrument(skip(state))]
pub async fn delete_prize(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_prize(&state, id).await?;
    Ok(Json(MessageResponse::new("prize deleted")))
}

#[instrument(skip(state, payload))]
pub async fn request_redemption(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RedemptionRequest>,
) -> AppResult<(StatusCode, Json<Redemption>)> {
    let redemption = services::request_redemption(&state, payload.user_id, payload.prize_id).await?;
    Ok((StatusCode::CREATED, Json(redemption)))
}

#[instrument(skip(state))]
pub async fn list_pending(State(state): State<AppState>) -> AppResult<Json<Vec<RedemptionDetails>>> {
    Ok(Json(services::list_pending_redemptions(&state).await?))
}

#[instrument(skip(state))]
pub async fn list_user_redemptions(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<RedemptionDetails>>> {
    Ok(Json(services::list_user_redemptions(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn approve_redemption(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminBody>,
) -> AppResult<Json<Redemption>> {
    let admin = authorize_admin(&state, payload.admin_id).await?;
    Ok(Json(services::approve_redemption(&state, id, &admin).await?))
}

#[instrument(skip(state, payload))]
pub async fn reject_redemption(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AdminBody>,
) -> AppResult<Json<Redemption>> {
    let admin = authorize_admin(&state, payload.admin_id).await?;
    Ok(Json(services::reject_redemption(&state, id, &admin).await?))
}
