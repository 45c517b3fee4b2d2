use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    coins::repo_types::CoinEntry,
    dto::MessageResponse,
    error::{ApiJson, ApiPath, AppResult},
    state::AppState,
    users::{
        dto::{CoinTotalResponse, CreateUserRequest, PublicUser, UpdateEmailRequest, UpdateUserRequest},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/:id/email", patch(update_email))
        .route("/users/:id/coins", get(get_coin_total))
        .route("/users/:id/transactions", get(get_transactions))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = services::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<PublicUser>>> {
    let users = services::list_users(&state).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(services::get_user(&state, id).await?.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = services::update_user(&state, id, payload.into()).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_email(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateEmailRequest>,
) -> AppResult<Json<PublicUser>> {
    let user = services::update_email(&state, id, &payload.email).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_user(&state, id).await?;
    Ok(Json(MessageResponse::new("user deleted")))
}

#[instrument(skip(state))]
pub async fn get_coin_total(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<CoinTotalResponse>> {
    let total_coins = services::approved_total(&state, id).await?;
    Ok(Json(CoinTotalResponse {
        user_id: id,
        total_coins,
    }))
}

#[instrument(skip(state))]
pub async fn get_transactions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<CoinEntry>>> {
    Ok(Json(services::transactions(&state, id).await?))
}
