use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        services,
    },
    error::{ApiJson, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = services::login(&state, &payload.email, &payload.password).await?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "login successful".into(),
        user: user.into(),
    }))
}
