use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    dto::MessageResponse,
    error::{ApiJson, ApiPath, ApiQuery, AppResult},
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, TaskQuery, UpdateTaskRequest},
        repo_types::Task,
        services,
    },
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/user", get(list_user_tasks))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = services::create_task(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    Ok(Json(services::update_task(&state, id, payload.into()).await?))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<TaskQuery>,
) -> AppResult<Json<Vec<Task>>> {
    Ok(Json(services::list_tasks(&state, q.role).await?))
}

#[instrument(skip(state))]
pub async fn list_user_tasks(State(state): State<AppState>) -> AppResult<Json<Vec<Task>>> {
    Ok(Json(services::list_user_tasks(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Task>> {
    Ok(Json(services::get_task(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_task(&state, id).await?;
    Ok(Json(MessageResponse::new("task deleted")))
}
