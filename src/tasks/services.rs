use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    tasks::{
        dto::CreateTaskRequest,
        repo_types::{NewTask, Task, TaskPatch},
    },
    users::repo_types::Role,
};

fn task_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("task {} not found", id))
}

fn check_reward(reward: i32) -> AppResult<()> {
    if reward <= 0 {
        return Err(AppError::validation("reward must be a positive number"));
    }
    Ok(())
}

pub async fn create_task(st: &AppState, req: CreateTaskRequest) -> AppResult<Task> {
    let name = req.name.trim().to_string();
    let description = req.description.trim().to_string();
    if name.is_empty() || description.is_empty() {
        return Err(AppError::validation("name and description are required"));
    }
    check_reward(req.reward)?;

    let task = st
        .store
        .create_task(NewTask {
            name,
            description,
            reward: req.reward,
            visibility: req.visibility,
        })
        .await?;
    info!(task_id = %task.id, reward = task.reward, "task created");
    Ok(task)
}

pub async fn update_task(st: &AppState, id: Uuid, patch: TaskPatch) -> AppResult<Task> {
    if patch.is_empty() {
        return Err(AppError::validation("provide at least one field to update"));
    }
    if let Some(reward) = patch.reward {
        check_reward(reward)?;
    }
    let task = st
        .store
        .update_task(id, patch)
        .await?
        .ok_or_else(|| task_not_found(id))?;
    info!(task_id = %id, "task updated");
    Ok(task)
}

pub async fn get_task(st: &AppState, id: Uuid) -> AppResult<Task> {
    st.store.find_task(id).await?.ok_or_else(|| task_not_found(id))
}

pub async fn list_tasks(st: &AppState, role: Option<Role>) -> AppResult<Vec<Task>> {
    st.store.list_tasks(role).await
}

/// Tasks a plain user may trigger (USER or AMBOS).
pub async fn list_user_tasks(st: &AppState) -> AppResult<Vec<Task>> {
    st.store.list_tasks(Some(Role::User)).await
}

pub async fn delete_task(st: &AppState, id: Uuid) -> AppResult<()> {
    if !st.store.delete_task(id).await? {
        return Err(task_not_found(id));
    }
    info!(task_id = %id, "task deleted");
    Ok(())
}
