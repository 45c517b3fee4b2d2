use serde::Deserialize;

use crate::{
    tasks::repo_types::{TaskPatch, Visibility},
    users::repo_types::Role,
};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub description: String,
    pub reward: i32,
    pub visibility: Visibility,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reward: Option<i32>,
    pub visibility: Option<Visibility>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(r: UpdateTaskRequest) -> Self {
        Self {
            name: r.name.filter(|s| !s.trim().is_empty()),
            description: r.description.filter(|s| !s.trim().is_empty()),
            reward: r.reward,
            visibility: r.visibility,
        }
    }
}

/// `GET /tasks?role=USER`
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub role: Option<Role>,
}
