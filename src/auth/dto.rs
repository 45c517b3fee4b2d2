use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: SessionUser,
}

/// What the frontend keeps about the logged-in user.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
}

impl From<User> for SessionUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            department: u.department,
        }
    }
}

/// Body carried by every admin decision endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBody {
    pub admin_id: Option<Uuid>,
}
