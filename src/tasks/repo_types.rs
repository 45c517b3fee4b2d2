use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::Role;

/// Which role may see and trigger a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_visibility")]
pub enum Visibility {
    #[sqlx(rename = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,
    #[sqlx(rename = "USER")]
    #[serde(rename = "USER")]
    User,
    #[sqlx(rename = "AMBOS")]
    #[serde(rename = "AMBOS")]
    Both,
}

impl Visibility {
    pub fn visible_to(self, role: Role) -> bool {
        matches!(
            (self, role),
            (Visibility::Both, _) | (Visibility::Admin, Role::Admin) | (Visibility::User, Role::User)
        )
    }

    /// Admins may grant coins directly only for tasks they can see.
    pub fn allows_admin_grant(self) -> bool {
        self.visible_to(Role::Admin)
    }
}

impl From<Role> for Visibility {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Visibility::Admin,
            Role::User => Visibility::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub reward: i32,
    pub visibility: Visibility,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub reward: i32,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reward: Option<i32>,
    pub visibility: Option<Visibility>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.reward.is_none()
            && self.visibility.is_none()
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(reward) = self.reward {
            task.reward = reward;
        }
        if let Some(visibility) = self.visibility {
            task.visibility = visibility;
        }
    }
}

#[cfg(test)]
mod visibility_tests {
    use super::*;

    #[test]
    fn both_is_visible_to_everyone() {
        assert!(Visibility::Both.visible_to(Role::User));
        assert!(Visibility::Both.visible_to(Role::Admin));
    }

    #[test]
    fn single_role_visibility() {
        assert!(Visibility::User.visible_to(Role::User));
        assert!(!Visibility::User.visible_to(Role::Admin));
        assert!(!Visibility::Admin.visible_to(Role::User));
        assert!(Visibility::Admin.allows_admin_grant());
        assert!(!Visibility::User.allows_admin_grant());
    }

    #[test]
    fn serializes_with_wire_labels() {
        assert_eq!(serde_json::to_string(&Visibility::Both).unwrap(), "\"AMBOS\"");
        let v: Visibility = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(v, Visibility::Admin);
        assert!(serde_json::from_str::<Visibility>("\"EVERYONE\"").is_err());
    }
}
