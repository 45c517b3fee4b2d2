use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::{Role, User, UserPatch};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role: Option<Role>,
    pub coins: Option<i32>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            department: r.department,
            role: r.role,
            coins: r.coins,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub role: Role,
    pub coins: i32,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            department: u.department,
            role: u.role,
            coins: u.coins,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinTotalResponse {
    pub user_id: Uuid,
    pub total_coins: i64,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn public_user_serializes_camel_case_without_hash() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Dani".into(),
            email: "dani@example.com".into(),
            department: None,
            role: Role::Admin,
            coins: 7,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["coins"], 7);
        assert!(json.get("passwordHash").is_none());

        let total = serde_json::to_value(CoinTotalResponse {
            user_id: user.id,
            total_coins: 12,
        })
        .unwrap();
        assert_eq!(total["totalCoins"], 12);
        assert!(total.get("userId").is_some());
    }
}
