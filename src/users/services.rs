use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{
        password::hash_password,
        services::{is_valid_email, normalize_email},
    },
    coins::repo_types::{CoinEntry, CoinFilter},
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::CreateUserRequest,
        repo_types::{NewUser, Role, User, UserPatch},
    },
};

fn user_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("user {} not found", id))
}

fn checked_email(raw: &str) -> AppResult<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(AppError::validation("invalid email"));
    }
    Ok(email)
}

pub async fn create_user(st: &AppState, req: CreateUserRequest) -> AppResult<User> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    let email = checked_email(&req.email)?;
    if req.password.len() < st.config.password_min_len {
        return Err(AppError::validation(format!(
            "password must have at least {} characters",
            st.config.password_min_len
        )));
    }
    if st.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("email already registered"));
    }

    let password_hash = hash_password(&req.password)?;
    let user = st
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            department: req.department,
            role: req.role.unwrap_or(Role::User),
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user created");
    Ok(user)
}

/// Users with role USER; admins are not listed.
pub async fn list_users(st: &AppState) -> AppResult<Vec<User>> {
    st.store.list_users(Role::User).await
}

pub async fn get_user(st: &AppState, id: Uuid) -> AppResult<User> {
    st.store.find_user(id).await?.ok_or_else(|| user_not_found(id))
}

pub async fn update_user(st: &AppState, id: Uuid, mut patch: UserPatch) -> AppResult<User> {
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("name cannot be empty"));
        }
    }
    if let Some(email) = &patch.email {
        patch.email = Some(checked_email(email)?);
    }
    if matches!(patch.coins, Some(c) if c < 0) {
        return Err(AppError::validation("coins cannot be negative"));
    }
    let user = st
        .store
        .update_user(id, patch)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    info!(user_id = %id, "user updated");
    Ok(user)
}

pub async fn update_email(st: &AppState, id: Uuid, email: &str) -> AppResult<User> {
    if email.trim().is_empty() {
        return Err(AppError::validation("email is required"));
    }
    update_user(
        st,
        id,
        UserPatch {
            email: Some(email.to_string()),
            ..Default::default()
        },
    )
    .await
}

pub async fn delete_user(st: &AppState, id: Uuid) -> AppResult<()> {
    if !st.store.delete_user(id).await? {
        return Err(user_not_found(id));
    }
    info!(user_id = %id, "user deleted with its ledger entries");
    Ok(())
}

/// Sum of the user's APPROVED coin entries.
pub async fn approved_total(st: &AppState, id: Uuid) -> AppResult<i64> {
    get_user(st, id).await?;
    st.store.approved_coin_total(id).await
}

pub async fn transactions(st: &AppState, id: Uuid) -> AppResult<Vec<CoinEntry>> {
    get_user(st, id).await?;
    st.store
        .list_coins(CoinFilter {
            user_id: Some(id),
            status: None,
        })
        .await
}
