use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{password::verify_password, principal::Admin},
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::User,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Resolve `admin_id` to a verified [`Admin`].
///
/// Missing id is 401; an unknown id or a non-admin user is 403.
pub async fn authorize_admin(st: &AppState, admin_id: Option<Uuid>) -> AppResult<Admin> {
    let admin_id = admin_id.ok_or_else(|| AppError::Unauthorized("adminId is required".into()))?;
    let Some(user) = st.store.find_user(admin_id).await? else {
        warn!(%admin_id, "admin check for unknown user");
        return Err(AppError::Forbidden(
            "access denied: only admins may perform this operation".into(),
        ));
    };
    Admin::from_user(&user).map_err(|e| {
        warn!(%admin_id, "admin check failed for non-admin user");
        e
    })
}

pub async fn login(st: &AppState, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);
    let invalid = || AppError::Unauthorized("invalid email or password".into());

    let Some(user) = st.store.find_user_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }
    Ok(user)
}
