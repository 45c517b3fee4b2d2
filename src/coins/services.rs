use tracing::info;
use uuid::Uuid;

use crate::{
    auth::principal::Admin,
    coins::repo_types::{CoinEntry, CoinFilter, NewCoin, PendingCoin},
    error::{AppError, AppResult},
    ledger::{Decision, LedgerStatus},
    state::AppState,
};

/// Record a PENDING grant request for `task_id`; the balance is untouched
/// until an admin approves it.
pub async fn request_coin(
    st: &AppState,
    user_id: Uuid,
    task_id: Uuid,
    message: Option<String>,
) -> AppResult<CoinEntry> {
    st.store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {} not found", user_id)))?;
    let task = st
        .store
        .find_task(task_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("task {} not found", task_id)))?;

    let coin = st
        .store
        .insert_coin(NewCoin {
            user_id,
            task_id,
            amount: task.reward,
            message,
        })
        .await?;
    info!(coin_id = %coin.id, %user_id, %task_id, amount = coin.amount, "coin requested");
    Ok(coin)
}

pub async fn list_coins(st: &AppState) -> AppResult<Vec<CoinEntry>> {
    st.store.list_coins(CoinFilter::default()).await
}

pub async fn list_pending(st: &AppState) -> AppResult<Vec<PendingCoin>> {
    st.store.list_pending_coins().await
}

pub async fn list_for_user(st: &AppState, user_id: Uuid, pending_only: bool) -> AppResult<Vec<CoinEntry>> {
    st.store
        .list_coins(CoinFilter {
            user_id: Some(user_id),
            status: pending_only.then_some(LedgerStatus::Pending),
        })
        .await
}

pub async fn approve(st: &AppState, id: Uuid, admin: &Admin) -> AppResult<CoinEntry> {
    let coin = st.store.decide_coin(id, admin, Decision::Approve).await?;
    info!(coin_id = %id, admin_id = %admin.id(), user_id = %coin.user_id, amount = coin.amount, "coin approved");
    Ok(coin)
}

pub async fn reject(st: &AppState, id: Uuid, admin: &Admin) -> AppResult<CoinEntry> {
    let coin = st.store.decide_coin(id, admin, Decision::Reject).await?;
    info!(coin_id = %id, admin_id = %admin.id(), "coin rejected");
    Ok(coin)
}

/// Editable in any status; `None` clears the message to "".
pub async fn update_message(st: &AppState, id: Uuid, message: Option<String>) -> AppResult<CoinEntry> {
    st.store
        .update_coin_message(id, message.unwrap_or_default())
        .await?
        .ok_or_else(|| AppError::not_found(format!("coin request {} not found", id)))
}

pub async fn delete(st: &AppState, id: Uuid) -> AppResult<()> {
    st.store.delete_coin(id).await?;
    info!(coin_id = %id, "coin request deleted");
    Ok(())
}

/// Grant `task_id`'s reward to every user at once, skipping PENDING.
/// Any unknown user aborts the whole batch.
pub async fn batch_grant(
    st: &AppState,
    task_id: Uuid,
    user_ids: &[Uuid],
    admin: &Admin,
) -> AppResult<Vec<CoinEntry>> {
    if user_ids.is_empty() {
        return Err(AppError::validation("userIds must be a non-empty list"));
    }
    let task = st
        .store
        .find_task(task_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("task {} not found", task_id)))?;
    if !task.visibility.allows_admin_grant() {
        return Err(AppError::validation("this task does not allow admin grants"));
    }

    let granted = st.store.grant_coins(&task, user_ids, admin).await?;
    info!(%task_id, admin_id = %admin.id(), users = granted.len(), reward = task.reward, "coins granted");
    Ok(granted)
}
