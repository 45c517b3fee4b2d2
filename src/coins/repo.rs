use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    coins::repo_types::{CoinEntry, CoinFilter, NewCoin, PendingCoin},
    error::AppResult,
    ledger::LedgerStatus,
};

/// Insert a PENDING entry.
pub async fn insert(db: &PgPool, new: NewCoin) -> AppResult<CoinEntry> {
    let coin = sqlx::query_as::<_, CoinEntry>(
        r#"
        INSERT INTO coins (user_id, task_id, amount, status, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
        "#,
    )
    .bind(new.user_id)
    .bind(new.task_id)
    .bind(new.amount)
    .bind(LedgerStatus::Pending)
    .bind(new.message)
    .fetch_one(db)
    .await?;
    Ok(coin)
}

/// Insert an entry that skips PENDING (batch grants).
pub async fn insert_approved_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    task_id: Uuid,
    amount: i32,
    approved_by: Uuid,
) -> AppResult<CoinEntry> {
    let coin = sqlx::query_as::<_, CoinEntry>(
        r#"
        INSERT INTO coins (user_id, task_id, amount, status, approved_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(task_id)
    .bind(amount)
    .bind(LedgerStatus::Approved)
    .bind(approved_by)
    .fetch_one(&mut **tx)
    .await?;
    Ok(coin)
}

pub async fn find(db: &PgPool, id: Uuid) -> AppResult<Option<CoinEntry>> {
    let coin = sqlx::query_as::<_, CoinEntry>(
        r#"
        SELECT id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
          FROM coins
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(coin)
}

pub async fn list(db: &PgPool, filter: CoinFilter) -> AppResult<Vec<CoinEntry>> {
    let rows = sqlx::query_as::<_, CoinEntry>(
        r#"
        SELECT id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
          FROM coins
         WHERE ($1::uuid IS NULL OR user_id = $1)
           AND ($2::ledger_status IS NULL OR status = $2)
         ORDER BY created_at DESC
        "#,
    )
    .bind(filter.user_id)
    .bind(filter.status)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_pending_with_user(db: &PgPool) -> AppResult<Vec<PendingCoin>> {
    let rows = sqlx::query_as::<_, PendingCoin>(
        r#"
        SELECT c.id, c.user_id, c.task_id, c.amount, c.status, c.approved_by, c.message,
               c.created_at, c.updated_at,
               u.name AS user_name, u.email AS user_email, u.department AS user_department
          FROM coins c
          JOIN users u ON u.id = c.user_id
         WHERE c.status = $1
         ORDER BY c.created_at ASC
        "#,
    )
    .bind(LedgerStatus::Pending)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn update_message(db: &PgPool, id: Uuid, message: String) -> AppResult<Option<CoinEntry>> {
    let coin = sqlx::query_as::<_, CoinEntry>(
        r#"
        UPDATE coins
           SET message = $2, updated_at = now()
         WHERE id = $1
        RETURNING id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(message)
    .fetch_optional(db)
    .await?;
    Ok(coin)
}

/// Lock an entry for the rest of the transaction.
pub async fn lock_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Option<CoinEntry>> {
    let coin = sqlx::query_as::<_, CoinEntry>(
        r#"
        SELECT id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
          FROM coins
         WHERE id = $1
         FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(coin)
}

/// Persist the status and decider of a locked entry.
pub async fn write_decision_tx(
    tx: &mut Transaction<'_, Postgres>,
    coin: &CoinEntry,
) -> AppResult<CoinEntry> {
    let coin = sqlx::query_as::<_, CoinEntry>(
        r#"
        UPDATE coins
           SET status = $2, approved_by = $3, updated_at = now()
         WHERE id = $1
        RETURNING id, user_id, task_id, amount, status, approved_by, message, created_at, updated_at
        "#,
    )
    .bind(coin.id)
    .bind(coin.status)
    .bind(coin.approved_by)
    .fetch_one(&mut **tx)
    .await?;
    Ok(coin)
}

pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<()> {
    sqlx::query("DELETE FROM coins WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
