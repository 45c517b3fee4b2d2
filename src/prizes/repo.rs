use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::AppResult,
    ledger::LedgerStatus,
    prizes::repo_types::{NewPrize, Prize, PrizePatch, Redemption, RedemptionDetails, RedemptionFilter},
};

// ---- catalog ----

pub async fn insert_prize(db: &PgPool, new: NewPrize) -> AppResult<Prize> {
    let prize = sqlx::query_as::<_, Prize>(
        r#"
        INSERT INTO prizes (name, description, cost)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, cost, created_at, updated_at
        "#,
    )
    .bind(new.name)
    .bind(new.description)
    .bind(new.cost)
    .fetch_one(db)
    .await?;
    Ok(prize)
}

pub async fn find_prize(db: &PgPool, id: Uuid) -> AppResult<Option<Prize>> {
    let prize = sqlx::query_as::<_, Prize>(
        r#"
        SELECT id, name, description, cost, created_at, updated_at
          FROM prizes
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(prize)
}

pub async fn find_prize_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Option<Prize>> {
    let prize = sqlx::query_as::<_, Prize>(
        r#"
        SELECT id, name, description, cost, created_at, updated_at
          FROM prizes
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(prize)
}

pub async fn list_prizes(db: &PgPool) -> AppResult<Vec<Prize>> {
    let prizes = sqlx::query_as::<_, Prize>(
        r#"
        SELECT id, name, description, cost, created_at, updated_at
          FROM prizes
         ORDER BY cost ASC, name ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(prizes)
}

pub async fn update_prize(db: &PgPool, id: Uuid, patch: PrizePatch) -> AppResult<Option<Prize>> {
    let prize = sqlx::query_as::<_, Prize>(
        r#"
        UPDATE prizes
           SET name        = COALESCE($2, name),
               description = COALESCE($3, description),
               cost        = COALESCE($4, cost),
               updated_at  = now()
         WHERE id = $1
        RETURNING id, name, description, cost, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.cost)
    .fetch_optional(db)
    .await?;
    Ok(prize)
}

pub async fn delete_prize(db: &PgPool, id: Uuid) -> AppResult<bool> {
    let deleted = sqlx::query("DELETE FROM prizes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(deleted > 0)
}

// ---- redemptions ----

pub async fn insert_redemption_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    prize_id: Uuid,
    cost: i32,
) -> AppResult<Redemption> {
    let redemption = sqlx::query_as::<_, Redemption>(
        r#"
        INSERT INTO prize_redemptions (user_id, prize_id, cost, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, prize_id, cost, status, approved_by, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(prize_id)
    .bind(cost)
    .bind(LedgerStatus::Pending)
    .fetch_one(&mut **tx)
    .await?;
    Ok(redemption)
}

pub async fn lock_redemption_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<Option<Redemption>> {
    let redemption = sqlx::query_as::<_, Redemption>(
        r#"
        SELECT id, user_id, prize_id, cost, status, approved_by, created_at, updated_at
          FROM prize_redemptions
         WHERE id = $1
         FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(redemption)
}

pub async fn write_decision_tx(
    tx: &mut Transaction<'_, Postgres>,
    redemption: &Redemption,
) -> AppResult<Redemption> {
    let redemption = sqlx::query_as::<_, Redemption>(
        r#"
        UPDATE prize_redemptions
           SET status = $2, approved_by = $3, updated_at = now()
         WHERE id = $1
        RETURNING id, user_id, prize_id, cost, status, approved_by, created_at, updated_at
        "#,
    )
    .bind(redemption.id)
    .bind(redemption.status)
    .bind(redemption.approved_by)
    .fetch_one(&mut **tx)
    .await?;
    Ok(redemption)
}

pub async fn list_redemptions(db: &PgPool, filter: RedemptionFilter) -> AppResult<Vec<RedemptionDetails>> {
    let rows = sqlx::query_as::<_, RedemptionDetails>(
        r#"
        SELECT r.id, r.user_id, r.prize_id, r.cost, r.status, r.approved_by, r.created_at, r.updated_at,
               u.name AS user_name, p.name AS prize_name, p.cost AS prize_cost
          FROM prize_redemptions r
          JOIN users u ON u.id = r.user_id
          JOIN prizes p ON p.id = r.prize_id
         WHERE ($1::uuid IS NULL OR r.user_id = $1)
           AND ($2::ledger_status IS NULL OR r.status = $2)
         ORDER BY r.created_at DESC
        "#,
    )
    .bind(filter.user_id)
    .bind(filter.status)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
