use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::AppResult,
    ledger::LedgerStatus,
    users::repo_types::{NewUser, Role, User, UserPatch},
};

impl User {
    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, department, role, coins, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, department, role, coins, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, department, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, department, role, coins, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.department)
        .bind(new.role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn list_by_role(db: &PgPool, role: Role) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, department, role, coins, created_at
            FROM users
            WHERE role = $1
            ORDER BY name ASC
            "#,
        )
        .bind(role)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn update(db: &PgPool, id: Uuid, patch: UserPatch) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name       = COALESCE($2, name),
                   email      = COALESCE($3, email),
                   department = COALESCE($4, department),
                   role       = COALESCE($5, role),
                   coins      = COALESCE($6, coins)
             WHERE id = $1
            RETURNING id, name, email, password_hash, department, role, coins, created_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.department)
        .bind(patch.role)
        .bind(patch.coins)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Delete the user and every ledger row that references them.
    pub async fn delete_cascade(db: &PgPool, id: Uuid) -> AppResult<bool> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM coins WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM prize_redemptions WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            // nothing to cascade for an unknown id; tx is dropped and rolled back
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    /// Sum of APPROVED coin entries, independent of the cached balance.
    pub async fn approved_total(db: &PgPool, id: Uuid) -> AppResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
              FROM coins
             WHERE user_id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(LedgerStatus::Approved)
        .fetch_one(db)
        .await?;
        Ok(total)
    }
}

/// Lock the user row for the rest of the transaction.
pub async fn lock_user_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, department, role, coins, created_at
          FROM users
         WHERE id = $1
         FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(user)
}

/// Add `delta` (may be negative) to the user's balance.
pub async fn adjust_balance_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    delta: i32,
) -> AppResult<()> {
    sqlx::query("UPDATE users SET coins = coins + $2 WHERE id = $1")
        .bind(id)
        .bind(delta)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
