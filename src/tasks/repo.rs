use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    tasks::repo_types::{NewTask, Task, TaskPatch, Visibility},
    users::repo_types::Role,
};

pub async fn insert(db: &PgPool, new: NewTask) -> AppResult<Task> {
    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (name, description, reward, visibility)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, description, reward, visibility, created_at, updated_at
        "#,
    )
    .bind(new.name)
    .bind(new.description)
    .bind(new.reward)
    .bind(new.visibility)
    .fetch_one(db)
    .await?;
    Ok(task)
}

pub async fn find(db: &PgPool, id: Uuid) -> AppResult<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, name, description, reward, visibility, created_at, updated_at
          FROM tasks
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(task)
}

pub async fn list(db: &PgPool, visible_to: Option<Role>) -> AppResult<Vec<Task>> {
    let tasks = match visible_to {
        None => {
            sqlx::query_as::<_, Task>(
                r#"
                SELECT id, name, description, reward, visibility, created_at, updated_at
                  FROM tasks
                 ORDER BY created_at ASC
                "#,
            )
            .fetch_all(db)
            .await?
        }
        Some(role) => {
            sqlx::query_as::<_, Task>(
                r#"
                SELECT id, name, description, reward, visibility, created_at, updated_at
                  FROM tasks
                 WHERE visibility = $1 OR visibility = $2
                 ORDER BY created_at ASC
                "#,
            )
            .bind(Visibility::Both)
            .bind(Visibility::from(role))
            .fetch_all(db)
            .await?
        }
    };
    Ok(tasks)
}

pub async fn update(db: &PgPool, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
           SET name        = COALESCE($2, name),
               description = COALESCE($3, description),
               reward      = COALESCE($4, reward),
               visibility  = COALESCE($5, visibility),
               updated_at  = now()
         WHERE id = $1
        RETURNING id, name, description, reward, visibility, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.reward)
    .bind(patch.visibility)
    .fetch_optional(db)
    .await?;
    Ok(task)
}

pub async fn delete(db: &PgPool, id: Uuid) -> AppResult<bool> {
    let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(deleted > 0)
}
