use crate::db::models::Todo;
use crate::error::{AppError, AppResult};
use sqlx::SqlitePool;

pub async fn all(pool: &SqlitePool) -> AppResult<Vec<Todo>> {
    let todos = sqlx::query_as::<_, Todo>("SELECT * FROM todos ORDER BY created_at, id")
        .fetch_all(pool)
        .await?;

    Ok(todos)
}

pub async fn get(pool: &SqlitePool, id: &str) -> AppResult<Todo> {
    let todo = sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Todo '{}' not found", id)),
            _ => AppError::Database(e),
        })?;

    Ok(todo)
}

pub async fn insert(pool: &SqlitePool, body: &str) -> AppResult<Todo> {
    let todo = Todo::new(body.to_string());

    sqlx::query("INSERT INTO todos (id, body, done, created_at) VALUES (?, ?, ?, ?)")
        .bind(&todo.id)
        .bind(&todo.body)
        .bind(todo.done)
        .bind(&todo.created_at)
        .execute(pool)
        .await?;

    Ok(todo)
}

pub async fn update(pool: &SqlitePool, id: &str, body: &str) -> AppResult<Todo> {
    let result = sqlx::query("UPDATE todos SET body = ? WHERE id = ?")
        .bind(body)
        .bind(id)
        .execute(pool)
        .await?;
    ensure_touched(result.rows_affected(), id)?;

    get(pool, id).await
}

/// Flip `done` and return the updated row.
pub async fn toggle(pool: &SqlitePool, id: &str) -> AppResult<Todo> {
    let result = sqlx::query("UPDATE todos SET done = NOT done WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    ensure_touched(result.rows_affected(), id)?;

    get(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    ensure_touched(result.rows_affected(), id)
}

fn ensure_touched(rows: u64, id: &str) -> AppResult<()> {
    if rows == 0 {
        return Err(AppError::NotFound(format!("Todo '{}' not found", id)));
    }
    Ok(())
}
