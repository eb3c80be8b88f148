//! # Todo Handlers
//!
//! Plain CRUD behind the authorization gate. Every route here is mounted on
//! the protected chain, so handlers assume an authenticated caller.

use crate::db::{models::Todo, todos};
use crate::error::{AppError, AppResult};
use crate::extract::ApiJson;
use crate::session::SessionHandle;
use crate::state::AppState;
use crate::validator::{self, Validator};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

const MAX_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct TodoInput {
    #[serde(default)]
    pub body: String,
}

impl TodoInput {
    pub fn validate(&self) -> Validator {
        let mut form = Validator::new();
        form.check_field(validator::not_blank(&self.body), "body", "This field cannot be blank");
        form.check_field(
            validator::max_chars(&self.body, MAX_BODY_CHARS),
            "body",
            "This field cannot be more than 200 characters long",
        );
        form
    }
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: String,
    pub body: String,
    pub done: bool,
    pub flash: String,
}

impl TodoResponse {
    fn new(todo: Todo, flash: String) -> Self {
        Self {
            id: todo.id,
            body: todo.body,
            done: todo.done,
            flash,
        }
    }
}

/// GET /api/todo
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Todo>>> {
    Ok(Json(todos::all(&state.db).await?))
}

/// GET /api/todo/{id}
pub async fn view(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Todo>> {
    Ok(Json(todos::get(&state.db, &id).await?))
}

/// POST /api/todo
pub async fn create(
    State(state): State<AppState>,
    session: SessionHandle,
    ApiJson(input): ApiJson<TodoInput>,
) -> AppResult<Json<TodoResponse>> {
    let form = input.validate();
    if !form.valid() {
        return Err(AppError::InvalidInput(form));
    }

    let todo = todos::insert(&state.db, &input.body).await?;
    tracing::debug!(todo_id = %todo.id, "Todo created");

    session.set_flash("Todo has been created.")?;
    Ok(Json(TodoResponse::new(todo, session.pop_flash())))
}

/// PUT /api/todo/{id}
pub async fn update(
    State(state): State<AppState>,
    session: SessionHandle,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TodoInput>,
) -> AppResult<Json<TodoResponse>> {
    let form = input.validate();
    if !form.valid() {
        return Err(AppError::InvalidInput(form));
    }

    let todo = todos::update(&state.db, &id, &input.body).await?;

    session.set_flash("Todo has been updated.")?;
    Ok(Json(TodoResponse::new(todo, session.pop_flash())))
}

/// PATCH /api/todo/{id}/toggle
pub async fn toggle(
    State(state): State<AppState>,
    session: SessionHandle,
    Path(id): Path<String>,
) -> AppResult<Json<TodoResponse>> {
    let todo = todos::toggle(&state.db, &id).await?;

    session.set_flash("Todo status has been updated.")?;
    Ok(Json(TodoResponse::new(todo, session.pop_flash())))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub flash: String,
}

/// DELETE /api/todo/{id}
pub async fn delete(
    State(state): State<AppState>,
    session: SessionHandle,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    todos::delete(&state.db, &id).await?;

    session.set_flash("Deleted successfully!")?;
    Ok(Json(DeleteResponse {
        flash: session.pop_flash(),
    }))
}
