//! Request handlers for the `/todo` routes and the home page.
//!
//! Each handler validates its input through the mapper, makes exactly one
//! gateway call, and shapes the envelope. Failures are returned as
//! [`ApiError`], which owns the status mapping.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::Json;
use chrono::Utc;
use todo_core::{
    mapper, CreateTodo, Envelope, StoreError, Todo, TodoId, UpdateTodo, ValidationError,
};

use crate::error::ApiError;
use crate::AppState;

const HOME_PAGE: &str = include_str!("../static/home.html");

pub async fn home_redirect() -> Redirect {
    Redirect::to("/home")
}

pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Todo>>>, ApiError> {
    let records = state
        .gateway
        .find_all()
        .await
        .map_err(|e| ApiError::store("Failed to fetch todos", e))?;
    Ok(Json(Envelope::data(records.iter().map(mapper::to_wire).collect())))
}

pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(input) = payload.map_err(|rejection| malformed("Invalid Json", rejection))?;
    let fields =
        mapper::new_todo(input, Utc::now()).map_err(|e| ApiError::validation("Invalid Json", e))?;

    let id = state
        .gateway
        .insert(fields)
        .await
        .map_err(|e| ApiError::store("Failed to save todo", e))?;

    tracing::info!(todo_id = %id, "todo created");
    Ok((
        StatusCode::CREATED,
        Json(Envelope::created("Todo created successfully", id)),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Envelope>, ApiError> {
    // The id is checked before the body so a bad id is always a 400.
    let id = identifier("Failed to update todo", raw_id)?;
    let Json(input) =
        payload.map_err(|rejection| malformed("Failed to decode request body", rejection))?;
    let patch = mapper::patch(input)
        .map_err(|e| ApiError::validation("Failed to decode request body", e))?;

    state
        .gateway
        .update_fields(id, patch)
        .await
        .map_err(|e| ApiError::store("Failed to update todo", e))?;

    tracing::info!(todo_id = %id, "todo updated");
    Ok(Json(Envelope::message("Todo updated successfully")))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let id = identifier("Failed to delete todo", raw_id)?;

    state
        .gateway
        .delete_by_id(id)
        .await
        .map_err(|e| ApiError::store("Failed to delete todo", e))?;

    tracing::info!(todo_id = %id, "todo deleted");
    Ok(Json(Envelope::message("Todo deleted successfully")))
}

/// A segment that does not even decode as UTF-8 is as invalid as a bad hex id.
fn identifier(
    message: &'static str,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<TodoId, ApiError> {
    let Path(raw_id) = raw_id.map_err(|rejection| {
        ApiError::store(message, StoreError::InvalidIdentifier(rejection.body_text()))
    })?;
    mapper::decode_identifier(&raw_id).map_err(|e| ApiError::store(message, e))
}

fn malformed(message: &'static str, rejection: JsonRejection) -> ApiError {
    ApiError::validation(message, ValidationError::MalformedBody(rejection.body_text()))
}
