//! Conversion between wire payloads and persisted records.
//!
//! Validation of client input happens here and nowhere else: a payload that
//! reaches the store has already been checked.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, ValidationError};
use crate::types::{CreateTodo, NewTodo, Todo, TodoId, TodoPatch, TodoRecord, UpdateTodo};

pub fn to_wire(record: &TodoRecord) -> Todo {
    Todo {
        id: record.id.to_hex(),
        title: record.title.clone(),
        completed: record.completed,
        created_at: record.created_at,
    }
}

/// Build the fields of a new record, stamping `created_at` with `now`. New
/// todos always start out not completed.
pub fn new_todo(input: CreateTodo, now: DateTime<Utc>) -> Result<NewTodo, ValidationError> {
    check_title(&input.title)?;
    Ok(NewTodo {
        title: input.title,
        completed: false,
        created_at: now,
    })
}

pub fn patch(input: UpdateTodo) -> Result<TodoPatch, ValidationError> {
    check_title(&input.title)?;
    Ok(TodoPatch {
        title: input.title,
        completed: input.completed,
    })
}

/// Parse a path segment into a store identifier. Surrounding whitespace is
/// ignored; anything that is not a 24-digit hex ObjectId is rejected.
pub fn decode_identifier(raw: &str) -> Result<TodoId, StoreError> {
    ObjectId::parse_str(raw.trim())
        .map(TodoId::from_object_id)
        .map_err(|_| StoreError::InvalidIdentifier(raw.to_string()))
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}
