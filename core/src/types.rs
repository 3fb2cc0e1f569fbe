//! Persisted and wire representations of a todo item.
//!
//! # Design
//! `TodoRecord` is what the document store holds: a native `ObjectId`, the
//! user-editable fields and the creation timestamp. `Todo` is what clients
//! receive: the same fields with the id rendered as a hex string. Conversion
//! between the two lives in [`crate::mapper`] so that validation happens in
//! exactly one place.

use std::fmt;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-native identifier of a todo record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TodoId(ObjectId);

impl TodoId {
    /// Allocate a fresh identifier. Only stores call this.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn from_object_id(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }

    /// The 24-character lowercase hex form used on the wire.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// A todo as held by the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRecord {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields of a record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl NewTodo {
    pub fn into_record(self, id: TodoId) -> TodoRecord {
        TodoRecord {
            id,
            title: self.title,
            completed: self.completed,
            created_at: self.created_at,
        }
    }
}

/// The fields an update overwrites. `id` and `created_at` are never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: String,
    pub completed: bool,
}

/// A single todo item as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a new todo. Only the title is read; any `id`
/// or `completed` in the payload is ignored and new todos start out open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

/// Request payload for updating an existing todo. Both fields are required;
/// the update replaces them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodo {
    pub title: String,
    pub completed: bool,
}

/// JSON wrapper around every response body.
///
/// The HTTP status is the primary outcome signal; the envelope carries a
/// human-readable `message`, an optional `error` detail, and the payload
/// (`data` for listings, `todo_id` for creations).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T = serde_json::Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_id: Option<String>,
}

impl<T> Envelope<T> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            error: None,
            data: None,
            todo_id: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::message(message)
        }
    }

    pub fn data(data: T) -> Self {
        Self {
            message: None,
            error: None,
            data: Some(data),
            todo_id: None,
        }
    }

    pub fn created(message: impl Into<String>, id: TodoId) -> Self {
        Self {
            todo_id: Some(id.to_hex()),
            ..Self::message(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_reads_title_only() {
        let input: CreateTodo =
            serde_json::from_str(r#"{"id":"abc","title":"Mine","completed":true}"#).unwrap();
        assert_eq!(input.title, "Mine");
        let echoed = serde_json::to_value(&input).unwrap();
        assert_eq!(echoed, serde_json::json!({ "title": "Mine" }));

        let untitled: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(untitled.is_err());
    }

    #[test]
    fn update_todo_requires_completed() {
        let result: Result<UpdateTodo, _> = serde_json::from_str(r#"{"title":"Only title"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn todo_serializes_created_at_as_rfc3339() {
        let created_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let todo = Todo {
            id: "6634b1f0a1b2c3d4e5f60718".to_string(),
            title: "Test".to_string(),
            completed: false,
            created_at,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], "6634b1f0a1b2c3d4e5f60718");
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn message_envelope_omits_empty_fields() {
        let envelope: Envelope = Envelope::message("Todo deleted successfully");
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"message":"Todo deleted successfully"}"#);
    }

    #[test]
    fn created_envelope_carries_hex_id() {
        let id = TodoId::generate();
        let envelope: Envelope = Envelope::created("Todo created successfully", id);
        assert_eq!(envelope.todo_id.as_deref(), Some(id.to_hex().as_str()));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn data_envelope_reads_back_list() {
        let raw = r#"{"data":[{"id":"6634b1f0a1b2c3d4e5f60718","title":"a","completed":true,"created_at":"2024-05-01T12:00:00Z"}]}"#;
        let envelope: Envelope<Vec<Todo>> = serde_json::from_str(raw).unwrap();
        let todos = envelope.data.unwrap();
        assert_eq!(todos.len(), 1);
        assert!(todos[0].completed);
        assert!(envelope.message.is_none());
    }
}
