//! The document-store collaborator contract.
//!
//! # Design
//! Implementations are thin pass-throughs to a backend. They generate the
//! identifier on insert, and report "no record matched" as `Ok(false)` rather
//! than an error so the caller can tell it apart from a transport failure.
//! Deadlines are not the store's concern; the gateway in front of it applies
//! them uniformly.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{NewTodo, TodoId, TodoPatch, TodoRecord};

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Round-trip to the backend to prove it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Every record, in the backend's natural order.
    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError>;

    /// Persist a new record and return the identifier the store assigned.
    async fn insert(&self, todo: NewTodo) -> Result<TodoId, StoreError>;

    /// Overwrite title and completed. Returns whether a record matched `id`.
    async fn update_fields(&self, id: TodoId, patch: TodoPatch) -> Result<bool, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: TodoId) -> Result<bool, StoreError>;
}
