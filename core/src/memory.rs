//! In-process document store.
//!
//! Records are kept in insertion order, which stands in for a document
//! store's natural order. Used as the `memory` backend and as the fake in
//! tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::DocumentStore;
use crate::types::{NewTodo, TodoId, TodoPatch, TodoRecord};

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<TodoRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: TodoId) -> Option<TodoRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, todo: NewTodo) -> Result<TodoId, StoreError> {
        let id = TodoId::generate();
        self.records.write().await.push(todo.into_record(id));
        Ok(id)
    }

    async fn update_fields(&self, id: TodoId, patch: TodoPatch) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        record.title = patch.title;
        record.completed = patch.completed;
        Ok(true)
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
