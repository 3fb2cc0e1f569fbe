//! Deadline-scoped access to the document store.
//!
//! # Design
//! Handlers never talk to a `DocumentStore` directly. Every call goes
//! through `TodoGateway`, which applies the single configured timeout and
//! turns the store's "nothing matched" answers into `StoreError::NotFound`.
//! A call that runs past its deadline is dropped, not retried, and only the
//! request that issued it sees the failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use todo_core::{DocumentStore, NewTodo, StoreError, TodoId, TodoPatch, TodoRecord};

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct TodoGateway {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl TodoGateway {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        self.bounded(self.store.find_all()).await
    }

    pub async fn insert(&self, todo: NewTodo) -> Result<TodoId, StoreError> {
        self.bounded(self.store.insert(todo)).await
    }

    pub async fn update_fields(&self, id: TodoId, patch: TodoPatch) -> Result<(), StoreError> {
        let matched = self.bounded(self.store.update_fields(id, patch)).await?;
        matched.then_some(()).ok_or(StoreError::NotFound)
    }

    pub async fn delete_by_id(&self, id: TodoId) -> Result<(), StoreError> {
        let removed = self.bounded(self.store.delete_by_id(id)).await?;
        removed.then_some(()).ok_or(StoreError::NotFound)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for TodoGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoGateway")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
