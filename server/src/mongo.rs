//! MongoDB-backed `DocumentStore`.
//!
//! Documents keep the field names `_id`, `title`, `completed` and
//! `createdAt`. Driver errors are folded into `StoreError`: connectivity
//! problems become `Unavailable`, everything else `Unknown`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, doc};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use todo_core::{DocumentStore, NewTodo, StoreError, TodoId, TodoPatch, TodoRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TodoDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    completed: bool,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
}

impl TodoDocument {
    fn new(id: ObjectId, todo: NewTodo) -> Self {
        Self {
            id,
            title: todo.title,
            completed: todo.completed,
            created_at: bson::DateTime::from_millis(todo.created_at.timestamp_millis()),
        }
    }

    fn into_record(self) -> Result<TodoRecord, StoreError> {
        let millis = self.created_at.timestamp_millis();
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            StoreError::Unknown(format!("createdAt out of range for todo {}", self.id))
        })?;
        Ok(TodoRecord {
            id: TodoId::from_object_id(self.id),
            title: self.title,
            completed: self.completed,
            created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    collection: Collection<TodoDocument>,
}

impl MongoStore {
    /// Parses `uri` and opens a client whose connection attempts and server
    /// selection are bounded by `connect_timeout`. No round-trip happens
    /// here; call [`DocumentStore::ping`] to verify the server is reachable.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await.map_err(classify)?;
        options.app_name = Some("todo-server".to_string());
        options.connect_timeout = Some(connect_timeout);
        options.server_selection_timeout = Some(connect_timeout);

        let client = Client::with_options(options).map_err(classify)?;
        let database = client.database(database);
        let collection = database.collection::<TodoDocument>(collection);
        Ok(Self {
            database,
            collection,
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn find_all(&self) -> Result<Vec<TodoRecord>, StoreError> {
        let cursor = self.collection.find(doc! {}).await.map_err(classify)?;
        let documents: Vec<TodoDocument> = cursor.try_collect().await.map_err(classify)?;
        documents.into_iter().map(TodoDocument::into_record).collect()
    }

    async fn insert(&self, todo: NewTodo) -> Result<TodoId, StoreError> {
        let document = TodoDocument::new(ObjectId::new(), todo);
        let result = self.collection.insert_one(&document).await.map_err(classify)?;
        result
            .inserted_id
            .as_object_id()
            .map(TodoId::from_object_id)
            .ok_or_else(|| StoreError::Unknown(format!("unexpected inserted id {}", result.inserted_id)))
    }

    async fn update_fields(&self, id: TodoId, patch: TodoPatch) -> Result<bool, StoreError> {
        let update = doc! {
            "$set": {
                "title": patch.title,
                "completed": patch.completed,
            }
        };
        let result = self
            .collection
            .update_one(doc! { "_id": id.object_id() }, update)
            .await
            .map_err(classify)?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<bool, StoreError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.object_id() })
            .await
            .map_err(classify)?;
        Ok(result.deleted_count > 0)
    }
}

fn classify(err: mongodb::error::Error) -> StoreError {
    match *err.kind {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Unknown(err.to_string()),
    }
}
