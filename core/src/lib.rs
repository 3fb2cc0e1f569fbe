//! Domain core for the todo service.
//!
//! # Overview
//! Holds everything about a todo that does not depend on HTTP or on a
//! particular database: the persisted and wire shapes, the mapper that
//! validates and converts between them, the error taxonomy, and the
//! `DocumentStore` contract with an in-memory implementation.
//!
//! # Design
//! - Identifiers are MongoDB `ObjectId`s wrapped in `TodoId`; the wire form is
//!   the 24-character hex string.
//! - The store contract reports "no match" as data, not as an error, so the
//!   layer above can normalize it to `StoreError::NotFound`.
//! - `InMemoryStore` doubles as a development backend and a test fake.

pub mod error;
pub mod mapper;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{StoreError, ValidationError};
pub use memory::InMemoryStore;
pub use store::DocumentStore;
pub use types::{CreateTodo, Envelope, NewTodo, Todo, TodoId, TodoPatch, TodoRecord, UpdateTodo};
