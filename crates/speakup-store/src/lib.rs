//! # speakup-store
//!
//! Device-local persistence for the SOS client, backed by SQLite.
//!
//! The emergency contact list is stored as one JSON blob under a single
//! well-known key and is always read and written whole. Callers depend on
//! the [`ContactRepository`] trait, so the backend can be swapped without
//! touching the SOS state machine.

pub mod contacts;
pub mod database;
pub mod kv;
pub mod migrations;
pub mod repository;

mod error;

pub use contacts::{ContactBook, SqliteContactStore};
pub use database::Database;
pub use error::StoreError;
pub use repository::{ContactRepository, MemoryContactStore};
