//! Book persistence.
//!
//! This module handles:
//! - Book record types
//! - The [`BookStore`] trait handlers talk to
//! - MongoDB-backed store
//! - In-memory store for tests and local runs

pub mod memory;
pub mod mongo;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};

pub use memory::{InMemoryBookStore, MemoryStoreConfig};
pub use mongo::MongoBookStore;
pub use types::{Book, NewBook, StoreBackend};

/// Document-store client shared by all request handlers.
///
/// One instance is built at startup and injected into the router state.
/// Every lookup returns `Ok(None)` when no document matches, leaving the
/// not-found policy to the caller.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new book, assigning its id and timestamps.
    async fn create(&self, book: NewBook) -> StoreResult<Book>;

    /// All books in store default order.
    async fn list(&self) -> StoreResult<Vec<Book>>;

    /// Fetch one book by id.
    async fn get(&self, id: &str) -> StoreResult<Option<Book>>;

    /// Overwrite the three fields of a book, returning the updated record.
    async fn update(&self, id: &str, book: NewBook) -> StoreResult<Option<Book>>;

    /// Remove a book by id, returning the removed record.
    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Book>>;

    /// Remove the first book whose title matches exactly.
    async fn delete_by_title(&self, title: &str) -> StoreResult<Option<Book>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Which backend this is.
    fn backend(&self) -> StoreBackend;
}

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn BookStore>;

/// Parse a book identifier.
pub fn parse_id(id: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// Build the store selected by configuration.
///
/// For MongoDB this connects and pings before returning, so a bad
/// connection string fails here rather than on the first request.
pub async fn connect(config: &Config) -> StoreResult<SharedStore> {
    match config.book_store {
        StoreBackend::Mongo => {
            let url = config
                .mongo_url
                .as_deref()
                .ok_or_else(|| StoreError::Unavailable("MONGO_URL is not set".to_string()))?;
            let store =
                MongoBookStore::connect(url, &config.mongo_database, &config.mongo_collection)
                    .await?;
            store.ping().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(InMemoryBookStore::new())),
    }
}
