//! In-memory book store.
//!
//! Used by the test suite and for running the service without a database.
//! Ids are real ObjectIds so the HTTP surface behaves the same as with MongoDB.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

use super::types::{Book, NewBook, StoreBackend};
use super::{parse_id, BookStore};

/// Configuration for in-memory store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// Whether to fail read operations.
    pub fail_reads: bool,
    /// Whether to fail write operations.
    pub fail_writes: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    book: Book,
}

/// Process-local [`BookStore`].
#[derive(Debug, Clone)]
pub struct InMemoryBookStore {
    config: MemoryStoreConfig,
    books: Arc<DashMap<ObjectId, Entry>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryBookStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create an empty store with custom behavior.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            books: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Store whose every operation fails.
    pub fn failing() -> Self {
        Self::with_config(MemoryStoreConfig {
            fail_reads: true,
            fail_writes: true,
            latency_ms: 0,
        })
    }

    /// Number of stored books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Remove all books.
    pub fn clear(&self) {
        self.books.clear();
    }

    async fn simulate(&self, write: bool) -> StoreResult<()> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if write && self.config.fail_writes {
            return Err(StoreError::Unavailable("simulated write failure".to_string()));
        }
        if !write && self.config.fail_reads {
            return Err(StoreError::Unavailable("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn ordered(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.books.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        self.simulate(true).await?;

        let id = ObjectId::new();
        let now = Utc::now();
        let book = Book {
            id: id.to_hex(),
            title: book.title,
            author: book.author,
            publish_year: book.publish_year,
            created_at: now,
            updated_at: now,
        };
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.books.insert(
            id,
            Entry {
                seq,
                book: book.clone(),
            },
        );

        debug!(id = %book.id, "stored book in memory");
        Ok(book)
    }

    async fn list(&self) -> StoreResult<Vec<Book>> {
        self.simulate(false).await?;
        Ok(self.ordered().into_iter().map(|e| e.book).collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        self.simulate(false).await?;
        let oid = parse_id(id)?;
        Ok(self.books.get(&oid).map(|e| e.book.clone()))
    }

    async fn update(&self, id: &str, book: NewBook) -> StoreResult<Option<Book>> {
        self.simulate(true).await?;
        let oid = parse_id(id)?;

        let Some(mut entry) = self.books.get_mut(&oid) else {
            return Ok(None);
        };
        let stored = &mut entry.book;
        stored.title = book.title;
        stored.author = book.author;
        stored.publish_year = book.publish_year;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        self.simulate(true).await?;
        let oid = parse_id(id)?;
        Ok(self.books.remove(&oid).map(|(_, e)| e.book))
    }

    async fn delete_by_title(&self, title: &str) -> StoreResult<Option<Book>> {
        self.simulate(true).await?;

        let first = self
            .ordered()
            .into_iter()
            .find(|e| e.book.title == title)
            .map(|e| e.book.id);

        match first {
            Some(id) => {
                let oid = parse_id(&id)?;
                Ok(self.books.remove(&oid).map(|(_, e)| e.book))
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        self.simulate(false).await
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let store = InMemoryBookStore::new();
        let created = store
            .create(NewBook::new("Dune", "Herbert", 1965))
            .await
            .unwrap();

        assert_eq!(created.id.len(), 24);
        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = InMemoryBookStore::new();
        for (title, year) in [("A", 2001), ("B", 2002), ("C", 2003)] {
            store.create(NewBook::new(title, "X", year)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn update_returns_new_values() {
        let store = InMemoryBookStore::new();
        let created = store.create(NewBook::new("Old", "Anon", 1900)).await.unwrap();

        let updated = store
            .update(&created.id, NewBook::new("New", "Someone", 2000))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.publish_year, 2000);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = InMemoryBookStore::new();
        let result = store
            .update(&ObjectId::new().to_hex(), NewBook::new("T", "A", 1))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_by_title_removes_only_first_match() {
        let store = InMemoryBookStore::new();
        let first = store.create(NewBook::new("Twin", "One", 1)).await.unwrap();
        let second = store.create(NewBook::new("Twin", "Two", 2)).await.unwrap();

        let removed = store.delete_by_title("Twin").await.unwrap().unwrap();
        assert_eq!(removed.id, first.id);
        assert_eq!(store.len(), 1);
        assert!(store.get(&second.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_by_id_then_get_is_none() {
        let store = InMemoryBookStore::new();
        let created = store.create(NewBook::new("Gone", "Soon", 1999)).await.unwrap();

        assert!(store.delete_by_id(&created.id).await.unwrap().is_some());
        assert!(store.get(&created.id).await.unwrap().is_none());
        assert!(store.delete_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let store = InMemoryBookStore::new();
        assert!(matches!(
            store.get("123").await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn failing_store_fails_every_operation() {
        let store = InMemoryBookStore::failing();
        assert!(store.list().await.is_err());
        assert!(store.ping().await.is_err());
        assert!(store.create(NewBook::new("T", "A", 1)).await.is_err());
        assert!(store.delete_by_title("T").await.is_err());
    }

    #[tokio::test]
    async fn configured_latency_delays_operations() {
        let store = InMemoryBookStore::with_config(MemoryStoreConfig {
            latency_ms: 20,
            ..Default::default()
        });

        let start = std::time::Instant::now();
        store.list().await.unwrap();
        store.create(NewBook::new("T", "A", 1)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(store.len(), 1);
    }
}
