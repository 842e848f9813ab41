//! MongoDB-backed book store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::metrics;

use super::types::{Book, NewBook, StoreBackend};
use super::{parse_id, BookStore};

/// Book as stored in the collection.
///
/// Timestamps are optional so documents written without them still load;
/// the ObjectId creation time stands in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    author: String,
    publish_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<bson::DateTime>,
}

impl TryFrom<BookDocument> for Book {
    type Error = StoreError;

    fn try_from(doc: BookDocument) -> Result<Self, Self::Error> {
        let created = doc.created_at.unwrap_or_else(|| doc.id.timestamp());
        let updated = doc.updated_at.unwrap_or(created);
        Ok(Book {
            id: doc.id.to_hex(),
            title: doc.title,
            author: doc.author,
            publish_year: doc.publish_year,
            created_at: to_chrono(created)?,
            updated_at: to_chrono(updated)?,
        })
    }
}

fn to_chrono(dt: bson::DateTime) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {dt}")))
}

fn map_optional(doc: Option<BookDocument>) -> StoreResult<Option<Book>> {
    doc.map(Book::try_from).transpose()
}

/// [`BookStore`] over a MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoBookStore {
    database: Database,
    books: Collection<BookDocument>,
}

impl MongoBookStore {
    /// Connect using a MongoDB connection string.
    ///
    /// The database named in the URL wins; `database` is used when the URL
    /// names none. The driver connects lazily, call [`BookStore::ping`] to
    /// verify the server is reachable.
    pub async fn connect(url: &str, database: &str, collection: &str) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(url).await?;
        options.app_name = Some("book-catalog".to_string());
        let client = Client::with_options(options)?;

        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(database));
        info!(database = %database.name(), collection, "using MongoDB collection");

        Ok(Self {
            books: database.collection(collection),
            database,
        })
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    #[instrument(skip(self, book), fields(title = %book.title))]
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let _timer = metrics::timer_store_op("create");
        let now = bson::DateTime::now();
        let document = BookDocument {
            id: ObjectId::new(),
            title: book.title,
            author: book.author,
            publish_year: book.publish_year,
            created_at: Some(now),
            updated_at: Some(now),
        };

        self.books.insert_one(&document).await?;
        debug!(id = %document.id, "inserted book");
        Book::try_from(document)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> StoreResult<Vec<Book>> {
        let _timer = metrics::timer_store_op("list");
        let documents: Vec<BookDocument> = self.books.find(doc! {}).await?.try_collect().await?;
        documents.into_iter().map(Book::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> StoreResult<Option<Book>> {
        let oid = parse_id(id)?;
        let _timer = metrics::timer_store_op("get");
        map_optional(self.books.find_one(doc! { "_id": oid }).await?)
    }

    #[instrument(skip(self, book))]
    async fn update(&self, id: &str, book: NewBook) -> StoreResult<Option<Book>> {
        let oid = parse_id(id)?;
        let _timer = metrics::timer_store_op("update");
        let update = doc! {
            "$set": {
                "title": book.title,
                "author": book.author,
                "publishYear": book.publish_year,
                "updatedAt": bson::DateTime::now(),
            }
        };

        let updated = self
            .books
            .find_one_and_update(doc! { "_id": oid }, update)
            .return_document(ReturnDocument::After)
            .await?;
        map_optional(updated)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        let oid = parse_id(id)?;
        let _timer = metrics::timer_store_op("delete_by_id");
        map_optional(self.books.find_one_and_delete(doc! { "_id": oid }).await?)
    }

    #[instrument(skip(self))]
    async fn delete_by_title(&self, title: &str) -> StoreResult<Option<Book>> {
        let _timer = metrics::timer_store_op("delete_by_title");
        map_optional(
            self.books
                .find_one_and_delete(doc! { "title": title })
                .await?,
        )
    }

    async fn ping(&self) -> StoreResult<()> {
        let _timer = metrics::timer_store_op("ping");
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Mongo
    }
}
