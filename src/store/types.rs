//! Book record types shared by every store backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier (24 hex characters).
    #[serde(rename = "_id")]
    #[schema(example = "65a1f0c2e4b0a1b2c3d4e5f6")]
    pub id: String,
    /// Book title.
    #[schema(example = "Dune")]
    pub title: String,
    /// Book author.
    #[schema(example = "Frank Herbert")]
    pub author: String,
    /// Year of first publication.
    #[schema(example = 1965)]
    pub publish_year: i32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last overwritten.
    pub updated_at: DateTime<Utc>,
}

/// The three caller-supplied fields of a book, already checked for presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    /// Book title.
    pub title: String,
    /// Book author.
    pub author: String,
    /// Year of first publication.
    pub publish_year: i32,
}

impl NewBook {
    /// Create a new book payload.
    pub fn new(title: impl Into<String>, author: impl Into<String>, publish_year: i32) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            publish_year,
        }
    }
}

/// Which store implementation backs the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// MongoDB document store.
    #[default]
    #[serde(alias = "mongodb")]
    #[strum(to_string = "mongo", serialize = "mongodb")]
    Mongo,
    /// Process-local store, contents are lost on exit.
    #[serde(alias = "in-memory")]
    #[strum(to_string = "memory", serialize = "in-memory")]
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn book_serializes_with_mongo_style_keys() {
        let now = Utc::now();
        let book = Book {
            id: "65a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            publish_year: 1965,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["_id"], "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["publishYear"], 1965);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn store_backend_parses_aliases() {
        assert_eq!(StoreBackend::from_str("mongo").unwrap(), StoreBackend::Mongo);
        assert_eq!(StoreBackend::from_str("mongodb").unwrap(), StoreBackend::Mongo);
        assert_eq!(StoreBackend::from_str("memory").unwrap(), StoreBackend::Memory);
        assert!(StoreBackend::from_str("postgres").is_err());
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
    }
}
