//! Book catalog REST API.
//!
//! A thin HTTP layer over a document store: create, list, fetch, overwrite
//! and delete book records, plus three static pages.
//!
//! ```text
//! POST   /books                 create (201)
//! GET    /books                 list
//! GET    /books/:id             fetch one
//! PUT    /books/:id             overwrite, returns {result: book}
//! DELETE /books/id/:id          delete by id
//! DELETE /books/title/:title    delete first exact title match
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`store`]: Book store trait, MongoDB and in-memory backends
//! - [`api`]: HTTP router and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
