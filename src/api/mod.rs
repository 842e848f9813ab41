//! HTTP API module: book routes, static pages, health and metrics endpoints.

pub mod docs;
pub mod handlers;
pub mod routes;

pub use docs::ApiDoc;
pub use handlers::AppState;
pub use routes::{create_router, RouterOptions};
