//! HTTP API route definitions.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::docs::ApiDoc;
use super::handlers::{
    about, contact, create_book, delete_book_by_id, delete_book_by_title, get_book, health,
    home, list_books, not_found, prometheus, ready, update_book, AppState,
};
use crate::metrics;

/// Optional layers attached to the router.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Attach a permissive CORS layer.
    pub cors_permissive: bool,
    /// Serve Swagger UI and the OpenAPI document.
    pub swagger: bool,
}

/// Create the API router.
pub fn create_router(state: AppState, options: RouterOptions) -> Router {
    let mut router = Router::new()
        // Static pages
        .route("/", get(home))
        .route("/about", get(about))
        .route("/contact", get(contact))
        // Books
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book_by_id),
        )
        .route("/books/id/:id", axum::routing::delete(delete_book_by_id))
        .route(
            "/books/title/:title",
            axum::routing::delete(delete_book_by_title),
        )
        // Operational endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(prometheus))
        .fallback(not_found);

    if options.swagger {
        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let mut router = router
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http());

    if options.cors_permissive {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

/// Record request count and latency keyed by the matched route template.
async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(req).await;
    metrics::record_http_request(start, &route, response.status().as_u16());
    response
}
