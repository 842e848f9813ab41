//! HTTP API handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, MessageResponse, StoreError};
use crate::metrics;
use crate::store::{Book, NewBook, SharedStore, StoreBackend};

/// Message returned when a create or update body is incomplete.
pub const MISSING_FIELDS_MESSAGE: &str = "Send all required fields: title, author, publishYear";

/// Message returned after a successful delete.
pub const DELETED_MESSAGE: &str = "Book deleted successfully";

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store client.
    pub store: SharedStore,
    /// Prometheus handle, when the exporter is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Create or update request body.
///
/// Fields stay untyped on the wire: presence is checked the way a JSON
/// client would test truthiness, then each value is cast to its stored
/// type. A present value that cannot be cast is a store cast error.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    /// Book title.
    #[schema(value_type = Option<String>, example = "Dune")]
    pub title: Option<Value>,
    /// Book author.
    #[schema(value_type = Option<String>, example = "Frank Herbert")]
    pub author: Option<Value>,
    /// Year of first publication.
    #[schema(value_type = Option<i32>, example = 1965)]
    pub publish_year: Option<Value>,
}

impl BookRequest {
    /// Check that all three fields are present and truthy, then cast them.
    pub fn into_new_book(self) -> Result<NewBook, ApiError> {
        let (Some(title), Some(author), Some(year)) = (
            self.title.filter(is_truthy),
            self.author.filter(is_truthy),
            self.publish_year.filter(is_truthy),
        ) else {
            return Err(ApiError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        };

        Ok(NewBook::new(
            cast_string("title", title)?,
            cast_string("author", author)?,
            cast_year(year)?,
        ))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cast_string(path: &'static str, value: Value) -> Result<String, StoreError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(StoreError::Cast {
            kind: "string",
            value: raw(&other),
            path,
        }),
    }
}

fn whole_year(f: f64) -> Option<i32> {
    let in_range = f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX);
    (f.fract() == 0.0 && in_range).then_some(f as i32)
}

fn cast_year(value: Value) -> Result<i32, StoreError> {
    let year = match &value {
        Value::Number(n) => n.as_f64().and_then(whole_year),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(whole_year),
        Value::Bool(true) => Some(1),
        _ => None,
    };

    year.ok_or_else(|| StoreError::Cast {
        kind: "Number",
        value: raw(&value),
        path: "publishYear",
    })
}

fn parse_body(body: Result<Json<BookRequest>, JsonRejection>) -> Result<NewBook, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected book payload");
        ApiError::Validation(MISSING_FIELDS_MESSAGE.to_string())
    })?;
    request.into_new_book()
}

/// Update response envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateResponse {
    /// The book after the update.
    pub result: Book,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the store answered a ping.
    pub ready: bool,
    /// Store backend in use.
    pub store: StoreBackend,
}

/// Home page.
pub async fn home() -> &'static str {
    info!("reached the home page");
    "Home page is here"
}

/// About page.
pub async fn about() -> &'static str {
    "About page"
}

/// Contact page.
pub async fn contact() -> &'static str {
    "Contact page"
}

/// Create a book.
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Missing required field", body = MessageResponse),
        (status = 500, description = "Store failure or uncastable field", body = MessageResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    body: Result<Json<BookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new_book = parse_body(body)?;
    let book = state.store.create(new_book).await?;

    metrics::inc_books_created();
    info!(id = %book.id, title = %book.title, "created book");
    Ok((StatusCode::CREATED, Json(book)))
}

/// List all books.
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = [Book]),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// Fetch one book.
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "No such book", body = MessageResponse),
        (status = 500, description = "Store failure or malformed id", body = MessageResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Overwrite a book.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book id")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Updated book", body = UpdateResponse),
        (status = 400, description = "Missing required field", body = MessageResponse),
        (status = 404, description = "No such book", body = MessageResponse),
        (status = 500, description = "Store failure or malformed id", body = MessageResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let new_book = parse_body(body)?;
    let result = state
        .store
        .update(&id, new_book)
        .await?
        .ok_or(ApiError::NotFound)?;

    metrics::inc_books_updated();
    info!(id = %result.id, "updated book");
    Ok(Json(UpdateResponse { result }))
}

/// Delete a book by id.
#[utoipa::path(
    delete,
    path = "/books/id/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "No such book", body = MessageResponse),
        (status = 500, description = "Store failure or malformed id", body = MessageResponse)
    )
)]
pub async fn delete_book_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let book = state
        .store
        .delete_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    metrics::inc_books_deleted();
    info!(id = %book.id, "deleted book");
    Ok(Json(MessageResponse::new(DELETED_MESSAGE)))
}

/// Delete the first book with an exact title.
#[utoipa::path(
    delete,
    path = "/books/title/{title}",
    tag = "books",
    params(("title" = String, Path, description = "Exact book title")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "No book with that title", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn delete_book_by_title(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let book = state
        .store
        .delete_by_title(&title)
        .await?
        .ok_or(ApiError::NotFound)?;

    metrics::inc_books_deleted();
    info!(id = %book.id, title = %book.title, "deleted book by title");
    Ok(Json(MessageResponse::new(DELETED_MESSAGE)))
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if the store answers, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "store ping failed");
            false
        }
    };

    let response = ReadyResponse {
        ready,
        store: state.store.backend(),
    };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Prometheus exposition.
pub async fn prometheus(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics exporter not installed".to_string(),
        ),
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(MessageResponse::new("Route not found")),
    )
}
