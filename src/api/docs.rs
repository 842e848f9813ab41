//! OpenAPI document for the book routes.

use utoipa::OpenApi;

use super::handlers::{self, BookRequest, UpdateResponse};
use crate::error::MessageResponse;
use crate::store::Book;

/// OpenAPI description served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "Book Catalog API", description = "CRUD over a collection of books"),
    paths(
        handlers::create_book,
        handlers::list_books,
        handlers::get_book,
        handlers::update_book,
        handlers::delete_book_by_id,
        handlers::delete_book_by_title,
    ),
    components(schemas(Book, BookRequest, UpdateResponse, MessageResponse)),
    tags((name = "books", description = "Book records"))
)]
pub struct ApiDoc;
