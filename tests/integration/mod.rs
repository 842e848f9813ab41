//! Integration tests for the book catalog API.
//!
//! The HTTP flow tests run against the in-memory store. Tests marked
//! `#[ignore]` need a MongoDB server in `MONGO_URL`.
//! Run with: cargo test --test integration -- --ignored

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use book_catalog::api::{create_router, AppState, RouterOptions};
use book_catalog::config::Config;
use book_catalog::store::{self, BookStore, InMemoryBookStore, NewBook, SharedStore, StoreBackend};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router(store: SharedStore) -> Router {
    create_router(AppState::new(store), RouterOptions::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Create, list, delete, then fetch the deleted book.
async fn dune_scenario(app: &Router) {
    let (status, created) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({"title": "Dune", "author": "Herbert", "publishYear": 1965})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Dune");
    let id = created["_id"].as_str().unwrap().to_string();

    let (status, all) = send(app, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(all.as_array().unwrap().iter().any(|b| b["_id"] == id.as_str()));

    let (status, fetched) = send(app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["author"], "Herbert");
    assert_eq!(fetched["publishYear"], 1965);

    let (status, deleted) = send(app, Method::DELETE, &format!("/books/id/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Book deleted successfully");

    let (status, _) = send(app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Update, then confirm a re-fetch sees the new values.
async fn update_scenario(app: &Router) {
    let (_, created) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({"title": "Draft", "author": "Anon", "publishYear": 1999})),
    )
    .await;
    let id = created["_id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        app,
        Method::PUT,
        &format!("/books/{id}"),
        Some(json!({"title": "Final", "author": "Named", "publishYear": 2001})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["result"]["_id"], id.as_str());

    let (_, fetched) = send(app, Method::GET, &format!("/books/{id}"), None).await;
    assert_eq!(fetched["title"], "Final");
    assert_eq!(fetched["author"], "Named");
    assert_eq!(fetched["publishYear"], 2001);

    send(app, Method::DELETE, &format!("/books/id/{id}"), None).await;
}

#[tokio::test]
async fn create_list_delete_flow_in_memory() {
    let app = router(Arc::new(InMemoryBookStore::new()));
    dune_scenario(&app).await;
}

#[tokio::test]
async fn update_then_refetch_in_memory() {
    let app = router(Arc::new(InMemoryBookStore::new()));
    update_scenario(&app).await;
}

#[tokio::test]
async fn concurrent_creates_are_all_stored() {
    let store = InMemoryBookStore::new();
    let app = router(Arc::new(store.clone()));

    let tasks: Vec<_> = (1..=20)
        .map(|year| {
            let app = app.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    Method::POST,
                    "/books",
                    Some(json!({"title": format!("Vol {year}"), "author": "Many", "publishYear": year})),
                )
                .await
                .0
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::CREATED);
    }
    assert_eq!(store.len(), 20);
}

#[tokio::test]
async fn memory_backend_connects_from_config() {
    let config = Config {
        book_store: StoreBackend::Memory,
        ..Config::default()
    };
    let store = store::connect(&config).await.unwrap();
    assert_eq!(store.backend(), StoreBackend::Memory);

    let book = store.create(NewBook::new("T", "A", 1)).await.unwrap();
    assert!(store.get(&book.id).await.unwrap().is_some());
}

/// Get a MongoDB-backed config from environment.
fn mongo_config() -> Option<Config> {
    dotenvy::dotenv().ok();
    let url = std::env::var("MONGO_URL").ok()?;

    Some(Config {
        mongo_url: Some(url),
        mongo_database: "book_catalog_test".to_string(),
        ..Config::default()
    })
}

#[tokio::test]
#[ignore = "requires MONGO_URL"]
async fn mongo_create_list_delete_flow() {
    let Some(config) = mongo_config() else {
        println!("Skipping: MONGO_URL not set");
        return;
    };

    let store = store::connect(&config).await.expect("connect to MongoDB");
    assert_eq!(store.backend(), StoreBackend::Mongo);

    let app = router(store);
    dune_scenario(&app).await;
    update_scenario(&app).await;
}

#[tokio::test]
#[ignore = "requires MONGO_URL"]
async fn mongo_delete_by_title_removes_first_match() {
    let Some(config) = mongo_config() else {
        println!("Skipping: MONGO_URL not set");
        return;
    };

    let store = store::connect(&config).await.expect("connect to MongoDB");
    let title = format!("Twin {}", std::process::id());
    store.create(NewBook::new(&title, "One", 1)).await.unwrap();
    let second = store.create(NewBook::new(&title, "Two", 2)).await.unwrap();

    let removed = store.delete_by_title(&title).await.unwrap().unwrap();
    assert_eq!(removed.author, "One");
    assert!(store.get(&second.id).await.unwrap().is_some());

    store.delete_by_id(&second.id).await.unwrap();
}

#[tokio::test]
async fn unreachable_mongo_fails_at_connect() {
    let config = Config {
        mongo_url: Some(
            "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=500&connectTimeoutMS=500".to_string(),
        ),
        ..Config::default()
    };

    assert!(store::connect(&config).await.is_err());
}
