//! Application configuration loaded from environment variables.

use serde::Deserialize;

use crate::store::StoreBackend;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Attach a permissive CORS layer to the router.
    #[serde(default)]
    pub cors_permissive: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    // === Document Store ===
    /// Which store backend to use.
    #[serde(default)]
    pub book_store: StoreBackend,

    /// MongoDB connection string (host, credentials, database).
    #[serde(default)]
    pub mongo_url: Option<String>,

    /// Database used when the connection string names none.
    #[serde(default = "default_database")]
    pub mongo_database: String,

    /// Collection holding books.
    #[serde(default = "default_collection")]
    pub mongo_collection: String,
}

fn default_port() -> u16 {
    5555
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log filter directives from a raw `RUST_LOG` value, `info` when unset or blank.
pub fn resolve_log_filter(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default_log_level(),
    }
}

fn default_database() -> String {
    "bookstore".to_string()
}

fn default_collection() -> String {
    "books".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_permissive: false,
            rust_log: default_log_level(),
            book_store: StoreBackend::default(),
            mongo_url: None,
            mongo_database: default_database(),
            mongo_collection: default_collection(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("PORT must be non-zero".to_string());
        }

        if self.book_store == StoreBackend::Mongo {
            let url = self.mongo_url.as_deref().unwrap_or("").trim();
            if url.is_empty() {
                return Err("MONGO_URL is required when BOOK_STORE=mongo".to_string());
            }
            if !url.starts_with("mongodb://") && !url.starts_with("mongodb+srv://") {
                return Err("MONGO_URL must start with mongodb:// or mongodb+srv://".to_string());
            }
        }

        if self.mongo_database.trim().is_empty() {
            return Err("MONGO_DATABASE must not be empty".to_string());
        }

        if self.mongo_collection.trim().is_empty() {
            return Err("MONGO_COLLECTION must not be empty".to_string());
        }

        Ok(())
    }

    /// Connection string with any password replaced, safe to log.
    pub fn redacted_mongo_url(&self) -> Option<String> {
        self.mongo_url.as_deref().map(redact_credentials)
    }
}

fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => {
            let user = rest[..at].split(':').next().unwrap_or("");
            format!("{scheme}://{user}:****@{}", &rest[at + 1..])
        }
        None => url.to_string(),
    }
}
