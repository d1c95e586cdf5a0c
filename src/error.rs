//! Error types for marginalia

use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error type
///
/// `NotConfigured`, `AlreadySynced`, `NoPdfAttachments` and `NoAnnotations`
/// are per-item sync outcomes, not faults: the sync service converts them
/// into failure results and the batch keeps going.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Capacities API not configured. Please set API token and Space ID.")]
    NotConfigured,

    #[error("Item already synced. Use force sync to re-sync.")]
    AlreadySynced,

    #[error("No PDF attachments or annotations found.")]
    NoPdfAttachments,

    #[error("No annotations found in PDF.")]
    NoAnnotations,

    /// Non-success response from the Capacities API. The message embeds the
    /// status text and the raw response body.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build the typed API error from a non-success response
    pub fn api(status: reqwest::StatusCode, body: &str) -> Self {
        Error::Api {
            status: status.as_u16(),
            message: format!(
                "Capacities API error: {} {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                body
            ),
        }
    }
}
