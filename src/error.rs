//! Defines the error types for the pollen client and the CLI host around it.
//!
//! Uses the `thiserror` crate for ergonomic error definition. Errors that do not
//! implement `Clone` are wrapped in `Arc` so both enums stay cloneable.
//!
//! `ApiError` is the typed result of the single network boundary in
//! [`crate::api::PollenApi`]: every failure a fetch can produce maps onto one of
//! its four kinds. The client never logs or swallows them; the host layer
//! decides how to surface a failed fetch.

use std::sync::Arc;
use thiserror::Error;

/// Failure kinds of the pollen API client, one per failure class at the
/// network boundary.
///
/// A caller that receives any of these should treat the data as temporarily
/// unavailable rather than as a terminal condition.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// The 10-second request guard expired before a response was read.
    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    /// The response body was not the JSON shape we expect.
    #[error("Error parsing response from {url}: {source}")]
    Parse {
        url: String,
        source: Arc<serde_json::Error>,
    },

    /// Connection, DNS, TLS or HTTP-status failure from `reqwest`.
    #[error("Error fetching {url}: {source}")]
    Transport {
        url: String,
        source: Arc<reqwest::Error>,
    },

    /// Anything that fits none of the classes above.
    #[error("Unexpected error for {url}: {message}")]
    Unexpected { url: String, message: String },
}

/// A specialized `Result` for operations of the API client.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The error enumeration for the CLI host layer.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Error returned by the pollen API client.
    #[error("API Error: {0}")]
    Api(#[from] ApiError),

    /// Error related to accessing environment variables.
    #[error("Environment Error: {0}")]
    Env(#[from] std::env::VarError),

    /// Error specific to CLI logic or argument handling.
    #[error("CLI Error: {0}")]
    Cli(String),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// --- From implementations ---
// Arc is used for the non-Clone error types.

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}
