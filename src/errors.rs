/*!
 * Error types for the locsync application.
 *
 * This module contains custom error types for the different collaborators of the
 * sync pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a remote API (translation backend or content store)
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from the API
        message: String,
        /// Server supplied retry hint, in seconds
        retry_after_secs: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    /// Whether the failed call may succeed if issued again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded { .. } => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// A single field rejected by the content store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    /// Node (or property) the store rejected
    pub node_id: String,
    /// Message reported by the store
    pub error: String,
}

/// Errors that can occur while reading from or writing to the content store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Transport or API failure
    #[error("Content store request failed: {0}")]
    Http(#[from] ProviderError),

    /// Document, component or site missing
    #[error("Content not found: {0}")]
    NotFound(String),

    /// The store answered with a payload we could not interpret
    #[error("Invalid content store payload: {0}")]
    InvalidPayload(String),

    /// Update rejected by structural validation and not correctable
    #[error("Structural validation failed for {target}: {}", format_failures(.failures))]
    Structural {
        /// Document or component the update targeted
        target: String,
        /// Every node the store still rejected
        failures: Vec<FieldFailure>,
    },
}

fn format_failures(failures: &[FieldFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.node_id, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur during translation
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backend answered but returned nothing usable
    #[error("Empty translation returned for text: {0}")]
    EmptyResponse(String),

    /// Every batch of a locale fell back to the source text
    #[error("All {0} translation units failed to translate")]
    AllBatchesFailed(usize),
}

/// Failure of one locale's pipeline
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Traversal or update failure
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Translation failure
    #[error("{0}")]
    Translation(#[from] TranslationError),

    /// Locale cannot be synced (for instance, localization disabled)
    #[error("Locale {0} is not a translation target")]
    NotATarget(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the content store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
