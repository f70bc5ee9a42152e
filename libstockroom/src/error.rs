//! Error types for Stockroom

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StockroomError>;

#[derive(Error, Debug)]
pub enum StockroomError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Operation timed out")]
    Timeout,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StockroomError {
    /// True for errors raised before any network call was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(self, StockroomError::InvalidInput(_))
    }
}

/// Authentication error kinds, translated at the adapter boundary.
///
/// The core never inspects raw backend payloads; adapters map whatever the
/// backend reports into this closed set, with `Backend` carrying the raw
/// message as the generic fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account not found")]
    UserNotFound,

    #[error("email already registered")]
    EmailInUse,

    #[error("weak password")]
    WeakPassword,

    #[error("malformed email")]
    InvalidEmail,

    #[error("rate limited")]
    RateLimited,

    #[error("{0}")]
    Backend(String),
}

/// Document-store error kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("service unavailable")]
    Unavailable,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("document not found")]
    NotFound,

    #[error("{0}")]
    Backend(String),
}

/// Blob-store error kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("canceled")]
    Canceled,

    #[error("unknown storage error")]
    Unknown,

    #[error("invalid format")]
    InvalidFormat,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
