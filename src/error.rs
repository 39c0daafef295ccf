//! # Error Handling
//!
//! Every way a passkey operation can fail, and the single function that turns
//! platform exceptions into those failures.
//!
//! ## Taxonomy
//! - `UnsupportedEnvironment`: insecure origin or no platform credential API
//! - `UserCancelled`: the user dismissed the prompt or it timed out
//! - `DuplicateCredential`: the authenticator already holds a credential for this account
//! - `NoPasskeysRegistered`: login begin answered 404
//! - `ServerRejected`: a finish/list/delete call answered non-ok
//! - `Network`: the HTTP request itself failed, passed through untouched
//! - `UnknownPlatform`: any other platform exception, passed through untouched

use std::fmt;
use thiserror::Error;

/// The ceremony a platform call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceremony {
    Registration,
    Authentication,
}

impl fmt::Display for Ceremony {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ceremony::Registration => f.write_str("Registration"),
            Ceremony::Authentication => f.write_str("Authentication"),
        }
    }
}

/// Exceptions raised by the platform credential API.
///
/// The named variants cover the exception names the ceremonies branch on;
/// anything else lands in `Other` with its name preserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("NotAllowedError: {0}")]
    NotAllowed(String),

    #[error("InvalidStateError: {0}")]
    InvalidState(String),

    #[error("AbortError: the operation was aborted")]
    Aborted,

    #[error("NotSupportedError: {0}")]
    NotSupported(String),

    #[error("SecurityError: {0}")]
    Security(String),

    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl PlatformError {
    /// Build an error from a platform exception name such as `"NotAllowedError"`
    pub fn from_name(name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match name {
            "NotAllowedError" => PlatformError::NotAllowed(message),
            "InvalidStateError" => PlatformError::InvalidState(message),
            "AbortError" => PlatformError::Aborted,
            "NotSupportedError" => PlatformError::NotSupported(message),
            "SecurityError" => PlatformError::Security(message),
            _ => PlatformError::Other {
                name: name.to_string(),
                message,
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlatformError::NotAllowed(_) => "NotAllowedError",
            PlatformError::InvalidState(_) => "InvalidStateError",
            PlatformError::Aborted => "AbortError",
            PlatformError::NotSupported(_) => "NotSupportedError",
            PlatformError::Security(_) => "SecurityError",
            PlatformError::Other { name, .. } => name,
        }
    }
}

/// Outcome of classifying a platform exception
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformFailure {
    Cancelled,
    Duplicate,
    Aborted,
    Unknown(PlatformError),
}

/// Classify a platform exception raised during `ceremony`.
///
/// `InvalidState` only means "already registered" while creating a credential;
/// during authentication it is unknown and passes through.
pub fn classify(ceremony: Ceremony, error: PlatformError) -> PlatformFailure {
    match error {
        PlatformError::NotAllowed(_) => PlatformFailure::Cancelled,
        PlatformError::InvalidState(_) if ceremony == Ceremony::Registration => {
            PlatformFailure::Duplicate
        }
        PlatformError::Aborted => PlatformFailure::Aborted,
        other => PlatformFailure::Unknown(other),
    }
}

impl PlatformFailure {
    /// Error surfaced to callers of a modal ceremony
    pub fn into_error(self, ceremony: Ceremony) -> PasskeyError {
        match self {
            PlatformFailure::Cancelled => PasskeyError::UserCancelled(ceremony),
            PlatformFailure::Duplicate => PasskeyError::DuplicateCredential,
            PlatformFailure::Aborted => PasskeyError::UnknownPlatform(PlatformError::Aborted),
            PlatformFailure::Unknown(error) => PasskeyError::UnknownPlatform(error),
        }
    }
}

/// Library-wide error type
#[derive(Error, Debug)]
pub enum PasskeyError {
    #[error("WebAuthn is not supported in this browser")]
    UnsupportedEnvironment,

    #[error("{0} was cancelled or timed out")]
    UserCancelled(Ceremony),

    #[error("This authenticator is already registered")]
    DuplicateCredential,

    #[error("No passkeys registered")]
    NoPasskeysRegistered,

    /// Server answered non-ok; holds the server's text or a fallback message
    #[error("{0}")]
    ServerRejected(String),

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    UnknownPlatform(PlatformError),

    /// Server answered ok but the body did not match the expected shape
    #[error("Malformed server payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid base64url data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl PasskeyError {
    /// Classify a platform exception from a modal ceremony
    pub fn from_platform(ceremony: Ceremony, error: PlatformError) -> Self {
        classify(ceremony, error).into_error(ceremony)
    }
}

pub type PasskeyResult<T> = Result<T, PasskeyError>;
