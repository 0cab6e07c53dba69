//! Error types module
//!
//! Every error returned by the bridge carries exactly one [`ErrorCode`] plus a
//! human-readable message, so callers can branch on the code without string matching.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Stable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request could not be interpreted (wrong argument shape, missing file on disk).
    BadRequest,
    /// The provider rejected the credentials or the operation.
    Unauthorized,
    /// The configuration is missing or malformed.
    InvalidConfig,
    /// No bucket could be resolved for the operation.
    InvalidBucket,
    /// The provider identifier is empty or unknown.
    InvalidProvider,
    /// Explicit credentials were required but not supplied.
    InvalidCredentials,
    /// A File or MultiFile failed validation.
    InvalidParameters,
    /// I/O or provider-side failure while handling a file.
    FileOperationFailed,
    /// The adapter has no live client.
    ClientError,
    /// At least one file of a batch failed to upload.
    IncompleteMultiFileUpload,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad request",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::InvalidConfig => "invalid config",
            ErrorCode::InvalidBucket => "invalid bucket",
            ErrorCode::InvalidProvider => "invalid provider",
            ErrorCode::InvalidCredentials => "invalid credentials",
            ErrorCode::InvalidParameters => "invalid parameters",
            ErrorCode::FileOperationFailed => "file operation failed",
            ErrorCode::ClientError => "client error",
            ErrorCode::IncompleteMultiFileUpload => "incomplete files upload",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The error type returned by every bridge operation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct BifrostError {
    code: ErrorCode,
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

/// Result type for bridge operations
pub type BifrostResult<T> = Result<T, BifrostError>;

impl BifrostError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying error that caused this one.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn invalid_bucket(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidBucket, message)
    }

    pub fn invalid_provider(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidProvider, message)
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCredentials, message)
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameters, message)
    }

    pub fn file_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FileOperationFailed, message)
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ClientError, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Configuration and credential problems never fix themselves; I/O and
    /// provider failures may be transient.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::FileOperationFailed
                | ErrorCode::ClientError
                | ErrorCode::IncompleteMultiFileUpload
        )
    }

    /// Message followed by the chain of underlying causes.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl Serialize for BifrostError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BifrostError", 2)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}
