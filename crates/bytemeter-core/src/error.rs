//! Shared error type across bytemeter crates.

use thiserror::Error;

/// Stable error codes, used as log fields and in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The key extractor could not derive a key for a request.
    KeyDerivation,
    /// Invalid or unreadable configuration.
    Config,
    /// Socket / filesystem failure.
    Io,
}

impl ErrorCode {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::KeyDerivation => "KEY_DERIVATION",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Io => "IO",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BytemeterError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum BytemeterError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(String),
}

impl BytemeterError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            BytemeterError::KeyDerivation(_) => ErrorCode::KeyDerivation,
            BytemeterError::Config(_) => ErrorCode::Config,
            BytemeterError::Io(_) => ErrorCode::Io,
        }
    }
}

impl From<std::io::Error> for BytemeterError {
    fn from(e: std::io::Error) -> Self {
        BytemeterError::Io(e.to_string())
    }
}
