use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error is not, for example,
    /// due to a user error - merely that it cannot be confidently determined
    /// by the code.
    Internal,

    /// The user provided invalid input (a missing or oversized file, a
    /// damaged container, a wrong password).
    User,
}

/// What went wrong, for callers that map failures to messages or exit codes.
///
/// Every error carries exactly one kind. `OperationFailed` is the catch-all
/// for I/O and cryptographic failures that fit nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input path does not exist or is not a regular file.
    NotFound,
    /// The plaintext is larger than the configured maximum.
    SizeExceeded,
    /// The container is structurally invalid (too short, empty ciphertext,
    /// or ciphertext not a whole number of blocks).
    Corrupt,
    /// Padding did not validate after decryption. Without an integrity tag
    /// a wrong password and a damaged ciphertext look the same.
    InvalidPasswordOrCorrupt,
    /// An empty password was supplied where one is required.
    EmptyPassword,
    /// The password could not be obtained from the configured source.
    PasswordUnavailable,
    /// Any other I/O or cryptographic failure.
    OperationFailed,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct PwboxError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Specific condition, always provided.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl PwboxError {
    /// Creates a new error with a category, kind and display message.
    pub fn new(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving
    /// the original as source. Category and kind carry over unchanged.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PwboxError>;
