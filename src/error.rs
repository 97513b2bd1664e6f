use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error is not, for example,
    /// due to a user error - merely that it cannot be confidently
    /// determined by the code.
    Internal,

    /// The user provided invalid input or performed an action that is
    /// unsupported or impossible to complete.
    User,
}

/// The stage of an encrypt/decrypt operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Opening, reading or writing a file (or stdin/stdout) failed.
    Io,
    /// The operating system random source could not produce a salt.
    RandomSource,
    /// Key/IV derivation from the password could not be performed.
    KeyDerivation,
    /// The block cipher rejected the derived key or IV.
    CipherInit,
    /// Input ended before the salt could be read.
    TruncatedInput,
    /// The final block did not carry valid padding: wrong password,
    /// corrupted ciphertext, or a truncated file.
    PaddingValidation,
    /// Password could not be obtained from the configured reader.
    PassphraseUnavailable,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct CryptError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Failing stage, for callers that branch on the kind of failure.
    pub kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl CryptError {
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

    /// Wraps the current error with a higher-level message while preserving the original as source.
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
pub type Result<T> = std::result::Result<T, CryptError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_keeps_kind_and_chain() {
        let inner = CryptError::with_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "failed to open in.txt",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        let outer = inner.with_context("encryption failed");

        assert_eq!(outer.kind, ErrorKind::Io);
        assert_eq!(outer.category, ErrorCategory::User);
        assert_eq!(outer.to_string(), "encryption failed");

        let source = outer.source_error().expect("context should keep the inner error");
        assert_eq!(source.to_string(), "failed to open in.txt");
        let root = source.source().expect("inner error should keep the io error");
        assert_eq!(root.to_string(), "no such file");
    }

    #[test]
    fn test_plain_error_has_no_source() {
        let err = CryptError::new(
            ErrorCategory::User,
            ErrorKind::PaddingValidation,
            "decryption failed",
        );
        assert_eq!(err.message(), "decryption failed");
        assert!(err.source_error().is_none());
    }
}
