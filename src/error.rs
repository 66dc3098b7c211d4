//! Error types.
//!
//! `AppError` is the application-level failure carried up to `main` (and shown
//! in the TUI status line). `RowRejection` is the per-row outcome of
//! normalization; the batch step absorbs it, so it never reaches the user.

use thiserror::Error;

/// Invalid configuration or CLI usage.
pub const EXIT_CONFIG: u8 = 2;
/// Transport, terminal or I/O failure at runtime.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a raw row could not become a canonical point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("row has no `date`, `created_at` or `timestamp` value")]
    MissingDate,
    #[error("row has no numeric speed, energy or mass field")]
    NoNumericField,
}
