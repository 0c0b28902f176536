//! Custom error types for the kanban core.
//!
//! Soft not-found conditions on entity methods are reported as `bool` or
//! `Option` and never reach this type. Everything here is something the
//! caller has to react to.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for kanban operations
#[derive(Error, Debug)]
pub enum KanbanError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// A value outside its allowed set, or a configured limit was exceeded
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Deleting the only remaining board
    #[error("Cannot delete the last board")]
    LastBoard,

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Record addressed by a coordinator operation does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// The underlying key-value store failed
    #[error("Storage error on '{key}': {message}")]
    Storage { key: String, message: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl KanbanError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a storage error
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error should be surfaced as blocking feedback
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::LastBoard)
    }

    /// Check if this error names a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the storage medium
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Io(_))
    }
}

/// Type alias for kanban results
pub type Result<T> = std::result::Result<T, KanbanError>;

/// Extension trait for converting foreign errors to KanbanError
pub trait IntoKanbanError<T> {
    fn into_kanban_storage(self, key: &str) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> IntoKanbanError<T> for std::result::Result<T, E> {
    fn into_kanban_storage(self, key: &str) -> Result<T> {
        self.map_err(|e| KanbanError::storage(key, e.into().to_string()))
    }
}
