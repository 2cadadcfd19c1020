//! # Error Types
//!
//! This module defines error types used throughout the adforge library.
//!
//! Every error is scoped to the single action that raised it (one export, one
//! batch run, one template save). Nothing here is fatal to the process.

use thiserror::Error;

use crate::model::ExportFormat;

/// Main error type for adforge operations
#[derive(Debug, Error)]
pub enum AdForgeError {
    /// Image decoding or pixel processing error
    #[error("Image error: {0}")]
    Image(String),

    /// Encoding a bitmap to an output format failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Export format is declared but has no encode path
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(ExportFormat),

    /// Export size is zero, too large, or overflows at export density
    #[error("Invalid target size: {0}")]
    InvalidSize(String),

    /// Another export is already running against the shared surface
    #[error("An export is already in progress")]
    ExportInProgress,

    /// A rendered frame was captured after the editing state changed
    #[error("Stale frame: rendered generation {rendered}, current generation {current}")]
    StaleFrame { rendered: u64, current: u64 },

    /// Batch CSV validation error on a specific line (1-based, header is line 1)
    #[error("CSV line {line}: {message}")]
    Csv { line: usize, message: String },

    /// A batch row failed; the whole batch was aborted
    #[error("Batch row {row} ({name}) failed: {source}")]
    Batch {
        row: usize,
        name: String,
        #[source]
        source: Box<AdForgeError>,
    },

    /// Remote image fetch failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Template storage is unavailable or unreadable
    #[error("Storage error: {0}")]
    Storage(String),

    /// Template storage would exceed its configured quota
    #[error("Storage quota exceeded: {needed} bytes needed, limit is {limit} bytes")]
    StorageQuota { needed: usize, limit: usize },

    /// Lookup of a named resource (preset, template) failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, AdForgeError>;

impl AdForgeError {
    /// True for errors caused by caller input rather than the environment.
    pub fn is_validation(&self) -> bool {
        match self {
            AdForgeError::UnsupportedFormat(_)
            | AdForgeError::InvalidSize(_)
            | AdForgeError::Csv { .. } => true,
            AdForgeError::Batch { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}
