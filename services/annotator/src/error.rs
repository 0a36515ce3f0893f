//! services/annotator/src/error.rs
//!
//! Defines the primary error type for the annotator service.

use crate::config::ConfigError;
use thematic_core::ports::PortError;
use thematic_core::store::StoreError;
use thematic_core::sync::SyncError;

/// The primary error type for the `annotator` service.
#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error that propagated up from one of the core ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// The store refused an annotation action.
    #[error("Annotation rejected: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
