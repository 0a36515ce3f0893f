//! crates/thematic_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the workbench's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the REST backend, the token storage and the user's
//! terminal or browser.

use async_trait::async_trait;
use crate::domain::{Document, DocumentId, ProjectId, ProjectSnapshot, StagedFile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, filesystem).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Backend rejected the request ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ProjectBackend: Send + Sync {
    /// Fetches the full project snapshot (documents, segments, codes, assignments, annotations).
    async fn get_project(&self, project_id: ProjectId) -> PortResult<ProjectSnapshot>;

    async fn upload_document(
        &self,
        project_id: ProjectId,
        file: &StagedFile,
    ) -> PortResult<Document>;

    async fn bulk_upload_documents(
        &self,
        project_id: ProjectId,
        files: &[StagedFile],
    ) -> PortResult<Vec<Document>>;

    // --- Fallback paths ---
    async fn list_project_documents(&self, project_id: ProjectId) -> PortResult<Vec<Document>>;

    async fn get_document(&self, document_id: DocumentId) -> PortResult<Document>;

    async fn delete_document(&self, document_id: DocumentId) -> PortResult<()>;
}

/// Persisted client-side storage for the bearer token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> PortResult<()>;
    fn clear(&self) -> PortResult<()>;
}

/// Asks the user to approve a destructive action.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}
