//! crates/thematic_core/src/sync.rs
//!
//! Keeps the store's documents, segments, codes, comments and assignments in
//! step with the backend's project snapshot.
//!
//! Every mutating operation ends in a full `load_project` instead of patching
//! collections locally. Each load takes a generation number and only the most
//! recently issued one may apply its snapshot; a shutdown cancels whatever is
//! still in flight so nothing lands after teardown.

use crate::domain::{Document, DocumentId, ProjectId, StagedFile};
use crate::ports::{Confirmation, PortError, PortResult, ProjectBackend};
use crate::store::{Action, ActiveDocument, NotificationLevel, Store};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this document? This action cannot be undone.";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No project selected. Please select a project first.")]
    MissingProject,
    #[error("No files selected for upload")]
    NoFilesStaged,
    #[error("Authentication failed. Please log in again.")]
    Unauthorized,
    #[error("The synchronizer has shut down")]
    ShutDown,
    #[error(transparent)]
    Port(PortError),
}

/// What happened to a snapshot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was issued while this one was in flight.
    Superseded,
    /// The synchronizer was shut down first.
    Cancelled,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The document carried its segments.
    Adopted,
    /// Segments were missing; a full refetch ran.
    Refetched(LoadOutcome),
    /// The synchronizer was shut down; nothing was selected.
    Cancelled,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub uploaded: Vec<Document>,
    pub refresh: Result<LoadOutcome, SyncError>,
}

impl UploadOutcome {
    fn cancelled(uploaded: Vec<Document>) -> Self {
        Self {
            uploaded,
            refresh: Ok(LoadOutcome::Cancelled),
        }
    }
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Declined,
    Deleted { refresh: Result<LoadOutcome, SyncError> },
    /// Shut down before the deletion was confirmed by the backend.
    Cancelled,
}

pub struct Synchronizer {
    backend: Arc<dyn ProjectBackend>,
    store: Arc<Mutex<Store>>,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

impl Synchronizer {
    pub fn new(backend: Arc<dyn ProjectBackend>, store: Arc<Mutex<Store>>) -> Self {
        Self {
            backend,
            store,
            generation: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> Arc<Mutex<Store>> {
        self.store.clone()
    }

    /// Drops the results of every in-flight and future operation.
    pub fn shutdown(&self) {
        info!("Synchronizer shutting down.");
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Points the store at `project_id`, dropping everything loaded for
    /// another project.
    pub async fn open_project(&self, project_id: ProjectId) {
        let mut store = self.store.lock().await;
        if self.shutdown.is_cancelled() {
            return;
        }
        info!("Opening project {}.", project_id);
        apply(&mut store, Action::OpenProject(project_id));
    }

    /// Fetches the full project snapshot and replaces the local collections.
    pub async fn load_project(&self, project_id: ProjectId) -> Result<LoadOutcome, SyncError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Loading project {} (generation {}).", project_id, generation);

        let Some(result) = self.guarded(self.backend.get_project(project_id)).await else {
            return Ok(LoadOutcome::Cancelled);
        };

        let mut store = self.store.lock().await;
        if self.shutdown.is_cancelled() {
            return Ok(LoadOutcome::Cancelled);
        }
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding project snapshot from stale generation {}.", generation);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(snapshot) => {
                apply(&mut store, Action::LoadProjectSuccess(snapshot));
                info!("Project {} refreshed.", project_id);
                Ok(LoadOutcome::Applied)
            }
            Err(e) => Err(fail(&mut store, e)),
        }
    }

    /// Makes `document` active. A document without a `segments` field is
    /// treated as inconsistent and triggers a full project refetch.
    pub async fn select_document(&self, document: &Document) -> Result<SelectOutcome, SyncError> {
        let project_id = {
            let mut store = self.store.lock().await;
            if self.shutdown.is_cancelled() {
                return Ok(SelectOutcome::Cancelled);
            }
            apply(
                &mut store,
                Action::DocumentSelected {
                    document: ActiveDocument::from(document),
                    segments: document.segments.clone(),
                },
            );
            if document.segments.is_some() {
                return Ok(SelectOutcome::Adopted);
            }
            match store.project_id() {
                Some(id) => id,
                None => return Err(reject(&mut store, SyncError::MissingProject)),
            }
        };

        warn!(
            "Document {} arrived without segments; refetching project {}.",
            document.id, project_id
        );
        let outcome = self.load_project(project_id).await?;
        Ok(SelectOutcome::Refetched(outcome))
    }

    pub async fn stage_files(&self, files: Vec<StagedFile>) {
        let mut store = self.store.lock().await;
        if self.shutdown.is_cancelled() {
            debug!("Ignoring {} staged files after shutdown.", files.len());
            return;
        }
        apply(&mut store, Action::FilesStaged(files));
    }

    /// Uploads every staged file: one file goes through the single-document
    /// endpoint, several through bulk upload. Staged files are kept on failure;
    /// files staged while the upload is in flight stay staged.
    pub async fn upload_files(&self) -> Result<UploadOutcome, SyncError> {
        let (project_id, files) = {
            let mut store = self.store.lock().await;
            if self.shutdown.is_cancelled() {
                return Ok(UploadOutcome::cancelled(Vec::new()));
            }
            let Some(project_id) = store.project_id() else {
                return Err(reject(&mut store, SyncError::MissingProject));
            };
            if store.staged_files().is_empty() {
                return Err(reject(&mut store, SyncError::NoFilesStaged));
            }
            (project_id, store.staged_files().to_vec())
        };

        let result = if files.len() == 1 {
            info!("Uploading single file {} to project {}.", files[0].file_name, project_id);
            self.guarded(self.backend.upload_document(project_id, &files[0]))
                .await
                .map(|r| r.map(|document| vec![document]))
        } else {
            info!("Bulk uploading {} files to project {}.", files.len(), project_id);
            self.guarded(self.backend.bulk_upload_documents(project_id, &files))
                .await
        };

        let uploaded = {
            let mut store = self.store.lock().await;
            match result {
                None => return Ok(UploadOutcome::cancelled(Vec::new())),
                Some(Ok(uploaded)) if self.shutdown.is_cancelled() => {
                    return Ok(UploadOutcome::cancelled(uploaded))
                }
                Some(Err(_)) if self.shutdown.is_cancelled() => return Err(SyncError::ShutDown),
                Some(Err(e)) => return Err(fail(&mut store, e)),
                Some(Ok(uploaded)) => {
                    for file in &files {
                        apply(&mut store, Action::StagedFileRemoved(file.file_name.clone()));
                    }
                    apply(
                        &mut store,
                        Action::Notified {
                            level: NotificationLevel::Success,
                            message: "Files uploaded successfully!".to_string(),
                        },
                    );
                    uploaded
                }
            }
        };

        let refresh = self.load_project(project_id).await;
        Ok(UploadOutcome { uploaded, refresh })
    }

    /// Deletes a document after the user confirms, then resynchronizes.
    pub async fn delete_document(
        &self,
        document_id: DocumentId,
        confirmation: &dyn Confirmation,
    ) -> Result<DeleteOutcome, SyncError> {
        let project_id = {
            let mut store = self.store.lock().await;
            if self.shutdown.is_cancelled() {
                return Ok(DeleteOutcome::Cancelled);
            }
            match store.project_id() {
                Some(id) => id,
                None => return Err(reject(&mut store, SyncError::MissingProject)),
            }
        };

        if !confirmation.confirm(DELETE_PROMPT).await {
            info!("Deletion of document {} declined.", document_id);
            return Ok(DeleteOutcome::Declined);
        }

        info!("Deleting document {} from project {}.", document_id, project_id);
        let Some(result) = self.guarded(self.backend.delete_document(document_id)).await else {
            return Ok(DeleteOutcome::Cancelled);
        };

        {
            let mut store = self.store.lock().await;
            if self.shutdown.is_cancelled() {
                return match result {
                    Ok(()) => Ok(DeleteOutcome::Deleted {
                        refresh: Ok(LoadOutcome::Cancelled),
                    }),
                    Err(_) => Err(SyncError::ShutDown),
                };
            }
            if let Err(e) = result {
                return Err(fail(&mut store, e));
            }
            apply(&mut store, Action::DocumentDeleted(document_id));
        }

        let refresh = self.load_project(project_id).await;
        Ok(DeleteOutcome::Deleted { refresh })
    }

    /// Replaces only the document list, via the per-project listing endpoint.
    pub async fn refresh_document_list(&self) -> Result<LoadOutcome, SyncError> {
        let project_id = {
            let mut store = self.store.lock().await;
            if self.shutdown.is_cancelled() {
                return Ok(LoadOutcome::Cancelled);
            }
            match store.project_id() {
                Some(id) => id,
                None => return Err(reject(&mut store, SyncError::MissingProject)),
            }
        };
        let issued = self.generation.load(Ordering::SeqCst);

        let Some(result) = self
            .guarded(self.backend.list_project_documents(project_id))
            .await
        else {
            return Ok(LoadOutcome::Cancelled);
        };

        let mut store = self.store.lock().await;
        if self.shutdown.is_cancelled() {
            return Ok(LoadOutcome::Cancelled);
        }
        if self.generation.load(Ordering::SeqCst) != issued {
            debug!("A project load started meanwhile; dropping the document list.");
            return Ok(LoadOutcome::Superseded);
        }
        match result {
            Ok(documents) => {
                info!("Fetched {} documents for project {}.", documents.len(), project_id);
                apply(&mut store, Action::DocumentsReplaced(documents));
                Ok(LoadOutcome::Applied)
            }
            Err(e) => Err(fail(&mut store, e)),
        }
    }

    /// Fetches one document with its segments without touching the store.
    pub async fn document_detail(&self, document_id: DocumentId) -> Result<Document, SyncError> {
        let Some(result) = self.guarded(self.backend.get_document(document_id)).await else {
            return Err(SyncError::ShutDown);
        };
        match result {
            Ok(document) => Ok(document),
            Err(e) => {
                let mut store = self.store.lock().await;
                if self.shutdown.is_cancelled() {
                    return Err(SyncError::ShutDown);
                }
                Err(fail(&mut store, e))
            }
        }
    }

    /// Runs `request` unless the synchronizer is, or becomes, shut down.
    /// `None` means the result must not be applied.
    async fn guarded<T, F>(&self, request: F) -> Option<PortResult<T>>
    where
        F: Future<Output = PortResult<T>>,
    {
        if self.shutdown.is_cancelled() {
            debug!("Request skipped after shutdown.");
            return None;
        }
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!("Request abandoned on shutdown.");
                None
            }
            result = request => Some(result),
        }
    }
}

fn apply(store: &mut Store, action: Action) {
    if let Err(e) = store.dispatch(action) {
        warn!("Synchronizer action rejected: {}", e);
    }
}

/// Records a backend failure in the store and classifies it.
fn fail(store: &mut Store, error: PortError) -> SyncError {
    match error {
        PortError::Unauthorized => {
            warn!("Backend rejected our credentials; switching to login.");
            apply(store, Action::AuthRequired);
            SyncError::Unauthorized
        }
        other => {
            error!("Backend request failed: {}", other);
            apply(
                store,
                Action::Notified {
                    level: NotificationLevel::Error,
                    message: other.to_string(),
                },
            );
            SyncError::Port(other)
        }
    }
}

/// Records a precondition failure; no request was made.
fn reject(store: &mut Store, error: SyncError) -> SyncError {
    warn!("{}", error);
    apply(
        store,
        Action::Notified {
            level: NotificationLevel::Warning,
            message: error.to_string(),
        },
    );
    error
}
