pub mod annotation;
pub mod browse;
pub mod context;
pub mod domain;
pub mod ports;
pub mod selection;
pub mod store;
pub mod surface;
pub mod sync;

pub use annotation::AnnotationDispatcher;
pub use domain::{
    Code, CodeAssignment, Comment, Document, DocumentId, DocumentKind, ProjectId, ProjectSnapshot,
    ProjectSummary, Segment, SelectionCandidate, StagedFile,
};
pub use ports::{Confirmation, PortError, PortResult, ProjectBackend, TokenStore};
pub use store::{Action, AnnotationPhase, Store, StoreError};
pub use surface::{SelectionSurface, TextSurface};
pub use sync::{SyncError, Synchronizer};
