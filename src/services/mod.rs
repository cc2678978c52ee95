// src/services/mod.rs
pub mod artifact_store;
pub mod backend;
pub mod content_disposition;

pub use artifact_store::{ArtifactStore, ArtifactUrl};
pub use backend::{
    GenerateRequest, GenerationSource, HttpBackend, PresentationBackend, PromptRequest,
    ProgressFn, TransferProgress,
};
pub use content_disposition::filename_from_content_disposition;
