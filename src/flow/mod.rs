// src/flow/mod.rs
pub mod collector;
pub mod controller;
pub mod progress;
pub mod selector;

pub use collector::{FileCollector, PromptDraft};
pub use controller::{
    DoneState, FlowController, FlowEvent, FlowState, GenerationOrigin, ProcessingState,
    PromptState, Step, StyleSelectState, UploadState,
};
pub use progress::ProgressPhase;
pub use selector::Selection;
