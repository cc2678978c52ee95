// src/lib.rs
//! Client for the SmartDeck presentation backend.
//!
//! [`flow::FlowController`] sequences one session: collect files or a prompt,
//! analyze, choose a style and theme, generate, download. All network I/O
//! goes through a [`services::PresentationBackend`].

pub mod catalog;
pub mod config;
pub mod errors;
pub mod flow;
pub mod models;
pub mod services;

pub use config::Config;
pub use errors::{FlowError, GatewayError, SmartDeckError, UserNotice, ValidationError};
pub use flow::{FlowController, FlowEvent, FlowState, Step};
pub use models::{AnalysisSession, GeneratedArtifact, InputMode, StyleSuggestion, UploadedFile};
pub use services::{HttpBackend, PresentationBackend};
