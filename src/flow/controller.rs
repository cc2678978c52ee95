// src/flow/controller.rs
use log::{debug, info, warn};
use std::fmt;
use std::mem;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::catalog::{DesignTheme, StyleCatalog};
use crate::errors::{FlowError, GatewayOperation, UserNotice, ValidationError};
use crate::flow::collector::{FileCollector, MAX_PROMPT_CHARS, PromptDraft};
use crate::flow::progress::{self, ProgressPhase};
use crate::flow::selector::Selection;
use crate::models::*;
use crate::services::{
    ArtifactStore, ArtifactUrl, GenerateRequest, PresentationBackend, PromptRequest,
    TransferProgress,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ModeSelect,
    Upload,
    PromptInput,
    Analyzing,
    StyleSelect,
    Processing,
    Done,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ModeSelect => "mode_select",
            Step::Upload => "upload",
            Step::PromptInput => "prompt_input",
            Step::Analyzing => "analyzing",
            Step::StyleSelect => "style_select",
            Step::Processing => "processing",
            Step::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct UploadState {
    pub files: FileCollector,
    pub consent: bool,
}

impl UploadState {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::NoFiles);
        }
        if !self.consent {
            return Err(ValidationError::ConsentRequired);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PromptState {
    pub prompt: PromptDraft,
    pub consent: bool,
    pub selection: Selection,
}

impl PromptState {
    fn validate(&self) -> Result<(), ValidationError> {
        self.prompt.validate()?;
        if !self.consent {
            return Err(ValidationError::ConsentRequired);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct StyleSelectState {
    pub files: FileCollector,
    pub session: AnalysisSession,
    pub selection: Selection,
}

/// The selection step a generation started from, restored if it fails.
#[derive(Debug)]
pub enum GenerationOrigin {
    Files(StyleSelectState),
    Prompt(PromptState),
}

impl GenerationOrigin {
    pub fn mode(&self) -> InputMode {
        match self {
            GenerationOrigin::Files(_) => InputMode::File,
            GenerationOrigin::Prompt(_) => InputMode::Prompt,
        }
    }

    pub fn selection(&self) -> &Selection {
        match self {
            GenerationOrigin::Files(state) => &state.selection,
            GenerationOrigin::Prompt(state) => &state.selection,
        }
    }

    fn into_state(self) -> FlowState {
        match self {
            GenerationOrigin::Files(state) => FlowState::StyleSelect(state),
            GenerationOrigin::Prompt(state) => FlowState::PromptInput(state),
        }
    }
}

#[derive(Debug)]
pub struct ProcessingState {
    pub origin: GenerationOrigin,
}

#[derive(Debug)]
pub struct DoneState {
    pub mode: InputMode,
    pub artifact: ArtifactUrl,
    pub filename: String,
    pub style_name: String,
    pub theme: &'static DesignTheme,
}

/// Where the session is, carrying only what is meaningful there.
#[derive(Debug)]
pub enum FlowState {
    ModeSelect,
    Upload(UploadState),
    PromptInput(PromptState),
    /// Files are kept so a failed or abandoned analysis can return to upload.
    Analyzing(FileCollector),
    StyleSelect(StyleSelectState),
    Processing(ProcessingState),
    Done(DoneState),
}

impl FlowState {
    pub fn step(&self) -> Step {
        match self {
            FlowState::ModeSelect => Step::ModeSelect,
            FlowState::Upload(_) => Step::Upload,
            FlowState::PromptInput(_) => Step::PromptInput,
            FlowState::Analyzing(_) => Step::Analyzing,
            FlowState::StyleSelect(_) => Step::StyleSelect,
            FlowState::Processing(_) => Step::Processing,
            FlowState::Done(_) => Step::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    StepChanged(Step),
    Progress { percent: u8, phase: ProgressPhase },
    Notice(UserNotice),
}

enum BackendCall {
    Files(GenerateRequest),
    Prompt(PromptRequest),
}

/// Drives one session through
/// `mode_select -> upload | prompt_input -> [analyzing] -> style_select -> processing -> done`.
///
/// Backend calls take `&mut self`, so at most one is ever in flight. Dropping
/// a pending `analyze`/`generate` future abandons the call and leaves the
/// controller in its waiting step; `abandon_pending` or `reset` recovers.
pub struct FlowController {
    backend: Arc<dyn PresentationBackend>,
    state: FlowState,
    artifacts: ArtifactStore,
    events: Option<UnboundedSender<FlowEvent>>,
}

impl FlowController {
    pub fn new(backend: Arc<dyn PresentationBackend>) -> Self {
        Self {
            backend,
            state: FlowState::ModeSelect,
            artifacts: ArtifactStore::new(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<FlowEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step()
    }

    pub fn mode(&self) -> Option<InputMode> {
        match &self.state {
            FlowState::ModeSelect => None,
            FlowState::Upload(_) | FlowState::Analyzing(_) | FlowState::StyleSelect(_) => {
                Some(InputMode::File)
            }
            FlowState::PromptInput(_) => Some(InputMode::Prompt),
            FlowState::Processing(state) => Some(state.origin.mode()),
            FlowState::Done(state) => Some(state.mode),
        }
    }

    pub fn files(&self) -> Option<&FileCollector> {
        match &self.state {
            FlowState::Upload(state) => Some(&state.files),
            FlowState::Analyzing(files) => Some(files),
            FlowState::StyleSelect(state) => Some(&state.files),
            FlowState::Processing(ProcessingState {
                origin: GenerationOrigin::Files(state),
            }) => Some(&state.files),
            _ => None,
        }
    }

    pub fn prompt(&self) -> Option<&PromptDraft> {
        match &self.state {
            FlowState::PromptInput(state) => Some(&state.prompt),
            FlowState::Processing(ProcessingState {
                origin: GenerationOrigin::Prompt(state),
            }) => Some(&state.prompt),
            _ => None,
        }
    }

    pub fn consent(&self) -> bool {
        match &self.state {
            FlowState::Upload(state) => state.consent,
            FlowState::PromptInput(state) => state.consent,
            _ => false,
        }
    }

    pub fn session(&self) -> Option<&AnalysisSession> {
        match &self.state {
            FlowState::StyleSelect(state) => Some(&state.session),
            FlowState::Processing(ProcessingState {
                origin: GenerationOrigin::Files(state),
            }) => Some(&state.session),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.state {
            FlowState::PromptInput(state) => Some(&state.selection),
            FlowState::StyleSelect(state) => Some(&state.selection),
            FlowState::Processing(state) => Some(state.origin.selection()),
            _ => None,
        }
    }

    /// Whether style and theme may be chosen right now.
    pub fn pickers_available(&self) -> bool {
        match &self.state {
            FlowState::StyleSelect(_) => true,
            FlowState::PromptInput(state) => state.prompt.is_ready(),
            _ => false,
        }
    }

    pub fn artifact(&self) -> Option<(&ArtifactUrl, &GeneratedArtifact)> {
        match &self.state {
            FlowState::Done(state) => self
                .artifacts
                .get(&state.artifact)
                .map(|artifact| (&state.artifact, artifact)),
            _ => None,
        }
    }

    /// Number of artifact references not yet released.
    pub fn live_artifacts(&self) -> usize {
        self.artifacts.len()
    }

    pub fn choose_mode(&mut self, mode: InputMode) -> Result<(), FlowError> {
        if !matches!(self.state, FlowState::ModeSelect) {
            return Err(self.invalid("choose a mode"));
        }
        info!("Starting {} session", mode);
        match mode {
            InputMode::File => self.transition(FlowState::Upload(UploadState::default())),
            InputMode::Prompt => self.transition(FlowState::PromptInput(PromptState::default())),
        }
        Ok(())
    }

    pub fn add_files(
        &mut self,
        files: impl IntoIterator<Item = UploadedFile>,
    ) -> Result<(), FlowError> {
        let step = self.step();
        match &mut self.state {
            FlowState::Upload(state) => {
                state.files.add(files);
                debug!("{} file(s) selected", state.files.len());
                Ok(())
            }
            _ => Err(invalid("add files", step)),
        }
    }

    pub fn remove_file(&mut self, index: usize) -> Result<UploadedFile, FlowError> {
        let step = self.step();
        match &mut self.state {
            FlowState::Upload(state) => Ok(state.files.remove(index)?),
            _ => Err(invalid("remove a file", step)),
        }
    }

    pub fn set_consent(&mut self, consent: bool) -> Result<(), FlowError> {
        let step = self.step();
        match &mut self.state {
            FlowState::Upload(state) => state.consent = consent,
            FlowState::PromptInput(state) => state.consent = consent,
            _ => return Err(invalid("set consent", step)),
        }
        Ok(())
    }

    pub fn set_prompt(&mut self, text: &str) -> Result<(), FlowError> {
        let step = self.step();
        match &mut self.state {
            FlowState::PromptInput(state) => {
                state.prompt.set(text);
                warn_near_limit(&state.prompt);
                Ok(())
            }
            _ => Err(invalid("edit the prompt", step)),
        }
    }

    pub fn append_prompt_suggestion(&mut self, suggestion: &str) -> Result<(), FlowError> {
        let step = self.step();
        match &mut self.state {
            FlowState::PromptInput(state) => {
                state.prompt.append_suggestion(suggestion);
                warn_near_limit(&state.prompt);
                Ok(())
            }
            _ => Err(invalid("edit the prompt", step)),
        }
    }

    pub fn select_style(&mut self, id: &str) -> Result<(), FlowError> {
        self.picker("select a style")?.select_style(id)
    }

    pub fn select_theme(&mut self, id: &str) -> Result<(), FlowError> {
        self.picker("select a theme")?.select_theme(id)
    }

    fn picker(&mut self, operation: &'static str) -> Result<&mut Selection, FlowError> {
        let step = self.step();
        match &mut self.state {
            FlowState::StyleSelect(state) => Ok(&mut state.selection),
            FlowState::PromptInput(state) => {
                state.prompt.validate()?;
                Ok(&mut state.selection)
            }
            _ => Err(invalid(operation, step)),
        }
    }

    /// Sends the collected files to the backend for analysis.
    ///
    /// Validation failures leave the flow untouched. Backend failures return
    /// to `upload` with the files and consent kept.
    pub async fn analyze(&mut self) -> Result<(), FlowError> {
        match &self.state {
            FlowState::Upload(state) => state.validate()?,
            _ => return Err(self.invalid("analyze")),
        }

        let files = match self.take_state() {
            FlowState::Upload(state) => state.files,
            other => return Err(self.restore(other, "analyze")),
        };
        let request = files.files().to_vec();
        info!(
            "Analyzing {} file(s), {} bytes",
            files.len(),
            files.total_size()
        );
        self.transition(FlowState::Analyzing(files));

        let backend = Arc::clone(&self.backend);
        let result = backend.analyze(&request).await;

        let files = match self.take_state() {
            FlowState::Analyzing(files) => files,
            other => return Err(self.restore(other, "analyze")),
        };

        match result {
            Ok(session) => {
                let catalog = StyleCatalog::from_suggestions(session.suggested_styles.clone());
                let selection = Selection::new(catalog);
                info!(
                    "Analysis complete; {} selected by default",
                    selection.style_id()
                );
                self.transition(FlowState::StyleSelect(StyleSelectState {
                    files,
                    session,
                    selection,
                }));
                Ok(())
            }
            Err(err) => {
                warn!("Analysis failed: {}", err);
                self.transition(FlowState::Upload(UploadState {
                    files,
                    consent: true,
                }));
                Err(self.fail(err.into_notice(GatewayOperation::Analyze)))
            }
        }
    }

    /// Requests the presentation for the current selection.
    ///
    /// In prompt mode the prompt must be long enough and consent given;
    /// otherwise nothing happens. A backend failure returns to the step the
    /// generation started from with all inputs intact.
    pub async fn generate(&mut self) -> Result<(), FlowError> {
        match &self.state {
            FlowState::StyleSelect(_) => {}
            FlowState::PromptInput(state) => state.validate()?,
            _ => return Err(self.invalid("generate")),
        }

        let origin = match self.take_state() {
            FlowState::StyleSelect(state) => GenerationOrigin::Files(state),
            FlowState::PromptInput(state) => GenerationOrigin::Prompt(state),
            other => return Err(self.restore(other, "generate")),
        };

        let mode = origin.mode();
        let call = match &origin {
            GenerationOrigin::Files(state) => BackendCall::Files(GenerateRequest::new(
                Some(&state.session),
                state.files.files(),
                state.selection.style_id(),
                state.selection.theme_id(),
            )),
            GenerationOrigin::Prompt(state) => BackendCall::Prompt(PromptRequest {
                prompt: state.prompt.text().to_string(),
                style: state.selection.style_id().to_string(),
                theme: state.selection.theme_id().to_string(),
            }),
        };
        info!(
            "Generating from {} (style: {}, theme: {})",
            mode,
            origin.selection().style_id(),
            origin.selection().theme_id()
        );
        self.transition(FlowState::Processing(ProcessingState { origin }));

        let progress = Self::progress_reporter(self.events.clone(), mode);
        let backend = Arc::clone(&self.backend);
        let (result, operation) = match call {
            BackendCall::Files(request) => (
                backend.generate(request, &progress).await,
                GatewayOperation::GenerateFromFiles,
            ),
            BackendCall::Prompt(request) => (
                backend.generate_from_prompt(request, &progress).await,
                GatewayOperation::GenerateFromPrompt,
            ),
        };

        let origin = match self.take_state() {
            FlowState::Processing(state) => state.origin,
            other => return Err(self.restore(other, "generate")),
        };

        match result {
            Ok(artifact) => {
                let filename = artifact.filename.clone();
                info!("Received {} ({} bytes)", filename, artifact.size());
                let url = self.install_artifact(artifact);
                let selection = origin.selection();
                let done = DoneState {
                    mode,
                    artifact: url,
                    filename,
                    style_name: selection.style().name.clone(),
                    theme: selection.theme(),
                };
                self.transition(FlowState::Done(done));
                Ok(())
            }
            Err(err) => {
                warn!("Generation failed: {}", err);
                self.transition(origin.into_state());
                Err(self.fail(err.into_notice(operation)))
            }
        }
    }

    /// Returns from a waiting step whose backend call was dropped. Returns
    /// false when nothing was pending.
    pub fn abandon_pending(&mut self) -> bool {
        match self.take_state() {
            FlowState::Analyzing(files) => {
                info!("Abandoned pending analysis");
                self.transition(FlowState::Upload(UploadState {
                    files,
                    consent: true,
                }));
                true
            }
            FlowState::Processing(state) => {
                info!("Abandoned pending generation");
                self.transition(state.origin.into_state());
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Back to mode selection with every session input discarded and every
    /// artifact reference released.
    pub fn reset(&mut self) {
        debug!("Reset from {}", self.step());
        self.artifacts.revoke_all();
        self.transition(FlowState::ModeSelect);
    }

    fn install_artifact(&mut self, artifact: GeneratedArtifact) -> ArtifactUrl {
        self.artifacts.revoke_all();
        self.artifacts.register(artifact)
    }

    fn progress_reporter(
        events: Option<UnboundedSender<FlowEvent>>,
        mode: InputMode,
    ) -> impl Fn(TransferProgress) + Send + Sync + 'static {
        move |transfer: TransferProgress| {
            let percent = progress::percent(transfer.loaded, transfer.total);
            let phase = ProgressPhase::for_percent(percent, mode);
            debug!("Download {}% ({})", percent, phase);
            if let Some(events) = &events {
                let _ = events.send(FlowEvent::Progress { percent, phase });
            }
        }
    }

    fn take_state(&mut self) -> FlowState {
        mem::replace(&mut self.state, FlowState::ModeSelect)
    }

    fn restore(&mut self, state: FlowState, operation: &'static str) -> FlowError {
        self.state = state;
        self.invalid(operation)
    }

    fn transition(&mut self, state: FlowState) {
        self.state = state;
        let step = self.state.step();
        debug!("Step -> {}", step);
        self.emit(FlowEvent::StepChanged(step));
    }

    fn fail(&self, notice: UserNotice) -> FlowError {
        self.emit(FlowEvent::Notice(notice.clone()));
        FlowError::Failed(notice)
    }

    fn emit(&self, event: FlowEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn invalid(&self, operation: &'static str) -> FlowError {
        invalid(operation, self.step())
    }
}

fn invalid(operation: &'static str, step: Step) -> FlowError {
    FlowError::InvalidTransition { operation, step }
}

fn warn_near_limit(prompt: &PromptDraft) {
    if prompt.near_limit() {
        warn!(
            "Prompt is {} of {} characters",
            prompt.char_count(),
            MAX_PROMPT_CHARS
        );
    }
}
