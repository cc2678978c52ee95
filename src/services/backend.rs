// src/services/backend.rs
use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};

use crate::config::Config;
use crate::errors::{GatewayError, SmartDeckError};
use crate::models::*;
use crate::services::content_disposition::filename_from_content_disposition;

/// Bytes received so far on an artifact download. `total` is the
/// `Content-Length`, when the backend sends one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

pub type ProgressFn<'a> = &'a (dyn Fn(TransferProgress) + Send + Sync);

/// What `/generate` should build from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationSource {
    /// A prior analysis the backend has kept; files are not re-sent.
    Session { id: String, token: Option<String> },
    Files(Vec<UploadedFile>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub source: GenerationSource,
    pub style: String,
    pub theme: String,
}

impl GenerateRequest {
    /// Prefers the session handle and falls back to re-sending `files`.
    pub fn new(
        session: Option<&AnalysisSession>,
        files: &[UploadedFile],
        style: impl Into<String>,
        theme: impl Into<String>,
    ) -> Self {
        let source = match session.and_then(AnalysisSession::handle) {
            Some((id, token)) => GenerationSource::Session {
                id: id.to_string(),
                token: token.map(str::to_string),
            },
            None => GenerationSource::Files(files.to_vec()),
        };
        Self {
            source,
            style: style.into(),
            theme: theme.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub prompt: String,
    pub style: String,
    pub theme: String,
}

#[async_trait]
pub trait PresentationBackend: Send + Sync {
    async fn analyze(&self, files: &[UploadedFile]) -> Result<AnalysisSession, GatewayError>;

    async fn generate(
        &self,
        request: GenerateRequest,
        progress: ProgressFn<'_>,
    ) -> Result<GeneratedArtifact, GatewayError>;

    async fn generate_from_prompt(
        &self,
        request: PromptRequest,
        progress: ProgressFn<'_>,
    ) -> Result<GeneratedArtifact, GatewayError>;

    async fn status(&self) -> Result<ServiceStatus, GatewayError>;
}

pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &Url) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SmartDeckError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SmartDeckError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn file_part(file: &UploadedFile) -> Part {
        Part::bytes(file.content.to_vec()).file_name(file.name.clone())
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Response, GatewayError> {
        let url = self.endpoint(path);
        info!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!("POST {} failed before a response arrived: {}", url, e);
                GatewayError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let err = GatewayError::from_error_body(status.as_u16(), &body);
            warn!("POST {} rejected: {}", url, err);
            return Err(err);
        }

        Ok(response)
    }

    async fn download(
        response: Response,
        default_filename: &str,
        progress: ProgressFn<'_>,
    ) -> Result<GeneratedArtifact, GatewayError> {
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| default_filename.to_string());

        let total = response.content_length();
        let mut content = BytesMut::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(
                    "Presentation body broke off after {} bytes: {}",
                    content.len(),
                    e
                );
                GatewayError::from(e)
            })?;
            content.extend_from_slice(&chunk);
            progress(TransferProgress {
                loaded: content.len() as u64,
                total,
            });
        }

        debug!("Downloaded {} ({} bytes)", filename, content.len());
        Ok(GeneratedArtifact::new(content.freeze(), filename))
    }
}

#[async_trait]
impl PresentationBackend for HttpBackend {
    async fn analyze(&self, files: &[UploadedFile]) -> Result<AnalysisSession, GatewayError> {
        let form = files
            .iter()
            .fold(Form::new(), |form, file| form.part("files", Self::file_part(file)));

        let response = self.post_form("analyze", form).await?;
        let session: AnalysisSession = response
            .json()
            .await
            .map_err(|e| GatewayError::Unexpected(format!("Failed to parse analysis: {}", e)))?;

        info!(
            "Analysis session {} returned {} style suggestions",
            session.session_id,
            session.suggested_styles.len()
        );
        Ok(session)
    }

    async fn generate(
        &self,
        request: GenerateRequest,
        progress: ProgressFn<'_>,
    ) -> Result<GeneratedArtifact, GatewayError> {
        let form = match &request.source {
            GenerationSource::Session { id, token } => {
                let form = Form::new().text("session_id", id.clone());
                match token {
                    Some(token) => form.text("session_token", token.clone()),
                    None => form,
                }
            }
            GenerationSource::Files(files) => files
                .iter()
                .fold(Form::new(), |form, file| form.part("files", Self::file_part(file))),
        }
        .text("theme", request.theme.clone())
        .text("style", request.style.clone());

        let response = self.post_form("generate", form).await?;
        Self::download(response, InputMode::File.default_filename(), progress).await
    }

    async fn generate_from_prompt(
        &self,
        request: PromptRequest,
        progress: ProgressFn<'_>,
    ) -> Result<GeneratedArtifact, GatewayError> {
        let form = Form::new()
            .text("prompt", request.prompt)
            .text("theme", request.theme)
            .text("style", request.style);

        let response = self.post_form("generate-from-prompt", form).await?;
        Self::download(response, InputMode::Prompt.default_filename(), progress).await
    }

    async fn status(&self) -> Result<ServiceStatus, GatewayError> {
        let url = self.endpoint("");
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(GatewayError::from_error_body(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Unexpected(format!("Failed to parse status: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, token: Option<&str>) -> AnalysisSession {
        AnalysisSession {
            session_id: id.to_string(),
            session_token: token.map(str::to_string),
            summary: "summary".to_string(),
            suggested_styles: Vec::new(),
            filenames: Vec::new(),
            text_preview: None,
        }
    }

    #[test]
    fn generate_request_prefers_session_handle() {
        let files = vec![UploadedFile::new("sales.xlsx", vec![1u8, 2])];
        let session = session("abc", Some("tok"));
        let request = GenerateRequest::new(Some(&session), &files, "sales", "emerald_pro");

        assert_eq!(
            request.source,
            GenerationSource::Session {
                id: "abc".into(),
                token: Some("tok".into())
            }
        );
        assert_eq!(request.style, "sales");
        assert_eq!(request.theme, "emerald_pro");
    }

    #[test]
    fn generate_request_resends_files_without_handle() {
        let files = vec![UploadedFile::new("sales.xlsx", vec![1u8, 2])];

        let without_session = GenerateRequest::new(None, &files, "executive", "corporate_navy");
        assert_eq!(without_session.source, GenerationSource::Files(files.clone()));

        let blank_session = session("", Some("tok"));
        let blank =
            GenerateRequest::new(Some(&blank_session), &files, "executive", "corporate_navy");
        assert_eq!(blank.source, GenerationSource::Files(files));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let backend = HttpBackend::new(&Url::parse("http://localhost:8000/").unwrap());
        assert_eq!(backend.endpoint("analyze"), "http://localhost:8000/analyze");

        let nested = HttpBackend::new(&Url::parse("https://decks.example.com/api/").unwrap());
        assert_eq!(
            nested.endpoint("generate-from-prompt"),
            "https://decks.example.com/api/generate-from-prompt"
        );
    }
}
