// src/models.rs
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::SmartDeckError;

/// Extensions offered by the file picker. Advisory only: nothing is rejected
/// client-side.
pub const ADVISORY_EXTENSIONS: [&str; 8] =
    ["xlsx", "xls", "csv", "doc", "docx", "png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    File,
    Prompt,
}

impl InputMode {
    /// Filename used when the backend does not send a usable
    /// `Content-Disposition` header.
    pub fn default_filename(self) -> &'static str {
        match self {
            InputMode::File => "SmartDeck_Presentation.pptx",
            InputMode::Prompt => "SmartDeck_Prompt.pptx",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::File => f.write_str("file"),
            InputMode::Prompt => f.write_str("prompt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, SmartDeckError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SmartDeckError::Config(format!("Not a file path: {}", path.display()))
            })?;
        let content = tokio::fs::read(path).await?;
        Ok(Self::new(name, content))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    pub fn matches_advisory_filter(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ADVISORY_EXTENSIONS.contains(&ext.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSuggestion {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recommended: Option<bool>,
}

impl StyleSuggestion {
    pub fn is_recommended(&self) -> bool {
        self.is_recommended.unwrap_or(false)
    }
}

/// Result of a successful `/analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub session_id: String,
    #[serde(default)]
    pub session_token: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub suggested_styles: Vec<StyleSuggestion>,
    #[serde(default)]
    pub filenames: Vec<String>,
    #[serde(default)]
    pub text_preview: Option<String>,
}

impl AnalysisSession {
    /// The id/token pair to present on `/generate`, if the backend issued one.
    pub fn handle(&self) -> Option<(&str, Option<&str>)> {
        if self.session_id.is_empty() {
            return None;
        }
        Some((
            self.session_id.as_str(),
            self.session_token.as_deref().filter(|t| !t.is_empty()),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub content: Bytes,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn new(content: impl Into<Bytes>, filename: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            filename: filename.into(),
            created_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Writes the artifact into `dir`. Only the final path component of the
    /// server-suggested name is used.
    pub async fn save_to(&self, dir: &Path, fallback: &str) -> Result<PathBuf, SmartDeckError> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| fallback.into());
        let path = dir.join(name);

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &self.content).await?;
        Ok(path)
    }
}

/// Backend health as reported by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub gemini_enabled: bool,
    #[serde(default)]
    pub version: Option<String>,
}
