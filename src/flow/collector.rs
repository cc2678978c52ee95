// src/flow/collector.rs
use crate::errors::ValidationError;
use crate::models::UploadedFile;

pub const MIN_PROMPT_CHARS: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 5000;
/// Character count past which the prompt counter is highlighted.
pub const PROMPT_WARNING_CHARS: usize = 4500;

/// Quick-start topics that can be appended to a prompt.
pub const PROMPT_SUGGESTIONS: [&str; 4] =
    ["Q4 Sales", "Financial Review", "Product Launch", "Team Update"];

/// Ordered files picked for upload. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCollector {
    files: Vec<UploadedFile>,
}

impl FileCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends in order; drops and picker selections both land here.
    pub fn add(&mut self, files: impl IntoIterator<Item = UploadedFile>) {
        self.files.extend(files);
    }

    pub fn remove(&mut self, index: usize) -> Result<UploadedFile, ValidationError> {
        if index >= self.files.len() {
            return Err(ValidationError::NoSuchFile {
                index,
                len: self.files.len(),
            });
        }
        Ok(self.files.remove(index))
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptDraft {
    text: String,
}

impl PromptDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the text, keeping at most `MAX_PROMPT_CHARS` characters.
    pub fn set(&mut self, text: &str) {
        self.text = text.chars().take(MAX_PROMPT_CHARS).collect();
    }

    /// Appends a topic on its own line.
    pub fn append_suggestion(&mut self, suggestion: &str) {
        let combined = if self.text.is_empty() {
            suggestion.to_string()
        } else {
            format!("{}\n{}", self.text, suggestion)
        };
        self.set(&combined);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn near_limit(&self) -> bool {
        self.char_count() > PROMPT_WARNING_CHARS
    }

    /// Long enough (ignoring surrounding whitespace) to offer style and
    /// theme pickers and to allow generation.
    pub fn is_ready(&self) -> bool {
        self.trimmed_len() >= MIN_PROMPT_CHARS
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ValidationError::PromptTooShort {
                min: MIN_PROMPT_CHARS,
                actual: self.trimmed_len(),
            })
        }
    }

    fn trimmed_len(&self) -> usize {
        self.text.trim().chars().count()
    }
}
