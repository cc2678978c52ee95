// src/errors.rs
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::flow::Step;

#[derive(Error, Debug)]
pub enum SmartDeckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// Failure of a single backend call, classified by what reached the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backend answered with a non-2xx status. `detail` is the `detail`
    /// string of a JSON error body, if one could be decoded.
    #[error("Backend returned {status}{}", format_detail(.detail))]
    Server { status: u16, detail: Option<String> },

    /// No response reached the client.
    #[error("Backend unreachable: {0}")]
    Connectivity(String),

    #[error("Unexpected backend error: {0}")]
    Unexpected(String),
}

fn format_detail(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl GatewayError {
    /// Builds a `Server` error from a raw (possibly binary) error body.
    ///
    /// The body is decoded as UTF-8 and parsed as JSON; only a non-empty string
    /// `detail` is kept. Anything else degrades to `detail: None`.
    pub fn from_error_body(status: u16, body: &[u8]) -> Self {
        let detail = std::str::from_utf8(body)
            .ok()
            .and_then(|text| serde_json::from_str::<ErrorBody>(text).ok())
            .and_then(|parsed| parsed.detail)
            .and_then(|detail| detail.as_str().map(str::to_string))
            .filter(|detail| !detail.trim().is_empty());

        GatewayError::Server { status, detail }
    }

    pub fn into_notice(self, operation: GatewayOperation) -> UserNotice {
        match self {
            GatewayError::Server {
                detail: Some(detail),
                ..
            } => UserNotice {
                kind: NoticeKind::Server,
                message: detail,
            },
            GatewayError::Connectivity(_) => UserNotice {
                kind: NoticeKind::Connectivity,
                message: operation.connectivity_message().to_string(),
            },
            GatewayError::Server { detail: None, .. } | GatewayError::Unexpected(_) => UserNotice {
                kind: NoticeKind::Unknown,
                message: operation.generic_message().to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        // A body cut short means the connection dropped mid-transfer.
        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            GatewayError::Connectivity(err.to_string())
        } else {
            GatewayError::Unexpected(err.to_string())
        }
    }
}

/// The backend call a failure belongs to. Each one words its notices differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOperation {
    Analyze,
    GenerateFromFiles,
    GenerateFromPrompt,
}

impl GatewayOperation {
    fn connectivity_message(self) -> &'static str {
        match self {
            GatewayOperation::Analyze => {
                "Server unavailable. Check that the backend is running."
            }
            GatewayOperation::GenerateFromFiles => "Server disconnected during generation.",
            GatewayOperation::GenerateFromPrompt => "Server disconnected.",
        }
    }

    fn generic_message(self) -> &'static str {
        match self {
            GatewayOperation::Analyze => "Unknown error while analyzing files.",
            GatewayOperation::GenerateFromFiles => {
                "Failed to generate the presentation. Please try again."
            }
            GatewayOperation::GenerateFromPrompt => "Failed to generate from prompt.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The backend rejected the input and said why.
    Server,
    /// The backend could not be reached at all.
    Connectivity,
    Unknown,
}

/// A message meant for the person driving the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Local checks that block an action before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Select at least one file before analyzing")]
    NoFiles,

    #[error("Consent is required before your content is sent")]
    ConsentRequired,

    #[error("Prompt must be at least {min} characters (got {actual})")]
    PromptTooShort { min: usize, actual: usize },

    #[error("No file at position {index} (have {len})")]
    NoSuchFile { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot {operation} during the {step} step")]
    InvalidTransition { operation: &'static str, step: Step },

    #[error("Style '{0}' is not in the active catalog")]
    UnknownStyle(String),

    #[error("Theme '{0}' is not in the theme catalog")]
    UnknownTheme(String),

    /// A backend call failed; the flow has already returned to the last
    /// interactive step.
    #[error("{0}")]
    Failed(UserNotice),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_detail_is_surfaced_verbatim() {
        let err = GatewayError::from_error_body(422, br#"{"detail":"prompt too vague"}"#);
        assert_eq!(
            err,
            GatewayError::Server {
                status: 422,
                detail: Some("prompt too vague".to_string())
            }
        );

        let notice = err.into_notice(GatewayOperation::GenerateFromPrompt);
        assert_eq!(notice.kind, NoticeKind::Server);
        assert_eq!(notice.message, "prompt too vague");
    }

    #[test]
    fn undecodable_bodies_fall_back_to_generic_message() {
        for body in [
            &b"<html>502 Bad Gateway</html>"[..],
            &[0xff, 0xfe, 0x00][..],
            &br#"{"error":"nope"}"#[..],
            &br#"{"detail":[{"loc":["body","prompt"],"msg":"field required"}]}"#[..],
            &br#"{"detail":"   "}"#[..],
        ] {
            let err = GatewayError::from_error_body(500, body);
            assert_eq!(err, GatewayError::Server { status: 500, detail: None });
            let notice = err.into_notice(GatewayOperation::GenerateFromFiles);
            assert_eq!(notice.kind, NoticeKind::Unknown);
            assert_eq!(
                notice.message,
                "Failed to generate the presentation. Please try again."
            );
        }
    }

    #[test]
    fn connectivity_is_distinct_per_operation() {
        let analyze = GatewayError::Connectivity("refused".into())
            .into_notice(GatewayOperation::Analyze);
        let prompt = GatewayError::Connectivity("refused".into())
            .into_notice(GatewayOperation::GenerateFromPrompt);

        assert_eq!(analyze.kind, NoticeKind::Connectivity);
        assert_eq!(prompt.kind, NoticeKind::Connectivity);
        assert_ne!(analyze.message, prompt.message);
        assert!(analyze.message.contains("unavailable"));
    }

    #[test]
    fn unexpected_errors_use_generic_analysis_message() {
        let notice = GatewayError::Unexpected("bad json".into())
            .into_notice(GatewayOperation::Analyze);
        assert_eq!(notice.kind, NoticeKind::Unknown);
        assert_eq!(notice.message, "Unknown error while analyzing files.");
    }
}
