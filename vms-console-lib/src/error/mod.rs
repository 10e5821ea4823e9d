use thiserror::Error;

use crate::types::Transformation;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Field analysis error: {0}")]
    FieldAnalysis(#[from] FieldAnalysisError),
    #[error(
        "Partial failure: transformation {index} was removed, the replacement failed ({add_error}) \
         and restoring the original failed ({restore_error}); mapping rules may be inconsistent"
    )]
    PartialFailure {
        index: usize,
        original: Box<Transformation>,
        add_error: Box<ConsoleError>,
        restore_error: Box<ConsoleError>,
    },
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConsoleError {
    /// The text shown to a user after the action context, e.g. the server's `message`.
    pub fn detail(&self) -> String {
        match self {
            ConsoleError::Api { message, .. } => message.clone(),
            ConsoleError::Validation(message)
            | ConsoleError::InvalidState(message)
            | ConsoleError::Config(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldAnalysisError {
    #[error("Field structure at '{path}' is nested deeper than the limit of {max_depth}")]
    TooDeep { path: String, max_depth: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Error,
}

/// The single status line a screen shows after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == BannerKind::Error
    }
}
