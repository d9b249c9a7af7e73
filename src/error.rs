//! Error types shared across the client.

use thiserror::Error;

use crate::selection::SelectionError;
use crate::thumbnails::RenderError;

/// Errors surfaced by a session, the transport, or file loading.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Unsupported file type: {0} (expected an image or a PDF)")]
    UnsupportedFileType(String),

    #[error("No file selected")]
    NoFileSelected,

    #[error("{0} has no pages to select")]
    NotPaginated(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// One protocol line that could not be parsed. Recovered inside the
    /// decoder and never returned from a session.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid page selection: {0}")]
    Selection(#[from] SelectionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Whether this error ended an in-flight request.
    pub fn is_transport(&self) -> bool {
        matches!(self, OcrError::Transport(_))
    }

    /// Message for the status line, without the variant label for transport
    /// failures.
    pub fn detail(&self) -> String {
        match self {
            OcrError::Transport(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}


impl From<reqwest::Error> for OcrError {
    fn from(e: reqwest::Error) -> Self {
        OcrError::Transport(e.to_string())
    }
}
