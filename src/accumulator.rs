//! Result accumulator and status machine for one OCR request.
//!
//! Folds decoded stream events into ordered multi-page text. The state is
//! created fresh per submission and replaced wholesale by the next one.

use std::fmt;

use crate::stream::StreamEvent;

/// Cursor glyph appended to the text while a stream is still producing.
pub const CURSOR: &str = "▌";

/// Request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Request sent, waiting for the response headers.
    Uploading,
    /// Response accepted, no page started yet.
    Generating,
    /// Recognizing page `n`.
    PageActive(u32),
    Done,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Uploading => write!(f, "uploading"),
            Status::Generating => write!(f, "generating"),
            Status::PageActive(n) => write!(f, "page {}", n),
            Status::Done => write!(f, "done"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

/// Metadata delivered only with the final event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalMetadata {
    pub filename: String,
    pub total_pages: u32,
}

/// Renderable snapshot pushed to subscribers after every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderView {
    pub text: String,
    /// Whether the "still producing" cursor should be drawn after `text`.
    pub cursor: bool,
    pub status: Status,
    pub status_text: String,
    /// Page-count line, present only for finished multi-page results.
    pub page_summary: Option<String>,
}

impl RenderView {
    /// Text with the cursor glyph appended when active.
    pub fn display_text(&self) -> String {
        if self.cursor {
            format!("{}{}", self.text, CURSOR)
        } else {
            self.text.clone()
        }
    }
}

/// Accumulated state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator {
    full_text: String,
    current_page: u32,
    total_pages: u32,
    status: Status,
    terminal: Option<TerminalMetadata>,
    streaming: bool,
    error: Option<String>,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Separator inserted before the content of every page after the first.
pub fn page_break_marker(page: u32) -> String {
    format!("\n\n--- page {} ---\n\n", page)
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            full_text: String::new(),
            current_page: 1,
            total_pages: 1,
            status: Status::Uploading,
            terminal: None,
            streaming: true,
            error: None,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn terminal(&self) -> Option<&TerminalMetadata> {
        self.terminal.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The response was accepted; text generation is under way.
    pub fn begin_generating(&mut self) {
        if self.status == Status::Uploading {
            self.status = Status::Generating;
        }
    }

    /// Fold one event into the state.
    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::PageStart { page, total } => {
                self.status = Status::PageActive(*page);
                self.current_page = *page;
                self.total_pages = *total;
                if *page > 1 {
                    self.full_text.push_str(&page_break_marker(*page));
                }
            }
            StreamEvent::Content { text } => self.full_text.push_str(text),
            StreamEvent::PageEnd => {}
            StreamEvent::Done {
                filename,
                total_pages,
            } => {
                self.status = Status::Done;
                self.streaming = false;
                self.terminal = Some(TerminalMetadata {
                    filename: filename.clone(),
                    total_pages: *total_pages,
                });
            }
        }
    }

    /// Pure form of `apply`.
    pub fn fold(mut self, event: &StreamEvent) -> Self {
        self.apply(event);
        self
    }

    /// The transport ended without error. Status is left as is; only the
    /// cursor is retired.
    pub fn finish(&mut self) {
        self.streaming = false;
    }

    /// The transport failed.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = Status::Failed;
        self.streaming = false;
        self.error = Some(message.into());
    }

    /// Status line for the current state.
    pub fn status_text(&self) -> String {
        match self.status {
            Status::Uploading => "Uploading and analyzing file...".to_string(),
            Status::Generating => "Generating text...".to_string(),
            Status::PageActive(page) => {
                format!("Processing page {}/{}...", page, self.total_pages)
            }
            Status::Done => "Done!".to_string(),
            Status::Failed => match &self.error {
                Some(e) => format!("An error occurred: {}", e),
                None => "An error occurred".to_string(),
            },
        }
    }

    /// Current renderable value.
    pub fn view(&self) -> RenderView {
        let page_summary = self
            .terminal
            .as_ref()
            .filter(|t| t.total_pages > 1)
            .map(|t| format!("{} pages total", t.total_pages));

        RenderView {
            text: self.full_text.clone(),
            cursor: self.streaming && self.status != Status::Done,
            status: self.status,
            status_text: self.status_text(),
            page_summary,
        }
    }
}
