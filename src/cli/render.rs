//! Terminal render sink.
//!
//! Recognized text goes to stdout as it arrives so it can be piped. The
//! status line lives in a spinner on stderr.

use std::io::{stdout, Stdout, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use streamocr::accumulator::{RenderView, Status};
use streamocr::session::RenderSink;

pub struct TerminalSink<W: Write> {
    out: W,
    spinner: ProgressBar,
    printed: usize,
    finished: bool,
}

impl TerminalSink<Stdout> {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self::with_writer(stdout(), spinner)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn with_writer(out: W, spinner: ProgressBar) -> Self {
        Self {
            out,
            spinner,
            printed: 0,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn finish(&mut self, view: &RenderView) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.spinner.finish_and_clear();
        if !view.text.is_empty() && !view.text.ends_with('\n') {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn render(&mut self, view: &RenderView) {
        // Text is append-only within a request, so only the tail is new.
        if let Some(delta) = view.text.get(self.printed..).filter(|d| !d.is_empty()) {
            let out = &mut self.out;
            self.spinner.suspend(|| {
                let _ = out.write_all(delta.as_bytes());
                let _ = out.flush();
            });
            self.printed = view.text.len();
        }

        self.spinner.set_message(view.status_text.clone());

        let ended = matches!(view.status, Status::Done | Status::Failed) || !view.cursor;
        if ended {
            self.finish(view);
        }
    }
}

#[cfg(test)]
mod tests {
    use streamocr::accumulator::Accumulator;
    use streamocr::stream::StreamEvent;

    use super::*;

    fn sink() -> TerminalSink<Vec<u8>> {
        TerminalSink::with_writer(Vec::new(), ProgressBar::hidden())
    }

    #[test]
    fn test_prints_only_new_text() {
        let mut sink = sink();
        let mut acc = Accumulator::new();
        sink.render(&acc.view());
        acc.begin_generating();
        for event in [
            StreamEvent::PageStart { page: 1, total: 2 },
            StreamEvent::Content { text: "Hel".into() },
            StreamEvent::Content { text: "lo".into() },
            StreamEvent::PageStart { page: 2, total: 2 },
            StreamEvent::Content { text: "World".into() },
            StreamEvent::Done {
                filename: "doc.pdf".into(),
                total_pages: 2,
            },
        ] {
            acc.apply(&event);
            sink.render(&acc.view());
        }
        acc.finish();
        sink.render(&acc.view());

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "Hello\n\n--- page 2 ---\n\nWorld\n");
    }

    #[test]
    fn test_failure_without_text_prints_nothing() {
        let mut sink = sink();
        let mut acc = Accumulator::new();
        sink.render(&acc.view());
        acc.fail("HTTP error! status: 500");
        sink.render(&acc.view());
        assert!(sink.into_inner().is_empty());
    }
}
