//! One loaded file and its most recent request.
//!
//! A `Session` replaces what would otherwise be process-wide state: the
//! chosen file, its page selection, the committed selection summary, and
//! the accumulator of the last submission. Everything is reset explicitly
//! when the file changes.

use std::path::Path;

use futures::StreamExt;
use tracing::{info, warn};

use crate::accumulator::{Accumulator, RenderView};
use crate::client::OcrClient;
use crate::document::LoadedFile;
use crate::error::OcrError;
use crate::request::{GenerationParams, OcrRequest};
use crate::selection::{PageRange, SelectionStore};
use crate::thumbnails::{PageRenderer, ThumbnailGrid};

/// Receives a fresh view after every state change. Never feeds back.
pub trait RenderSink {
    fn render(&mut self, view: &RenderView);
}

impl RenderSink for Vec<RenderView> {
    fn render(&mut self, view: &RenderView) {
        self.push(view.clone());
    }
}

#[derive(Debug, Default)]
pub struct Session {
    file: Option<LoadedFile>,
    selection: SelectionStore,
    summary: Option<String>,
    accumulator: Option<Accumulator>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and classify a file, replacing the current one.
    ///
    /// An unsupported file is rejected before anything is changed.
    pub fn select_file(&mut self, path: &Path) -> Result<&LoadedFile, OcrError> {
        let file = LoadedFile::open(path)?;
        Ok(self.load(file))
    }

    /// Replace the current file with one already in memory.
    pub fn load(&mut self, file: LoadedFile) -> &LoadedFile {
        info!("Selected {} ({})", file.name, file.mime_type);
        self.reset();
        self.file.insert(file)
    }

    pub fn remove_file(&mut self) {
        self.reset();
        self.file = None;
    }

    fn reset(&mut self) {
        self.selection = SelectionStore::default();
        self.summary = None;
        self.accumulator = None;
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// Summary committed by the last confirmed grid.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn accumulator(&self) -> Option<&Accumulator> {
        self.accumulator.as_ref()
    }

    fn paginated_file(&self) -> Result<&LoadedFile, OcrError> {
        let file = self.file.as_ref().ok_or(OcrError::NoFileSelected)?;
        if !file.kind.is_paginated() {
            return Err(OcrError::NotPaginated(file.name.clone()));
        }
        Ok(file)
    }

    /// Open the thumbnail grid for the current PDF.
    pub async fn open_grid<'a, R>(
        &'a mut self,
        renderer: &R,
        scale: f32,
    ) -> Result<ThumbnailGrid<'a>, OcrError>
    where
        R: PageRenderer + ?Sized,
    {
        let path = self.paginated_file()?.path.clone();
        Ok(ThumbnailGrid::open(renderer, &path, &mut self.selection, scale).await?)
    }

    /// Record the summary returned by a confirmed grid.
    pub fn commit_summary(&mut self, summary: String) {
        self.summary = Some(summary);
    }

    /// Select pages without the grid, asking the renderer for the page count.
    ///
    /// Pages beyond the document are ignored.
    pub async fn select_pages<R>(
        &mut self,
        renderer: &R,
        pages: &[PageRange],
    ) -> Result<(), OcrError>
    where
        R: PageRenderer + ?Sized,
    {
        let path = self.paginated_file()?.path.clone();
        let total = renderer.page_count(&path).await?;

        self.selection.set_total_pages(total);
        self.selection.clear();
        for range in pages {
            if range.first > total {
                warn!("Ignoring page {} (document has {} pages)", range.first, total);
            } else if range.last > total && range.last != u32::MAX {
                warn!(
                    "Ignoring pages {}-{} (document has {} pages)",
                    total + 1,
                    range.last,
                    total
                );
            }
        }
        self.selection.select_ranges(pages);
        self.summary = Some(self.selection.display_summary());
        Ok(())
    }

    /// Build the request for the current file and selection.
    pub fn request(&self, params: &GenerationParams) -> Result<OcrRequest, OcrError> {
        let file = self.file.as_ref().ok_or(OcrError::NoFileSelected)?;
        Ok(OcrRequest::with_params(file, params, &self.selection))
    }

    /// Submit the current file and fold the response into a new accumulator.
    ///
    /// The sink sees a view after the upload starts, after the response is
    /// accepted, after every event, and once more when the stream ends. A
    /// transport failure leaves the accumulator in `Failed` and is returned;
    /// the session stays usable for another submission.
    pub async fn submit(
        &mut self,
        client: &OcrClient,
        params: &GenerationParams,
        sink: &mut dyn RenderSink,
    ) -> Result<&Accumulator, OcrError> {
        let request = self.request(params)?;
        let acc = self.accumulator.insert(Accumulator::new());
        sink.render(&acc.view());

        let mut events = match client.stream(&request).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Request failed: {}", e);
                acc.fail(e.detail());
                sink.render(&acc.view());
                return Err(e);
            }
        };

        acc.begin_generating();
        sink.render(&acc.view());

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    acc.apply(&event);
                    sink.render(&acc.view());
                }
                Err(e) => {
                    warn!("Stream interrupted: {}", e);
                    acc.fail(e.detail());
                    sink.render(&acc.view());
                    return Err(e);
                }
            }
        }

        acc.finish();
        sink.render(&acc.view());
        info!("Stream finished with status {}", acc.status());
        Ok(acc)
    }
}
