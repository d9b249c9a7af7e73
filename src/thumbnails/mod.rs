//! Thumbnail grid for choosing PDF pages.
//!
//! The grid renders one low-resolution raster per page through a
//! [`PageRenderer`] and binds each tile's checked state to the session's
//! [`SelectionStore`]. The store is mutated live; there is no staging area,
//! so dismissing the grid without confirming keeps every toggle.

mod pdftoppm;

pub use pdftoppm::{PdftoppmRenderer, POPPLER_NOT_FOUND};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::selection::SelectionStore;

/// Default thumbnail scale (half resolution).
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.5;

/// Errors from the page renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer not available: {0}")]
    ToolNotAvailable(String),

    #[error("Could not read document: {0}")]
    InvalidDocument(String),

    #[error("Failed to render page {page}: {reason}")]
    PageFailed { page: u32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rasterized page. Opaque to everything except presentation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded image data.
    pub png: Vec<u8>,
}

impl RenderedPage {
    /// Wrap PNG bytes, reading dimensions from the IHDR chunk.
    pub fn from_png(png: Vec<u8>) -> Option<Self> {
        const SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        if png.len() < 24 || !png.starts_with(SIGNATURE) || &png[12..16] != b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        Some(Self { width, height, png })
    }
}

/// Renders pages of a paginated document.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the document.
    async fn page_count(&self, document: &Path) -> Result<u32, RenderError>;

    /// Render one page (1-based) at `scale` relative to 72 DPI.
    async fn render_page(
        &self,
        document: &Path,
        page: u32,
        scale: f32,
    ) -> Result<RenderedPage, RenderError>;
}

/// One selectable tile.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub page: u32,
    pub image: RenderedPage,
    /// Mirrors the selection store; repainted on every store change made
    /// through the grid.
    pub selected: bool,
}

/// An open thumbnail grid bound to a selection store.
pub struct ThumbnailGrid<'s> {
    store: &'s mut SelectionStore,
    tiles: Vec<Thumbnail>,
}

impl<'s> ThumbnailGrid<'s> {
    /// Render every page and open the grid.
    ///
    /// Pages are rendered one at a time, in order. Any failure aborts the
    /// whole open and leaves `store` untouched. On success the store's page
    /// count is set from the document.
    pub async fn open<R>(
        renderer: &R,
        document: &Path,
        store: &'s mut SelectionStore,
        scale: f32,
    ) -> Result<ThumbnailGrid<'s>, RenderError>
    where
        R: PageRenderer + ?Sized,
    {
        let total = renderer.page_count(document).await.inspect_err(|e| {
            warn!("Could not open {}: {}", document.display(), e);
        })?;
        if total == 0 {
            return Err(RenderError::InvalidDocument(format!(
                "{} has no pages",
                document.display()
            )));
        }

        let mut tiles = Vec::with_capacity(total as usize);
        for page in 1..=total {
            let image = renderer
                .render_page(document, page, scale)
                .await
                .inspect_err(|e| warn!("Thumbnail rendering aborted: {}", e))?;
            tiles.push(Thumbnail {
                page,
                image,
                selected: false,
            });
        }

        info!(
            "Rendered {} thumbnail(s) for {}",
            tiles.len(),
            document.display()
        );

        store.set_total_pages(total);
        let mut grid = ThumbnailGrid { store, tiles };
        grid.repaint_all();
        Ok(grid)
    }

    pub fn tiles(&self) -> &[Thumbnail] {
        &self.tiles
    }

    pub fn tile(&self, page: u32) -> Option<&Thumbnail> {
        self.index_of(page).map(|i| &self.tiles[i])
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.store.size()
    }

    pub fn store(&self) -> &SelectionStore {
        self.store
    }

    fn index_of(&self, page: u32) -> Option<usize> {
        let index = page.checked_sub(1)? as usize;
        (index < self.tiles.len()).then_some(index)
    }

    /// Flip one page. Returns the new state, or `None` for an unknown page.
    pub fn toggle(&mut self, page: u32) -> Option<bool> {
        let index = self.index_of(page)?;
        let selected = !self.tiles[index].selected;
        self.set_selected(page, selected);
        Some(selected)
    }

    /// Set one page's state. Touches only that tile.
    pub fn set_selected(&mut self, page: u32, selected: bool) {
        let Some(index) = self.index_of(page) else {
            return;
        };
        if selected {
            self.store.add(page);
        } else {
            self.store.remove(page);
        }
        self.tiles[index].selected = self.store.contains(page);
    }

    pub fn select_all(&mut self) {
        self.store.select_all();
        self.repaint_all();
    }

    pub fn deselect_all(&mut self) {
        self.store.clear();
        self.repaint_all();
    }

    fn repaint_all(&mut self) {
        for tile in &mut self.tiles {
            tile.selected = self.store.contains(tile.page);
        }
    }

    /// Commit and close. Returns the summary text for the main view.
    pub fn confirm(self) -> String {
        self.store.display_summary()
    }

    /// Close without confirming. Live toggles stay in the store.
    pub fn close(self) {}

    /// Write every thumbnail as `page-NNN.png` into `dir`.
    pub fn write_pngs(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let width = self.tiles.len().to_string().len().max(2);
        self.tiles
            .iter()
            .map(|tile| {
                let path = dir.join(format!("page-{:0width$}.png", tile.page, width = width));
                std::fs::write(&path, &tile.image.png)?;
                Ok(path)
            })
            .collect()
    }
}
