//! Thumbnail export command.

use std::path::{Path, PathBuf};

use console::style;

use streamocr::config::Settings;
use streamocr::document::format_file_size;
use streamocr::session::Session;
use streamocr::thumbnails::POPPLER_NOT_FOUND;

use super::build_renderer;
use crate::cli::icons::Mark;

/// Render every page of a PDF to PNG thumbnails.
pub async fn cmd_pages(
    settings: &Settings,
    file: &Path,
    out: Option<PathBuf>,
    scale: f32,
) -> anyhow::Result<()> {
    let renderer = build_renderer(settings);
    if !renderer.is_available() {
        eprintln!("{} {}", Mark::Fail, POPPLER_NOT_FOUND);
        anyhow::bail!("PDF renderer not available");
    }

    let mut session = Session::new();
    let loaded = session.select_file(file)?;
    let name = loaded.name.clone();
    let size = format_file_size(loaded.size());
    let out = out.unwrap_or_else(|| default_out_dir(file));

    let grid = session.open_grid(&renderer, scale).await?;
    let written = grid.write_pngs(&out)?;

    println!(
        "{} {} ({}): {} page(s)",
        Mark::Ok,
        style(&name).bold(),
        size,
        grid.len()
    );
    for (tile, path) in grid.tiles().iter().zip(&written) {
        println!(
            "  {} page {:>4}  {}x{}  {}",
            Mark::Detail,
            tile.page,
            tile.image.width,
            tile.image.height,
            path.display()
        );
    }

    Ok(())
}

fn default_out_dir(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{}-pages", stem))
}
