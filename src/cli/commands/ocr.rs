//! Streaming OCR command.

use std::path::Path;

use console::style;

use streamocr::config::Settings;
use streamocr::document::format_file_size;
use streamocr::request::GenerationParams;
use streamocr::selection::SelectionStore;
use streamocr::session::Session;

use super::{build_client, build_renderer};
use crate::cli::icons::Mark;
use crate::cli::picker::pick_pages;
use crate::cli::render::TerminalSink;

/// Recognize a file, streaming text to stdout.
pub async fn cmd_ocr(
    settings: &Settings,
    file: &Path,
    pages: Option<&str>,
    pick: bool,
    params: &GenerationParams,
    output: Option<&Path>,
    scale: f32,
) -> anyhow::Result<()> {
    let mut session = Session::new();
    let loaded = session.select_file(file)?;
    eprintln!(
        "{} {} ({}, {})",
        Mark::Step,
        style(&loaded.name).bold(),
        loaded.mime_type,
        format_file_size(loaded.size())
    );

    if pages.is_some() || pick {
        let renderer = build_renderer(settings);

        if let Some(csv) = pages {
            let pages = SelectionStore::parse(csv)?;
            session.select_pages(&renderer, &pages).await?;
        }

        if pick {
            let title = session
                .file()
                .map(|f| f.name.clone())
                .unwrap_or_default();
            let grid = session.open_grid(&renderer, scale).await?;
            match pick_pages(grid, &title)? {
                Some(summary) => session.commit_summary(summary),
                None => eprintln!("{} Picker closed without confirming", Mark::Warn),
            }
        }

        if session.selection().is_empty() {
            eprintln!("  {} Pages: all", Mark::Detail);
        } else {
            eprintln!(
                "  {} Pages: {}",
                Mark::Detail,
                session.selection().display_summary()
            );
        }
    }

    let client = build_client(settings)?;
    let mut sink = TerminalSink::new();

    let acc = match session.submit(&client, params, &mut sink).await {
        Ok(acc) => acc,
        Err(e) => {
            eprintln!("{} An error occurred: {}", Mark::Fail, e.detail());
            return Err(e.into());
        }
    };

    match acc.terminal() {
        Some(terminal) => {
            eprintln!("{} Processed: {}", Mark::Ok, terminal.filename);
            if let Some(summary) = acc.view().page_summary {
                eprintln!("  {} {}", Mark::Detail, summary);
            }
        }
        None => eprintln!(
            "{} Stream ended before the server reported completion",
            Mark::Warn
        ),
    }

    if let Some(path) = output {
        tokio::fs::write(path, acc.full_text()).await?;
        eprintln!("  {} Saved to {}", Mark::Detail, path.display());
    }

    Ok(())
}
