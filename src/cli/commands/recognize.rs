//! Non-streaming recognition command.

use std::path::Path;

use streamocr::config::Settings;
use streamocr::document::DocumentKind;
use streamocr::request::GenerationParams;
use streamocr::session::Session;

use super::build_client;
use crate::cli::icons::Mark;

/// Recognize one image and print the full result.
pub async fn cmd_recognize(
    settings: &Settings,
    image: &Path,
    params: &GenerationParams,
) -> anyhow::Result<()> {
    let mut session = Session::new();
    let loaded = session.select_file(image)?;
    if loaded.kind != DocumentKind::Image {
        anyhow::bail!(
            "{} is not an image; use `streamocr ocr` for PDFs",
            loaded.name
        );
    }

    let client = build_client(settings)?;
    let request = session.request(params)?;

    match client.recognize(&request).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} An error occurred: {}", Mark::Fail, e.detail());
            Err(e.into())
        }
    }
}
