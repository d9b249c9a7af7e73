//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod health;
mod ocr;
mod pages;
mod recognize;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use streamocr::client::OcrClient;
use streamocr::config::{load_settings_with_options, LoadOptions, Settings};
use streamocr::error::OcrError;
use streamocr::request::GenerationParams;
use streamocr::thumbnails::PdftoppmRenderer;

#[derive(Parser)]
#[command(name = "streamocr")]
#[command(about = "Stream OCR results for images and PDFs from a remote OCR service")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OCR server base URL (overrides config and STREAMOCR_SERVER_URL)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Overrides for the generation parameters in settings.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Prompt sent with the document
    #[arg(long)]
    prompt: Option<String>,
    /// Maximum tokens to generate
    #[arg(long)]
    max_tokens: Option<String>,
    /// Sampling temperature
    #[arg(long)]
    temperature: Option<String>,
}

impl ParamArgs {
    fn resolve(&self, settings: &Settings) -> GenerationParams {
        let mut params = settings.generation_params();
        if let Some(ref prompt) = self.prompt {
            params.prompt = prompt.clone();
        }
        if let Some(ref max_tokens) = self.max_tokens {
            params.max_tokens = max_tokens.clone();
        }
        if let Some(ref temperature) = self.temperature {
            params.temperature = temperature.clone();
        }
        params
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Stream recognized text for an image or PDF to stdout
    Ocr {
        /// Image or PDF to recognize
        file: PathBuf,
        /// Pages to recognize, e.g. "1-3,5" (PDF only, default: all)
        #[arg(short, long)]
        pages: Option<String>,
        /// Choose pages interactively from thumbnails (PDF only)
        #[arg(long)]
        pick: bool,
        #[command(flatten)]
        params: ParamArgs,
        /// Also write the final text to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Thumbnail scale for --pick
        #[arg(long)]
        scale: Option<f32>,
    },

    /// Render PDF page thumbnails to PNG files
    Pages {
        /// PDF to render
        file: PathBuf,
        /// Output directory (default: <name>-pages)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Scale relative to 72 DPI
        #[arg(long)]
        scale: Option<f32>,
    },

    /// Check that the OCR server is up
    Health,

    /// Show resolved configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Recognize an image with the non-streaming endpoint
    Recognize {
        /// Image to recognize
        image: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print resolved settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file in use
    Path,
}

/// Build the HTTP client from settings.
fn build_client(settings: &Settings) -> Result<OcrClient, OcrError> {
    let mut builder = OcrClient::builder(settings.server_url.clone())
        .connect_timeout(Duration::from_secs(settings.request_timeout));
    if let Some(ref user_agent) = settings.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    builder.build()
}

/// Build the PDF renderer from settings.
fn build_renderer(settings: &Settings) -> PdftoppmRenderer {
    PdftoppmRenderer::new()
        .with_pdftoppm(&settings.pdftoppm_path)
        .with_pdfinfo(&settings.pdfinfo_path)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        server_url: cli.server,
    };
    let (settings, config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Ocr {
            file,
            pages,
            pick,
            params,
            output,
            scale,
        } => {
            let params = params.resolve(&settings);
            let scale = scale.unwrap_or(settings.thumbnail_scale);
            ocr::cmd_ocr(
                &settings,
                &file,
                pages.as_deref(),
                pick,
                &params,
                output.as_deref(),
                scale,
            )
            .await
        }
        Commands::Pages { file, out, scale } => {
            let scale = scale.unwrap_or(settings.thumbnail_scale);
            pages::cmd_pages(&settings, &file, out, scale).await
        }
        Commands::Health => health::cmd_health(&settings).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => config_cmd::cmd_config_show(&settings, json),
            ConfigCommands::Path => config_cmd::cmd_config_path(&config),
        },
        Commands::Recognize { image, params } => {
            let params = params.resolve(&settings);
            recognize::cmd_recognize(&settings, &image, &params).await
        }
    }
}
