//! Configuration commands.

use console::style;

use streamocr::config::{Config, Settings};

use crate::cli::icons::Mark;

/// Resolved settings as JSON.
fn settings_json(settings: &Settings) -> serde_json::Value {
    serde_json::json!({
        "server_url": settings.server_url.as_str(),
        "prompt": settings.prompt,
        "max_tokens": settings.max_tokens,
        "temperature": settings.temperature,
        "request_timeout": settings.request_timeout,
        "user_agent": settings.user_agent,
        "thumbnail_scale": settings.thumbnail_scale,
        "pdftoppm_path": settings.pdftoppm_path.display().to_string(),
        "pdfinfo_path": settings.pdfinfo_path.display().to_string(),
    })
}

/// Print resolved settings.
pub fn cmd_config_show(settings: &Settings, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&settings_json(settings))?);
        return Ok(());
    }

    println!("{}", style("SETTINGS").cyan().bold());
    println!("  {:<18} {}", "Server:", settings.server_url);
    println!("  {:<18} {}", "Prompt:", settings.prompt);
    println!("  {:<18} {}", "Max tokens:", settings.max_tokens);
    println!("  {:<18} {}", "Temperature:", settings.temperature);
    println!("  {:<18} {}s", "Connect timeout:", settings.request_timeout);
    println!(
        "  {:<18} {}",
        "User agent:",
        settings
            .user_agent
            .as_deref()
            .unwrap_or(streamocr::client::USER_AGENT)
    );
    println!("  {:<18} {}", "Thumbnail scale:", settings.thumbnail_scale);
    println!("  {:<18} {}", "pdftoppm:", settings.pdftoppm_path.display());
    println!("  {:<18} {}", "pdfinfo:", settings.pdfinfo_path.display());
    Ok(())
}

/// Print the config file in use.
pub fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{}", path.display()),
        None => {
            eprintln!("{} No config file found, using defaults", Mark::Warn);
            eprintln!(
                "  {} Create streamocr.toml in your config directory to override them",
                Mark::Detail
            );
        }
    }
    Ok(())
}
