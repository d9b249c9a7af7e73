//! Server health check.

use console::style;

use streamocr::config::Settings;

use super::build_client;
use crate::cli::icons::Mark;

pub async fn cmd_health(settings: &Settings) -> anyhow::Result<()> {
    let client = build_client(settings)?;

    match client.health().await {
        Ok(health) => {
            println!(
                "{} {} is {}",
                Mark::Ok,
                style(client.base_url()).bold(),
                health.status
            );
            if !health.model.is_empty() {
                println!("  {} Model: {}", Mark::Detail, health.model);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {} is unreachable: {}", Mark::Fail, client.base_url(), e);
            Err(e.into())
        }
    }
}
