//! `onika status` — config path, layer table, budget and provider keys.

use anyhow::Result;
use colored::Colorize;

use onika_core::config::{get_config_path, load_config};
use onika_providers::PROVIDERS;
use onika_router::{StatusReporter, StatusView};

use crate::helpers::display_path;

pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🎸 Onika Status".magenta().bold());
    println!();

    println!(
        "  {:<12} {} {}",
        "Config:".bold(),
        display_path(&config_path),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );
    println!(
        "  {:<12} {} retries · {}ms backoff · temp {}",
        "Router:".bold(),
        config.router.max_retries,
        config.router.backoff_ms,
        config.router.temperature
    );

    match crate::build_router(&config) {
        Ok(router) => print_view(&StatusReporter::for_router(&router).snapshot()),
        Err(e) => {
            println!();
            println!("  {} {e:#}", "✗ Invalid configuration:".red().bold());
        }
    }

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let configured = config
            .providers
            .get_by_name(spec.name)
            .is_some_and(|p| p.is_configured());
        let status = if configured {
            format!("{} (key set)", "✓".green())
        } else {
            format!("· not configured (set {})", spec.env_key)
                .dimmed()
                .to_string()
        };
        println!("    {:<12} {}", spec.display_name, status);
    }

    let telegram = if config.channels.telegram.token.is_empty() {
        format!("{}", "· not configured".dimmed())
    } else {
        format!("{} (token set)", "✓".green())
    };
    println!();
    println!("  {:<12} {}", "Telegram:".bold(), telegram);
    println!();

    Ok(())
}

fn print_view(view: &StatusView) {
    println!();
    println!("  {}", "Layers:".bold());
    for layer in &view.layers {
        let tier = if layer.is_free {
            "free".green()
        } else {
            "paid".yellow()
        };
        let mark = if layer.configured {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!(
            "    {mark} {}. {:<16} {} {} [{tier}]",
            layer.ordinal,
            layer.display_name,
            layer.model_id.dimmed(),
            format!("via {}", layer.provider).dimmed(),
        );
    }

    println!();
    println!(
        "  {:<12} ${:.4} spent of ${:.2} · ${:.4} remaining",
        "Budget:".bold(),
        view.accrued,
        view.daily_limit,
        view.remaining
    );
}
