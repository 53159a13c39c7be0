//! `onika onboard` — write the default config and data directories.

use anyhow::{Context, Result};
use colored::Colorize;

use onika_core::config::{get_config_path, save_config, Config};
use onika_core::utils::get_history_path;
use onika_providers::PROVIDERS;

use crate::helpers::display_path;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🎸 Onika — Setup".magenta().bold());
    println!();

    let config_path = get_config_path();
    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            display_path(&config_path)
        );
    } else {
        save_config(&Config::default(), Some(&config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            display_path(&config_path)
        );
    }

    if let Some(history_dir) = get_history_path().parent() {
        std::fs::create_dir_all(history_dir)
            .with_context(|| format!("failed to create {}", history_dir.display()))?;
    }

    println!();
    println!("  {}", "Next steps:".bold());
    println!("    1. Add API keys to the config, or export them:");
    for spec in PROVIDERS {
        println!("         {}", spec.env_key.dimmed());
    }
    println!("    2. Check the layer table:  {}", "onika status".cyan());
    println!("    3. Try it:                 {}", "onika ask -m \"hello\"".cyan());
    println!();

    Ok(())
}
