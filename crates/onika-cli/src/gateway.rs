//! `onika gateway` — chat channels plus the daily budget rollover.
//!
//! Startup sequence:
//! 1. Load config, build the router
//! 2. Start the budget rollover task
//! 3. Register enabled channels
//! 4. Run until a channel exits or Ctrl+C

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use onika_channels::Channel;
use onika_core::config::load_config;
use onika_router::BudgetRollover;

use crate::helpers;

pub async fn run() -> Result<()> {
    println!();
    println!("  🎸 Onika — Gateway");
    println!();

    let config = load_config(None);
    let router = crate::build_router(&config)?;

    let rollover = Arc::new(BudgetRollover::new(
        router.budget().clone(),
        config.budget.reset_hour_utc,
    ));

    #[allow(unused_mut)]
    let mut channels: Vec<Arc<dyn Channel>> = Vec::new();

    #[cfg(feature = "telegram")]
    {
        let tg = &config.channels.telegram;
        if !tg.token.is_empty() {
            use onika_channels::telegram::TelegramChannel;
            channels.push(Arc::new(TelegramChannel::new(tg, router.clone())));
            info!("registered telegram channel");
        }
    }

    let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
    info!(
        layers = router.registry().len(),
        channels = ?names,
        reset_hour_utc = config.budget.reset_hour_utc,
        "gateway starting"
    );

    println!("  Layers:    {}", router.registry().len());
    println!(
        "  Budget:    ${:.2}/day, resets {:02}:00 UTC",
        config.budget.daily_limit, config.budget.reset_hour_utc
    );
    println!("  Channels:  {} registered", channels.len());
    println!("  Config:    {}", helpers::display_path(&onika_core::config::get_config_path()));
    println!();

    if channels.is_empty() {
        println!("  ⚠  No channels registered. Set channels.telegram.token (or");
        println!("     TELEGRAM_TOKEN) and build with --features telegram.");
        println!();
    }

    println!("  Ctrl+C to stop");
    println!();

    let channel_tasks = run_channels(channels.clone());

    tokio::select! {
        result = rollover.start() => {
            if let Err(e) = result {
                error!(error = %e, "budget rollover error");
            }
        }
        _ = channel_tasks => {
            info!("all channels exited");
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
        }
    }

    rollover.stop();
    for channel in &channels {
        if let Err(e) = channel.stop().await {
            error!(channel = channel.name(), error = %e, "failed to stop channel");
        }
    }

    Ok(())
}

/// Run every channel's `start()` concurrently; resolve once all return.
/// With no channels this never resolves, leaving the gateway to Ctrl+C.
async fn run_channels(channels: Vec<Arc<dyn Channel>>) {
    if channels.is_empty() {
        std::future::pending::<()>().await;
    }

    let mut tasks = tokio::task::JoinSet::new();
    for channel in channels {
        tasks.spawn(async move {
            if let Err(e) = channel.start().await {
                error!(channel = channel.name(), error = %e, "channel error");
            }
        });
    }
    while tasks.join_next().await.is_some() {}
}
