//! Shared CLI helpers — outcome printing, banner, path display.

use std::path::Path;

use colored::Colorize;

use onika_router::RouteOutcome;

/// One-line summary of who answered and what it cost.
pub fn outcome_meta(outcome: &RouteOutcome) -> Option<String> {
    match outcome {
        RouteOutcome::Success {
            layer_ordinal,
            model_id,
            latency,
            cost,
            is_free,
            ..
        } => {
            let price = if *is_free {
                "free".to_string()
            } else {
                format!("${cost:.6}")
            };
            Some(format!(
                "Layer {layer_ordinal} · {model_id} · {:.2}s · {price}",
                latency.as_secs_f64()
            ))
        }
        RouteOutcome::Failure { .. } => None,
    }
}

/// Print a route outcome to stdout. Failure details go to stderr.
pub fn print_outcome(outcome: &RouteOutcome) {
    println!();
    println!("{}", "🎸 ÖNIKA LI".magenta().bold());
    match outcome {
        RouteOutcome::Success { content, .. } => {
            if content.trim().is_empty() {
                println!("{}", "(empty answer)".dimmed());
            } else {
                println!("{content}");
            }
            if let Some(meta) = outcome_meta(outcome) {
                println!("{}", meta.dimmed());
            }
        }
        RouteOutcome::Failure {
            attempted_errors,
            fallback_message,
        } => {
            println!("{}", fallback_message.yellow());
            for error in attempted_errors {
                eprintln!("  {} {}", "✗".red(), error.dimmed());
            }
        }
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🎸 Onika".magenta().bold(), version.dimmed());
    println!("{}", "Type a message, or \"exit\" to quit.".dimmed());
    println!();
}

/// Print a "routing" placeholder while a request is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ routing...".dimmed());
}

pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Show `path` with the home directory abbreviated to `~`.
pub fn display_path(path: &Path) -> String {
    if let Some(home) = dirs_next::home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            return Path::new("~").join(rest).display().to_string();
        }
    }
    path.display().to_string()
}
