//! Config loader — reads `~/.onika/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.onika/config.json`
//! 3. Environment variables `ONIKA_<SECTION>__<FIELD>` (override JSON)
//! 4. Conventional credential variables (`GROQ_API_KEY`, `TELEGRAM_TOKEN`, …),
//!    only where the value is still empty

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Provider names paired with their `ONIKA_PROVIDERS__<NAME>` segment and
/// conventional API key variable.
pub const PROVIDER_ENV: &[(&str, &str, &str)] = &[
    ("openrouter", "OPENROUTER", "OPENROUTER_API_KEY"),
    ("groq", "GROQ", "GROQ_API_KEY"),
    ("moonshot", "MOONSHOT", "MOONSHOT_API_KEY"),
    ("deepseek", "DEEPSEEK", "DEEPSEEK_API_KEY"),
    ("gemini", "GEMINI", "GEMINI_API_KEY"),
    ("openai", "OPENAI", "OPENAI_API_KEY"),
    ("anthropic", "ANTHROPIC", "ANTHROPIC_API_KEY"),
];

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `ONIKA_ROUTER__MAX_RETRIES`, `ONIKA_ROUTER__BACKOFF_MS`
/// - `ONIKA_BUDGET__DAILY_LIMIT`, `ONIKA_BUDGET__RESET_HOUR_UTC`
/// - `ONIKA_PROVIDERS__<NAME>__API_KEY`, `ONIKA_PROVIDERS__<NAME>__API_BASE`
/// - `ONIKA_CHANNELS__TELEGRAM__TOKEN`
///
/// Unparseable numeric values are ignored with a warning.
fn apply_env_overrides(mut config: Config) -> Config {
    if let Some(n) = env_parse::<u32>("ONIKA_ROUTER__MAX_RETRIES") {
        config.router.max_retries = n;
    }
    if let Some(ms) = env_parse::<u64>("ONIKA_ROUTER__BACKOFF_MS") {
        config.router.backoff_ms = ms;
    }
    if let Some(limit) = env_parse::<f64>("ONIKA_BUDGET__DAILY_LIMIT") {
        config.budget.daily_limit = limit;
    }
    if let Some(hour) = env_parse::<u32>("ONIKA_BUDGET__RESET_HOUR_UTC") {
        config.budget.reset_hour_utc = hour;
    }

    for (name, segment, conventional) in PROVIDER_ENV {
        if let Some(provider) = config.providers.get_by_name_mut(name) {
            if let Ok(val) = std::env::var(format!("ONIKA_PROVIDERS__{segment}__API_KEY")) {
                provider.api_key = val;
            }
            if let Ok(val) = std::env::var(format!("ONIKA_PROVIDERS__{segment}__API_BASE")) {
                provider.api_base = Some(val);
            }
            if provider.api_key.is_empty() {
                if let Ok(val) = std::env::var(conventional) {
                    provider.api_key = val;
                }
            }
        }
    }

    if let Ok(val) = std::env::var("ONIKA_CHANNELS__TELEGRAM__TOKEN") {
        config.channels.telegram.token = val;
    }
    if config.channels.telegram.token.is_empty() {
        if let Ok(val) = std::env::var("TELEGRAM_TOKEN") {
            config.channels.telegram.token = val;
        }
    }

    config
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
