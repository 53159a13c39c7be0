//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `layers`, `RouterSettings`,
//! `BudgetConfig`, `ChannelsConfig`, `AppConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ConfigError;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.onika/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    /// Layers in fallback order. Ordinals must be unique and dense.
    pub layers: Vec<LayerConfig>,
    pub router: RouterSettings,
    pub budget: BudgetConfig,
    pub channels: ChannelsConfig,
    pub app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            layers: default_layers(),
            router: RouterSettings::default(),
            budget: BudgetConfig::default(),
            channels: ChannelsConfig::default(),
            app: AppConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Credentials and endpoint for a single provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations, one per entry in the provider table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub moonshot: ProviderConfig,
    #[serde(default)]
    pub deepseek: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub anthropic: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openrouter" => Some(&self.openrouter),
            "groq" => Some(&self.groq),
            "moonshot" => Some(&self.moonshot),
            "deepseek" => Some(&self.deepseek),
            "gemini" => Some(&self.gemini),
            "openai" => Some(&self.openai),
            "anthropic" => Some(&self.anthropic),
            _ => None,
        }
    }

    /// Mutable access by name, used by env overrides.
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "openrouter" => Some(&mut self.openrouter),
            "groq" => Some(&mut self.groq),
            "moonshot" => Some(&mut self.moonshot),
            "deepseek" => Some(&mut self.deepseek),
            "gemini" => Some(&mut self.gemini),
            "openai" => Some(&mut self.openai),
            "anthropic" => Some(&mut self.anthropic),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Layers
// ─────────────────────────────────────────────

/// One layer: a provider + model at a fixed position in the fallback order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerConfig {
    /// 1-based try-order.
    pub ordinal: u32,
    /// Human-readable name for status output.
    pub display_name: String,
    /// Key into the provider table (e.g. `"openrouter"`).
    pub provider: String,
    /// Model identifier sent upstream.
    pub model: String,
    /// Free layers are never gated by the budget and always cost zero.
    pub free: bool,
    /// Hard per-call deadline in seconds.
    pub timeout_secs: u64,
    /// USD per million total tokens. Ignored for free layers.
    pub rate_per_million_tokens: f64,
    /// Output token cap; falls back to `router.maxTokensFree`/`maxTokensPaid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Attempts for this layer; falls back to `router.maxRetries`.
    /// Zero means "try once".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            ordinal: 0,
            display_name: String::new(),
            provider: String::new(),
            model: String::new(),
            free: true,
            timeout_secs: 30,
            rate_per_million_tokens: 0.0,
            max_tokens: None,
            max_attempts: None,
        }
    }
}

impl LayerConfig {
    fn new(ordinal: u32, display_name: &str, provider: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            ordinal,
            display_name: display_name.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            timeout_secs,
            ..Default::default()
        }
    }
}

/// The stock four-layer table: three free tiers, then a paid fallback.
pub fn default_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig::new(1, "Kimi K2", "openrouter", "moonshotai/kimi-k2:free", 30),
        LayerConfig::new(
            2,
            "DeepSeek V3",
            "openrouter",
            "deepseek/deepseek-chat-v3-0324:free",
            30,
        ),
        LayerConfig::new(3, "Llama 3.3 70B", "groq", "llama-3.3-70b-versatile", 20),
        LayerConfig {
            free: false,
            rate_per_million_tokens: 3.0,
            ..LayerConfig::new(4, "Claude Sonnet", "anthropic", "claude-3-5-sonnet-latest", 45)
        },
    ]
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Default persona sent as the system prompt on every call.
pub const DEFAULT_PERSONA: &str = "你是 ÖNIKA LI，摇滚风格AI助手，简洁有力，偶尔用emoji。";

/// Default apology shown to the user when every layer failed.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "⚠️ 所有AI层都暂时不可用，请稍后再试。";

/// Retry, backoff, and request-shaping settings for the router.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterSettings {
    /// Attempts per layer before falling through. Must be ≥ 1.
    pub max_retries: u32,
    /// Fixed wait between attempts on the same layer.
    pub backoff_ms: u64,
    /// How many trailing error strings a failure carries.
    pub error_log_size: usize,
    /// Output token cap for free layers.
    pub max_tokens_free: u32,
    /// Output token cap for paid layers.
    pub max_tokens_paid: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// System prompt.
    pub persona: String,
    /// User-facing message when all layers are exhausted.
    pub fallback_message: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 1000,
            error_log_size: 4,
            max_tokens_free: 2048,
            max_tokens_paid: 1024,
            temperature: 0.7,
            persona: DEFAULT_PERSONA.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl RouterSettings {
    /// Reject settings the router cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidRetries);
        }
        if self.error_log_size == 0 {
            return Err(ConfigError::InvalidErrorLogSize);
        }
        if self.max_tokens_paid > self.max_tokens_free {
            return Err(ConfigError::PaidTokensAboveFree {
                paid: self.max_tokens_paid,
                free: self.max_tokens_free,
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Budget
// ─────────────────────────────────────────────

/// Daily spend ceiling for paid layers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetConfig {
    /// USD per day.
    pub daily_limit: f64,
    /// Hour of day (UTC) at which accrued spend resets.
    pub reset_hour_utc: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limit: 1.0,
            reset_hour_utc: 0,
        }
    }
}

impl BudgetConfig {
    /// Reject a negative or non-finite limit and an out-of-range hour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.daily_limit.is_finite() || self.daily_limit < 0.0 {
            return Err(ConfigError::InvalidDailyLimit);
        }
        if self.reset_hour_utc >= 24 {
            return Err(ConfigError::InvalidResetHour(self.reset_hour_utc));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────

/// All channel configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Telegram channel config.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// Abandon a route that has not finished after this many seconds.
    pub reply_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            allowed_users: Vec::new(),
            reply_timeout_secs: 120,
        }
    }
}

// ─────────────────────────────────────────────
// App identity
// ─────────────────────────────────────────────

/// Attribution sent to aggregator providers (`HTTP-Referer`, `X-Title`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub referer: String,
    pub title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            referer: "https://onikali.vercel.app".to_string(),
            title: "ONIKA LI".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
