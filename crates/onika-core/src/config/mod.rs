//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use onika_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Layers: {}", cfg.layers.len());
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config, PROVIDER_ENV};
pub use schema::{
    AppConfig, BudgetConfig, Config, LayerConfig, ProviderConfig, ProvidersConfig,
    RouterSettings, TelegramConfig,
};
