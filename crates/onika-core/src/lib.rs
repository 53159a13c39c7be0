//! Onika core — shared types, configuration, and utilities.
//!
//! - **types**: chat-completion wire types for the OpenAI-compatible and
//!   Anthropic Messages protocols
//! - **config**: JSON config schema, loader, and env var overrides
//! - **error**: startup configuration errors
//! - **utils**: paths and string helpers

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::ConfigError;
