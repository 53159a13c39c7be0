//! Upstream layer for Onika: who to call, and how.
//!
//! # Architecture
//!
//! - [`registry`] — static provider table and the ordered [`LayerRegistry`]
//! - [`traits::UpstreamClient`] — one chat-completion attempt against one layer
//! - [`http_provider::HttpUpstream`] — reqwest-backed client for the
//!   OpenAI-compatible and Anthropic Messages wire formats
//! - [`error::AttemptError`] — why an attempt failed

pub mod error;
pub mod http_provider;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use error::AttemptError;
pub use http_provider::HttpUpstream;
pub use registry::{LayerDescriptor, LayerRegistry, ProviderSpec, WireFormat, PROVIDERS};
pub use traits::{AttemptResult, UpstreamClient};
