//! The upstream client abstraction.
//!
//! The router only ever talks to an [`UpstreamClient`]; the reqwest-backed
//! [`HttpUpstream`](crate::http_provider::HttpUpstream) is the production
//! implementation and tests substitute fakes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AttemptError;
use crate::registry::LayerDescriptor;

/// Outcome of one upstream call against one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptResult {
    pub layer_ordinal: u32,
    pub model_id: String,
    /// Assistant text. Empty on failure.
    pub content: String,
    /// Wall-clock time of the attempt, measured on both paths.
    pub latency: Duration,
    /// USD. Zero for free layers and failures.
    pub cost: f64,
    pub succeeded: bool,
    pub failure: Option<AttemptError>,
}

impl AttemptResult {
    pub fn success(
        layer: &LayerDescriptor,
        content: impl Into<String>,
        latency: Duration,
        cost: f64,
    ) -> Self {
        Self {
            layer_ordinal: layer.ordinal,
            model_id: layer.model_id.clone(),
            content: content.into(),
            latency,
            cost,
            succeeded: true,
            failure: None,
        }
    }

    pub fn failure(layer: &LayerDescriptor, error: AttemptError, latency: Duration) -> Self {
        Self {
            layer_ordinal: layer.ordinal,
            model_id: layer.model_id.clone(),
            content: String::new(),
            latency,
            cost: 0.0,
            succeeded: false,
            failure: Some(error),
        }
    }

    /// Human-readable failure reason, if the attempt failed.
    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Issues a single chat-completion call to a single layer.
///
/// Implementations must enforce `layer.per_call_timeout`, never panic, and
/// report every upstream problem as a failed [`AttemptResult`] instead of
/// an error. They must not touch budget state.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Send `message` (with the configured persona) to `layer`.
    async fn call(&self, layer: &LayerDescriptor, message: &str) -> AttemptResult;

    /// Whether `layer`'s provider has credentials. Checked before each layer
    /// so unconfigured layers cost no network round-trip.
    fn is_available(&self, _layer: &LayerDescriptor) -> bool {
        true
    }
}
