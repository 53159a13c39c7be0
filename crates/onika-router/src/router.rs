//! Free-first layer router.
//!
//! A route walks the registry in ordinal order. Each layer is gated by the
//! budget and by credential availability, then tried up to its attempt count
//! with a fixed backoff between tries. The first success wins. Upstream
//! problems never escape as errors: an exhausted route is a
//! [`RouteOutcome::Failure`] carrying the tail of the error log and the
//! user-facing apology.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use onika_core::config::RouterSettings;
use onika_core::ConfigError;
use onika_providers::{AttemptError, LayerDescriptor, LayerRegistry, UpstreamClient};

use crate::budget::BudgetTracker;

// ─────────────────────────────────────────────
// RouteOutcome
// ─────────────────────────────────────────────

/// Result of one route, handed back to the adapter that asked.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RouteOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        layer_ordinal: u32,
        model_id: String,
        content: String,
        latency: Duration,
        cost: f64,
        is_free: bool,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        /// Oldest first, at most `error_log_size` entries.
        attempted_errors: Vec<String>,
        fallback_message: String,
    },
}

impl RouteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RouteOutcome::Success { .. })
    }

    /// Text to show the user: the answer, or the fallback message.
    pub fn reply_text(&self) -> &str {
        match self {
            RouteOutcome::Success { content, .. } => content,
            RouteOutcome::Failure {
                fallback_message, ..
            } => fallback_message,
        }
    }

    /// Ordinal of the layer that answered, if any.
    pub fn layer_ordinal(&self) -> Option<u32> {
        match self {
            RouteOutcome::Success { layer_ordinal, .. } => Some(*layer_ordinal),
            RouteOutcome::Failure { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Routes one message at a time; share it behind an `Arc` for concurrency.
pub struct Router {
    registry: Arc<LayerRegistry>,
    budget: Arc<BudgetTracker>,
    client: Arc<dyn UpstreamClient>,
    settings: RouterSettings,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("layers", &self.registry.len())
            .field("budget", &self.budget)
            .field("max_retries", &self.settings.max_retries)
            .finish()
    }
}

impl Router {
    /// Create a router. Fails only on invalid settings.
    pub fn new(
        registry: Arc<LayerRegistry>,
        budget: Arc<BudgetTracker>,
        client: Arc<dyn UpstreamClient>,
        settings: RouterSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            registry,
            budget,
            client,
            settings,
        })
    }

    pub fn registry(&self) -> &Arc<LayerRegistry> {
        &self.registry
    }

    pub fn budget(&self) -> &Arc<BudgetTracker> {
        &self.budget
    }

    pub fn client(&self) -> &Arc<dyn UpstreamClient> {
        &self.client
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Route `message` through the layers until one answers.
    pub async fn route(&self, message: &str) -> RouteOutcome {
        let mut errors = Vec::new();
        let backoff = Duration::from_millis(self.settings.backoff_ms);

        for layer in self.registry.list() {
            if let Some(skip) = self.skip_reason(layer) {
                debug!(layer = layer.ordinal, reason = %skip, "Skipping layer");
                errors.push(format!("layer {}: {}", layer.ordinal, skip));
                continue;
            }

            let attempts = layer.attempts(self.settings.max_retries);
            for attempt in 1..=attempts {
                let result = self.client.call(layer, message).await;

                if result.succeeded {
                    if !layer.is_free {
                        self.budget.charge(result.cost);
                    }
                    info!(
                        layer = layer.ordinal,
                        attempt,
                        model = %result.model_id,
                        latency_ms = result.latency.as_millis() as u64,
                        cost = result.cost,
                        "Route answered"
                    );
                    return RouteOutcome::Success {
                        layer_ordinal: layer.ordinal,
                        model_id: result.model_id,
                        content: result.content,
                        latency: result.latency,
                        cost: result.cost,
                        is_free: layer.is_free,
                    };
                }

                let reason = result
                    .failure_reason()
                    .unwrap_or_else(|| "unknown error".to_string());
                errors.push(format!(
                    "layer {} retry {}: {}",
                    layer.ordinal, attempt, reason
                ));

                if attempt < attempts && !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }

            debug!(layer = layer.ordinal, attempts, "Layer exhausted, falling through");
        }

        let keep = self.settings.error_log_size;
        let attempted_errors = errors.split_off(errors.len().saturating_sub(keep));
        warn!(errors = ?attempted_errors, "All layers exhausted");

        RouteOutcome::Failure {
            attempted_errors,
            fallback_message: self.settings.fallback_message.clone(),
        }
    }

    fn skip_reason(&self, layer: &LayerDescriptor) -> Option<AttemptError> {
        if !self.budget.is_eligible(layer) {
            Some(AttemptError::BudgetExceeded)
        } else if !self.client.is_available(layer) {
            Some(AttemptError::NotConfigured)
        } else {
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
