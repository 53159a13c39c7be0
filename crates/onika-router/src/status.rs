//! Read-only view of the layer table and today's budget.

use std::fmt::Write;
use std::sync::Arc;

use serde::Serialize;

use onika_core::utils::escape_html;
use onika_providers::{LayerRegistry, UpstreamClient};

use crate::budget::BudgetTracker;
use crate::router::Router;

/// One row of the status table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStatus {
    pub ordinal: u32,
    pub display_name: String,
    pub model_id: String,
    /// Provider display name, e.g. `"OpenRouter"`.
    pub provider: String,
    pub is_free: bool,
    /// Whether the provider has credentials.
    pub configured: bool,
}

/// Point-in-time snapshot. Two snapshots with no charge or reset in between
/// compare equal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub layers: Vec<LayerStatus>,
    pub daily_limit: f64,
    pub accrued: f64,
    pub remaining: f64,
}

impl StatusView {
    /// Plain text for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::from("Layers:\n");
        for layer in &self.layers {
            let _ = writeln!(
                out,
                "  {}. {} ({}) via {} [{}]{}",
                layer.ordinal,
                layer.display_name,
                layer.model_id,
                layer.provider,
                if layer.is_free { "free" } else { "paid" },
                if layer.configured { "" } else { " (not configured)" },
            );
        }
        let _ = write!(
            out,
            "Budget: ${:.4} spent of ${:.2}, ${:.4} remaining",
            self.accrued, self.daily_limit, self.remaining
        );
        out
    }

    /// Telegram HTML.
    pub fn render_html(&self) -> String {
        let mut out = String::from("<b>🎸 ÖNIKA LI status</b>\n\n");
        for layer in &self.layers {
            let icon = if !layer.configured {
                "⚪"
            } else if layer.is_free {
                "🟢"
            } else {
                "💰"
            };
            let _ = writeln!(
                out,
                "{icon} <b>Layer {}</b>: {} <code>{}</code>",
                layer.ordinal,
                escape_html(&layer.display_name),
                escape_html(&layer.model_id),
            );
        }
        let _ = write!(
            out,
            "\n💵 Budget: <code>${:.4}</code> / <code>${:.2}</code> (remaining <code>${:.4}</code>)",
            self.accrued, self.daily_limit, self.remaining
        );
        out
    }
}

/// Builds [`StatusView`]s from the shared router state.
#[derive(Clone)]
pub struct StatusReporter {
    registry: Arc<LayerRegistry>,
    budget: Arc<BudgetTracker>,
    client: Arc<dyn UpstreamClient>,
}

impl StatusReporter {
    pub fn new(
        registry: Arc<LayerRegistry>,
        budget: Arc<BudgetTracker>,
        client: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            registry,
            budget,
            client,
        }
    }

    /// Reporter sharing a router's registry, budget and client.
    pub fn for_router(router: &Router) -> Self {
        Self::new(
            router.registry().clone(),
            router.budget().clone(),
            router.client().clone(),
        )
    }

    pub fn snapshot(&self) -> StatusView {
        let layers = self
            .registry
            .list()
            .iter()
            .map(|layer| LayerStatus {
                ordinal: layer.ordinal,
                display_name: layer.display_name.clone(),
                model_id: layer.model_id.clone(),
                provider: layer.provider.display_name.to_string(),
                is_free: layer.is_free,
                configured: self.client.is_available(layer),
            })
            .collect();

        StatusView {
            layers,
            daily_limit: self.budget.daily_limit(),
            accrued: self.budget.accrued(),
            remaining: self.budget.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use onika_core::config::schema::default_layers;
    use onika_providers::{AttemptError, AttemptResult, LayerDescriptor};
    use std::time::Duration;

    /// Only groq has credentials.
    struct GroqOnly;

    #[async_trait]
    impl UpstreamClient for GroqOnly {
        async fn call(&self, layer: &LayerDescriptor, _message: &str) -> AttemptResult {
            AttemptResult::failure(layer, AttemptError::NotConfigured, Duration::ZERO)
        }

        fn is_available(&self, layer: &LayerDescriptor) -> bool {
            layer.provider.name == "groq"
        }
    }

    fn reporter(budget: Arc<BudgetTracker>) -> StatusReporter {
        StatusReporter::new(
            Arc::new(LayerRegistry::from_config(&default_layers()).unwrap()),
            budget,
            Arc::new(GroqOnly),
        )
    }

    #[test]
    fn test_snapshot_lists_layers_in_order() {
        let view = reporter(Arc::new(BudgetTracker::new(1.0))).snapshot();

        let ordinals: Vec<u32> = view.layers.iter().map(|l| l.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
        assert_eq!(view.layers[0].provider, "OpenRouter");
        assert!(!view.layers[0].configured);
        assert!(view.layers[2].configured);
        assert!(!view.layers[3].is_free);
    }

    #[test]
    fn test_snapshot_is_stable_without_changes() {
        let budget = Arc::new(BudgetTracker::new(1.0));
        budget.charge(0.2);
        let reporter = reporter(budget);
        assert_eq!(reporter.snapshot(), reporter.snapshot());
    }

    #[test]
    fn test_snapshot_reflects_budget() {
        let budget = Arc::new(BudgetTracker::new(1.0));
        let reporter = reporter(budget.clone());

        budget.charge(1.5);
        let view = reporter.snapshot();
        assert_eq!(view.accrued, 1.5);
        assert_eq!(view.remaining, 0.0);

        budget.reset();
        assert_eq!(reporter.snapshot().remaining, 1.0);
    }

    #[test]
    fn test_render_text() {
        let text = reporter(Arc::new(BudgetTracker::new(1.0))).snapshot().render_text();
        assert!(text.contains("1. Kimi K2 (moonshotai/kimi-k2:free) via OpenRouter [free] (not configured)"));
        assert!(text.contains("3. Llama 3.3 70B (llama-3.3-70b-versatile) via Groq [free]\n"));
        assert!(text.contains("[paid]"));
        assert!(text.ends_with("Budget: $0.0000 spent of $1.00, $1.0000 remaining"));
    }

    #[test]
    fn test_render_html_escapes() {
        let mut view = reporter(Arc::new(BudgetTracker::new(1.0))).snapshot();
        view.layers[0].display_name = "<Kimi & co>".into();
        let html = view.render_html();
        assert!(html.contains("&lt;Kimi &amp; co&gt;"));
        assert!(html.contains("<b>Layer 4</b>"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(reporter(Arc::new(BudgetTracker::new(1.0))).snapshot())
            .unwrap();
        assert_eq!(json["dailyLimit"], 1.0);
        assert_eq!(json["layers"][0]["modelId"], "moonshotai/kimi-k2:free");
        assert_eq!(json["layers"][3]["isFree"], false);
    }
}
