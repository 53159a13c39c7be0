//! Provider table and layer registry.
//!
//! `PROVIDERS` describes how to reach each supported backend. A
//! [`LayerRegistry`] is the operator's ordered selection of provider + model
//! pairs, built once at startup and never mutated afterwards. Its order is the
//! fallback priority.

use std::collections::HashSet;
use std::time::Duration;

use onika_core::config::LayerConfig;
use onika_core::ConfigError;

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Which request/response schema a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST /chat/completions` with Bearer auth.
    OpenAiCompatible,
    /// `POST /messages` with `x-api-key` and `anthropic-version`.
    AnthropicMessages,
}

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, matching the `providers.<name>` config key.
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"OpenRouter"`.
    pub display_name: &'static str,
    /// Conventional environment variable for the API key.
    pub env_key: &'static str,
    /// API base used when the config doesn't override it.
    pub default_api_base: &'static str,
    pub wire_format: WireFormat,
    /// Aggregators front many models and want `HTTP-Referer` / `X-Title`.
    pub is_aggregator: bool,
}

/// Every provider a layer may reference.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openrouter",
        display_name: "OpenRouter",
        env_key: "OPENROUTER_API_KEY",
        default_api_base: "https://openrouter.ai/api/v1",
        wire_format: WireFormat::OpenAiCompatible,
        is_aggregator: true,
    },
    ProviderSpec {
        name: "groq",
        display_name: "Groq",
        env_key: "GROQ_API_KEY",
        default_api_base: "https://api.groq.com/openai/v1",
        wire_format: WireFormat::OpenAiCompatible,
        is_aggregator: false,
    },
    // Kimi
    ProviderSpec {
        name: "moonshot",
        display_name: "Moonshot",
        env_key: "MOONSHOT_API_KEY",
        default_api_base: "https://api.moonshot.cn/v1",
        wire_format: WireFormat::OpenAiCompatible,
        is_aggregator: false,
    },
    ProviderSpec {
        name: "deepseek",
        display_name: "DeepSeek",
        env_key: "DEEPSEEK_API_KEY",
        default_api_base: "https://api.deepseek.com/v1",
        wire_format: WireFormat::OpenAiCompatible,
        is_aggregator: false,
    },
    ProviderSpec {
        name: "gemini",
        display_name: "Gemini",
        env_key: "GEMINI_API_KEY",
        default_api_base: "https://generativelanguage.googleapis.com/v1beta/openai",
        wire_format: WireFormat::OpenAiCompatible,
        is_aggregator: false,
    },
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_api_base: "https://api.openai.com/v1",
        wire_format: WireFormat::OpenAiCompatible,
        is_aggregator: false,
    },
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        env_key: "ANTHROPIC_API_KEY",
        default_api_base: "https://api.anthropic.com/v1",
        wire_format: WireFormat::AnthropicMessages,
        is_aggregator: false,
    },
];

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

// ─────────────────────────────────────────────
// LayerDescriptor
// ─────────────────────────────────────────────

/// One resolved layer. Immutable once the registry is built.
#[derive(Clone, Debug)]
pub struct LayerDescriptor {
    /// 1-based try-order.
    pub ordinal: u32,
    pub display_name: String,
    pub model_id: String,
    pub is_free: bool,
    pub per_call_timeout: Duration,
    pub provider: &'static ProviderSpec,
    /// USD per million total tokens (paid layers only).
    pub rate_per_million_tokens: f64,
    pub max_tokens: Option<u32>,
    pub max_attempts: Option<u32>,
}

impl LayerDescriptor {
    /// Estimated cost of a call that used `total_tokens`. Free layers cost nothing.
    pub fn cost_for(&self, total_tokens: u64) -> f64 {
        if self.is_free {
            0.0
        } else {
            total_tokens as f64 / 1_000_000.0 * self.rate_per_million_tokens
        }
    }

    /// Attempts to make on this layer given the router-wide default.
    ///
    /// A per-layer override of zero still means one attempt.
    pub fn attempts(&self, default_attempts: u32) -> u32 {
        self.max_attempts.unwrap_or(default_attempts).max(1)
    }

    fn from_config(layer: &LayerConfig) -> Result<Self, ConfigError> {
        let provider =
            find_by_name(&layer.provider).ok_or_else(|| ConfigError::UnknownProvider {
                ordinal: layer.ordinal,
                provider: layer.provider.clone(),
            })?;
        if layer.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel(layer.ordinal));
        }
        if layer.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout(layer.ordinal));
        }
        if !layer.rate_per_million_tokens.is_finite() || layer.rate_per_million_tokens < 0.0 {
            return Err(ConfigError::InvalidRate(layer.ordinal));
        }

        let display_name = if layer.display_name.is_empty() {
            layer.model.clone()
        } else {
            layer.display_name.clone()
        };

        Ok(Self {
            ordinal: layer.ordinal,
            display_name,
            model_id: layer.model.clone(),
            is_free: layer.free,
            per_call_timeout: Duration::from_secs(layer.timeout_secs),
            provider,
            rate_per_million_tokens: layer.rate_per_million_tokens,
            max_tokens: layer.max_tokens,
            max_attempts: layer.max_attempts,
        })
    }
}

// ─────────────────────────────────────────────
// LayerRegistry
// ─────────────────────────────────────────────

/// The ordered, read-only list of layers.
#[derive(Clone, Debug)]
pub struct LayerRegistry {
    layers: Vec<LayerDescriptor>,
}

impl LayerRegistry {
    /// Build the registry from config, sorted by ordinal.
    ///
    /// Ordinals must be unique and dense starting at 1.
    pub fn from_config(layers: &[LayerConfig]) -> Result<Self, ConfigError> {
        if layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }

        let mut seen = HashSet::new();
        for layer in layers {
            if !seen.insert(layer.ordinal) {
                return Err(ConfigError::DuplicateOrdinal(layer.ordinal));
            }
        }

        let mut descriptors = layers
            .iter()
            .map(LayerDescriptor::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        descriptors.sort_by_key(|l| l.ordinal);

        for (expected, layer) in (1u32..).zip(&descriptors) {
            if layer.ordinal != expected {
                return Err(ConfigError::OrdinalGap {
                    expected,
                    found: layer.ordinal,
                });
            }
        }

        Ok(Self { layers: descriptors })
    }

    /// All layers, ascending by ordinal.
    pub fn list(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    /// Look up a layer by ordinal.
    pub fn get(&self, ordinal: u32) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.ordinal == ordinal)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use onika_core::config::schema::default_layers;

    fn layer(ordinal: u32, provider: &str) -> LayerConfig {
        LayerConfig {
            ordinal,
            display_name: format!("Layer {ordinal}"),
            provider: provider.to_string(),
            model: "some-model".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("groq").unwrap();
        assert_eq!(spec.display_name, "Groq");
        assert_eq!(spec.env_key, "GROQ_API_KEY");
        assert!(find_by_name("litellm").is_none());
    }

    #[test]
    fn test_env_overrides_cover_every_provider() {
        use onika_core::config::PROVIDER_ENV;

        assert_eq!(PROVIDER_ENV.len(), PROVIDERS.len());
        for spec in PROVIDERS {
            let entry = PROVIDER_ENV.iter().find(|(name, _, _)| *name == spec.name);
            let Some((_, segment, conventional)) = entry else {
                panic!("no env override entry for {}", spec.name);
            };
            assert_eq!(*conventional, spec.env_key, "{}", spec.name);
            assert_eq!(*segment, spec.name.to_uppercase(), "{}", spec.name);
        }
    }

    #[test]
    fn test_only_anthropic_speaks_messages_api() {
        for spec in PROVIDERS {
            let expected = if spec.name == "anthropic" {
                WireFormat::AnthropicMessages
            } else {
                WireFormat::OpenAiCompatible
            };
            assert_eq!(spec.wire_format, expected, "{}", spec.name);
        }
    }

    #[test]
    fn test_openrouter_is_the_aggregator() {
        let aggregators: Vec<&str> = PROVIDERS
            .iter()
            .filter(|s| s.is_aggregator)
            .map(|s| s.name)
            .collect();
        assert_eq!(aggregators, vec!["openrouter"]);
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let mut names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total, "Duplicate provider names found");
    }

    #[test]
    fn test_default_layers_build() {
        let registry = LayerRegistry::from_config(&default_layers()).unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.get(4).is_some_and(|l| !l.is_free));
        assert_eq!(registry.get(3).unwrap().provider.name, "groq");
    }

    #[test]
    fn test_list_is_sorted_by_ordinal() {
        let registry =
            LayerRegistry::from_config(&[layer(3, "groq"), layer(1, "openrouter"), layer(2, "gemini")])
                .unwrap();
        let ordinals: Vec<u32> = registry.list().iter().map(|l| l.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(LayerRegistry::from_config(&[]).unwrap_err(), ConfigError::NoLayers);
    }

    #[test]
    fn test_rejects_duplicate_ordinal() {
        let err = LayerRegistry::from_config(&[layer(1, "groq"), layer(1, "openai")]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateOrdinal(1));
    }

    #[test]
    fn test_rejects_gap() {
        let err = LayerRegistry::from_config(&[layer(1, "groq"), layer(3, "openai")]).unwrap_err();
        assert_eq!(err, ConfigError::OrdinalGap { expected: 2, found: 3 });
    }

    #[test]
    fn test_rejects_zero_based() {
        let err = LayerRegistry::from_config(&[layer(0, "groq")]).unwrap_err();
        assert_eq!(err, ConfigError::OrdinalGap { expected: 1, found: 0 });
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = LayerRegistry::from_config(&[layer(1, "mystery")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider { ordinal: 1, .. }));
    }

    #[test]
    fn test_rejects_zero_timeout_and_empty_model() {
        let mut zero = layer(1, "groq");
        zero.timeout_secs = 0;
        assert_eq!(LayerRegistry::from_config(&[zero]).unwrap_err(), ConfigError::ZeroTimeout(1));

        let mut blank = layer(1, "groq");
        blank.model = "  ".into();
        assert_eq!(LayerRegistry::from_config(&[blank]).unwrap_err(), ConfigError::EmptyModel(1));
    }

    #[test]
    fn test_display_name_falls_back_to_model() {
        let mut cfg = layer(1, "groq");
        cfg.display_name.clear();
        let registry = LayerRegistry::from_config(&[cfg]).unwrap();
        assert_eq!(registry.list()[0].display_name, "some-model");
    }

    #[test]
    fn test_cost_for_paid_and_free() {
        let mut paid = layer(1, "anthropic");
        paid.free = false;
        paid.rate_per_million_tokens = 3.0;
        let mut free = layer(2, "groq");
        free.rate_per_million_tokens = 3.0;

        let registry = LayerRegistry::from_config(&[paid, free]).unwrap();
        let cost = registry.get(1).unwrap().cost_for(500_000);
        assert!((cost - 1.5).abs() < 1e-9);
        assert_eq!(registry.get(2).unwrap().cost_for(500_000), 0.0);
    }

    #[test]
    fn test_attempts_override() {
        let mut once = layer(1, "groq");
        once.max_attempts = Some(0);
        let mut thrice = layer(2, "groq");
        thrice.max_attempts = Some(3);
        let registry = LayerRegistry::from_config(&[once, thrice, layer(3, "groq")]).unwrap();

        assert_eq!(registry.get(1).unwrap().attempts(2), 1);
        assert_eq!(registry.get(2).unwrap().attempts(2), 3);
        assert_eq!(registry.get(3).unwrap().attempts(2), 2);
    }
}
