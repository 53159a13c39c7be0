//! reqwest-backed upstream client.
//!
//! One `HttpUpstream` serves every layer. It holds a single pooled
//! `reqwest::Client` plus a resolved endpoint per configured provider and
//! branches on the provider's [`WireFormat`] when building the request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, info, warn};

use onika_core::config::{AppConfig, ProviderConfig, ProvidersConfig, RouterSettings};
use onika_core::types::{
    AnthropicRequest, AnthropicResponse, ChatCompletionRequest, ChatCompletionResponse, Message,
};

use crate::error::AttemptError;
use crate::registry::{LayerDescriptor, ProviderSpec, WireFormat, PROVIDERS};
use crate::traits::{AttemptResult, UpstreamClient};

/// `anthropic-version` header value for the Messages API.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ─────────────────────────────────────────────
// Endpoint — one configured provider
// ─────────────────────────────────────────────

struct Endpoint {
    api_base: String,
    api_key: String,
    extra_headers: HeaderMap,
    spec: &'static ProviderSpec,
}

impl Endpoint {
    fn new(config: &ProviderConfig, spec: &'static ProviderSpec) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let mut extra_headers = HeaderMap::new();
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                match (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(val)) => {
                        extra_headers.insert(name, val);
                    }
                    _ => warn!(provider = spec.name, header = %key, "Ignoring invalid header"),
                }
            }
        }

        Self {
            api_base,
            api_key: config.api_key.clone(),
            extra_headers,
            spec,
        }
    }

    fn url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        match self.spec.wire_format {
            WireFormat::OpenAiCompatible => format!("{base}/chat/completions"),
            WireFormat::AnthropicMessages => format!("{base}/messages"),
        }
    }
}

// ─────────────────────────────────────────────
// HttpUpstream
// ─────────────────────────────────────────────

/// Production [`UpstreamClient`].
pub struct HttpUpstream {
    client: reqwest::Client,
    endpoints: HashMap<&'static str, Endpoint>,
    persona: String,
    temperature: f64,
    max_tokens_free: u32,
    max_tokens_paid: u32,
    referer: String,
    title: String,
}

impl std::fmt::Debug for HttpUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut configured: Vec<_> = self.endpoints.keys().collect();
        configured.sort();
        f.debug_struct("HttpUpstream")
            .field("configured", &configured)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl HttpUpstream {
    /// Resolve an endpoint for every provider that has an API key.
    ///
    /// No overall request timeout is set on the client: each call is bounded
    /// by its layer's own deadline instead.
    pub fn new(
        providers: &ProvidersConfig,
        router: &RouterSettings,
        app: &AppConfig,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let endpoints = PROVIDERS
            .iter()
            .filter_map(|spec| {
                let config = providers.get_by_name(spec.name)?;
                config
                    .is_configured()
                    .then(|| (spec.name, Endpoint::new(config, spec)))
            })
            .collect::<HashMap<_, _>>();

        debug!(configured = endpoints.len(), "Upstream client ready");

        Ok(Self {
            client,
            endpoints,
            persona: router.persona.clone(),
            temperature: router.temperature,
            max_tokens_free: router.max_tokens_free,
            max_tokens_paid: router.max_tokens_paid,
            referer: app.referer.clone(),
            title: app.title.clone(),
        })
    }

    fn max_tokens_for(&self, layer: &LayerDescriptor) -> u32 {
        layer.max_tokens.unwrap_or(if layer.is_free {
            self.max_tokens_free
        } else {
            self.max_tokens_paid
        })
    }

    fn build_request(
        &self,
        endpoint: &Endpoint,
        layer: &LayerDescriptor,
        message: &str,
    ) -> reqwest::RequestBuilder {
        let max_tokens = self.max_tokens_for(layer);
        let request = self
            .client
            .post(endpoint.url())
            .headers(endpoint.extra_headers.clone());

        match endpoint.spec.wire_format {
            WireFormat::OpenAiCompatible => {
                let body = ChatCompletionRequest {
                    model: layer.model_id.clone(),
                    messages: vec![Message::system(&self.persona), Message::user(message)],
                    temperature: self.temperature,
                    max_tokens,
                };
                let request = request.bearer_auth(&endpoint.api_key).json(&body);
                if endpoint.spec.is_aggregator {
                    request
                        .header("HTTP-Referer", &self.referer)
                        .header("X-Title", &self.title)
                } else {
                    request
                }
            }
            WireFormat::AnthropicMessages => {
                let body = AnthropicRequest {
                    model: layer.model_id.clone(),
                    system: self.persona.clone(),
                    messages: vec![Message::user(message)],
                    temperature: self.temperature,
                    max_tokens,
                };
                request
                    .header("x-api-key", &endpoint.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body)
            }
        }
    }

    /// Send one request and extract `(content, total_tokens)`.
    async fn send(
        &self,
        endpoint: &Endpoint,
        layer: &LayerDescriptor,
        message: &str,
    ) -> Result<(String, u64), AttemptError> {
        let response = self
            .build_request(endpoint, layer, message)
            .send()
            .await
            .map_err(|e| AttemptError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Connection(e.to_string()))?;

        if !status.is_success() {
            return Err(AttemptError::from_status(status.as_u16(), &body));
        }

        let content = match endpoint.spec.wire_format {
            WireFormat::OpenAiCompatible => serde_json::from_str::<ChatCompletionResponse>(&body)
                .ok()
                .and_then(ChatCompletionResponse::into_content),
            WireFormat::AnthropicMessages => serde_json::from_str::<AnthropicResponse>(&body)
                .ok()
                .and_then(AnthropicResponse::into_content),
        };

        content.ok_or_else(|| {
            error!(
                layer = layer.ordinal,
                model = %layer.model_id,
                body = %onika_core::utils::truncate_string(&body, 200),
                "Unexpected response shape"
            );
            AttemptError::from_unparseable_body(&body)
        })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn call(&self, layer: &LayerDescriptor, message: &str) -> AttemptResult {
        let started = Instant::now();

        let Some(endpoint) = self.endpoints.get(layer.provider.name) else {
            return AttemptResult::failure(layer, AttemptError::NotConfigured, started.elapsed());
        };

        debug!(
            layer = layer.ordinal,
            provider = layer.provider.display_name,
            model = %layer.model_id,
            timeout_ms = layer.per_call_timeout.as_millis() as u64,
            "Calling upstream"
        );

        let outcome =
            tokio::time::timeout(layer.per_call_timeout, self.send(endpoint, layer, message))
                .await
                .unwrap_or(Err(AttemptError::Timeout(layer.per_call_timeout)));
        let latency = started.elapsed();

        match outcome {
            Ok((content, tokens)) => {
                let cost = layer.cost_for(tokens);
                info!(
                    layer = layer.ordinal,
                    model = %layer.model_id,
                    latency_ms = latency.as_millis() as u64,
                    tokens,
                    cost,
                    "Upstream call succeeded"
                );
                AttemptResult::success(layer, content, latency, cost)
            }
            Err(err) => {
                warn!(
                    layer = layer.ordinal,
                    model = %layer.model_id,
                    latency_ms = latency.as_millis() as u64,
                    rate_limited = err.is_rate_limit(),
                    error = %err,
                    "Upstream call failed"
                );
                AttemptResult::failure(layer, err, latency)
            }
        }
    }

    fn is_available(&self, layer: &LayerDescriptor) -> bool {
        self.endpoints.contains_key(layer.provider.name)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
