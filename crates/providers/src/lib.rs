//! Completion provider implementations for TinyAgent.
//!
//! All providers implement the `tinyagent_core::Provider` trait.
//! [`build_from_config`] wires the configured backend behind the retry
//! decorator.

pub mod anthropic;
pub mod retry;
pub mod sse;
pub mod stream;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use retry::{RetryPolicy, RetryProvider};
pub use sse::{SseFrame, SseParser};
pub use stream::{StreamAssembler, StreamEvent};

use std::sync::Arc;
use tinyagent_config::AppConfig;
use tinyagent_core::error::ProviderError;
use tinyagent_core::provider::Provider;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Build the configured provider, wrapped in the retry decorator.
///
/// Passing a `text_sink` turns on streaming; text deltas are sent to it as
/// they arrive. A retry after a mid-stream failure streams the new attempt
/// from the start, so the sink may see the interrupted partial text first.
pub fn build_from_config(
    config: &AppConfig,
    text_sink: Option<UnboundedSender<String>>,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let policy = RetryPolicy::new(config.retry.max_retries, config.retry.base_delay());

    match config.default_provider.as_str() {
        "anthropic" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ProviderError::NotConfigured(
                    "No API key. Set TINYAGENT_API_KEY or ANTHROPIC_API_KEY, or api_key in config.toml"
                        .into(),
                )
            })?;

            let anthropic_config = AnthropicConfig {
                api_key,
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| anthropic::DEFAULT_BASE_URL.into()),
                model: config.default_model.clone(),
                max_tokens: config.default_max_tokens,
                temperature: config.default_temperature,
                request_timeout: config.request_timeout(),
            };

            let mut provider = AnthropicProvider::new(anthropic_config)?;
            if let Some(sink) = text_sink {
                provider = provider.with_text_sink(sink);
            }

            let provider = RetryProvider::new(provider, policy);
            info!(
                provider = "anthropic",
                model = %config.default_model,
                streaming = provider.inner().is_streaming(),
                max_retries = provider.policy().max_retries(),
                "Provider ready"
            );
            Ok(Arc::new(provider))
        }
        other => Err(ProviderError::NotConfigured(format!(
            "Unknown provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_anthropic_with_key() {
        let config = AppConfig {
            api_key: Some("sk-ant-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config, None).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn missing_key_is_not_configured() {
        let err = build_from_config(&AppConfig::default(), None).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn unknown_provider_rejected() {
        let config = AppConfig {
            api_key: Some("k".into()),
            default_provider: "openrouter".into(),
            ..AppConfig::default()
        };
        let err = build_from_config(&config, None).err().unwrap();
        assert!(err.to_string().contains("openrouter"));
    }
}
