//! LLM provider implementations for Corretor.
//!
//! All providers implement the `corretor_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use corretor_config::AppConfig;
use corretor_core::error::ProviderError;

/// Build the configured provider.
///
/// Fails with `NotConfigured` when no API key is available, so callers can
/// report the problem before the first request.
pub fn build_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no API key for provider '{}'; set OPENROUTER_API_KEY",
                config.provider.name
            ))
        })?;

    Ok(OpenAiCompatProvider::new(
        config.provider.name.clone(),
        config.provider.base_url.clone(),
        api_key,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use corretor_core::Provider;

    #[test]
    fn missing_key_is_not_configured() {
        let config = AppConfig::default();
        let err = build_from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn builds_named_provider() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-or-test".into());
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openrouter");
    }
}
