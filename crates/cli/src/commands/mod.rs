//! CLI subcommands and the wiring they share.

pub mod chat;
pub mod serve;

use corretor_agent::TurnOrchestrator;
use corretor_config::AppConfig;
use corretor_core::tool::DataFetchTool;
use corretor_tools::UnavailableTool;
use std::sync::Arc;
use tracing::warn;

/// Build the turn pipeline from configuration.
///
/// A missing LLM key is fatal. A data source that cannot be built is not:
/// questions that need the table get the error as data instead.
pub fn build_orchestrator(config: &AppConfig) -> Result<TurnOrchestrator, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        print_missing_key_help();
        return Err("No API key found. See above for setup instructions.".into());
    }
    let provider = corretor_providers::build_from_config(config)?;

    let tool: Arc<dyn DataFetchTool> = match corretor_tools::build_from_config(&config.data_source) {
        Ok(tool) => tool,
        Err(e) => {
            warn!(error = %e, "Data source unavailable, data requests will report the error");
            Arc::new(UnavailableTool::new(e))
        }
    };

    Ok(TurnOrchestrator::new(Arc::new(provider), tool, &config.provider.model)
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens)
        .with_prefetch(config.data_source.prefetch))
}

fn print_missing_key_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables (or put it in .env):");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recommended)");
    eprintln!("    OPENAI_API_KEY=sk-...             (for OpenAI direct)");
    eprintln!("    CORRETOR_API_KEY=sk-...           (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_an_error() {
        let config = AppConfig::default();
        assert!(build_orchestrator(&config).is_err());
    }

    #[test]
    fn builds_with_key_even_without_data_source() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-or-test".into());
        config.data_source.prefetch = true;

        let orchestrator = build_orchestrator(&config).unwrap();
        assert_eq!(orchestrator.model(), config.provider.model);
        assert_eq!(orchestrator.provider_name(), "openrouter");
    }
}
