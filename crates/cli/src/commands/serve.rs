//! `corretor --api`: start the HTTP API server.

use corretor_config::AppConfig;
use std::sync::Arc;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let orchestrator = Arc::new(super::build_orchestrator(&config)?);

    println!("Starting API server on http://{}:{}", config.gateway.host, config.gateway.port);
    println!("Use the endpoint /api/chatbot for chatbot interactions");

    corretor_gateway::start(config, orchestrator).await?;

    Ok(())
}
