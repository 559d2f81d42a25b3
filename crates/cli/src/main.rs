//! Corretor CLI: the main entry point.
//!
//! Modes:
//! - interactive chat (default); words on the command line form the first
//!   question
//! - `--api`: serve `POST /api/chatbot` over HTTP
//! - `--clear-history`: report that history is not persisted, then exit

use clap::Parser;

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "corretor",
    about = "Corretor: listings assistant for real-estate questions",
    version,
    author
)]
struct Cli {
    /// First question to ask; the chat continues interactively afterwards
    query: Vec<String>,

    /// Start the HTTP API server instead of the interactive chat
    #[arg(long)]
    api: bool,

    /// Port for the API server (overrides PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Clear conversation history and exit
    #[arg(long)]
    clear_history: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.clear_history {
        println!("No persistent history to clear: conversation history only lives for one chat session.");
        return Ok(());
    }

    let config = corretor_config::AppConfig::load()
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let _log_guard = logging::init(&config.logging, cli.verbose || cli.api, cli.verbose)?;

    if cli.api {
        commands::serve::run(config, cli.port).await?;
    } else {
        let query = (!cli.query.is_empty()).then(|| cli.query.join(" "));
        commands::chat::run(config, query).await?;
    }

    Ok(())
}
