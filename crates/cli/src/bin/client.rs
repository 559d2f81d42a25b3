//! `corretor-client`: send one question to a running Corretor API server.
//!
//! Reads the question from the command line, or prompts for it on stdin,
//! then prints the JSON reply.

use clap::Parser;
use std::io::Write;

#[derive(Parser)]
#[command(
    name = "corretor-client",
    about = "Send a question to the Corretor chatbot endpoint",
    version
)]
struct Args {
    /// Question to send; prompted for when omitted
    query: Vec<String>,

    /// Chatbot endpoint
    #[arg(long, env = "CORRETOR_URL", default_value = "http://localhost:8000/api/chatbot")]
    url: String,

    /// Sent as a bearer token when set
    #[arg(long, env = "CORRETOR_CLIENT_API_KEY")]
    api_key: Option<String>,
}

fn read_query() -> std::io::Result<String> {
    print!("Enter your query: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let query = if args.query.is_empty() {
        read_query()?
    } else {
        args.query.join(" ")
    };

    let client = reqwest::Client::new();
    let mut request = client
        .post(&args.url)
        .json(&serde_json::json!({ "query": query }));
    if let Some(key) = &args.api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        let body: serde_json::Value = response.json().await?;
        println!("\nResponse from chatbot:");
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        let body = response.text().await.unwrap_or_default();
        eprintln!("Error: Received status code {}", status.as_u16());
        eprintln!("Response: {body}");
        std::process::exit(1);
    }

    Ok(())
}
