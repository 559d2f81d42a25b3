//! `corretor`: interactive chat on the console.

use corretor_agent::{ChatSession, TurnEvent, system_prompt};
use corretor_config::AppConfig;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A line typed at the `You:` prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Clear,
    Skip,
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Skip;
    }
    match line.to_lowercase().as_str() {
        "exit" | "quit" | "bye" => Input::Exit,
        "clear" => Input::Clear,
        _ => Input::Query(line),
    }
}

/// Print one turn event to stdout as it arrives.
fn render(event: TurnEvent) {
    let mut stdout = std::io::stdout();
    match event {
        TurnEvent::Text { content } => {
            let _ = write!(stdout, "{content}");
        }
        TurnEvent::FetchingData => {
            tracing::debug!("Fetching listings data");
        }
        // Wipe what the first answer printed and start a fresh line.
        TurnEvent::Restart => {
            let _ = write!(stdout, "\r\x1b[K\nAssistant: ");
        }
    }
    let _ = stdout.flush();
}

pub async fn run(config: AppConfig, first_query: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = Arc::new(super::build_orchestrator(&config)?);
    let prompt = system_prompt(config.prompt.system_prompt_override.as_deref());
    let mut session = ChatSession::new(orchestrator, prompt, config.history.max_pairs);

    println!("Chat session started. Type 'exit', 'quit', or 'bye' to end the conversation.");
    println!("Type 'clear' to clear the conversation history within this session.");
    println!("---------------------------------------------------------------------");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = first_query;

    loop {
        let line = match pending.take() {
            Some(query) => query,
            None => {
                print!("\nYou: ");
                std::io::stdout().flush()?;
                match lines.next_line().await? {
                    Some(line) => line,
                    None => break,
                }
            }
        };

        match classify(&line) {
            Input::Skip => continue,
            Input::Exit => {
                println!("\nEnding chat session. Goodbye!");
                break;
            }
            Input::Clear => {
                session.clear();
                println!("\nConversation history cleared for this session.");
            }
            Input::Query(query) => {
                print!("\nAssistant: ");
                std::io::stdout().flush()?;

                match session.ask(query, render).await {
                    Ok(_) => println!(),
                    Err(e) => {
                        tracing::error!(error = %e, "Turn failed");
                        eprintln!("\nError: {e}");
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        for word in ["exit", "QUIT", "Bye", "  bye  "] {
            assert_eq!(classify(word), Input::Exit);
        }
    }

    #[test]
    fn clear_resets_history() {
        assert_eq!(classify("Clear"), Input::Clear);
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(classify(""), Input::Skip);
        assert_eq!(classify("   "), Input::Skip);
    }

    #[test]
    fn anything_else_is_a_query() {
        assert_eq!(
            classify("  Quais imóveis estão livres?\n"),
            Input::Query("Quais imóveis estão livres?")
        );
        assert_eq!(classify("exit now"), Input::Query("exit now"));
    }
}
