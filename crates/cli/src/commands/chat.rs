//! `tinyagent chat`: interactive session over stdin.

use std::io::Write;
use tinyagent_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::build_session;

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (mut agent, mut console) = build_session(config)?;

    println!();
    println!("  TinyAgent, interactive mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Session:   {}", agent.conversation_id());
    println!("  Type 'exit' or 'quit' to leave.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        println!();
        let outcome = console.drive(&mut agent, input.to_string()).await;
        match outcome.result {
            Ok(answer) => {
                if outcome.streamed {
                    println!();
                } else {
                    for line in answer.lines() {
                        println!("  Assistant > {line}");
                    }
                }
                println!();
            }
            // The session stays usable after a failed run
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
