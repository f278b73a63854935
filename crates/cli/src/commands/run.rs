//! `tinyagent run`: one instruction, one answer.

use std::path::PathBuf;
use tinyagent_config::AppConfig;

use super::build_session;

pub async fn run(
    config: &AppConfig,
    prompt: Option<String>,
    task_file: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let instruction = match (prompt, task_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("Failed to read task file {}: {e}", path.display()))?,
        (None, None) => return Err("No instruction given".into()),
    };
    if instruction.trim().is_empty() {
        return Err("Instruction is empty".into());
    }

    let (mut agent, mut console) = build_session(config)?;
    let outcome = console.drive(&mut agent, instruction).await;
    let answer = outcome.result?;

    if outcome.streamed {
        println!();
    } else {
        println!("{answer}");
    }
    Ok(())
}
