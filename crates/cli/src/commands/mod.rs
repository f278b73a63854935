//! Command handlers and the plumbing they share.

pub mod chat;
pub mod init;
pub mod run;
pub mod tools;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tinyagent_agent::{AgentEvent, AgentLoop};
use tinyagent_config::AppConfig;
use tinyagent_core::error::Result as AgentResult;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let mut config =
                AppConfig::load_from(path).map_err(|e| format!("Failed to load config: {e}"))?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?,
    };
    Ok(config)
}

/// Build an agent from the configuration, plus the console that renders
/// what it does.
pub fn build_session(
    config: &AppConfig,
) -> Result<(AgentLoop, Console), Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TINYAGENT_API_KEY=sk-ant-...");
        eprintln!("    ANTHROPIC_API_KEY=sk-ant-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let (text_tx, text_rx) = if config.stream {
        let (tx, rx) = unbounded_channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    let provider = tinyagent_providers::build_from_config(config, text_tx)?;
    let tools = Arc::new(tinyagent_tools::default_registry(&config.tools));

    let (event_tx, event_rx) = unbounded_channel();
    let agent = AgentLoop::new(provider, tools)
        .with_config(&config.agent)
        .with_event_sink(event_tx);

    Ok((
        agent,
        Console {
            text: text_rx,
            events: event_rx,
        },
    ))
}

/// Renders streamed text to stdout and tool activity to stderr while a
/// run is in flight.
pub struct Console {
    text: Option<UnboundedReceiver<String>>,
    events: UnboundedReceiver<AgentEvent>,
}

/// What a driven run produced.
pub struct Outcome {
    pub result: AgentResult<String>,
    /// Whether any text already reached stdout as it streamed.
    pub streamed: bool,
}

impl Console {
    /// Run one instruction, rendering output as it arrives.
    pub async fn drive(&mut self, agent: &mut AgentLoop, input: String) -> Outcome {
        let mut streamed = false;
        let run = agent.run(input);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                biased;
                Some(delta) = recv_text(&mut self.text) => {
                    streamed = true;
                    print_delta(&delta);
                }
                Some(event) = self.events.recv() => render_event(&event),
                result = &mut run => break result,
            }
        };

        // Anything sent just before the run finished
        if let Some(rx) = self.text.as_mut() {
            while let Ok(delta) = rx.try_recv() {
                streamed = true;
                print_delta(&delta);
            }
        }
        while let Ok(event) = self.events.try_recv() {
            render_event(&event);
        }

        Outcome { result, streamed }
    }
}

async fn recv_text(rx: &mut Option<UnboundedReceiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

fn print_delta(delta: &str) {
    print!("{delta}");
    let _ = std::io::stdout().flush();
}

fn render_event(event: &AgentEvent) {
    match event {
        AgentEvent::ToolCall { name, input, .. } => {
            let args = serde_json::Value::Object(input.clone());
            eprintln!("\n  [tool] {name} {}", truncate(&args.to_string(), 200));
        }
        AgentEvent::ToolResult { name, result, .. } => {
            let status = if result.success { "ok" } else { "failed" };
            let first_line = result.content().lines().next().unwrap_or_default();
            eprintln!("  [tool] {name} {status}: {}", truncate(first_line, 200));
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
