//! Interactive chat over stdin/stdout.

use agent::{handle_command, split_stream, Agent, TextSplitter};
use agent_core::{InvokeInput, OutputChunk, ToolPayload, ToolResult, Trigger};
use anyhow::Result;
use futures::StreamExt;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const EXIT_COMMANDS: &[&str] = &["/exit", "/quit"];

fn tool_line(result: &ToolResult) -> String {
    match &result.payload {
        ToolPayload::Text(text) => format!("[{}] {}", result.tool_name, text),
        ToolPayload::Image(url) => format!("[{}] image: {}", result.tool_name, url),
        ToolPayload::Audio(path) => format!("[{}] audio: {}", result.tool_name, path.display()),
        ToolPayload::File(path) => format!("[{}] file: {}", result.tool_name, path.display()),
    }
}

/// Runs one user message through the agent and prints the reply parts as they arrive.
async fn run_turn(agent: &Agent, text: &str, delimiters: &[String]) -> Result<()> {
    if let Some(reply) = handle_command(agent, text) {
        println!("{}", reply);
        return Ok(());
    }

    let stream = agent.invoke(Trigger::UserMessage, Some(InvokeInput::text(text)))?;
    let splitter = if delimiters.is_empty() {
        TextSplitter::default()
    } else {
        TextSplitter::new(delimiters.iter().cloned())
    };
    let mut parts = Box::pin(split_stream(stream, splitter));

    while let Some(item) = parts.next().await {
        match item {
            Ok(OutputChunk::Text(part)) => {
                let part = part.trim_end_matches('\n');
                if !part.trim().is_empty() {
                    println!("{}", part);
                }
            }
            Ok(OutputChunk::Tool(result)) => println!("{}", tool_line(&result)),
            Err(e) => {
                error!(error = %e, "Turn failed");
                eprintln!("Error: {}", e);
            }
        }
    }
    Ok(())
}

/// Reads stdin line by line until EOF or an exit command.
pub async fn run_chat(agent: Agent, first_message: Option<String>, delimiters: Vec<String>) -> Result<()> {
    info!(tools = ?agent.tool_names(), "step: chat started");

    if let Some(message) = first_message.filter(|m| !m.trim().is_empty()) {
        run_turn(&agent, message.trim(), &delimiters).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line) {
            break;
        }
        run_turn(&agent, line, &delimiters).await?;
    }

    agent.shutdown().await;
    info!("step: chat finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tool_lines_name_the_tool_and_payload() {
        let text = ToolResult::new("recall_memory", "c1", ToolPayload::Text("none".into()));
        assert_eq!(tool_line(&text), "[recall_memory] none");

        let audio = ToolResult::new("play_sound", "c2", ToolPayload::Audio(PathBuf::from("sounds/bell.mp3")));
        assert_eq!(tool_line(&audio), "[play_sound] audio: sounds/bell.mp3");
    }
}
