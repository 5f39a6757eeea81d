#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;

use std::io;
use std::io::Write;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use yansi::Paint;

use crate::domain::services::is_exit_command;
use crate::domain::services::ChatReply;
use crate::domain::services::ChatSession;

pub const PROMPT: &str = "> ";
pub const CONTINUATION_PROMPT: &str = "... (press Enter again to send)";

/// Collects terminal lines until an empty line submits them.
#[derive(Default)]
pub struct MultilineInput {
    lines: Vec<String>,
}

impl MultilineInput {
    pub fn prompt(&self) -> &'static str {
        if self.lines.is_empty() {
            return PROMPT;
        }

        return CONTINUATION_PROMPT;
    }

    /// Feeds one line. Returns the joined message once an empty line follows
    /// at least one typed line. Empty lines with nothing typed are ignored.
    pub fn push(&mut self, line: &str) -> Option<String> {
        if !line.is_empty() {
            self.lines.push(line.to_string());
            return None;
        }

        if self.lines.is_empty() {
            return None;
        }

        let message = self.lines.join("\n");
        self.lines.clear();

        return Some(message);
    }
}

fn goodbye() {
    println!("\nGoodbye!");
}

/// Reads questions from stdin until `exit`, `quit`, EOF or Ctrl+C.
pub async fn chat_loop(mut session: ChatSession) -> Result<()> {
    println!("\nChat interface ready!");
    println!("Type 'exit', 'quit', or press Ctrl+C to end the chat.");
    println!("Type your message and press Enter. For multiple lines, keep typing and press Enter twice when done.");

    let mut stdout = io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = MultilineInput::default();

    loop {
        print!("{}", input.prompt());
        stdout.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                goodbye();
                return Ok(());
            }
        };

        let line = match line {
            Some(line) => line,
            None => {
                goodbye();
                return Ok(());
            }
        };

        let message = match input.push(&line) {
            Some(message) => message,
            None => continue,
        };

        if is_exit_command(&message) {
            println!("Goodbye!");
            return Ok(());
        }

        println!("\nProcessing your question...");

        let reply = tokio::select! {
            reply = session.chat(&message, &mut stdout) => reply,
            _ = tokio::signal::ctrl_c() => {
                goodbye();
                return Ok(());
            }
        };

        if matches!(reply, ChatReply::Error(_)) {
            eprintln!("{}\n", Paint::red(reply.text()));
        }

        tracing::debug!(
            turns = session.history().len(),
            messages = session.messages().len(),
            "Chat turn finished"
        );
    }
}
