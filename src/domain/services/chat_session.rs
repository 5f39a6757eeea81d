#[cfg(test)]
#[path = "chat_session_test.rs"]
mod tests;

use std::io::Write;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendRequest;
use crate::domain::models::BackendResponse;
use crate::domain::models::ConversationHistory;
use crate::domain::models::Message;
use crate::domain::models::Role;

pub const DEFAULT_CONTEXT_WINDOW: usize = 5;
pub const CHAT_MAX_TOKENS: u32 = 4096;

const GREETING: &str = "You are a helpful programming assistant.";
const CONTEXT_ACK: &str =
    "I understand. I'll help answer questions about this code. What would you like to know?";

/// Returns true for the words that end a chat.
pub fn is_exit_command(input: &str) -> bool {
    let cmd = input.trim().to_lowercase();
    return cmd == "exit" || cmd == "quit";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatReply {
    Answer(String),
    /// The backend failed. The session stays usable for the next turn.
    Error(String),
}

impl ChatReply {
    pub fn text(&self) -> &str {
        match self {
            ChatReply::Answer(text) => return text,
            ChatReply::Error(text) => return text,
        }
    }
}

pub struct ChatSession {
    backend: BackendBox,
    model: String,
    messages: Vec<Message>,
    history: ConversationHistory,
}

impl ChatSession {
    /// Starts a session. A non-empty `context` is seeded into the transcript
    /// as a question/answer pair before the first user turn.
    pub fn new(backend: BackendBox, model: &str, context: &str, context_window: usize) -> ChatSession {
        let mut messages = vec![Message::system(GREETING)];
        if !context.is_empty() {
            messages.push(Message::user(&format!(
                "Here is the code context I'll be asking about:\n{context}"
            )));
            messages.push(Message::assistant(CONTEXT_ACK));
        }

        return ChatSession {
            backend,
            model: model.to_string(),
            messages,
            history: ConversationHistory::new(context_window),
        };
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn history(&self) -> &ConversationHistory {
        return &self.history;
    }

    /// Prepends the recent conversation to a question.
    pub fn enhance_input(&self, input: &str) -> String {
        let conversation = self.history.format();
        if conversation.is_empty() {
            return input.to_string();
        }

        return format!("{conversation}\nCurrent question: {input}");
    }

    /// Runs one exchange, writing streamed fragments to `out` as they arrive.
    /// Backend failures are returned as [`ChatReply::Error`] instead of being
    /// propagated.
    pub async fn chat<W: Write>(&mut self, input: &str, out: &mut W) -> ChatReply {
        let transcript_len = self.messages.len();
        match self.exchange(input, out).await {
            Ok(answer) => return ChatReply::Answer(answer),
            Err(err) => {
                tracing::error!(error = ?err, "Chat exchange failed");
                self.messages.truncate(transcript_len);
                return ChatReply::Error(format!("Error: {err}"));
            }
        }
    }

    async fn exchange<W: Write>(&mut self, input: &str, out: &mut W) -> Result<String> {
        self.messages.push(Message::user(&self.enhance_input(input)));

        let request = BackendRequest::new(
            &self.model,
            Some(CHAT_MAX_TOKENS),
            self.messages.clone(),
        );

        write!(out, "\n{}: ", self.backend.name().label())?;
        out.flush()?;

        let (tx, mut rx) = mpsc::unbounded_channel::<BackendResponse>();
        let backend = &self.backend;
        let producer = async move {
            let res = backend.stream(request, &tx).await;
            drop(tx);
            return res;
        };
        let consumer = async {
            let mut answer = "".to_string();
            while let Some(res) = rx.recv().await {
                if res.done {
                    break;
                }
                write!(out, "{}", res.text)?;
                out.flush()?;
                answer += &res.text;
            }
            return Ok::<String, anyhow::Error>(answer);
        };

        let (stream_res, consumer_res) = tokio::join!(producer, consumer);
        stream_res?;
        let answer = consumer_res?;

        writeln!(out, "\n")?;
        out.flush()?;

        self.messages.push(Message::new(Role::Assistant, &answer));
        self.history.push(input, &answer);

        return Ok(answer);
    }
}
