#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use std::str::FromStr;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;
use strum::EnumString;
use strum::EnumVariantNames;
use tokio::sync::mpsc;

use super::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Claude,
    OpenAI,
}

impl BackendName {
    pub fn parse(text: &str) -> Result<BackendName> {
        return BackendName::from_str(text)
            .map_err(|_| return anyhow!(format!("No backend implemented for {text}")));
    }

    /// Name printed in front of streamed answers.
    pub fn label(&self) -> &'static str {
        match self {
            BackendName::Claude => return "Claude",
            BackendName::OpenAI => return "ChatGPT",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendName::Claude => return "claude-3-5-sonnet-20241022",
            BackendName::OpenAI => return "gpt-4o-mini",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendRequest {
    pub model: String,
    /// Upper bound on generated tokens. Backends that require a bound fall
    /// back to their own default when unset.
    pub max_tokens: Option<u32>,
    pub messages: Vec<Message>,
}

impl BackendRequest {
    pub fn new(model: &str, max_tokens: Option<u32>, messages: Vec<Message>) -> BackendRequest {
        return BackendRequest {
            model: model.to_string(),
            max_tokens,
            messages,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendResponse {
    pub text: String,
    pub done: bool,
}

impl BackendResponse {
    pub fn fragment(text: &str) -> BackendResponse {
        return BackendResponse {
            text: text.to_string(),
            done: false,
        };
    }

    pub fn done() -> BackendResponse {
        return BackendResponse {
            text: "".to_string(),
            done: true,
        };
    }
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Requests a single completion and returns its full text.
    async fn complete(&self, request: BackendRequest) -> Result<String>;

    /// Requests a completion in streaming mode. Each text fragment is sent
    /// through the channel in arrival order as soon as it is received.
    ///
    /// Upon receiving all results, a final `done` response is provided as the
    /// last message to the channel.
    async fn stream<'a>(
        &self,
        request: BackendRequest,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
