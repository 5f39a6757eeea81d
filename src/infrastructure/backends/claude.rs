#[cfg(test)]
#[path = "claude_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendRequest;
use crate::domain::models::BackendResponse;
use crate::domain::models::Role;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<MessageRequest>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    content: Vec<ContentBlock>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    _type: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta {
        delta: ContentBlock,
    },
    MessageStop,
    Error {
        error: ErrorDetail,
    },
    #[serde(other)]
    Other,
}

pub struct Claude {
    url: String,
    token: String,
}

impl Claude {
    pub fn new(url: &str, token: &str) -> Claude {
        return Claude {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        };
    }

    /// Claude takes instructions through a top-level `system` field rather
    /// than as a message, so system messages are lifted out of the transcript.
    fn to_completion_request(&self, request: BackendRequest, stream: bool) -> CompletionRequest {
        let mut system: Vec<String> = vec![];
        let mut messages: Vec<MessageRequest> = vec![];
        for message in request.messages {
            if message.role == Role::System {
                system.push(message.content);
                continue;
            }

            messages.push(MessageRequest {
                role: message.role.to_string(),
                content: message.content,
            });
        }

        let mut system_prompt = None;
        if !system.is_empty() {
            system_prompt = Some(system.join("\n\n"));
        }

        return CompletionRequest {
            model: request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: system_prompt,
            messages,
            stream,
        };
    }

    async fn post(&self, req: &CompletionRequest) -> Result<reqwest::Response> {
        if self.token.is_empty() {
            bail!("Claude token is not defined");
        }

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/messages", url = self.url))
            .header("x-api-key", &self.token)
            .header("content-type", "application/json")
            .header("anthropic-version", "2023-06-01")
            .json(req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                body = body.as_str(),
                "Failed to make completion request to Claude"
            );
            bail!(format!(
                "Failed to make completion request to Claude ({status}): {body}"
            ));
        }

        return Ok(res);
    }
}

#[async_trait]
impl Backend for Claude {
    fn name(&self) -> BackendName {
        return BackendName::Claude;
    }

    #[allow(clippy::implicit_return)]
    async fn complete(&self, request: BackendRequest) -> Result<String> {
        let req = self.to_completion_request(request, false);
        let res = self.post(&req).await?;

        let ores = res.json::<CompletionResponse>().await?;
        tracing::debug!(body = ?ores, "Completion response");

        let text = ores
            .content
            .into_iter()
            .filter(|block| return block._type == "text")
            .map(|block| return block.text)
            .collect::<Vec<String>>()
            .join("");

        return Ok(text);
    }

    #[allow(clippy::implicit_return)]
    async fn stream<'a>(
        &self,
        request: BackendRequest,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()> {
        let req = self.to_completion_request(request, true);
        let res = self.post(&req).await?;

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        while let Some(line) = lines_reader.next_line().await? {
            let mut cleaned_line = line.trim().to_string();
            if cleaned_line.starts_with("data:") {
                cleaned_line = cleaned_line.split_off(5).trim().to_string();
            }
            if cleaned_line.is_empty() || cleaned_line.starts_with("event:") {
                continue;
            }

            let ores: StreamEvent = serde_json::from_str(&cleaned_line)?;
            tracing::debug!(body = ?ores, "Completion response");

            match ores {
                StreamEvent::ContentBlockDelta { delta } => {
                    if delta.text.is_empty() {
                        continue;
                    }
                    tx.send(BackendResponse::fragment(&delta.text))?;
                }
                StreamEvent::MessageStop => break,
                StreamEvent::Error { error } => {
                    bail!(format!("Claude stream failed: {}", error.message));
                }
                StreamEvent::Other => continue,
            }
        }

        tx.send(BackendResponse::done())?;

        return Ok(());
    }
}
