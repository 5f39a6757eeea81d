#[cfg(test)]
#[path = "openai_test.rs"]
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
    messages: Vec<MessageRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceDeltaResponse {
    delta: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaChunk {
    choices: Vec<CompletionChoiceDeltaResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
}

pub struct OpenAI {
    url: String,
    token: String,
}

impl OpenAI {
    pub fn new(url: &str, token: &str) -> OpenAI {
        return OpenAI {
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        };
    }

    fn to_completion_request(&self, request: BackendRequest, stream: bool) -> CompletionRequest {
        let messages = request
            .messages
            .into_iter()
            .map(|message| {
                return MessageRequest {
                    role: message.role.to_string(),
                    content: message.content,
                };
            })
            .collect();

        return CompletionRequest {
            model: request.model,
            messages,
            max_completion_tokens: request.max_tokens,
            stream,
        };
    }

    async fn post(&self, req: &CompletionRequest) -> Result<reqwest::Response> {
        if self.token.is_empty() {
            bail!("OpenAI token is not defined");
        }

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(req)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status,
                body = body.as_str(),
                "Failed to make completion request to OpenAI"
            );
            bail!(format!(
                "Failed to make completion request to OpenAI ({status}): {body}"
            ));
        }

        return Ok(res);
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> BackendName {
        return BackendName::OpenAI;
    }

    #[allow(clippy::implicit_return)]
    async fn complete(&self, request: BackendRequest) -> Result<String> {
        let req = self.to_completion_request(request, false);
        let res = self.post(&req).await?;

        let ores = res.json::<CompletionResponse>().await?;
        tracing::debug!(body = ?ores, "Completion response");

        let choice = match ores.choices.into_iter().next() {
            Some(choice) => choice,
            None => bail!("OpenAI returned no completion choices"),
        };

        return Ok(choice.message.content.unwrap_or_default());
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
            if cleaned_line.is_empty() {
                continue;
            }
            if cleaned_line == "[DONE]" {
                break;
            }

            let ores: CompletionDeltaChunk = serde_json::from_str(&cleaned_line)?;
            tracing::debug!(body = ?ores, "Completion response");

            let text = ores
                .choices
                .into_iter()
                .filter_map(|choice| return choice.delta.content)
                .collect::<Vec<String>>()
                .join("");

            if text.is_empty() {
                continue;
            }

            tx.send(BackendResponse::fragment(&text))?;
        }

        tx.send(BackendResponse::done())?;

        return Ok(());
    }
}
