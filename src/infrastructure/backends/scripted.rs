use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendRequest;
use crate::domain::models::BackendResponse;

/// In-memory backend replying from a fixed script, recording every request
/// it receives. Streamed replies are split on spaces.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Arc<Mutex<Vec<BackendRequest>>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<&str, &str>>) -> ScriptedBackend {
        return ScriptedBackend {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|reply| {
                        return reply
                            .map(|e| return e.to_string())
                            .map_err(|e| return e.to_string());
                    })
                    .collect(),
            ),
            requests: Arc::new(Mutex::new(vec![])),
        };
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<BackendRequest>>> {
        return self.requests.clone();
    }

    fn next_reply(&self, request: BackendRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => return Ok(text),
            Some(Err(err)) => bail!(err),
            None => bail!("Script ran out of replies"),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> BackendName {
        return BackendName::Claude;
    }

    #[allow(clippy::implicit_return)]
    async fn complete(&self, request: BackendRequest) -> Result<String> {
        return self.next_reply(request);
    }

    #[allow(clippy::implicit_return)]
    async fn stream<'a>(
        &self,
        request: BackendRequest,
        tx: &'a mpsc::UnboundedSender<BackendResponse>,
    ) -> Result<()> {
        let text = self.next_reply(request)?;
        for fragment in text.split_inclusive(' ') {
            tx.send(BackendResponse::fragment(fragment))?;
        }
        tx.send(BackendResponse::done())?;

        return Ok(());
    }
}
