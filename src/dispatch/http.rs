use super::decision::{parse_decision, AmbiguousOutput};
use super::{ActionDispatcher, DispatchResult};
use crate::buffer::BufferSnapshot;
use crate::error::DispatchError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Structured reply from a decision endpoint
#[derive(Debug, Deserialize)]
struct RemoteDecision {
    act: bool,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

/// Hands the buffer snapshot to a remote decision service over HTTP.
///
/// The endpoint may answer with `{"act": bool, "payload": ...}` or with plain
/// text starting with `true`/`false`.
pub struct HttpDispatcher {
    client: Client,
    endpoint: String,
    ambiguous: AmbiguousOutput,
}

impl HttpDispatcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, ambiguous: AmbiguousOutput) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            ambiguous,
        })
    }

    fn interpret(&self, body: &str) -> DispatchResult {
        if let Ok(decision) = serde_json::from_str::<RemoteDecision>(body) {
            return if decision.act {
                DispatchResult::Acted(decision.payload.unwrap_or_else(|| json!({})))
            } else {
                DispatchResult::NoAction
            };
        }

        if parse_decision(body, self.ambiguous) {
            DispatchResult::Acted(json!({ "message": body.trim() }))
        } else {
            DispatchResult::NoAction
        }
    }
}

#[async_trait::async_trait]
impl ActionDispatcher for HttpDispatcher {
    async fn invoke(&self, snapshot: &BufferSnapshot) -> Result<DispatchResult, DispatchError> {
        let response = self.client.post(&self.endpoint).json(snapshot).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Transport(format!(
                "{} answered {}",
                self.endpoint, status
            )));
        }

        let body = response.text().await?;
        debug!(session = %snapshot.session_id, bytes = body.len(), "decision endpoint replied");

        Ok(self.interpret(&body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
