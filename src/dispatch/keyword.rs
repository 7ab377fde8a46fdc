use super::{ActionDispatcher, DispatchResult};
use crate::buffer::{BufferSnapshot, Message};
use crate::error::DispatchError;
use serde_json::json;
use tracing::info;

/// Acts when a message committed since the last analysis mentions one of the
/// wake words.
///
/// The payload is a notification whose prompt is the whole retained
/// discussion, one `"<text> (<speaker>)"` line per message in timestamp order.
pub struct KeywordDispatcher {
    keywords: Vec<String>,
}

impl KeywordDispatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    fn mentions_keyword(&self, message: &Message) -> bool {
        let text = message.text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

/// Render messages as prompt lines, user turns as the `{{user_name}}` placeholder
pub fn format_discussion(messages: &[Message]) -> String {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    ordered
        .iter()
        .map(|m| {
            let speaker = if m.speaker.is_user() {
                "{{user_name}}"
            } else {
                m.speaker.label()
            };
            format!("{} ({})", m.text, speaker)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait::async_trait]
impl ActionDispatcher for KeywordDispatcher {
    async fn invoke(&self, snapshot: &BufferSnapshot) -> Result<DispatchResult, DispatchError> {
        if !snapshot.fresh_messages().iter().any(|m| self.mentions_keyword(m)) {
            return Ok(DispatchResult::NoAction);
        }

        info!("Wake word heard in session {}", snapshot.session_id);

        Ok(DispatchResult::Acted(json!({
            "notification": {
                "prompt": format_discussion(&snapshot.messages),
                "params": ["user_name", "user_facts"],
            }
        })))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
