use super::segment::{FlushReason, Message, PendingChunk, Speaker};
use super::text::count_sentences;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

/// Per-session buffering state.
///
/// History is split by a watermark: messages before `fresh_from` were already
/// consumed by an analysis and stay only as context for the next dispatch.
/// `user_sentence_count` and `accumulation_started_at` always reflect the user
/// messages at or after the watermark.
#[derive(Debug, Clone)]
pub struct SessionBuffer {
    session_id: String,
    uid: Option<String>,
    messages: VecDeque<Message>,
    fresh_from: usize,
    max_messages: usize,
    pending: Option<PendingChunk>,
    user_sentence_count: usize,
    accumulation_started_at: Option<f64>,
    last_user_speech_at: Option<f64>,
    last_analysis_at: f64,
    last_action_at: Option<f64>,
    next_eligible_at: Option<f64>,
    last_activity_at: f64,
    last_flush_reason: Option<FlushReason>,
}

/// Read-only copy of a buffer handed to dispatchers and the HTTP API
#[derive(Debug, Clone, Serialize)]
pub struct BufferSnapshot {
    pub session_id: String,
    pub uid: Option<String>,
    pub messages: Vec<Message>,
    /// Index of the first message not yet consumed by an analysis
    pub fresh_from: usize,
    pub pending_text: Option<String>,
    pub user_sentence_count: usize,
    pub accumulation_started_at: Option<f64>,
    pub last_user_speech_at: Option<f64>,
    pub last_analysis_at: f64,
    pub last_action_at: Option<f64>,
    pub next_eligible_at: Option<f64>,
    pub last_activity_at: f64,
}

impl BufferSnapshot {
    /// Messages committed since the last analysis
    pub fn fresh_messages(&self) -> &[Message] {
        let start = self.fresh_from.min(self.messages.len());
        &self.messages[start..]
    }
}

impl SessionBuffer {
    /// Create an empty buffer.
    ///
    /// The analysis marker is seeded one cooldown in the past so a new session
    /// is not artificially blocked. No action has happened yet, whatever
    /// cooldown the session's user later turns out to have.
    pub fn new(session_id: impl Into<String>, now: f64, max_messages: usize, analysis_cooldown_secs: f64) -> Self {
        Self {
            session_id: session_id.into(),
            uid: None,
            messages: VecDeque::new(),
            fresh_from: 0,
            max_messages: max_messages.max(1),
            pending: None,
            user_sentence_count: 0,
            accumulation_started_at: None,
            last_user_speech_at: None,
            last_analysis_at: now - analysis_cooldown_secs,
            last_action_at: None,
            next_eligible_at: None,
            last_activity_at: now,
            last_flush_reason: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn set_uid(&mut self, uid: Option<&str>) {
        if let Some(uid) = uid {
            if self.uid.as_deref() != Some(uid) {
                self.uid = Some(uid.to_string());
            }
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn pending(&self) -> Option<&PendingChunk> {
        self.pending.as_ref()
    }

    pub fn user_sentence_count(&self) -> usize {
        self.user_sentence_count
    }

    pub fn accumulation_started_at(&self) -> Option<f64> {
        self.accumulation_started_at
    }

    pub fn last_user_speech_at(&self) -> Option<f64> {
        self.last_user_speech_at
    }

    pub fn last_analysis_at(&self) -> f64 {
        self.last_analysis_at
    }

    pub fn last_action_at(&self) -> Option<f64> {
        self.last_action_at
    }

    pub fn next_eligible_at(&self) -> Option<f64> {
        self.next_eligible_at
    }

    pub fn last_activity_at(&self) -> f64 {
        self.last_activity_at
    }

    pub fn last_flush_reason(&self) -> Option<FlushReason> {
        self.last_flush_reason
    }

    pub fn touch(&mut self, now: f64) {
        if now.is_finite() {
            self.last_activity_at = now;
        }
    }

    /// Start a new pending chunk, replacing none (callers flush first)
    pub(crate) fn start_chunk(&mut self, text: &str, timestamp: f64) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(PendingChunk::new(text, timestamp));
    }

    pub(crate) fn pending_mut(&mut self) -> Option<&mut PendingChunk> {
        self.pending.as_mut()
    }

    /// Commit the pending chunk, if any, into history.
    ///
    /// Returns true when a message was committed.
    pub fn flush_pending(&mut self, reason: FlushReason) -> bool {
        let Some(chunk) = self.pending.take() else {
            return false;
        };

        let text = chunk.text().trim();
        if text.is_empty() {
            return false;
        }

        debug!(
            session = %self.session_id,
            reason = %reason,
            words = chunk.word_count(),
            "flushed user chunk"
        );

        self.messages.push_back(Message {
            speaker: Speaker::User,
            text: text.to_string(),
            timestamp: chunk.start_timestamp(),
        });
        let spoke_at = chunk.last_timestamp();
        self.last_user_speech_at = Some(match self.last_user_speech_at {
            Some(prev) => prev.max(spoke_at),
            None => spoke_at,
        });
        self.last_flush_reason = Some(reason);
        self.evict_overflow();
        self.recompute();

        // A new utterance invalidates any computed "wait until" deadline
        self.next_eligible_at = None;
        true
    }

    /// Append a non-user message directly to history
    pub fn push_other(&mut self, speaker: Speaker, text: String, timestamp: f64) {
        self.messages.push_back(Message {
            speaker,
            text,
            timestamp,
        });
        self.evict_overflow();
        self.recompute();
    }

    /// Mark every retained message as consumed by an analysis
    pub fn consume(&mut self) {
        self.evict_overflow();
        self.fresh_from = self.messages.len();
        self.recompute();
    }

    pub fn mark_analysis(&mut self, now: f64) {
        self.last_analysis_at = self.last_analysis_at.max(now);
    }

    pub fn record_action(&mut self, now: f64) {
        self.last_action_at = Some(match self.last_action_at {
            Some(prev) => prev.max(now),
            None => now,
        });
    }

    /// Push the earliest retry time out to at least `at`
    pub fn defer_until(&mut self, at: f64) {
        self.next_eligible_at = Some(match self.next_eligible_at {
            Some(current) => current.max(at),
            None => at,
        });
    }

    /// Overwrite the earliest retry time after a successful dispatch
    pub fn reset_next_eligible(&mut self, at: f64) {
        self.next_eligible_at = Some(at);
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            session_id: self.session_id.clone(),
            uid: self.uid.clone(),
            messages: self.messages.iter().cloned().collect(),
            fresh_from: self.fresh_from.min(self.messages.len()),
            pending_text: self.pending.as_ref().map(|c| c.text().to_string()),
            user_sentence_count: self.user_sentence_count,
            accumulation_started_at: self.accumulation_started_at,
            last_user_speech_at: self.last_user_speech_at,
            last_analysis_at: self.last_analysis_at,
            last_action_at: self.last_action_at,
            next_eligible_at: self.next_eligible_at,
            last_activity_at: self.last_activity_at,
        }
    }

    fn evict_overflow(&mut self) {
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
            self.fresh_from = self.fresh_from.saturating_sub(1);
        }
    }

    fn recompute(&mut self) {
        let fresh_users = self
            .messages
            .iter()
            .skip(self.fresh_from)
            .filter(|m| m.speaker.is_user());

        let mut sentences = 0;
        let mut first = None;
        for message in fresh_users {
            if first.is_none() {
                first = Some(message.timestamp);
            }
            sentences += count_sentences(&message.text);
        }

        self.user_sentence_count = sentences;
        self.accumulation_started_at = first;
    }
}
