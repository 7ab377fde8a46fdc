use serde::{Deserialize, Serialize};
use std::fmt;

use super::text::count_words;

/// Label used for the device owner in committed history
pub const USER_LABEL: &str = "user";

/// Label used for non-user speech when the device gives none
pub const DEFAULT_OTHER_LABEL: &str = "other";

/// A single transcribed utterance fragment from the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Transcribed text (sanitized during ingestion)
    #[serde(default)]
    pub text: String,

    /// Seconds since epoch; `None` means "now" at ingestion time
    #[serde(default, alias = "timestamp")]
    pub start: Option<f64>,

    /// Whether the device owner spoke this segment
    #[serde(default)]
    pub is_user: bool,

    /// Free-text speaker label for non-user speech
    #[serde(default)]
    pub speaker: Option<String>,
}

impl Segment {
    pub fn user(text: impl Into<String>, start: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            is_user: true,
            speaker: None,
        }
    }

    pub fn other(speaker: impl Into<String>, text: impl Into<String>, start: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            is_user: false,
            speaker: Some(speaker.into()),
        }
    }
}

/// Who produced a committed message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Speaker {
    User,
    Other(String),
}

impl Speaker {
    pub fn is_user(&self) -> bool {
        matches!(self, Speaker::User)
    }

    pub fn label(&self) -> &str {
        match self {
            Speaker::User => USER_LABEL,
            Speaker::Other(label) => label,
        }
    }
}

impl From<String> for Speaker {
    fn from(label: String) -> Self {
        if label == USER_LABEL {
            Speaker::User
        } else {
            Speaker::Other(label)
        }
    }
}

impl From<Speaker> for String {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => USER_LABEL.to_string(),
            Speaker::Other(label) => label,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A committed, immutable conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: f64,
}

/// Consecutive user speech not yet committed to history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingChunk {
    text: String,
    start_timestamp: f64,
    last_timestamp: f64,
    word_count: usize,
}

impl PendingChunk {
    pub fn new(text: &str, timestamp: f64) -> Self {
        Self {
            text: text.to_string(),
            start_timestamp: timestamp,
            last_timestamp: timestamp,
            word_count: count_words(text),
        }
    }

    /// Space-join more text onto the chunk.
    ///
    /// `last_timestamp` never moves backwards.
    pub fn append(&mut self, text: &str, timestamp: f64) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
        self.word_count = count_words(&self.text);
        self.last_timestamp = self.last_timestamp.max(timestamp);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_timestamp(&self) -> f64 {
        self.start_timestamp
    }

    pub fn last_timestamp(&self) -> f64 {
        self.last_timestamp
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

/// Why a pending chunk was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushReason {
    SpeakerChange,
    Timeout,
    WordThreshold,
    SentenceComplete,
    PostTimeout,
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlushReason::SpeakerChange => "speaker-change",
            FlushReason::Timeout => "timeout",
            FlushReason::WordThreshold => "word-threshold",
            FlushReason::SentenceComplete => "sentence-complete",
            FlushReason::PostTimeout => "post-timeout",
        };
        f.write_str(s)
    }
}
