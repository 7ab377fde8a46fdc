//! Typed errors for the dispatch boundary and the settings API.

use thiserror::Error;

/// Failure of a downstream dispatcher call.
///
/// Never escapes `Engine::evaluate`; every variant is treated as "no action".
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Dispatcher timed out after {secs:.1}s")]
    Timeout { secs: f64 },

    #[error("Dispatcher transport failed: {0}")]
    Transport(String),

    #[error("Dispatcher returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            DispatchError::InvalidResponse(err.to_string())
        } else {
            DispatchError::Transport(err.to_string())
        }
    }
}

/// Rejected per-user settings update
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("min_sentences must be between 1 and 10, got {0}")]
    MinSentencesOutOfRange(u32),

    #[error("cooldown_seconds must be between 30 and 900, got {0}")]
    CooldownOutOfRange(u64),

    #[error("uid must be 3 to 50 characters of letters, digits, '-' or '_'")]
    InvalidUid,
}
