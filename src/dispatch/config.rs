use super::decision::AmbiguousOutput;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatch budget used when the configured one is unusable
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Shortest dispatch budget handed to the runtime
const MIN_TIMEOUT_SECS: f64 = 0.001;

/// Which dispatcher backend handles eligible windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherKind {
    /// Act when a wake word was spoken
    #[default]
    Keyword,
    /// Ask a remote decision endpoint
    Http,
}

/// Configuration for the action dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub kind: DispatcherKind,

    /// Overall budget for one dispatch, including network I/O
    /// Default: 10 seconds
    pub timeout_secs: f64,

    /// Policy for replies that are neither "true" nor "false"
    pub ambiguous_output: AmbiguousOutput,

    /// Wake words for the keyword dispatcher (matched case-insensitively)
    pub keywords: Vec<String>,

    /// Decision endpoint for the http dispatcher
    pub endpoint: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            kind: DispatcherKind::Keyword,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ambiguous_output: AmbiguousOutput::NoAction,
            keywords: vec!["jarvis".into(), "harvis".into(), "yarvis".into()],
            endpoint: None,
        }
    }
}

impl DispatcherConfig {
    /// `timeout_secs` as a `Duration`.
    ///
    /// Tiny or negative values are raised to a millisecond; NaN and values
    /// too large for a `Duration` fall back to the default budget.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs.is_nan() {
            return Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS);
        }
        Duration::try_from_secs_f64(self.timeout_secs.max(MIN_TIMEOUT_SECS))
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }
}
