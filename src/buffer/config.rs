use serde::{Deserialize, Serialize};

/// Tunables for session buffering and retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Committed messages retained per session (oldest evicted first)
    /// Default: 24
    pub max_messages: usize,

    /// Pending user words that force a flush
    /// Default: 8
    pub word_flush_threshold: usize,

    /// Gap between user segments (seconds) that closes a pending chunk
    /// Default: 5 seconds
    pub flush_timeout_secs: f64,

    /// Idle time before a session is swept
    /// Default: 600 seconds (10 minutes)
    pub retention_secs: f64,

    /// How often the sweeper runs
    /// Default: 300 seconds (5 minutes)
    pub sweep_interval_secs: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_messages: 24,
            word_flush_threshold: 8,
            flush_timeout_secs: 5.0,
            retention_secs: 600.0,
            sweep_interval_secs: 300,
        }
    }
}
