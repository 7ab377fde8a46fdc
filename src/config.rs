use crate::buffer::BufferConfig;
use crate::dispatch::{DispatcherConfig, DispatcherKind};
use crate::gate::GateSettings;
use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Environment variable prefix, e.g. `WEARABLE_GATE__SERVICE__HTTP__PORT=8080`
pub const ENV_PREFIX: &str = "WEARABLE_GATE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub buffer: BufferConfig,
    pub gate: GateSettings,
    pub dispatcher: DispatcherConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "wearable-gate".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5100,
        }
    }
}

impl Config {
    /// Load defaults, then the optional file at `path`, then environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let cfg: Config = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let buffer = &self.buffer;
        if buffer.max_messages == 0 {
            bail!("buffer.max_messages must be at least 1");
        }
        if buffer.word_flush_threshold == 0 {
            bail!("buffer.word_flush_threshold must be at least 1");
        }
        if !positive(buffer.flush_timeout_secs) {
            bail!("buffer.flush_timeout_secs must be positive");
        }
        if !positive(buffer.retention_secs) || buffer.sweep_interval_secs == 0 {
            bail!("buffer.retention_secs and buffer.sweep_interval_secs must be positive");
        }

        let gate = &self.gate;
        if gate.min_user_sentences == 0 {
            bail!("gate.min_user_sentences must be at least 1");
        }
        let windows = [
            ("gate.cooldown_after_action_secs", gate.cooldown_after_action_secs),
            ("gate.min_accumulation_window_secs", gate.min_accumulation_window_secs),
            ("gate.min_silence_after_user_secs", gate.min_silence_after_user_secs),
            ("gate.analysis_cooldown_secs", gate.analysis_cooldown_secs),
        ];
        for (key, value) in windows {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a non-negative number of seconds", key);
            }
        }

        if !positive(self.dispatcher.timeout_secs) {
            bail!("dispatcher.timeout_secs must be positive");
        }
        if self.dispatcher.kind == DispatcherKind::Http && self.dispatcher.endpoint.is_none() {
            bail!("dispatcher.endpoint is required when dispatcher.kind = \"http\"");
        }

        Ok(())
    }
}

fn positive(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0
}
