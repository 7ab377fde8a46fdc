//! Action dispatch boundary
//!
//! Once the gate opens, a dispatcher decides whether to act on the buffered
//! conversation and produces the payload returned to the device:
//! - `KeywordDispatcher` - wake-word notifications
//! - `HttpDispatcher` - remote decision endpoint

mod config;
mod decision;
mod http;
mod keyword;

pub use config::{DispatcherConfig, DispatcherKind, DEFAULT_TIMEOUT_SECS};
pub use decision::{parse_decision, AmbiguousOutput};
pub use http::HttpDispatcher;
pub use keyword::{format_discussion, KeywordDispatcher};

use crate::buffer::BufferSnapshot;
use crate::error::DispatchError;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one dispatcher call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchResult {
    /// The dispatcher acted; the payload goes back to the device
    Acted(serde_json::Value),
    /// The dispatcher decided against acting
    NoAction,
}

impl DispatchResult {
    pub fn acted(&self) -> bool {
        matches!(self, DispatchResult::Acted(_))
    }
}

/// Downstream collaborator invoked once per eligible window
#[async_trait::async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Decide on and perform the action for this conversation snapshot
    async fn invoke(&self, snapshot: &BufferSnapshot) -> Result<DispatchResult, DispatchError>;

    /// Get dispatcher name for logging
    fn name(&self) -> &str;
}

/// Dispatcher factory
pub struct DispatcherFactory;

impl DispatcherFactory {
    /// Create the dispatcher selected by configuration
    pub fn create(config: &DispatcherConfig) -> Result<Arc<dyn ActionDispatcher>> {
        match config.kind {
            DispatcherKind::Keyword => Ok(Arc::new(KeywordDispatcher::new(&config.keywords))),
            DispatcherKind::Http => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .context("dispatcher.endpoint is required for the http dispatcher")?;
                let dispatcher = HttpDispatcher::new(endpoint, config.timeout(), config.ambiguous_output)
                .context("Failed to build HTTP dispatcher")?;
                Ok(Arc::new(dispatcher))
            }
        }
    }
}
