//! Session buffering
//!
//! This module provides the per-session transcript buffer and its registry:
//! - `Segment` / `Message` / `PendingChunk` data types
//! - `SessionBuffer` with bounded history and derived counters
//! - `SessionBufferStore` with idle eviction
//! - Ingestion of webhook segments into a buffer

mod config;
mod ingest;
mod segment;
mod state;
mod store;
pub mod text;

pub use config::BufferConfig;
pub use ingest::{ingest_segments, IngestReport};
pub use segment::{FlushReason, Message, PendingChunk, Segment, Speaker, DEFAULT_OTHER_LABEL, USER_LABEL};
pub use state::{BufferSnapshot, SessionBuffer};
pub use store::{spawn_sweeper, SessionBufferStore, SessionHandle};
