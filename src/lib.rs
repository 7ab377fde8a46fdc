pub mod buffer;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gate;
pub mod http;

pub use buffer::{
    spawn_sweeper, BufferConfig, BufferSnapshot, FlushReason, IngestReport, Message, PendingChunk, Segment,
    SessionBuffer, SessionBufferStore, Speaker,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use dispatch::{ActionDispatcher, AmbiguousOutput, DispatchResult, DispatcherFactory, HttpDispatcher, KeywordDispatcher};
pub use engine::Engine;
pub use error::{DispatchError, SettingsError};
pub use gate::{EligibilityOutcome, GateSettings, Rejection, UserSettings, UserSettingsStore};
pub use http::{create_router, AppState};
