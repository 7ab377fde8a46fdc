use super::config::BufferConfig;
use super::state::SessionBuffer;
use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Shared handle to one session's buffer.
///
/// Holding the mutex is what serializes work on a session.
pub type SessionHandle = Arc<Mutex<SessionBuffer>>;

/// Registry of live session buffers (session_id → buffer)
pub struct SessionBufferStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    config: BufferConfig,
    analysis_cooldown_secs: f64,
}

impl SessionBufferStore {
    /// Create an empty store.
    ///
    /// The analysis cooldown seeds fresh buffers' `last_analysis_at`.
    pub fn new(config: BufferConfig, analysis_cooldown_secs: f64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            analysis_cooldown_secs,
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Return the buffer for `session_id`, creating it if missing
    pub async fn get_or_create(&self, session_id: &str, now: f64) -> SessionHandle {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(session_id) {
                return Arc::clone(handle);
            }
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(session_id.to_string()).or_insert_with(|| {
            info!("Creating session buffer: {}", session_id);
            Arc::new(Mutex::new(SessionBuffer::new(
                session_id,
                now,
                self.config.max_messages,
                self.analysis_cooldown_secs,
            )))
        });
        Arc::clone(handle)
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(Arc::clone)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Evict sessions idle for longer than the retention window.
    ///
    /// A session is only evicted when no caller holds its handle, so an
    /// in-flight request never writes into a buffer that left the map.
    /// Returns the number of evicted sessions.
    pub async fn sweep(&self, now: f64) -> usize {
        let retention = self.config.retention_secs;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|session_id, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            let Ok(buffer) = handle.try_lock() else {
                return true;
            };
            let idle = now - buffer.last_activity_at();
            if idle > retention {
                debug!("Session {} removed after {:.0}s idle", session_id, idle);
                false
            } else {
                true
            }
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Swept {} idle session(s), {} remaining", removed, sessions.len());
        }
        removed
    }
}

/// Run `sweep` on a fixed interval until the task is aborted
pub fn spawn_sweeper(store: Arc<SessionBufferStore>, clock: Arc<dyn Clock>) -> JoinHandle<()> {
    let period = Duration::from_secs(store.config().sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.sweep(clock.now()).await;
        }
    })
}
