use crate::buffer::{ingest_segments, BufferSnapshot, IngestReport, Segment, SessionBuffer, SessionBufferStore};
use crate::clock::Clock;
use crate::config::Config;
use crate::dispatch::{ActionDispatcher, DispatchResult, DispatcherFactory};
use crate::error::DispatchError;
use crate::gate::{self, EligibilityOutcome, GateCheck, Rejection, UserSettingsStore};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Buffering + gating engine shared by all webhook calls.
///
/// Every operation on a session holds that session's mutex for its whole
/// duration (including the dispatcher call), so calls for one session are
/// serialized while different sessions run in parallel.
pub struct Engine {
    store: Arc<SessionBufferStore>,
    settings: Arc<UserSettingsStore>,
    dispatcher: Arc<dyn ActionDispatcher>,
    clock: Arc<dyn Clock>,
    dispatch_timeout: Duration,
}

impl Engine {
    pub fn new(
        store: Arc<SessionBufferStore>,
        settings: Arc<UserSettingsStore>,
        dispatcher: Arc<dyn ActionDispatcher>,
        clock: Arc<dyn Clock>,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            settings,
            dispatcher,
            clock,
            dispatch_timeout,
        }
    }

    /// Build an engine from configuration with the configured dispatcher
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let dispatcher = DispatcherFactory::create(&config.dispatcher)?;
        Ok(Self::with_dispatcher(config, dispatcher, clock))
    }

    /// Build an engine from configuration around a caller-supplied dispatcher
    pub fn with_dispatcher(config: &Config, dispatcher: Arc<dyn ActionDispatcher>, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(SessionBufferStore::new(
            config.buffer.clone(),
            config.gate.analysis_cooldown_secs,
        ));
        let settings = Arc::new(UserSettingsStore::new(config.gate.clone()));

        Self::new(store, settings, dispatcher, clock, config.dispatcher.timeout())
    }

    pub fn store(&self) -> &Arc<SessionBufferStore> {
        &self.store
    }

    pub fn settings(&self) -> &Arc<UserSettingsStore> {
        &self.settings
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Fold a webhook payload's segments into the session's buffer
    pub async fn ingest(&self, session_id: &str, uid: Option<&str>, segments: &[Segment]) -> IngestReport {
        let now = self.clock.now();
        let handle = self.store.get_or_create(session_id, now).await;
        let mut buffer = handle.lock().await;
        self.ingest_locked(&mut buffer, uid, segments, now)
    }

    /// Run the eligibility gate and, if it opens, the dispatcher
    pub async fn evaluate(&self, session_id: &str) -> EligibilityOutcome {
        let Some(handle) = self.store.get(session_id).await else {
            return EligibilityOutcome::NotYetEligible {
                reason: Rejection::UnknownSession,
            };
        };
        let mut buffer = handle.lock().await;
        self.evaluate_locked(&mut buffer).await
    }

    /// Ingest then evaluate as one critical section for the session
    pub async fn handle_webhook(
        &self,
        session_id: &str,
        uid: Option<&str>,
        segments: &[Segment],
    ) -> (IngestReport, EligibilityOutcome) {
        let now = self.clock.now();
        let handle = self.store.get_or_create(session_id, now).await;
        let mut buffer = handle.lock().await;

        let report = self.ingest_locked(&mut buffer, uid, segments, now);
        let outcome = self.evaluate_locked(&mut buffer).await;
        (report, outcome)
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<BufferSnapshot> {
        let handle = self.store.get(session_id).await?;
        let buffer = handle.lock().await;
        Some(buffer.snapshot())
    }

    pub async fn sweep(&self) -> usize {
        self.store.sweep(self.clock.now()).await
    }

    pub async fn active_sessions(&self) -> usize {
        self.store.len().await
    }

    fn ingest_locked(
        &self,
        buffer: &mut SessionBuffer,
        uid: Option<&str>,
        segments: &[Segment],
        now: f64,
    ) -> IngestReport {
        buffer.set_uid(uid);
        ingest_segments(buffer, segments, self.store.config(), now)
    }

    async fn evaluate_locked(&self, buffer: &mut SessionBuffer) -> EligibilityOutcome {
        let settings = self.settings.gate_settings(buffer.uid()).await;
        let now = self.clock.now();

        match gate::check(buffer, &settings, now) {
            GateCheck::Deferred { next_eligible_at } => {
                return EligibilityOutcome::Deferred { next_eligible_at };
            }
            GateCheck::Rejected(reason) => {
                return EligibilityOutcome::NotYetEligible { reason };
            }
            GateCheck::Open => {}
        }

        let snapshot = buffer.snapshot();
        info!(
            session = %snapshot.session_id,
            dispatcher = self.dispatcher.name(),
            messages = snapshot.messages.len(),
            sentences = snapshot.user_sentence_count,
            "dispatching eligible window"
        );

        let result = self.dispatch(snapshot).await;

        // Bookkeeping always runs, whatever the dispatcher did
        gate::settle(buffer, &settings, result.acted(), self.clock.now());

        EligibilityOutcome::ActionInvoked { result }
    }

    /// Invoke the dispatcher on its own task under the dispatch timeout.
    ///
    /// Errors, panics and timeouts all come back as `NoAction`.
    async fn dispatch(&self, snapshot: BufferSnapshot) -> DispatchResult {
        let session_id = snapshot.session_id.clone();
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut task = tokio::spawn(async move { dispatcher.invoke(&snapshot).await });

        let error = match tokio::time::timeout(self.dispatch_timeout, &mut task).await {
            Ok(Ok(Ok(result))) => return result,
            Ok(Ok(Err(e))) => e,
            Ok(Err(join_error)) => DispatchError::Transport(format!("dispatcher task failed: {}", join_error)),
            Err(_) => {
                task.abort();
                DispatchError::Timeout {
                    secs: self.dispatch_timeout.as_secs_f64(),
                }
            }
        };

        warn!(session = %session_id, "Dispatch treated as no action: {}", error);
        DispatchResult::NoAction
    }
}
