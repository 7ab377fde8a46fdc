#![allow(dead_code)]

use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wearable_gate::{
    ActionDispatcher, BufferSnapshot, Clock, Config, DispatchError, DispatchResult, Engine, ManualClock,
};

/// What a scripted dispatcher does when invoked
#[derive(Debug, Clone)]
pub enum Script {
    Act(Value),
    NoAction,
    Fail,
    Stall(Duration),
    Panic,
}

/// Dispatcher that follows a fixed script and counts invocations
pub struct ScriptedDispatcher {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedDispatcher {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ActionDispatcher for ScriptedDispatcher {
    async fn invoke(&self, _snapshot: &BufferSnapshot) -> Result<DispatchResult, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Act(payload) => Ok(DispatchResult::Acted(payload.clone())),
            Script::NoAction => Ok(DispatchResult::NoAction),
            Script::Fail => Err(DispatchError::Transport("connection refused".to_string())),
            Script::Stall(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(DispatchResult::Acted(serde_json::json!({ "late": true })))
            }
            Script::Panic => panic!("dispatcher blew up"),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Engine on default config, a manual clock and the given dispatcher
pub fn test_engine(dispatcher: Arc<dyn ActionDispatcher>, clock: &Arc<ManualClock>) -> Engine {
    test_engine_with(Config::default(), dispatcher, clock)
}

pub fn test_engine_with(config: Config, dispatcher: Arc<dyn ActionDispatcher>, clock: &Arc<ManualClock>) -> Engine {
    let clock: Arc<dyn Clock> = Arc::clone(clock) as Arc<dyn Clock>;
    Engine::with_dispatcher(&config, dispatcher, clock)
}

/// Three complete user sentences at t=0, 10 and 20
pub fn three_sentences() -> Vec<wearable_gate::Segment> {
    vec![
        wearable_gate::Segment::user("I went hiking yesterday.", 0.0),
        wearable_gate::Segment::user("The view was great.", 10.0),
        wearable_gate::Segment::user("We should go back soon.", 20.0),
    ]
}
