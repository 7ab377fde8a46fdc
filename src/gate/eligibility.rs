use super::settings::GateSettings;
use crate::buffer::SessionBuffer;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// First check that kept a session from being dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    UnknownSession,
    AccumulationWindow,
    InsufficientSentences,
    AwaitingSilence,
    AnalysisCooldown,
    ActionCooldown,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::UnknownSession => "unknown session",
            Rejection::AccumulationWindow => "accumulation window too short",
            Rejection::InsufficientSentences => "not enough user sentences",
            Rejection::AwaitingSilence => "awaiting post-speech silence",
            Rejection::AnalysisCooldown => "analysis cooldown active",
            Rejection::ActionCooldown => "action cooldown active",
        };
        f.write_str(s)
    }
}

/// Result of the pre-dispatch checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateCheck {
    /// A previously computed deadline has not passed yet
    Deferred { next_eligible_at: f64 },
    Rejected(Rejection),
    /// All checks passed; `last_analysis_at` is already marked
    Open,
}

/// Run the ordered eligibility checks against `buffer`.
///
/// Only the first failing check decides the outcome. Time-based rejections
/// record a `next_eligible_at` lower bound so later calls short-circuit.
pub fn check(buffer: &mut SessionBuffer, settings: &GateSettings, now: f64) -> GateCheck {
    let session = buffer.session_id().to_string();

    if let Some(next) = buffer.next_eligible_at() {
        if now < next {
            debug!(session = %session, wait_secs = next - now, "skip: deferred until eligibility window");
            return GateCheck::Deferred { next_eligible_at: next };
        }
    }

    let accumulation_age = buffer.accumulation_started_at().map(|t| now - t);
    match accumulation_age {
        Some(age) if age >= settings.min_accumulation_window_secs => {}
        _ => {
            let wait = accumulation_age
                .map_or(settings.min_accumulation_window_secs, |age| {
                    (settings.min_accumulation_window_secs - age).max(0.0)
                });
            buffer.defer_until(now + wait);
            debug!(session = %session, ?accumulation_age, wait_secs = wait, "skip: {}", Rejection::AccumulationWindow);
            return GateCheck::Rejected(Rejection::AccumulationWindow);
        }
    }

    if (buffer.user_sentence_count() as u64) < u64::from(settings.min_user_sentences) {
        debug!(
            session = %session,
            sentences = buffer.user_sentence_count(),
            required = settings.min_user_sentences,
            "skip: {}",
            Rejection::InsufficientSentences
        );
        return GateCheck::Rejected(Rejection::InsufficientSentences);
    }

    let silence_age = buffer.last_user_speech_at().map(|t| now - t);
    match silence_age {
        Some(age) if age >= settings.min_silence_after_user_secs => {}
        _ => {
            let wait = silence_age.map_or(settings.min_silence_after_user_secs, |age| {
                (settings.min_silence_after_user_secs - age).max(0.0)
            });
            buffer.defer_until(now + wait);
            debug!(session = %session, ?silence_age, wait_secs = wait, "skip: {}", Rejection::AwaitingSilence);
            return GateCheck::Rejected(Rejection::AwaitingSilence);
        }
    }

    let since_analysis = now - buffer.last_analysis_at();
    if since_analysis < settings.analysis_cooldown_secs {
        let wait = settings.analysis_cooldown_secs - since_analysis;
        buffer.defer_until(now + wait);
        debug!(session = %session, wait_secs = wait, "skip: {}", Rejection::AnalysisCooldown);
        return GateCheck::Rejected(Rejection::AnalysisCooldown);
    }

    // A session that never acted has no action cooldown to wait out
    if let Some(last_action) = buffer.last_action_at() {
        let since_action = now - last_action;
        if since_action < settings.cooldown_after_action_secs {
            // Content is consumed without acting so the buffer cannot grow while cooling down
            let wait = settings.cooldown_after_action_secs - since_action;
            buffer.mark_analysis(now);
            buffer.consume();
            buffer.defer_until(now + wait);
            debug!(session = %session, wait_secs = wait, "skip: {}", Rejection::ActionCooldown);
            return GateCheck::Rejected(Rejection::ActionCooldown);
        }
    }

    buffer.mark_analysis(now);
    GateCheck::Open
}

/// Post-dispatch bookkeeping.
///
/// `acted` is true only when the dispatcher decided to act and produced
/// output; failures and timeouts settle as "no action".
pub fn settle(buffer: &mut SessionBuffer, settings: &GateSettings, acted: bool, now: f64) {
    buffer.consume();
    if acted {
        buffer.record_action(now);
        buffer.reset_next_eligible(now + settings.cooldown_after_action_secs);
    } else {
        buffer.defer_until(now + settings.analysis_cooldown_secs);
    }
}
