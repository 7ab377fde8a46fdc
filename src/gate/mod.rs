//! Eligibility gate
//!
//! Decides when a session's accumulated user speech justifies an expensive
//! downstream action, and keeps the cooldown bookkeeping around it.

mod eligibility;
mod outcome;
mod settings;

pub use eligibility::{check, settle, GateCheck, Rejection};
pub use outcome::EligibilityOutcome;
pub use settings::{
    normalize_uid, GateSettings, SettingsPatch, UserSettings, UserSettingsStore, COOLDOWN_SECONDS_RANGE,
    MIN_SENTENCES_RANGE,
};
