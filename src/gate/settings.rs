use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tokio::sync::RwLock;

pub const MIN_SENTENCES_RANGE: RangeInclusive<u32> = 1..=10;
pub const COOLDOWN_SECONDS_RANGE: RangeInclusive<u64> = 30..=900;

/// Thresholds read by the eligibility gate at evaluation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    /// User sentences required since the last analysis
    /// Default: 2
    pub min_user_sentences: u32,

    /// Quiet period after a successful dispatch
    /// Default: 120 seconds
    pub cooldown_after_action_secs: f64,

    /// How long the user must have been talking about the current topic
    /// Default: 15 seconds
    pub min_accumulation_window_secs: f64,

    /// Pause required after the last user speech
    /// Default: 3 seconds
    pub min_silence_after_user_secs: f64,

    /// Minimum spacing between analyses
    /// Default: 60 seconds
    pub analysis_cooldown_secs: f64,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            min_user_sentences: 2,
            cooldown_after_action_secs: 120.0,
            min_accumulation_window_secs: 15.0,
            min_silence_after_user_secs: 3.0,
            analysis_cooldown_secs: 60.0,
        }
    }
}

impl GateSettings {
    /// Overlay a user's stored preferences on these defaults
    pub fn with_user(&self, user: &UserSettings) -> Self {
        Self {
            min_user_sentences: user.min_user_sentences,
            cooldown_after_action_secs: user.cooldown_after_action_secs as f64,
            ..self.clone()
        }
    }
}

/// User-adjustable part of the gate configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "min_sentences")]
    pub min_user_sentences: u32,

    #[serde(rename = "cooldown_seconds")]
    pub cooldown_after_action_secs: u64,
}

impl UserSettings {
    pub fn from_defaults(defaults: &GateSettings) -> Self {
        Self {
            min_user_sentences: defaults.min_user_sentences,
            cooldown_after_action_secs: defaults.cooldown_after_action_secs.max(0.0).round() as u64,
        }
    }
}

/// Partial settings update as accepted by the settings API
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsPatch {
    #[serde(rename = "min_sentences")]
    pub min_user_sentences: Option<u32>,

    #[serde(rename = "cooldown_seconds")]
    pub cooldown_after_action_secs: Option<u64>,
}

impl SettingsPatch {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(n) = self.min_user_sentences {
            if !MIN_SENTENCES_RANGE.contains(&n) {
                return Err(SettingsError::MinSentencesOutOfRange(n));
            }
        }
        if let Some(secs) = self.cooldown_after_action_secs {
            if !COOLDOWN_SECONDS_RANGE.contains(&secs) {
                return Err(SettingsError::CooldownOutOfRange(secs));
            }
        }
        Ok(())
    }
}

/// In-memory per-user settings (uid → settings)
pub struct UserSettingsStore {
    defaults: GateSettings,
    users: RwLock<HashMap<String, UserSettings>>,
}

impl UserSettingsStore {
    pub fn new(defaults: GateSettings) -> Self {
        Self {
            defaults,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &GateSettings {
        &self.defaults
    }

    /// Stored settings for `uid`, or the defaults
    pub async fn get(&self, uid: &str) -> UserSettings {
        let users = self.users.read().await;
        users
            .get(uid)
            .copied()
            .unwrap_or_else(|| UserSettings::from_defaults(&self.defaults))
    }

    /// Validate and merge a partial update, returning the new settings
    pub async fn update(&self, uid: &str, patch: SettingsPatch) -> Result<UserSettings, SettingsError> {
        patch.validate()?;

        let mut users = self.users.write().await;
        let entry = users
            .entry(uid.to_string())
            .or_insert_with(|| UserSettings::from_defaults(&self.defaults));
        if let Some(n) = patch.min_user_sentences {
            entry.min_user_sentences = n;
        }
        if let Some(secs) = patch.cooldown_after_action_secs {
            entry.cooldown_after_action_secs = secs;
        }
        Ok(*entry)
    }

    /// Effective gate thresholds for a session owned by `uid`
    pub async fn gate_settings(&self, uid: Option<&str>) -> GateSettings {
        match uid {
            Some(uid) => {
                let users = self.users.read().await;
                match users.get(uid) {
                    Some(user) => self.defaults.with_user(user),
                    None => self.defaults.clone(),
                }
            }
            None => self.defaults.clone(),
        }
    }
}

/// Normalize a caller-supplied uid.
///
/// The trimmed value must be 3 to 50 characters; anything outside
/// `[A-Za-z0-9_-]` is then stripped.
pub fn normalize_uid(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(3..=50).contains(&len) {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
