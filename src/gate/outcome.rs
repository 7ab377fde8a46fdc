use super::eligibility::Rejection;
use crate::dispatch::DispatchResult;
use serde::Serialize;

/// What one evaluation of a session decided
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EligibilityOutcome {
    /// Short-circuited on a previously computed deadline
    Deferred { next_eligible_at: f64 },

    /// The dispatcher ran (errors and timeouts report `NoAction`)
    ActionInvoked { result: DispatchResult },

    /// A check failed this round
    NotYetEligible { reason: Rejection },
}

impl EligibilityOutcome {
    /// Dispatcher payload worth returning to the device, if any
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            EligibilityOutcome::ActionInvoked {
                result: DispatchResult::Acted(payload),
            } => Some(payload),
            _ => None,
        }
    }

    pub fn is_action_invoked(&self) -> bool {
        matches!(self, EligibilityOutcome::ActionInvoked { .. })
    }
}
