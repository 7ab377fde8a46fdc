use serde::{Deserialize, Serialize};

/// What to do when a dispatcher's reply is neither clearly "act" nor "skip"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguousOutput {
    /// Treat unparseable output as "no action" (avoids over-notifying)
    #[default]
    NoAction,
    /// Treat unparseable output as "act"
    Act,
}

/// Interpret a free-text model reply of the form `true; Reasoning: ...`.
///
/// Leading whitespace and case are ignored. Replies that start with neither
/// `true` nor `false` fall back to `policy`.
pub fn parse_decision(reply: &str, policy: AmbiguousOutput) -> bool {
    let reply = reply.trim_start().to_ascii_lowercase();
    if reply.starts_with("true") {
        true
    } else if reply.starts_with("false") {
        false
    } else {
        policy == AmbiguousOutput::Act
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision_explicit() {
        assert!(parse_decision("true;\nReasoning: asked directly", AmbiguousOutput::NoAction));
        assert!(parse_decision("  TRUE", AmbiguousOutput::NoAction));
        assert!(!parse_decision("false; nothing to add", AmbiguousOutput::Act));
    }

    #[test]
    fn test_parse_decision_ambiguous_follows_policy() {
        assert!(!parse_decision("maybe?", AmbiguousOutput::NoAction));
        assert!(parse_decision("maybe?", AmbiguousOutput::Act));
        assert!(!parse_decision("", AmbiguousOutput::NoAction));
    }
}
