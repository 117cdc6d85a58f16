/// Target state definitions for tracking crawl progress
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl target
///
/// Targets move `Pending -> Dispatched -> {Completed | Failed}`. Links dropped
/// by the domain or depth check never get a state at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    /// Claimed and waiting in the frontier
    Pending,

    /// A fetch task is running for this target
    Dispatched,

    /// Fetched and extracted
    Completed,

    /// Fetch failed after all retries
    Failed,
}

impl TargetState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: TargetState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Dispatched)
                | (Self::Dispatched, Self::Completed)
                | (Self::Dispatched, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!TargetState::Pending.is_terminal());
        assert!(!TargetState::Dispatched.is_terminal());
        assert!(TargetState::Completed.is_terminal());
        assert!(TargetState::Failed.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(TargetState::Pending.can_transition_to(TargetState::Dispatched));
        assert!(TargetState::Dispatched.can_transition_to(TargetState::Completed));
        assert!(TargetState::Dispatched.can_transition_to(TargetState::Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!TargetState::Pending.can_transition_to(TargetState::Completed));
        assert!(!TargetState::Completed.can_transition_to(TargetState::Dispatched));
        assert!(!TargetState::Failed.can_transition_to(TargetState::Pending));
        assert!(!TargetState::Dispatched.can_transition_to(TargetState::Dispatched));
    }

    #[test]
    fn test_display() {
        assert_eq!(TargetState::Dispatched.to_string(), "dispatched");
        assert_eq!(
            serde_json::to_string(&TargetState::Completed).unwrap(),
            "\"completed\""
        );
    }
}
