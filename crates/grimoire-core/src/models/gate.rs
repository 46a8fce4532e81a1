use std::fmt;

use serde::{Deserialize, Serialize};

/// Verdict of the evaluation gate on a candidate answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateDecision {
    /// Deliver the answer.
    Pass,
    /// Reject the answer.
    Fail,
    /// Deliver only after human review.
    Review,
    /// Regenerate the answer.
    Retry,
}

impl GateDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Review => "REVIEW",
            Self::Retry => "RETRY",
        }
    }

    pub fn is_deliverable(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
