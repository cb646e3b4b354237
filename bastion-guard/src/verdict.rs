use crate::category::Category;
use crate::remediation::RemediationOutcome;

/// Why an event led to no action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Skip {
    /// No policy, or the relevant category is off.
    Disabled,
    /// A member joined who is not an automated account.
    NotABot,
    /// Messages from automated accounts are never moderated.
    AutomatedAuthor,
    StoreUnavailable,
    /// No audit entry could name the actor.
    Unattributed,
    /// The latest audit entry concerns a different target.
    TargetMismatch,
    /// The change was made by the engine's own account.
    OwnAction,
    Exempt,
}

/// Result of running one event through a detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Skipped(Skip),
    /// Counted, still at or below the threshold.
    Tolerated { count: u32, threshold: u32 },
    /// Every enabled content check passed.
    Clean,
    Remediated {
        category: Category,
        outcome: RemediationOutcome,
    },
}

impl Verdict {
    pub fn is_remediated(&self) -> bool {
        matches!(self, Verdict::Remediated { .. })
    }
}
