//! Priority tiers.

use serde::{Deserialize, Serialize};

/// The six fixed dispatch phases, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Veto the intent outright.
    Cancel,
    /// Veto the intent or rewrite its parameters.
    CancelAndModify,
    /// React without vetoing.
    Modify,
    /// Bookkeeping just before the core effect.
    PreResolve,
    /// The intent's primary effect. The engine's own state change is
    /// applied right before this tier.
    Resolve,
    /// Follow-ups after the core effect.
    PostResolve,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Cancel,
        Tier::CancelAndModify,
        Tier::Modify,
        Tier::PreResolve,
        Tier::Resolve,
        Tier::PostResolve,
    ];

    /// Whether handlers in this tier are allowed to cancel.
    #[must_use]
    pub const fn may_cancel(self) -> bool {
        matches!(self, Tier::Cancel | Tier::CancelAndModify)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Cancel => "cancel",
            Tier::CancelAndModify => "cancel-and-modify",
            Tier::Modify => "modify",
            Tier::PreResolve => "pre-resolve",
            Tier::Resolve => "resolve",
            Tier::PostResolve => "post-resolve",
        };
        f.write_str(name)
    }
}
