use serde::{Deserialize, Serialize};

/// A member whose actions are never counted or remediated in one guild.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionEntry {
    pub user_id: u64,
    pub added_by: u64,
    /// Unix seconds.
    pub added_at: u64,
}
