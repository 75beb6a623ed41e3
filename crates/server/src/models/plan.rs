//! Subscription plan document (`subscriptions/{plan_id}`).

use serde::{Deserialize, Serialize};

use refill_core::{PlanId, PlanTerms, Timestamp, UserId};

/// A stored plan: computed terms plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(flatten)]
    pub terms: PlanTerms,
    pub created_at: Timestamp,
    /// Set on custom plans; the plan key equals this user's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl Plan {
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.created_by.is_some()
    }
}

/// A plan with its key, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRecord {
    pub id: PlanId,
    #[serde(flatten)]
    pub plan: Plan,
}
