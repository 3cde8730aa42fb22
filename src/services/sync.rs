//! Differential membership reconciliation.
//!
//! The declarative sync endpoints hand a full desired id set to the service,
//! which applies only the difference against the stored membership.

use std::collections::HashSet;

use uuid::Uuid;

/// Minimal change set turning one membership into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_add: Vec<Uuid>,
    pub to_remove: Vec<Uuid>,
}

impl MembershipDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the ids to insert and to delete so that `existing` becomes
/// `desired`. Ids present on both sides are untouched, so replaying the
/// same desired set is a no-op. Outputs are sorted to keep the writes they
/// drive deterministic.
#[must_use]
pub fn membership_diff(existing: &HashSet<Uuid>, desired: &HashSet<Uuid>) -> MembershipDiff {
    let mut to_add: Vec<Uuid> = desired.difference(existing).copied().collect();
    let mut to_remove: Vec<Uuid> = existing.difference(desired).copied().collect();
    to_add.sort_unstable();
    to_remove.sort_unstable();

    MembershipDiff { to_add, to_remove }
}
