//! Claim status lifecycle

use serde::{Deserialize, Serialize};

/// Claim adjudication status
///
/// Forward-only machine: `Draft → Submitted → Processing → {Approved,
/// Denied}`, then `Approved → Paid`. `Denied` and `Paid` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Draft,
    Submitted,
    Processing,
    Approved,
    Denied,
    Paid,
}

impl ClaimStatus {
    /// Whether the machine permits moving from `self` to `next`
    pub fn can_transition(self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (ClaimStatus::Draft, ClaimStatus::Submitted)
                | (ClaimStatus::Submitted, ClaimStatus::Processing)
                | (ClaimStatus::Processing, ClaimStatus::Approved)
                | (ClaimStatus::Processing, ClaimStatus::Denied)
                | (ClaimStatus::Approved, ClaimStatus::Paid)
        )
    }

    /// Whether line items may still be edited
    pub fn is_editable(self) -> bool {
        self == ClaimStatus::Draft
    }

    /// Whether no further transition exists
    pub fn is_terminal(self) -> bool {
        matches!(self, ClaimStatus::Denied | ClaimStatus::Paid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::Processing => "processing",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Denied => "denied",
            ClaimStatus::Paid => "paid",
        }
    }
}
