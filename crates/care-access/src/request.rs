//! Access-request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use care_common::{PatientId, RequestId, TenantId, UserId};

use crate::workflow::{ApprovalLevel, ApprovalWorkflow};

/// Lifecycle status of an access request
///
/// Everything but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl AccessStatus {
    /// Whether no further workflow action is permitted
    pub fn is_terminal(self) -> bool {
        self != AccessStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessStatus::Pending => "pending",
            AccessStatus::Approved => "approved",
            AccessStatus::Rejected => "rejected",
            AccessStatus::Expired => "expired",
        }
    }
}

/// A physician's request for elevated access to a patient's record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientAccessRequest {
    pub id: RequestId,
    pub tenant_id: TenantId,
    pub patient_id: PatientId,
    pub requesting_physician_id: UserId,
    pub target_physician_id: Option<UserId>,
    pub reason: String,
    pub status: AccessStatus,
    pub current_level: u32,
    pub workflow: ApprovalWorkflow,
    pub access_granted_until: Option<DateTime<Utc>>,
    pub pending_deadline: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientAccessRequest {
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Whether the approval window has elapsed at `now`
    pub fn overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == AccessStatus::Pending
            && self.pending_deadline.is_some_and(|deadline| now > deadline)
    }
}

/// Input for opening an access request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccessRequest {
    pub patient_id: PatientId,
    pub requesting_physician_id: UserId,
    pub target_physician_id: Option<UserId>,
    pub reason: String,
    /// Raw level descriptors; validated into an [`ApprovalWorkflow`]
    pub workflow: Vec<ApprovalLevel>,
}
