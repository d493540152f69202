//! Append-only approval history

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::{RequestId, Role, UserId};

/// A workflow decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Deny,
}

/// One recorded workflow action; never mutated or deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub id: Uuid,
    pub request_id: RequestId,
    pub level: u32,
    pub approver_role: Role,
    pub approver_id: UserId,
    pub decision: Decision,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ApprovalStep {
    pub(crate) fn record(
        request_id: RequestId,
        level: u32,
        approver_role: Role,
        approver_id: UserId,
        decision: Decision,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            level,
            approver_role,
            approver_id,
            decision,
            notes,
            timestamp: Utc::now(),
        }
    }
}

/// Per-request approval trail
///
/// Steps are appended under the engine's write lock and never rewritten;
/// reads return a snapshot in append order.
pub struct AuditTrail {
    steps: DashMap<RequestId, Vec<ApprovalStep>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            steps: DashMap::new(),
        }
    }

    /// Append a step to a request's trail
    pub fn append(&self, step: ApprovalStep) {
        tracing::debug!(
            request_id = %step.request_id,
            level = step.level,
            decision = ?step.decision,
            "approval step recorded"
        );
        self.steps.entry(step.request_id).or_default().push(step);
    }

    /// A request's trail in append order
    pub fn for_request(&self, request_id: &RequestId) -> Vec<ApprovalStep> {
        self.steps
            .get(request_id)
            .map(|steps| steps.clone())
            .unwrap_or_default()
    }

    /// Number of recorded steps for a request
    pub fn len_for(&self, request_id: &RequestId) -> usize {
        self.steps.get(request_id).map_or(0, |steps| steps.len())
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}
