//! Approval workflow engine

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::{CoreError, CoreResult, RequestId, Role, UserId};
use care_tenant::TenantScope;

use crate::grants::{AccessGrant, GrantRegistry};
use crate::history::{ApprovalStep, AuditTrail, Decision};
use crate::request::{AccessStatus, NewAccessRequest, PatientAccessRequest};
use crate::workflow::ApprovalWorkflow;

/// Engine time windows
#[derive(Debug, Clone, Copy)]
pub struct ApprovalConfig {
    /// How long a request may sit pending before it expires
    pub pending_ttl: Duration,
    /// How long approved access remains valid
    pub grant_ttl: Duration,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Duration::hours(72),
            grant_ttl: Duration::hours(24),
        }
    }
}

/// Caller-supplied fields of an approve or deny call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionInput {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Result of a workflow action
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalOutcome {
    /// Whether the request reached `Approved`
    pub approved: bool,
    /// The level now awaiting action, when the chain continues
    pub next_level: Option<u32>,
    /// The request after the action
    pub request: PatientAccessRequest,
}

/// Drives access requests through their role-gated approval chains
///
/// Every approve/deny runs its whole read-validate-write sequence under one
/// write lock, and rows carry a version token for remote callers, so two
/// approvers racing the same level cannot both advance it.
pub struct ApprovalEngine {
    config: ApprovalConfig,
    requests: Arc<RwLock<HashMap<RequestId, PatientAccessRequest>>>,
    trail: Arc<AuditTrail>,
    grants: Arc<GrantRegistry>,
}

impl ApprovalEngine {
    pub fn new(config: ApprovalConfig) -> Self {
        Self {
            config,
            requests: Arc::new(RwLock::new(HashMap::new())),
            trail: Arc::new(AuditTrail::new()),
            grants: Arc::new(GrantRegistry::new()),
        }
    }

    /// The registry consulted on grant-backed data access
    pub fn grants(&self) -> &GrantRegistry {
        &self.grants
    }

    /// Open a request at level 1 of its validated chain
    pub fn create_request(
        &self,
        scope: &TenantScope,
        input: NewAccessRequest,
    ) -> CoreResult<PatientAccessRequest> {
        if input.reason.trim().is_empty() {
            return Err(CoreError::validation("reason", "must not be empty"));
        }
        let workflow = ApprovalWorkflow::new(input.workflow)?;

        let now = Utc::now();
        let request = PatientAccessRequest {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id(),
            patient_id: input.patient_id,
            requesting_physician_id: input.requesting_physician_id,
            target_physician_id: input.target_physician_id,
            reason: input.reason,
            status: AccessStatus::Pending,
            current_level: 1,
            workflow,
            access_granted_until: None,
            pending_deadline: Some(now + self.config.pending_ttl),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        tracing::info!(
            request_id = %request.id,
            patient_id = %request.patient_id,
            levels = request.workflow.max_level(),
            "access request opened"
        );
        self.requests.write().insert(request.id, request.clone());
        Ok(request)
    }

    /// Fetch a request within scope
    pub fn get(&self, scope: &TenantScope, request_id: &RequestId) -> Option<PatientAccessRequest> {
        self.requests
            .read()
            .get(request_id)
            .filter(|r| scope.covers(r.tenant_id))
            .cloned()
    }

    /// Pending requests whose current level is gated to `role`
    pub fn list_pending_for(&self, scope: &TenantScope, role: Role) -> Vec<PatientAccessRequest> {
        let now = Utc::now();
        let mut pending: Vec<PatientAccessRequest> = self
            .requests
            .read()
            .values()
            .filter(|r| {
                scope.covers(r.tenant_id)
                    && r.status == AccessStatus::Pending
                    && !r.overdue(now)
                    && r.workflow.role_for(r.current_level) == Some(role)
            })
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending
    }

    /// A request's append-only trail
    pub fn history(&self, scope: &TenantScope, request_id: &RequestId) -> CoreResult<Vec<ApprovalStep>> {
        self.get(scope, request_id)
            .ok_or(CoreError::NotFound("access request"))?;
        Ok(self.trail.for_request(request_id))
    }

    /// Approve the current level, advancing the chain or granting access
    pub fn approve(
        &self,
        scope: &TenantScope,
        request_id: &RequestId,
        acting_role: Role,
        acting_user: UserId,
        input: DecisionInput,
    ) -> CoreResult<ApprovalOutcome> {
        let now = Utc::now();
        let mut requests = self.requests.write();
        let request = requests
            .get_mut(request_id)
            .filter(|r| scope.covers(r.tenant_id))
            .ok_or(CoreError::NotFound("access request"))?;

        if request.status.is_terminal() {
            return Err(CoreError::invalid_transition(
                request.status.as_str(),
                "approve",
            ));
        }
        if request.overdue(now) {
            request.status = AccessStatus::Expired;
            request.touch();
            tracing::warn!(request_id = %request.id, "approval window elapsed, request expired");
            return Err(CoreError::invalid_transition(
                AccessStatus::Expired.as_str(),
                "approve",
            ));
        }
        if let Some(expected) = input.expected_version {
            if expected != request.version {
                return Err(CoreError::Conflict(format!(
                    "stale version {expected}, request is at {}",
                    request.version
                )));
            }
        }
        let required = request
            .workflow
            .role_for(request.current_level)
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "no approver role configured for level {}",
                    request.current_level
                ))
            })?;
        if required != acting_role {
            tracing::warn!(
                request_id = %request.id,
                level = request.current_level,
                required = required.as_str(),
                acting = acting_role.as_str(),
                "approval attempted by wrong role"
            );
            return Err(CoreError::Authorization("not authorized at this level"));
        }

        self.trail.append(ApprovalStep::record(
            request.id,
            request.current_level,
            acting_role,
            acting_user,
            Decision::Approve,
            input.notes,
        ));

        if request.current_level >= request.workflow.max_level() {
            let until = now + self.config.grant_ttl;
            request.status = AccessStatus::Approved;
            request.access_granted_until = Some(until);
            request.touch();
            self.grants.insert(AccessGrant {
                request_id: request.id,
                tenant_id: request.tenant_id,
                patient_id: request.patient_id,
                physician_id: request.requesting_physician_id,
                granted_until: until,
            });
            tracing::info!(request_id = %request.id, until = %until, "access request approved");
            Ok(ApprovalOutcome {
                approved: true,
                next_level: None,
                request: request.clone(),
            })
        } else {
            request.current_level += 1;
            request.touch();
            tracing::info!(
                request_id = %request.id,
                next_level = request.current_level,
                "approval level advanced"
            );
            Ok(ApprovalOutcome {
                approved: false,
                next_level: Some(request.current_level),
                request: request.clone(),
            })
        }
    }

    /// Deny at the current level; a deny at any level is final
    pub fn deny(
        &self,
        scope: &TenantScope,
        request_id: &RequestId,
        acting_role: Role,
        acting_user: UserId,
        input: DecisionInput,
    ) -> CoreResult<ApprovalOutcome> {
        let now = Utc::now();
        let mut requests = self.requests.write();
        let request = requests
            .get_mut(request_id)
            .filter(|r| scope.covers(r.tenant_id))
            .ok_or(CoreError::NotFound("access request"))?;

        if request.status.is_terminal() {
            return Err(CoreError::invalid_transition(
                request.status.as_str(),
                "deny",
            ));
        }
        if request.overdue(now) {
            request.status = AccessStatus::Expired;
            request.touch();
            tracing::warn!(request_id = %request.id, "approval window elapsed, request expired");
            return Err(CoreError::invalid_transition(
                AccessStatus::Expired.as_str(),
                "deny",
            ));
        }
        if let Some(expected) = input.expected_version {
            if expected != request.version {
                return Err(CoreError::Conflict(format!(
                    "stale version {expected}, request is at {}",
                    request.version
                )));
            }
        }
        let required = request
            .workflow
            .role_for(request.current_level)
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "no approver role configured for level {}",
                    request.current_level
                ))
            })?;
        if required != acting_role {
            tracing::warn!(
                request_id = %request.id,
                level = request.current_level,
                required = required.as_str(),
                acting = acting_role.as_str(),
                "denial attempted by wrong role"
            );
            return Err(CoreError::Authorization("not authorized at this level"));
        }

        self.trail.append(ApprovalStep::record(
            request.id,
            request.current_level,
            acting_role,
            acting_user,
            Decision::Deny,
            input.notes,
        ));
        request.status = AccessStatus::Rejected;
        request.touch();
        tracing::info!(
            request_id = %request.id,
            level = request.current_level,
            "access request denied"
        );
        Ok(ApprovalOutcome {
            approved: false,
            next_level: None,
            request: request.clone(),
        })
    }

    /// Flip overdue pending requests to `Expired`; returns how many flipped
    ///
    /// Expiry is otherwise lazy (an approve or deny past the deadline flips
    /// the request); this sweep exists for operators, not a background timer.
    pub fn expire_overdue(&self, scope: &TenantScope, now: DateTime<Utc>) -> usize {
        let mut requests = self.requests.write();
        let mut flipped = 0;
        for request in requests.values_mut() {
            if scope.covers(request.tenant_id) && request.overdue(now) {
                request.status = AccessStatus::Expired;
                request.touch();
                tracing::warn!(request_id = %request.id, "pending request expired by sweep");
                flipped += 1;
            }
        }
        if flipped > 0 {
            tracing::info!(count = flipped, "expired overdue access requests");
        }
        flipped
    }
}
