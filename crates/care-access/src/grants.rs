//! Time-bounded access grants
//!
//! A grant is written when a request reaches `Approved`. Holding a grant is
//! not enough: the expiry is re-checked on every data access made under it,
//! separate from the request's own lifecycle status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use care_common::{CoreError, CoreResult, PatientId, RequestId, TenantId, UserId};
use care_tenant::TenantScope;

/// Elevated access granted by an approved request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub request_id: RequestId,
    pub tenant_id: TenantId,
    pub patient_id: PatientId,
    pub physician_id: UserId,
    pub granted_until: DateTime<Utc>,
}

/// Registry of grants, keyed by the approving request
pub struct GrantRegistry {
    grants: Arc<RwLock<HashMap<RequestId, AccessGrant>>>,
}

impl GrantRegistry {
    pub fn new() -> Self {
        Self {
            grants: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a grant; idempotent per request
    pub fn insert(&self, grant: AccessGrant) {
        tracing::info!(
            request_id = %grant.request_id,
            physician_id = %grant.physician_id,
            patient_id = %grant.patient_id,
            until = %grant.granted_until,
            "access grant recorded"
        );
        self.grants.write().insert(grant.request_id, grant);
    }

    /// The check made on every grant-backed data access
    ///
    /// A physician with no grant at all and one whose grants have all lapsed
    /// are both rejected, with distinct reasons for the log.
    pub fn assert_valid(
        &self,
        scope: &TenantScope,
        physician_id: &UserId,
        patient_id: &PatientId,
        at: DateTime<Utc>,
    ) -> CoreResult<AccessGrant> {
        let grants = self.grants.read();
        let mut lapsed = false;
        for grant in grants.values() {
            if !scope.covers(grant.tenant_id)
                || grant.physician_id != *physician_id
                || grant.patient_id != *patient_id
            {
                continue;
            }
            if at <= grant.granted_until {
                return Ok(grant.clone());
            }
            lapsed = true;
        }
        if lapsed {
            tracing::warn!(
                physician_id = %physician_id,
                patient_id = %patient_id,
                "access attempted on an expired grant"
            );
            Err(CoreError::Authorization("access grant expired"))
        } else {
            Err(CoreError::Authorization("no active access grant"))
        }
    }
}

impl Default for GrantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
