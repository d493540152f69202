//! Tenant data model

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::{CoreError, CoreResult, TenantId};

/// An isolated organization: hospital, clinic, pharmacy, lab, supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant id
    pub tenant_id: TenantId,
    /// Display name
    pub name: String,
    /// Organization kind
    pub kind: TenantKind,
    /// Lifecycle status; tenants are never deleted
    pub status: TenantStatus,
    /// Onboarding time
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new active tenant
    pub fn new(name: &str, kind: TenantKind) -> Self {
        Self {
            tenant_id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            status: TenantStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Whether the tenant may act on the platform
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

/// Organization kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantKind {
    /// Full-service hospital
    Hospital,
    /// Outpatient clinic
    Clinic,
    /// Pharmacy
    Pharmacy,
    /// Diagnostic laboratory
    Lab,
    /// Device / consumables supplier
    Supplier,
}

/// Tenant lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Onboarded and operating
    Active,
    /// Switched off; records retained, credentials rejected
    Deactivated,
}

/// Registry of onboarded tenants
///
/// Deactivation is the only removal: rows stay forever so historical claims
/// and audit trails keep resolving.
pub struct TenantRegistry {
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
}

impl TenantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tenants: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Onboard a new tenant
    pub fn register(&self, name: &str, kind: TenantKind) -> Tenant {
        let tenant = Tenant::new(name, kind);
        tracing::info!(tenant_id = %tenant.tenant_id, name, "tenant onboarded");
        self.tenants.write().insert(tenant.tenant_id, tenant.clone());
        tenant
    }

    /// Look up a tenant
    pub fn get(&self, tenant_id: &TenantId) -> Option<Tenant> {
        self.tenants.read().get(tenant_id).cloned()
    }

    /// Whether a tenant exists and is active
    pub fn is_active(&self, tenant_id: &TenantId) -> bool {
        self.tenants
            .read()
            .get(tenant_id)
            .map(Tenant::is_active)
            .unwrap_or(false)
    }

    /// Deactivate a tenant; its records remain, its credentials stop working
    pub fn deactivate(&self, tenant_id: &TenantId) -> CoreResult<Tenant> {
        let mut tenants = self.tenants.write();
        let tenant = tenants
            .get_mut(tenant_id)
            .ok_or(CoreError::NotFound("tenant"))?;
        tenant.status = TenantStatus::Deactivated;
        tracing::info!(tenant_id = %tenant_id, "tenant deactivated");
        Ok(tenant.clone())
    }
}

impl Default for TenantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
