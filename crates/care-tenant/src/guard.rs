//! Identity resolution and tenant scoping

use care_common::{Capability, CoreError, CoreResult, Role, TenantId, UserId};

use crate::credential::{CredentialVerifier, GuardConfig};
use crate::model::TenantRegistry;

/// An authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    /// Acting user
    pub user_id: UserId,
    /// Home tenant
    pub tenant_id: TenantId,
    /// Platform role
    pub role: Role,
}

impl Identity {
    /// Scope over the caller's own tenant; cannot fail
    pub fn own_scope(&self) -> TenantScope {
        TenantScope::new(self.tenant_id)
    }

    /// Scope check against a resource's tenant
    ///
    /// Rejects mismatches for every role, operator included: cross-tenant
    /// access is never implicit.
    pub fn scope_for(&self, resource_tenant: TenantId) -> CoreResult<TenantScope> {
        if self.tenant_id == resource_tenant {
            return Ok(TenantScope::new(resource_tenant));
        }
        tracing::warn!(
            user_id = %self.user_id,
            caller_tenant = %self.tenant_id,
            resource_tenant = %resource_tenant,
            "cross-tenant access denied"
        );
        Err(CoreError::Authorization("cross-tenant access denied"))
    }

    /// The explicit operator path across tenants
    pub fn scope_as_operator(&self, target_tenant: TenantId) -> CoreResult<TenantScope> {
        if !self.role.grants(Capability::OperateCrossTenant) {
            tracing::warn!(
                user_id = %self.user_id,
                role = self.role.as_str(),
                target_tenant = %target_tenant,
                "operator scope refused"
            );
            return Err(CoreError::Authorization("cross-tenant access denied"));
        }
        tracing::info!(
            user_id = %self.user_id,
            target_tenant = %target_tenant,
            "operator acting across tenants"
        );
        Ok(TenantScope::new(target_tenant))
    }
}

/// The tenant filter every scoped store method requires
///
/// Only `Identity` can mint one, which makes "forgot the tenant predicate"
/// unrepresentable in downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
}

impl TenantScope {
    pub(crate) fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    /// Tenant this scope is keyed to
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Whether a row belongs to this scope
    pub fn covers(&self, row_tenant: TenantId) -> bool {
        self.tenant_id == row_tenant
    }
}

/// The guard in front of every core operation
pub struct TenantGuard {
    verifier: CredentialVerifier,
    tenants: TenantRegistry,
}

impl TenantGuard {
    /// Build a guard over a tenant registry
    pub fn new(config: &GuardConfig, tenants: TenantRegistry) -> Self {
        Self {
            verifier: CredentialVerifier::new(config),
            tenants,
        }
    }

    /// Resolve an opaque credential into an identity
    ///
    /// Rejection is always explicit: bad signature, expiry, unknown tenant and
    /// deactivated tenant all surface the same authentication error.
    pub fn authorize(&self, credential: &str) -> CoreResult<Identity> {
        let claims = self.verifier.verify(credential)?;

        match self.tenants.get(&claims.tid) {
            Some(tenant) if tenant.is_active() => Ok(Identity {
                user_id: claims.sub,
                tenant_id: claims.tid,
                role: claims.role,
            }),
            Some(_) => {
                tracing::warn!(tenant_id = %claims.tid, "credential for deactivated tenant");
                Err(CoreError::Authentication)
            }
            None => {
                tracing::warn!(tenant_id = %claims.tid, "credential for unknown tenant");
                Err(CoreError::Authentication)
            }
        }
    }

    /// Credential issuance seam for the session collaborator and tests
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    /// The tenant registry behind this guard
    pub fn tenants(&self) -> &TenantRegistry {
        &self.tenants
    }
}
