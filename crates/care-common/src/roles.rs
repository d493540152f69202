//! Platform roles and capabilities
//!
//! Roles are a closed enumeration compared with `==`; an approver-role typo is
//! a compile error rather than a silently failing string match. Each role maps
//! to a static capability set.

use serde::{Deserialize, Serialize};

/// Closed set of platform roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Cross-tenant platform operations staff
    PlatformOperator,
    /// Organization administrator
    TenantAdmin,
    /// Treating physician
    Physician,
    /// Clinical department head
    DepartmentHead,
    /// Medical director
    MedicalDirector,
    /// Compliance / privacy officer
    ComplianceOfficer,
    /// Billing department clerk
    BillingClerk,
}

/// Things a role is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Maintain the service price catalog and coverage rules
    ManageCatalog,
    /// Create claims and edit their line items
    SubmitClaims,
    /// Drive claims through adjudication statuses
    AdjudicateClaims,
    /// Record insurer payments against approved claims
    RecordPayments,
    /// Open patient-access requests
    RequestAccess,
    /// Act as an approver in access workflows
    ApproveAccess,
    /// Mint explicit cross-tenant scopes
    OperateCrossTenant,
}

impl Role {
    /// Capability set for the role
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Self::PlatformOperator => &[
                ManageCatalog,
                SubmitClaims,
                AdjudicateClaims,
                RecordPayments,
                RequestAccess,
                ApproveAccess,
                OperateCrossTenant,
            ],
            Self::TenantAdmin => &[
                ManageCatalog,
                SubmitClaims,
                AdjudicateClaims,
                RecordPayments,
                ApproveAccess,
            ],
            Self::Physician => &[RequestAccess],
            Self::DepartmentHead => &[RequestAccess, ApproveAccess],
            Self::MedicalDirector => &[ApproveAccess],
            Self::ComplianceOfficer => &[ApproveAccess],
            Self::BillingClerk => &[SubmitClaims, AdjudicateClaims, RecordPayments],
        }
    }

    /// Check a single capability
    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Whether this role may act across tenants (explicitly, never implicitly)
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::PlatformOperator)
    }

    /// Stable lowercase name used in logs and tokens
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformOperator => "platform_operator",
            Self::TenantAdmin => "tenant_admin",
            Self::Physician => "physician",
            Self::DepartmentHead => "department_head",
            Self::MedicalDirector => "medical_director",
            Self::ComplianceOfficer => "compliance_officer",
            Self::BillingClerk => "billing_clerk",
        }
    }
}
