//! Entity id aliases
//!
//! Plain `Uuid` aliases; tenancy is enforced by scoped store methods, not by
//! the id types themselves.

use uuid::Uuid;

/// Tenant id
pub type TenantId = Uuid;
/// Platform user id
pub type UserId = Uuid;
/// Patient id
pub type PatientId = Uuid;
/// Billable service catalog entry id
pub type ServicePriceId = Uuid;
/// Insurance payer id
pub type ProviderId = Uuid;
/// Patient-to-payer policy link id
pub type PatientInsuranceId = Uuid;
/// Coverage rule id
pub type CoverageId = Uuid;
/// Insurance claim id
pub type ClaimId = Uuid;
/// Claim line item id
pub type LineItemId = Uuid;
/// Patient-access request id
pub type RequestId = Uuid;
