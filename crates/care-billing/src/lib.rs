//! OpenCare Billing Core
//!
//! Tenant-scoped insurance pricing and claims adjudication.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BILLING CORE                                     │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │   Service    │  │    Payer     │  │       Coverage Rules         │  │
//! │  │   Catalog    │  │  Directory   │  │  (service, payer) → split    │  │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────┬───────────────┘  │
//! │         │                 │                         │                  │
//! │         └────────────┬────┴─────────────────────────┘                  │
//! │                      ▼                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐  │
//! │  │                  PRICING RESOLVER                                │  │
//! │  │   rule → fixed-over-percentage │ fallback → policy copay │ 20/80 │  │
//! │  └──────────────────────────┬──────────────────────────────────────┘  │
//! │                             ▼                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐  │
//! │  │                  CLAIM LIFECYCLE                                 │  │
//! │  │   draft ─► submitted ─► processing ─► approved ─► paid           │  │
//! │  │                                  └──► denied                     │  │
//! │  └─────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod catalog;
pub mod claims;
pub mod coverage;
pub mod lifecycle;
pub mod payers;
pub mod resolver;

use std::sync::Arc;

pub use catalog::{NewServicePrice, ServiceCatalog, ServicePrice, ServiceType};
pub use claims::{
    ClaimEngine, ClaimLineItem, InsuranceClaim, LineItemInput, NewClaim, SplitInput,
    TransitionRequest,
};
pub use coverage::{CoverageRegistry, NewPlanCoverage, PlanCoverage};
pub use lifecycle::ClaimStatus;
pub use payers::{
    InsuranceProvider, NewPatientInsurance, PatientInsurance, PatientInsuranceRegistry,
    ProviderKind, ProviderRegistry,
};
pub use resolver::{PriceBreakdown, PriceResolver};

/// The billing core with its registries wired together
pub struct BillingPlatform {
    /// Billable service catalog
    pub catalog: Arc<ServiceCatalog>,
    /// Insurance payers
    pub providers: Arc<ProviderRegistry>,
    /// Patient policies
    pub policies: Arc<PatientInsuranceRegistry>,
    /// Coverage rules
    pub coverage: Arc<CoverageRegistry>,
    /// Cost-split resolution
    pub resolver: Arc<PriceResolver>,
    /// Claim store and lifecycle
    pub claims: Arc<ClaimEngine>,
}

impl BillingPlatform {
    /// Wire up the billing core
    pub fn new() -> Self {
        let catalog = Arc::new(ServiceCatalog::new());
        let providers = Arc::new(ProviderRegistry::new());
        let policies = Arc::new(PatientInsuranceRegistry::new(providers.clone()));
        let coverage = Arc::new(CoverageRegistry::new(catalog.clone(), providers.clone()));
        let resolver = Arc::new(PriceResolver::new(
            catalog.clone(),
            coverage.clone(),
            policies.clone(),
        ));
        let claims = Arc::new(ClaimEngine::new(
            catalog.clone(),
            policies.clone(),
            resolver.clone(),
        ));
        Self {
            catalog,
            providers,
            policies,
            coverage,
            resolver,
            claims,
        }
    }
}

impl Default for BillingPlatform {
    fn default() -> Self {
        Self::new()
    }
}
