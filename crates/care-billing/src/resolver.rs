//! Pricing & Coverage Resolver
//!
//! Computes the per-unit split of a service price between patient and
//! insurer. Pure read-side computation: missing coverage data selects a
//! documented fallback, never an error. The only failure is an unknown
//! service price.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use care_common::money::percent_of;
use care_common::{CoreError, CoreResult, PatientInsuranceId, ProviderId, ServicePriceId};
use care_tenant::TenantScope;

use crate::catalog::ServiceCatalog;
use crate::coverage::CoverageRegistry;
use crate::payers::PatientInsuranceRegistry;

/// Patient share applied when no coverage data exists at all
pub const DEFAULT_PATIENT_SHARE_PCT: Decimal = dec!(20);

/// Per-unit cost split for one service
///
/// Always reconciles: `patient_copay + insurance_amount + deductible_amount
/// == unit_price`, cent-exact. Deductible is carried but currently always
/// zero on every path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub unit_price: Decimal,
    pub patient_copay: Decimal,
    pub insurance_amount: Decimal,
    pub deductible_amount: Decimal,
}

/// Resolves cost splits from the catalog, coverage rules and policies
pub struct PriceResolver {
    catalog: Arc<ServiceCatalog>,
    coverage: Arc<CoverageRegistry>,
    policies: Arc<PatientInsuranceRegistry>,
}

impl PriceResolver {
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        coverage: Arc<CoverageRegistry>,
        policies: Arc<PatientInsuranceRegistry>,
    ) -> Self {
        Self {
            catalog,
            coverage,
            policies,
        }
    }

    /// Resolve the per-unit split for a service under a payer and policy
    ///
    /// Resolution order:
    /// 1. the active coverage rule for the (service, payer) pair, where a
    ///    fixed copay takes precedence over a percentage;
    /// 2. no rule: the policy's own copay, capped at the unit price;
    /// 3. no data at all: a flat 20/80 patient/insurer split.
    ///
    /// A `max_coverage_amount` on the rule caps the insurer share and shifts
    /// the excess onto the patient.
    pub fn resolve(
        &self,
        scope: &TenantScope,
        service_price_id: ServicePriceId,
        provider_id: Option<ProviderId>,
        patient_insurance_id: Option<PatientInsuranceId>,
    ) -> CoreResult<PriceBreakdown> {
        let price = self
            .catalog
            .get(scope, &service_price_id)
            .ok_or(CoreError::NotFound("service price"))?;
        let unit_price = price.base_price;
        let deductible_amount = Decimal::ZERO;

        let rule =
            provider_id.and_then(|pid| self.coverage.active_rule(scope, &service_price_id, &pid));

        let mut patient_copay = match &rule {
            Some(rule) => match (rule.copay_amount, rule.copay_percentage) {
                // A fixed copay wins even when a percentage is also set
                (Some(fixed), _) => fixed.min(unit_price),
                (None, Some(pct)) => percent_of(unit_price, pct),
                (None, None) => Decimal::ZERO,
            },
            None => {
                let policy_copay = patient_insurance_id
                    .and_then(|id| self.policies.get(scope, &id))
                    .and_then(|policy| policy.copay_amount);
                match policy_copay {
                    Some(copay) => {
                        tracing::debug!(
                            service_price_id = %service_price_id,
                            "no coverage rule, falling back to policy copay"
                        );
                        copay.min(unit_price)
                    }
                    None => {
                        tracing::debug!(
                            service_price_id = %service_price_id,
                            "no coverage data, applying default patient share"
                        );
                        percent_of(unit_price, DEFAULT_PATIENT_SHARE_PCT)
                    }
                }
            }
        };

        let mut insurance_amount = unit_price - patient_copay - deductible_amount;

        // Cap the insurer share; the excess shifts onto the patient
        if let Some(cap) = rule.as_ref().and_then(|r| r.max_coverage_amount) {
            if insurance_amount > cap {
                let excess = insurance_amount - cap;
                tracing::debug!(
                    service_price_id = %service_price_id,
                    excess = %excess,
                    "insurer share capped"
                );
                patient_copay += excess;
                insurance_amount = cap;
            }
        }

        Ok(PriceBreakdown {
            unit_price,
            patient_copay,
            insurance_amount,
            deductible_amount,
        })
    }
}
