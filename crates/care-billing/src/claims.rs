//! Claim Lifecycle Aggregator
//!
//! Claims embed their line items, so a claim's totals and its items are
//! written in the same critical section and can never be observed out of
//! sync. Rows carry a version for optimistic concurrency by remote callers.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::money::round_cents;
use care_common::{
    ClaimId, CoreError, CoreResult, LineItemId, PatientId, PatientInsuranceId, ServicePriceId,
    TenantId,
};
use care_tenant::TenantScope;

use crate::catalog::ServiceCatalog;
use crate::lifecycle::ClaimStatus;
use crate::payers::PatientInsuranceRegistry;
use crate::resolver::PriceResolver;

/// One priced service on a claim
///
/// Invariants: `total_price == unit_price * quantity` and
/// `patient_copay + insurance_amount + deductible_amount == total_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimLineItem {
    pub id: LineItemId,
    pub service_price_id: ServicePriceId,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub patient_copay: Decimal,
    pub insurance_amount: Decimal,
    pub deductible_amount: Decimal,
}

/// A claim aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceClaim {
    pub id: ClaimId,
    pub tenant_id: TenantId,
    pub claim_number: String,
    pub patient_id: PatientId,
    pub patient_insurance_id: Option<PatientInsuranceId>,
    pub status: ClaimStatus,
    pub total_amount: Decimal,
    pub total_patient_copay: Decimal,
    pub total_insurance_amount: Decimal,
    pub approved_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub line_items: Vec<ClaimLineItem>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InsuranceClaim {
    fn recompute_totals(&mut self) {
        self.total_amount = self.line_items.iter().map(|i| i.total_price).sum();
        self.total_patient_copay = self.line_items.iter().map(|i| i.patient_copay).sum();
        self.total_insurance_amount = self.line_items.iter().map(|i| i.insurance_amount).sum();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Input for creating a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaim {
    pub patient_id: PatientId,
    pub claim_number: String,
    pub patient_insurance_id: Option<PatientInsuranceId>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

/// Input for one line item
///
/// When `split` is omitted the three-way split comes from the Pricing
/// Resolver; when supplied it must reconcile against the line total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub service_price_id: ServicePriceId,
    pub quantity: u32,
    pub split: Option<SplitInput>,
}

/// An explicitly supplied cost split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitInput {
    pub patient_copay: Decimal,
    pub insurance_amount: Decimal,
    pub deductible_amount: Decimal,
}

/// Input for a status transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: ClaimStatus,
    pub approved_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub expected_version: Option<u64>,
}

/// Engine owning the claim store and its lifecycle rules
pub struct ClaimEngine {
    catalog: Arc<ServiceCatalog>,
    policies: Arc<PatientInsuranceRegistry>,
    resolver: Arc<PriceResolver>,
    claims: Arc<RwLock<HashMap<ClaimId, InsuranceClaim>>>,
}

impl ClaimEngine {
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        policies: Arc<PatientInsuranceRegistry>,
        resolver: Arc<PriceResolver>,
    ) -> Self {
        Self {
            catalog,
            policies,
            resolver,
            claims: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Price a line item, resolving the split when none was supplied
    fn build_line_item(
        &self,
        scope: &TenantScope,
        patient_insurance_id: Option<PatientInsuranceId>,
        input: &LineItemInput,
        existing_id: Option<LineItemId>,
    ) -> CoreResult<ClaimLineItem> {
        if input.quantity == 0 {
            return Err(CoreError::validation("quantity", "must be at least 1"));
        }
        let quantity = Decimal::from(input.quantity);

        let (unit_price, patient_copay, insurance_amount, deductible_amount) = match &input.split {
            Some(split) => {
                if split.patient_copay < Decimal::ZERO
                    || split.insurance_amount < Decimal::ZERO
                    || split.deductible_amount < Decimal::ZERO
                {
                    return Err(CoreError::validation(
                        "split",
                        "components must not be negative",
                    ));
                }
                let price = self
                    .catalog
                    .get(scope, &input.service_price_id)
                    .ok_or(CoreError::NotFound("service price"))?;
                let total = price.base_price * quantity;
                let copay = round_cents(split.patient_copay);
                let insurance = round_cents(split.insurance_amount);
                let deductible = round_cents(split.deductible_amount);
                if copay + insurance + deductible != total {
                    return Err(CoreError::validation(
                        "split",
                        format!(
                            "components sum to {} but the line total is {}",
                            copay + insurance + deductible,
                            total
                        ),
                    ));
                }
                (price.base_price, copay, insurance, deductible)
            }
            None => {
                let provider_id = patient_insurance_id
                    .and_then(|id| self.policies.get(scope, &id))
                    .map(|policy| policy.provider_id);
                let unit = self.resolver.resolve(
                    scope,
                    input.service_price_id,
                    provider_id,
                    patient_insurance_id,
                )?;
                (
                    unit.unit_price,
                    unit.patient_copay * quantity,
                    unit.insurance_amount * quantity,
                    unit.deductible_amount * quantity,
                )
            }
        };

        Ok(ClaimLineItem {
            id: existing_id.unwrap_or_else(Uuid::new_v4),
            service_price_id: input.service_price_id,
            quantity: input.quantity,
            unit_price,
            total_price: unit_price * quantity,
            patient_copay,
            insurance_amount,
            deductible_amount,
        })
    }

    /// Create a claim in `Draft` with its initial line items
    pub fn create_claim(&self, scope: &TenantScope, input: NewClaim) -> CoreResult<InsuranceClaim> {
        if input.claim_number.trim().is_empty() {
            return Err(CoreError::validation("claim_number", "must not be empty"));
        }

        let mut line_items = Vec::with_capacity(input.line_items.len());
        for item in &input.line_items {
            line_items.push(self.build_line_item(
                scope,
                input.patient_insurance_id,
                item,
                None,
            )?);
        }

        let mut claims = self.claims.write();
        if claims
            .values()
            .any(|c| scope.covers(c.tenant_id) && c.claim_number == input.claim_number)
        {
            return Err(CoreError::Conflict("duplicate claim number".into()));
        }

        let now = Utc::now();
        let mut claim = InsuranceClaim {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id(),
            claim_number: input.claim_number,
            patient_id: input.patient_id,
            patient_insurance_id: input.patient_insurance_id,
            status: ClaimStatus::Draft,
            total_amount: Decimal::ZERO,
            total_patient_copay: Decimal::ZERO,
            total_insurance_amount: Decimal::ZERO,
            approved_amount: None,
            paid_amount: None,
            line_items,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        claim.recompute_totals();
        tracing::info!(
            claim_id = %claim.id,
            claim_number = %claim.claim_number,
            total = %claim.total_amount,
            "claim created"
        );
        claims.insert(claim.id, claim.clone());
        Ok(claim)
    }

    /// Fetch a claim within scope
    pub fn get(&self, scope: &TenantScope, claim_id: &ClaimId) -> Option<InsuranceClaim> {
        self.claims
            .read()
            .get(claim_id)
            .filter(|c| scope.covers(c.tenant_id))
            .cloned()
    }

    /// A tenant's claims, oldest first
    pub fn list(&self, scope: &TenantScope) -> Vec<InsuranceClaim> {
        let mut claims: Vec<InsuranceClaim> = self
            .claims
            .read()
            .values()
            .filter(|c| scope.covers(c.tenant_id))
            .cloned()
            .collect();
        claims.sort_by_key(|c| c.created_at);
        claims
    }

    /// The claim's insurance context, needed before pricing an item
    fn insurance_context(
        &self,
        scope: &TenantScope,
        claim_id: &ClaimId,
    ) -> CoreResult<Option<PatientInsuranceId>> {
        self.claims
            .read()
            .get(claim_id)
            .filter(|c| scope.covers(c.tenant_id))
            .map(|c| c.patient_insurance_id)
            .ok_or(CoreError::NotFound("claim"))
    }

    /// Append a line item and re-sum the claim's totals
    pub fn add_line_item(
        &self,
        scope: &TenantScope,
        claim_id: &ClaimId,
        input: LineItemInput,
    ) -> CoreResult<InsuranceClaim> {
        let insurance = self.insurance_context(scope, claim_id)?;
        let item = self.build_line_item(scope, insurance, &input, None)?;

        let mut claims = self.claims.write();
        let claim = claims
            .get_mut(claim_id)
            .filter(|c| scope.covers(c.tenant_id))
            .ok_or(CoreError::NotFound("claim"))?;
        if !claim.status.is_editable() {
            return Err(CoreError::Conflict(
                "line items can only be modified on a draft claim".into(),
            ));
        }
        claim.line_items.push(item);
        claim.recompute_totals();
        claim.touch();
        Ok(claim.clone())
    }

    /// Replace a line item and re-sum the claim's totals
    pub fn update_line_item(
        &self,
        scope: &TenantScope,
        claim_id: &ClaimId,
        item_id: &LineItemId,
        input: LineItemInput,
    ) -> CoreResult<InsuranceClaim> {
        let insurance = self.insurance_context(scope, claim_id)?;
        let item = self.build_line_item(scope, insurance, &input, Some(*item_id))?;

        let mut claims = self.claims.write();
        let claim = claims
            .get_mut(claim_id)
            .filter(|c| scope.covers(c.tenant_id))
            .ok_or(CoreError::NotFound("claim"))?;
        if !claim.status.is_editable() {
            return Err(CoreError::Conflict(
                "line items can only be modified on a draft claim".into(),
            ));
        }
        let slot = claim
            .line_items
            .iter_mut()
            .find(|i| i.id == *item_id)
            .ok_or(CoreError::NotFound("line item"))?;
        *slot = item;
        claim.recompute_totals();
        claim.touch();
        Ok(claim.clone())
    }

    /// Remove a line item and re-sum the claim's totals
    pub fn remove_line_item(
        &self,
        scope: &TenantScope,
        claim_id: &ClaimId,
        item_id: &LineItemId,
    ) -> CoreResult<InsuranceClaim> {
        let mut claims = self.claims.write();
        let claim = claims
            .get_mut(claim_id)
            .filter(|c| scope.covers(c.tenant_id))
            .ok_or(CoreError::NotFound("claim"))?;
        if !claim.status.is_editable() {
            return Err(CoreError::Conflict(
                "line items can only be modified on a draft claim".into(),
            ));
        }
        let index = claim
            .line_items
            .iter()
            .position(|i| i.id == *item_id)
            .ok_or(CoreError::NotFound("line item"))?;
        claim.line_items.remove(index);
        claim.recompute_totals();
        claim.touch();
        if claim.line_items.is_empty() {
            tracing::warn!(claim_id = %claim.id, "claim left with no line items");
        }
        Ok(claim.clone())
    }

    /// Drive a claim along a forward edge of its lifecycle
    pub fn transition(
        &self,
        scope: &TenantScope,
        claim_id: &ClaimId,
        request: TransitionRequest,
    ) -> CoreResult<InsuranceClaim> {
        let mut claims = self.claims.write();
        let claim = claims
            .get_mut(claim_id)
            .filter(|c| scope.covers(c.tenant_id))
            .ok_or(CoreError::NotFound("claim"))?;

        if let Some(expected) = request.expected_version {
            if expected != claim.version {
                return Err(CoreError::Conflict(format!(
                    "stale version {expected}, claim is at {}",
                    claim.version
                )));
            }
        }
        if !claim.status.can_transition(request.status) {
            return Err(CoreError::invalid_transition(
                claim.status.as_str(),
                request.status.as_str(),
            ));
        }

        match request.status {
            ClaimStatus::Approved => {
                let amount = request.approved_amount.ok_or_else(|| {
                    CoreError::validation("approved_amount", "required when approving")
                })?;
                if amount < Decimal::ZERO || amount > claim.total_amount {
                    return Err(CoreError::validation(
                        "approved_amount",
                        "must be between zero and the claim total",
                    ));
                }
                claim.approved_amount = Some(round_cents(amount));
            }
            ClaimStatus::Paid => {
                let amount = request.paid_amount.ok_or_else(|| {
                    CoreError::validation("paid_amount", "required when recording payment")
                })?;
                if amount < Decimal::ZERO || amount > claim.total_amount {
                    return Err(CoreError::validation(
                        "paid_amount",
                        "must be between zero and the claim total",
                    ));
                }
                claim.paid_amount = Some(round_cents(amount));
            }
            _ => {}
        }

        let from = claim.status;
        claim.status = request.status;
        claim.touch();
        tracing::info!(
            claim_id = %claim.id,
            from = from.as_str(),
            to = claim.status.as_str(),
            "claim transitioned"
        );
        Ok(claim.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewServicePrice, ServiceType};
    use crate::coverage::{CoverageRegistry, NewPlanCoverage};
    use crate::payers::{NewPatientInsurance, ProviderKind, ProviderRegistry};
    use care_common::Role;
    use care_tenant::Identity;
    use rust_decimal_macros::dec;

    struct Fixture {
        scope: TenantScope,
        engine: ClaimEngine,
        patient: PatientId,
        policy: PatientInsuranceId,
        covered: ServicePriceId,
        uncovered: ServicePriceId,
    }

    /// One tenant with a 200.00 service at 20% copay under the payer and an
    /// 80.00 service with no coverage rule; the policy carries a 25.00 copay.
    fn fixture() -> Fixture {
        let scope = Identity {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::BillingClerk,
        }
        .own_scope();
        let catalog = Arc::new(ServiceCatalog::new());
        let providers = Arc::new(ProviderRegistry::new());
        let coverage = Arc::new(CoverageRegistry::new(catalog.clone(), providers.clone()));
        let policies = Arc::new(PatientInsuranceRegistry::new(providers.clone()));
        let resolver = Arc::new(PriceResolver::new(
            catalog.clone(),
            coverage.clone(),
            policies.clone(),
        ));
        let engine = ClaimEngine::new(catalog.clone(), policies.clone(), resolver);

        let covered = catalog
            .register(
                &scope,
                NewServicePrice {
                    service_code: "PROC-200".into(),
                    service_type: ServiceType::Procedure,
                    currency: "USD".into(),
                    base_price: dec!(200.00),
                },
            )
            .unwrap()
            .id;
        let uncovered = catalog
            .register(
                &scope,
                NewServicePrice {
                    service_code: "LAB-80".into(),
                    service_type: ServiceType::LabTest,
                    currency: "USD".into(),
                    base_price: dec!(80.00),
                },
            )
            .unwrap()
            .id;
        let payer = providers
            .register(&scope, "Acme Health", "ACME", ProviderKind::Private)
            .unwrap()
            .id;
        coverage
            .register(
                &scope,
                NewPlanCoverage {
                    service_price_id: covered,
                    provider_id: payer,
                    copay_amount: None,
                    copay_percentage: Some(dec!(20)),
                    max_coverage_amount: None,
                    pre_auth_required: false,
                },
            )
            .unwrap();
        let patient = Uuid::new_v4();
        let policy = policies
            .register(
                &scope,
                NewPatientInsurance {
                    patient_id: patient,
                    provider_id: payer,
                    policy_number: "POL-9".into(),
                    copay_amount: Some(dec!(25.00)),
                    deductible_amount: None,
                    is_primary: true,
                },
            )
            .unwrap()
            .id;

        Fixture {
            scope,
            engine,
            patient,
            policy,
            covered,
            uncovered,
        }
    }

    fn item(service: ServicePriceId, quantity: u32) -> LineItemInput {
        LineItemInput {
            service_price_id: service,
            quantity,
            split: None,
        }
    }

    fn new_claim(f: &Fixture, number: &str, items: Vec<LineItemInput>) -> NewClaim {
        NewClaim {
            patient_id: f.patient,
            claim_number: number.into(),
            patient_insurance_id: Some(f.policy),
            line_items: items,
        }
    }

    fn assert_totals_match(claim: &InsuranceClaim) {
        let total: Decimal = claim.line_items.iter().map(|i| i.total_price).sum();
        let copay: Decimal = claim.line_items.iter().map(|i| i.patient_copay).sum();
        let insurance: Decimal = claim.line_items.iter().map(|i| i.insurance_amount).sum();
        assert_eq!(claim.total_amount, total);
        assert_eq!(claim.total_patient_copay, copay);
        assert_eq!(claim.total_insurance_amount, insurance);
        for item in &claim.line_items {
            assert_eq!(item.total_price, item.unit_price * Decimal::from(item.quantity));
            assert_eq!(
                item.patient_copay + item.insurance_amount + item.deductible_amount,
                item.total_price
            );
        }
    }

    #[test]
    fn test_create_claim_resolves_splits() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(
                &f.scope,
                new_claim(&f, "CLM-001", vec![item(f.covered, 2), item(f.uncovered, 1)]),
            )
            .unwrap();

        assert_eq!(claim.status, ClaimStatus::Draft);
        assert_eq!(claim.version, 1);
        // 2 x 200.00 at 20% copay, plus 80.00 against the policy's 25.00 copay
        assert_eq!(claim.total_amount, dec!(480.00));
        assert_eq!(claim.total_patient_copay, dec!(105.00));
        assert_eq!(claim.total_insurance_amount, dec!(375.00));
        assert_totals_match(&claim);
    }

    #[test]
    fn test_duplicate_claim_number_conflicts() {
        let f = fixture();
        f.engine
            .create_claim(&f.scope, new_claim(&f, "CLM-001", vec![]))
            .unwrap();
        let err = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-001", vec![]))
            .unwrap_err();
        assert_eq!(err, CoreError::Conflict("duplicate claim number".into()));
    }

    #[test]
    fn test_same_claim_number_allowed_across_tenants() {
        let f = fixture();
        f.engine
            .create_claim(&f.scope, new_claim(&f, "CLM-001", vec![]))
            .unwrap();

        let other = Identity {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::BillingClerk,
        }
        .own_scope();
        f.engine
            .create_claim(
                &other,
                NewClaim {
                    patient_id: Uuid::new_v4(),
                    claim_number: "CLM-001".into(),
                    patient_insurance_id: None,
                    line_items: vec![],
                },
            )
            .unwrap();
    }

    #[test]
    fn test_line_item_mutations_keep_totals() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-002", vec![item(f.covered, 1)]))
            .unwrap();

        let claim = f
            .engine
            .add_line_item(&f.scope, &claim.id, item(f.uncovered, 3))
            .unwrap();
        assert_eq!(claim.version, 2);
        assert_eq!(claim.total_amount, dec!(440.00));
        assert_totals_match(&claim);

        let added = claim.line_items[1].id;
        let claim = f
            .engine
            .update_line_item(&f.scope, &claim.id, &added, item(f.uncovered, 1))
            .unwrap();
        assert_eq!(claim.version, 3);
        assert_eq!(claim.total_amount, dec!(280.00));
        assert_totals_match(&claim);

        let claim = f
            .engine
            .remove_line_item(&f.scope, &claim.id, &added)
            .unwrap();
        assert_eq!(claim.version, 4);
        assert_eq!(claim.total_amount, dec!(200.00));
        assert_totals_match(&claim);
    }

    #[test]
    fn test_remove_last_line_item_leaves_zero_totals() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-003", vec![item(f.covered, 1)]))
            .unwrap();
        let only = claim.line_items[0].id;
        let claim = f
            .engine
            .remove_line_item(&f.scope, &claim.id, &only)
            .unwrap();
        assert!(claim.line_items.is_empty());
        assert_eq!(claim.total_amount, dec!(0));
        assert_eq!(claim.total_patient_copay, dec!(0));
        assert_eq!(claim.total_insurance_amount, dec!(0));
    }

    #[test]
    fn test_explicit_split_must_reconcile() {
        let f = fixture();
        let bad = LineItemInput {
            service_price_id: f.covered,
            quantity: 1,
            split: Some(SplitInput {
                patient_copay: dec!(50.00),
                insurance_amount: dec!(100.00),
                deductible_amount: dec!(0),
            }),
        };
        let err = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-004", vec![bad]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "split", .. }));

        let good = LineItemInput {
            service_price_id: f.covered,
            quantity: 1,
            split: Some(SplitInput {
                patient_copay: dec!(50.00),
                insurance_amount: dec!(150.00),
                deductible_amount: dec!(0),
            }),
        };
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-004", vec![good]))
            .unwrap();
        assert_eq!(claim.total_patient_copay, dec!(50.00));
        assert_totals_match(&claim);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let f = fixture();
        let err = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-005", vec![item(f.covered, 0)]))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "quantity", .. }));
    }

    #[test]
    fn test_editing_locked_after_submission() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-006", vec![item(f.covered, 1)]))
            .unwrap();
        f.engine
            .transition(
                &f.scope,
                &claim.id,
                TransitionRequest {
                    status: ClaimStatus::Submitted,
                    approved_amount: None,
                    paid_amount: None,
                    expected_version: None,
                },
            )
            .unwrap();

        let err = f
            .engine
            .add_line_item(&f.scope, &claim.id, item(f.uncovered, 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_forward_edges_only() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-007", vec![item(f.covered, 1)]))
            .unwrap();

        let err = f
            .engine
            .transition(
                &f.scope,
                &claim.id,
                TransitionRequest {
                    status: ClaimStatus::Approved,
                    approved_amount: Some(dec!(100.00)),
                    paid_amount: None,
                    expected_version: None,
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: "draft".into(),
                requested: "approved".into(),
            }
        );
    }

    fn advance(f: &Fixture, claim_id: &ClaimId, status: ClaimStatus) -> InsuranceClaim {
        let amount = match status {
            ClaimStatus::Approved => Some(dec!(150.00)),
            _ => None,
        };
        f.engine
            .transition(
                &f.scope,
                claim_id,
                TransitionRequest {
                    status,
                    approved_amount: amount,
                    paid_amount: if status == ClaimStatus::Paid {
                        Some(dec!(150.00))
                    } else {
                        None
                    },
                    expected_version: None,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_full_lifecycle_to_paid() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-008", vec![item(f.covered, 1)]))
            .unwrap();

        advance(&f, &claim.id, ClaimStatus::Submitted);
        advance(&f, &claim.id, ClaimStatus::Processing);
        let approved = advance(&f, &claim.id, ClaimStatus::Approved);
        assert_eq!(approved.approved_amount, Some(dec!(150.00)));
        let paid = advance(&f, &claim.id, ClaimStatus::Paid);
        assert_eq!(paid.paid_amount, Some(dec!(150.00)));
        assert!(paid.status.is_terminal());
    }

    #[test]
    fn test_approval_amount_required_and_bounded() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-009", vec![item(f.covered, 1)]))
            .unwrap();
        advance(&f, &claim.id, ClaimStatus::Submitted);
        advance(&f, &claim.id, ClaimStatus::Processing);

        let missing = f
            .engine
            .transition(
                &f.scope,
                &claim.id,
                TransitionRequest {
                    status: ClaimStatus::Approved,
                    approved_amount: None,
                    paid_amount: None,
                    expected_version: None,
                },
            )
            .unwrap_err();
        assert!(matches!(missing, CoreError::Validation { field: "approved_amount", .. }));

        let excessive = f
            .engine
            .transition(
                &f.scope,
                &claim.id,
                TransitionRequest {
                    status: ClaimStatus::Approved,
                    approved_amount: Some(dec!(500.00)),
                    paid_amount: None,
                    expected_version: None,
                },
            )
            .unwrap_err();
        assert!(matches!(excessive, CoreError::Validation { field: "approved_amount", .. }));
    }

    #[test]
    fn test_stale_version_rejected() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-010", vec![item(f.covered, 1)]))
            .unwrap();
        // Bump the version behind the caller's back
        f.engine
            .add_line_item(&f.scope, &claim.id, item(f.uncovered, 1))
            .unwrap();

        let err = f
            .engine
            .transition(
                &f.scope,
                &claim.id,
                TransitionRequest {
                    status: ClaimStatus::Submitted,
                    approved_amount: None,
                    paid_amount: None,
                    expected_version: Some(1),
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_claims_invisible_across_tenants() {
        let f = fixture();
        let claim = f
            .engine
            .create_claim(&f.scope, new_claim(&f, "CLM-011", vec![item(f.covered, 1)]))
            .unwrap();

        let other = Identity {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::TenantAdmin,
        }
        .own_scope();
        assert!(f.engine.get(&other, &claim.id).is_none());
        let err = f
            .engine
            .transition(
                &other,
                &claim.id,
                TransitionRequest {
                    status: ClaimStatus::Submitted,
                    approved_amount: None,
                    paid_amount: None,
                    expected_version: None,
                },
            )
            .unwrap_err();
        assert_eq!(err, CoreError::NotFound("claim"));
        assert!(f.engine.list(&other).is_empty());
    }
}
