//! Coverage rules binding (service, payer) pairs to cost-split policies

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::money::round_cents;
use care_common::{CoreError, CoreResult, CoverageId, ProviderId, ServicePriceId, TenantId};
use care_tenant::TenantScope;

use crate::catalog::ServiceCatalog;
use crate::payers::ProviderRegistry;

/// A cost-split rule for one (service, payer) pair
///
/// `copay_amount` is a fixed patient share and wins over `copay_percentage`
/// when both are set. `max_coverage_amount` caps the insurer share; the
/// excess shifts back onto the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCoverage {
    pub id: CoverageId,
    pub tenant_id: TenantId,
    pub service_price_id: ServicePriceId,
    pub provider_id: ProviderId,
    pub copay_amount: Option<Decimal>,
    pub copay_percentage: Option<Decimal>,
    pub max_coverage_amount: Option<Decimal>,
    pub pre_auth_required: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a coverage rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanCoverage {
    pub service_price_id: ServicePriceId,
    pub provider_id: ProviderId,
    pub copay_amount: Option<Decimal>,
    pub copay_percentage: Option<Decimal>,
    pub max_coverage_amount: Option<Decimal>,
    #[serde(default)]
    pub pre_auth_required: bool,
}

/// Registry of coverage rules
///
/// At most one ACTIVE rule exists per (service, payer) pair within a tenant;
/// replacing a rule means deactivating the old one first.
pub struct CoverageRegistry {
    catalog: Arc<ServiceCatalog>,
    providers: Arc<ProviderRegistry>,
    rules: Arc<RwLock<HashMap<CoverageId, PlanCoverage>>>,
}

impl CoverageRegistry {
    pub fn new(catalog: Arc<ServiceCatalog>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            catalog,
            providers,
            rules: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a coverage rule
    pub fn register(&self, scope: &TenantScope, input: NewPlanCoverage) -> CoreResult<PlanCoverage> {
        if let Some(pct) = input.copay_percentage {
            if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(CoreError::validation(
                    "copay_percentage",
                    "must be between 0 and 100",
                ));
            }
        }
        if let Some(copay) = input.copay_amount {
            if copay < Decimal::ZERO {
                return Err(CoreError::validation("copay_amount", "must not be negative"));
            }
        }
        if let Some(cap) = input.max_coverage_amount {
            if cap < Decimal::ZERO {
                return Err(CoreError::validation(
                    "max_coverage_amount",
                    "must not be negative",
                ));
            }
        }
        if self.catalog.get(scope, &input.service_price_id).is_none() {
            return Err(CoreError::NotFound("service price"));
        }
        if self.providers.get(scope, &input.provider_id).is_none() {
            return Err(CoreError::NotFound("insurance provider"));
        }

        let mut rules = self.rules.write();
        let occupied = rules.values().any(|r| {
            r.active
                && scope.covers(r.tenant_id)
                && r.service_price_id == input.service_price_id
                && r.provider_id == input.provider_id
        });
        if occupied {
            return Err(CoreError::Conflict(
                "an active coverage rule already exists for this service and payer".into(),
            ));
        }

        let rule = PlanCoverage {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id(),
            service_price_id: input.service_price_id,
            provider_id: input.provider_id,
            copay_amount: input.copay_amount.map(round_cents),
            copay_percentage: input.copay_percentage,
            max_coverage_amount: input.max_coverage_amount.map(round_cents),
            pre_auth_required: input.pre_auth_required,
            active: true,
            created_at: Utc::now(),
        };
        tracing::info!(
            coverage_id = %rule.id,
            service_price_id = %rule.service_price_id,
            provider_id = %rule.provider_id,
            "coverage rule registered"
        );
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    /// The active rule for a (service, payer) pair, if any
    pub fn active_rule(
        &self,
        scope: &TenantScope,
        service_price_id: &ServicePriceId,
        provider_id: &ProviderId,
    ) -> Option<PlanCoverage> {
        self.rules
            .read()
            .values()
            .find(|r| {
                r.active
                    && scope.covers(r.tenant_id)
                    && r.service_price_id == *service_price_id
                    && r.provider_id == *provider_id
            })
            .cloned()
    }

    /// Fetch a rule within scope
    pub fn get(&self, scope: &TenantScope, id: &CoverageId) -> Option<PlanCoverage> {
        self.rules
            .read()
            .get(id)
            .filter(|r| scope.covers(r.tenant_id))
            .cloned()
    }

    /// Retire a rule, freeing the (service, payer) pair for a replacement
    pub fn deactivate(&self, scope: &TenantScope, id: &CoverageId) -> CoreResult<PlanCoverage> {
        let mut rules = self.rules.write();
        let rule = rules
            .get_mut(id)
            .filter(|r| scope.covers(r.tenant_id))
            .ok_or(CoreError::NotFound("coverage rule"))?;
        rule.active = false;
        tracing::info!(coverage_id = %id, "coverage rule retired");
        Ok(rule.clone())
    }
}
