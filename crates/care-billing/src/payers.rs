//! Payer directory: insurance providers and patient policies

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::money::round_cents;
use care_common::{CoreError, CoreResult, PatientId, PatientInsuranceId, ProviderId, TenantId};
use care_tenant::TenantScope;

/// Payer category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Private,
    Government,
    Hmo,
    SelfFunded,
}

/// A tenant-scoped insurance payer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceProvider {
    pub id: ProviderId,
    pub tenant_id: TenantId,
    pub name: String,
    pub code: String,
    pub kind: ProviderKind,
    pub created_at: DateTime<Utc>,
}

/// Registry of insurance payers
pub struct ProviderRegistry {
    providers: Arc<RwLock<HashMap<ProviderId, InsuranceProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a payer; `code` is unique within the tenant
    pub fn register(
        &self,
        scope: &TenantScope,
        name: &str,
        code: &str,
        kind: ProviderKind,
    ) -> CoreResult<InsuranceProvider> {
        if code.trim().is_empty() {
            return Err(CoreError::validation("code", "must not be empty"));
        }

        let mut providers = self.providers.write();
        if providers
            .values()
            .any(|p| scope.covers(p.tenant_id) && p.code == code)
        {
            return Err(CoreError::Conflict(format!(
                "payer code {code} is already registered"
            )));
        }

        let provider = InsuranceProvider {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id(),
            name: name.to_string(),
            code: code.to_string(),
            kind,
            created_at: Utc::now(),
        };
        tracing::info!(provider_id = %provider.id, code, "payer registered");
        providers.insert(provider.id, provider.clone());
        Ok(provider)
    }

    /// Fetch a payer within scope
    pub fn get(&self, scope: &TenantScope, id: &ProviderId) -> Option<InsuranceProvider> {
        self.providers
            .read()
            .get(id)
            .filter(|p| scope.covers(p.tenant_id))
            .cloned()
    }

    /// List a tenant's payers
    pub fn list(&self, scope: &TenantScope) -> Vec<InsuranceProvider> {
        let mut payers: Vec<InsuranceProvider> = self
            .providers
            .read()
            .values()
            .filter(|p| scope.covers(p.tenant_id))
            .cloned()
            .collect();
        payers.sort_by(|a, b| a.code.cmp(&b.code));
        payers
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A patient's policy with a payer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInsurance {
    pub id: PatientInsuranceId,
    pub tenant_id: TenantId,
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub policy_number: String,
    pub copay_amount: Option<Decimal>,
    pub deductible_amount: Option<Decimal>,
    pub is_primary: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for linking a patient to a payer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientInsurance {
    pub patient_id: PatientId,
    pub provider_id: ProviderId,
    pub policy_number: String,
    pub copay_amount: Option<Decimal>,
    pub deductible_amount: Option<Decimal>,
    pub is_primary: bool,
}

/// Registry of patient policies
///
/// A patient holds 0..N policies with at most one primary. Registering a new
/// primary demotes the previous one inside the same critical section, so two
/// primaries are never observable.
pub struct PatientInsuranceRegistry {
    providers: Arc<ProviderRegistry>,
    policies: Arc<RwLock<HashMap<PatientInsuranceId, PatientInsurance>>>,
}

impl PatientInsuranceRegistry {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self {
            providers,
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Link a patient to a payer
    pub fn register(
        &self,
        scope: &TenantScope,
        input: NewPatientInsurance,
    ) -> CoreResult<PatientInsurance> {
        if let Some(copay) = input.copay_amount {
            if copay < Decimal::ZERO {
                return Err(CoreError::validation("copay_amount", "must not be negative"));
            }
        }
        if let Some(deductible) = input.deductible_amount {
            if deductible < Decimal::ZERO {
                return Err(CoreError::validation(
                    "deductible_amount",
                    "must not be negative",
                ));
            }
        }
        if self.providers.get(scope, &input.provider_id).is_none() {
            return Err(CoreError::NotFound("insurance provider"));
        }

        let mut policies = self.policies.write();
        if input.is_primary {
            for policy in policies.values_mut() {
                if scope.covers(policy.tenant_id)
                    && policy.patient_id == input.patient_id
                    && policy.is_primary
                {
                    policy.is_primary = false;
                    tracing::debug!(policy_id = %policy.id, "previous primary policy demoted");
                }
            }
        }

        let policy = PatientInsurance {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id(),
            patient_id: input.patient_id,
            provider_id: input.provider_id,
            policy_number: input.policy_number,
            copay_amount: input.copay_amount.map(round_cents),
            deductible_amount: input.deductible_amount.map(round_cents),
            is_primary: input.is_primary,
            active: true,
            created_at: Utc::now(),
        };
        tracing::info!(
            policy_id = %policy.id,
            patient_id = %policy.patient_id,
            primary = policy.is_primary,
            "patient policy registered"
        );
        policies.insert(policy.id, policy.clone());
        Ok(policy)
    }

    /// Fetch a policy within scope
    pub fn get(&self, scope: &TenantScope, id: &PatientInsuranceId) -> Option<PatientInsurance> {
        self.policies
            .read()
            .get(id)
            .filter(|p| scope.covers(p.tenant_id))
            .cloned()
    }

    /// A patient's policies, primary first
    pub fn list_for_patient(
        &self,
        scope: &TenantScope,
        patient_id: &PatientId,
    ) -> Vec<PatientInsurance> {
        let mut policies: Vec<PatientInsurance> = self
            .policies
            .read()
            .values()
            .filter(|p| scope.covers(p.tenant_id) && p.patient_id == *patient_id)
            .cloned()
            .collect();
        policies.sort_by_key(|p| (!p.is_primary, p.created_at));
        policies
    }

    /// End a policy
    pub fn deactivate(
        &self,
        scope: &TenantScope,
        id: &PatientInsuranceId,
    ) -> CoreResult<PatientInsurance> {
        let mut policies = self.policies.write();
        let policy = policies
            .get_mut(id)
            .filter(|p| scope.covers(p.tenant_id))
            .ok_or(CoreError::NotFound("patient insurance"))?;
        policy.active = false;
        policy.is_primary = false;
        Ok(policy.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_common::Role;
    use care_tenant::Identity;
    use rust_decimal_macros::dec;

    fn scope() -> TenantScope {
        Identity {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::TenantAdmin,
        }
        .own_scope()
    }

    fn registries() -> (Arc<ProviderRegistry>, PatientInsuranceRegistry) {
        let providers = Arc::new(ProviderRegistry::new());
        let policies = PatientInsuranceRegistry::new(providers.clone());
        (providers, policies)
    }

    fn policy_input(provider_id: ProviderId, patient_id: PatientId, primary: bool) -> NewPatientInsurance {
        NewPatientInsurance {
            patient_id,
            provider_id,
            policy_number: "POL-1001".into(),
            copay_amount: Some(dec!(25.00)),
            deductible_amount: None,
            is_primary: primary,
        }
    }

    #[test]
    fn test_duplicate_payer_code_rejected() {
        let registry = ProviderRegistry::new();
        let scope = scope();
        registry
            .register(&scope, "Acme Health", "ACME", ProviderKind::Private)
            .unwrap();
        let err = registry
            .register(&scope, "Acme Clone", "ACME", ProviderKind::Hmo)
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_single_primary_per_patient() {
        let (providers, policies) = registries();
        let scope = scope();
        let payer = providers
            .register(&scope, "Acme Health", "ACME", ProviderKind::Private)
            .unwrap();
        let patient = Uuid::new_v4();

        let first = policies
            .register(&scope, policy_input(payer.id, patient, true))
            .unwrap();
        let second = policies
            .register(&scope, policy_input(payer.id, patient, true))
            .unwrap();

        assert!(!policies.get(&scope, &first.id).unwrap().is_primary);
        assert!(policies.get(&scope, &second.id).unwrap().is_primary);

        let listed = policies.list_for_patient(&scope, &patient);
        assert_eq!(listed.iter().filter(|p| p.is_primary).count(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[test]
    fn test_policy_requires_known_payer() {
        let (_, policies) = registries();
        let err = policies
            .register(&scope(), policy_input(Uuid::new_v4(), Uuid::new_v4(), false))
            .unwrap_err();
        assert_eq!(err, CoreError::NotFound("insurance provider"));
    }

    #[test]
    fn test_negative_copay_rejected() {
        let (providers, policies) = registries();
        let scope = scope();
        let payer = providers
            .register(&scope, "Acme Health", "ACME", ProviderKind::Private)
            .unwrap();
        let mut input = policy_input(payer.id, Uuid::new_v4(), false);
        input.copay_amount = Some(dec!(-1));
        let err = policies.register(&scope, input).unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "copay_amount", .. }));
    }

    #[test]
    fn test_policies_invisible_across_tenants() {
        let (providers, policies) = registries();
        let scope = scope();
        let payer = providers
            .register(&scope, "Acme Health", "ACME", ProviderKind::Private)
            .unwrap();
        let policy = policies
            .register(&scope, policy_input(payer.id, Uuid::new_v4(), true))
            .unwrap();

        let other = self::scope();
        assert!(policies.get(&other, &policy.id).is_none());
    }
}
