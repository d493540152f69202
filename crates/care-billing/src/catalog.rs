//! Billable Service Catalog

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_common::money::round_cents;
use care_common::{CoreError, CoreResult, ServicePriceId, TenantId};
use care_tenant::TenantScope;

/// Classification of a billable service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Consultation,
    Procedure,
    LabTest,
    Imaging,
    Pharmacy,
}

/// A billable catalog entry
///
/// Entries are never mutated in place. A price change is a new entry
/// registered after the old one is deactivated, so line items built against
/// the old entry keep the price they were adjudicated with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePrice {
    pub id: ServicePriceId,
    pub tenant_id: TenantId,
    pub service_code: String,
    pub service_type: ServiceType,
    pub currency: String,
    pub base_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServicePrice {
    pub service_code: String,
    pub service_type: ServiceType,
    pub currency: String,
    pub base_price: Decimal,
}

/// Tenant-scoped catalog of billable services
pub struct ServiceCatalog {
    entries: Arc<RwLock<HashMap<ServicePriceId, ServicePrice>>>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a catalog entry
    ///
    /// One active entry per service code within a tenant; retire the old
    /// entry first to change a price.
    pub fn register(&self, scope: &TenantScope, input: NewServicePrice) -> CoreResult<ServicePrice> {
        if input.base_price <= Decimal::ZERO {
            return Err(CoreError::validation(
                "base_price",
                "must be greater than zero",
            ));
        }
        if input.service_code.trim().is_empty() {
            return Err(CoreError::validation("service_code", "must not be empty"));
        }

        let mut entries = self.entries.write();
        let duplicate = entries.values().any(|p| {
            p.active && scope.covers(p.tenant_id) && p.service_code == input.service_code
        });
        if duplicate {
            return Err(CoreError::Conflict(format!(
                "service code {} is already active",
                input.service_code
            )));
        }

        let price = ServicePrice {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id(),
            service_code: input.service_code,
            service_type: input.service_type,
            currency: input.currency,
            base_price: round_cents(input.base_price),
            active: true,
            created_at: Utc::now(),
        };
        tracing::info!(
            service_price_id = %price.id,
            service_code = %price.service_code,
            "catalog entry registered"
        );
        entries.insert(price.id, price.clone());
        Ok(price)
    }

    /// Fetch an entry within scope
    pub fn get(&self, scope: &TenantScope, id: &ServicePriceId) -> Option<ServicePrice> {
        self.entries
            .read()
            .get(id)
            .filter(|p| scope.covers(p.tenant_id))
            .cloned()
    }

    /// List a tenant's catalog
    pub fn list(&self, scope: &TenantScope) -> Vec<ServicePrice> {
        let mut prices: Vec<ServicePrice> = self
            .entries
            .read()
            .values()
            .filter(|p| scope.covers(p.tenant_id))
            .cloned()
            .collect();
        prices.sort_by(|a, b| a.service_code.cmp(&b.service_code));
        prices
    }

    /// Retire an entry; claims already built against it are unaffected
    pub fn deactivate(&self, scope: &TenantScope, id: &ServicePriceId) -> CoreResult<ServicePrice> {
        let mut entries = self.entries.write();
        let price = entries
            .get_mut(id)
            .filter(|p| scope.covers(p.tenant_id))
            .ok_or(CoreError::NotFound("service price"))?;
        price.active = false;
        tracing::info!(service_price_id = %id, "catalog entry retired");
        Ok(price.clone())
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::new()
    }
}
