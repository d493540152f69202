//! API handlers
//!
//! Request bodies for domain operations reuse the library input structs
//! directly; only boundary-specific DTOs are defined here. Every handler under
//! `/api/v1` receives the caller [`Identity`] from the auth middleware and
//! derives a [`TenantScope`] from it, so stores never see an unscoped call.
//!
//! [`TenantScope`]: care_tenant::TenantScope

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use care_access::{
    ApprovalLevel, ApprovalOutcome, ApprovalStep, DecisionInput, NewAccessRequest,
    PatientAccessRequest,
};
use care_billing::{
    ClaimStatus, InsuranceClaim, InsuranceProvider, LineItemInput, NewClaim, NewPatientInsurance,
    NewPlanCoverage, NewServicePrice, PatientInsurance, PlanCoverage, ProviderKind, ServicePrice,
    TransitionRequest,
};
use care_common::{Capability, CoreError, TenantId};
use care_tenant::Identity;

use crate::error::ApiError;
use crate::AppState;

fn require(identity: &Identity, capability: Capability) -> Result<(), ApiError> {
    if identity.role.grants(capability) {
        Ok(())
    } else {
        Err(CoreError::Authorization("insufficient role").into())
    }
}

/// Liveness payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process is serving
    pub status: String,
    /// Gateway crate version
    pub version: String,
}

/// Payer registration body
#[derive(Debug, Deserialize)]
pub struct NewProviderBody {
    /// Display name
    pub name: String,
    /// Tenant-unique payer code
    pub code: String,
    /// Payer category
    pub kind: ProviderKind,
}

/// Access request body; the requesting physician is always the caller
#[derive(Debug, Deserialize)]
pub struct NewAccessRequestBody {
    /// Patient whose record is requested
    pub patient_id: Uuid,
    /// Physician the access is delegated to, when not the requester
    pub target_physician_id: Option<Uuid>,
    /// Clinical justification
    pub reason: String,
    /// Approval chain, level 1 first
    pub workflow: Vec<ApprovalLevel>,
}

/// Overdue-sweep body; operators may name another tenant
#[derive(Debug, Default, Deserialize)]
pub struct ExpireOverdueBody {
    /// Tenant to sweep, defaults to the caller's own
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

/// Overdue-sweep result
#[derive(Debug, Serialize)]
pub struct ExpireOverdueResponse {
    /// Requests flipped to expired
    pub expired: usize,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// Service price catalog

pub async fn register_service_price(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<NewServicePrice>,
) -> Result<(StatusCode, Json<ServicePrice>), ApiError> {
    require(&identity, Capability::ManageCatalog)?;
    let price = state.billing.catalog.register(&identity.own_scope(), input)?;
    Ok((StatusCode::CREATED, Json(price)))
}

pub async fn list_service_prices(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<Vec<ServicePrice>> {
    Json(state.billing.catalog.list(&identity.own_scope()))
}

pub async fn retire_service_price(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServicePrice>, ApiError> {
    require(&identity, Capability::ManageCatalog)?;
    let price = state.billing.catalog.deactivate(&identity.own_scope(), &id)?;
    Ok(Json(price))
}

// Insurance payers and patient policies

pub async fn register_provider(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<NewProviderBody>,
) -> Result<(StatusCode, Json<InsuranceProvider>), ApiError> {
    require(&identity, Capability::ManageCatalog)?;
    let provider = state.billing.providers.register(
        &identity.own_scope(),
        &input.name,
        &input.code,
        input.kind,
    )?;
    Ok((StatusCode::CREATED, Json(provider)))
}

pub async fn list_providers(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<Vec<InsuranceProvider>> {
    Json(state.billing.providers.list(&identity.own_scope()))
}

pub async fn register_patient_insurance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<NewPatientInsurance>,
) -> Result<(StatusCode, Json<PatientInsurance>), ApiError> {
    require(&identity, Capability::ManageCatalog)?;
    let policy = state.billing.policies.register(&identity.own_scope(), input)?;
    Ok((StatusCode::CREATED, Json(policy)))
}

pub async fn list_patient_insurances(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<Uuid>,
) -> Json<Vec<PatientInsurance>> {
    Json(
        state
            .billing
            .policies
            .list_for_patient(&identity.own_scope(), &patient_id),
    )
}

// Coverage rules

pub async fn register_coverage_rule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<NewPlanCoverage>,
) -> Result<(StatusCode, Json<PlanCoverage>), ApiError> {
    require(&identity, Capability::ManageCatalog)?;
    let rule = state.billing.coverage.register(&identity.own_scope(), input)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn retire_coverage_rule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlanCoverage>, ApiError> {
    require(&identity, Capability::ManageCatalog)?;
    let rule = state.billing.coverage.deactivate(&identity.own_scope(), &id)?;
    Ok(Json(rule))
}

// Claims

pub async fn create_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<NewClaim>,
) -> Result<(StatusCode, Json<InsuranceClaim>), ApiError> {
    require(&identity, Capability::SubmitClaims)?;
    let claim = state.billing.claims.create_claim(&identity.own_scope(), input)?;
    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn list_claims(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<Vec<InsuranceClaim>> {
    Json(state.billing.claims.list(&identity.own_scope()))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    state
        .billing
        .claims
        .get(&identity.own_scope(), &id)
        .map(Json)
        .ok_or_else(|| CoreError::NotFound("claim").into())
}

pub async fn transition_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    let needed = match request.status {
        ClaimStatus::Draft | ClaimStatus::Submitted => Capability::SubmitClaims,
        ClaimStatus::Processing | ClaimStatus::Approved | ClaimStatus::Denied => {
            Capability::AdjudicateClaims
        }
        ClaimStatus::Paid => Capability::RecordPayments,
    };
    require(&identity, needed)?;
    let claim = state
        .billing
        .claims
        .transition(&identity.own_scope(), &id, request)?;
    Ok(Json(claim))
}

pub async fn add_line_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(claim_id): Path<Uuid>,
    Json(input): Json<LineItemInput>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    require(&identity, Capability::SubmitClaims)?;
    let claim = state
        .billing
        .claims
        .add_line_item(&identity.own_scope(), &claim_id, input)?;
    Ok(Json(claim))
}

pub async fn update_line_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((claim_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<LineItemInput>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    require(&identity, Capability::SubmitClaims)?;
    let claim =
        state
            .billing
            .claims
            .update_line_item(&identity.own_scope(), &claim_id, &item_id, input)?;
    Ok(Json(claim))
}

pub async fn remove_line_item(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((claim_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    require(&identity, Capability::SubmitClaims)?;
    let claim = state
        .billing
        .claims
        .remove_line_item(&identity.own_scope(), &claim_id, &item_id)?;
    Ok(Json(claim))
}

// Patient-access approvals

pub async fn create_access_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewAccessRequestBody>,
) -> Result<(StatusCode, Json<PatientAccessRequest>), ApiError> {
    require(&identity, Capability::RequestAccess)?;
    let input = NewAccessRequest {
        patient_id: body.patient_id,
        requesting_physician_id: identity.user_id,
        target_physician_id: body.target_physician_id,
        reason: body.reason,
        workflow: body.workflow,
    };
    let request = state.approvals.create_request(&identity.own_scope(), input)?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Pending requests awaiting the calling role at their current level
pub async fn list_access_requests(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Json<Vec<PatientAccessRequest>> {
    Json(
        state
            .approvals
            .list_pending_for(&identity.own_scope(), identity.role),
    )
}

pub async fn get_access_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatientAccessRequest>, ApiError> {
    state
        .approvals
        .get(&identity.own_scope(), &id)
        .map(Json)
        .ok_or_else(|| CoreError::NotFound("access request").into())
}

pub async fn access_request_history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ApprovalStep>>, ApiError> {
    let steps = state.approvals.history(&identity.own_scope(), &id)?;
    Ok(Json(steps))
}

pub async fn approve_access_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(input): Json<DecisionInput>,
) -> Result<Json<ApprovalOutcome>, ApiError> {
    require(&identity, Capability::ApproveAccess)?;
    let outcome = state.approvals.approve(
        &identity.own_scope(),
        &id,
        identity.role,
        identity.user_id,
        input,
    )?;
    Ok(Json(outcome))
}

pub async fn deny_access_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(input): Json<DecisionInput>,
) -> Result<Json<ApprovalOutcome>, ApiError> {
    require(&identity, Capability::ApproveAccess)?;
    let outcome = state.approvals.deny(
        &identity.own_scope(),
        &id,
        identity.role,
        identity.user_id,
        input,
    )?;
    Ok(Json(outcome))
}

/// Sweep overdue pending requests; operators may target another tenant
pub async fn expire_overdue(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<ExpireOverdueBody>,
) -> Result<Json<ExpireOverdueResponse>, ApiError> {
    require(&identity, Capability::ApproveAccess)?;
    let scope = match body.tenant_id {
        Some(target) if target != identity.tenant_id => identity.scope_as_operator(target)?,
        _ => identity.own_scope(),
    };
    let expired = state.approvals.expire_overdue(&scope, Utc::now());
    Ok(Json(ExpireOverdueResponse { expired }))
}

/// Probe whether the caller holds a live grant for the patient; 204 or 403
pub async fn check_patient_access(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.approvals.grants().assert_valid(
        &identity.own_scope(),
        &identity.user_id,
        &patient_id,
        Utc::now(),
    )?;
    Ok(StatusCode::NO_CONTENT)
}
