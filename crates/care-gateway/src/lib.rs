//! OpenCare Unified API Gateway
//!
//! HTTP surface over the clinical billing platform:
//! - Tenant guard (credential verification, scoped identities)
//! - Claims API (catalog, payers, coverage, claim lifecycle)
//! - Patient-access API (multi-level approval workflows)
//!
//! Every `/api/v1` route passes through the bearer-credential middleware;
//! `/health` is the only unauthenticated endpoint.

#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use care_access::{ApprovalConfig, ApprovalEngine};
use care_billing::BillingPlatform;
use care_tenant::{GuardConfig, TenantGuard, TenantRegistry};

pub use error::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Tenant isolation guard
    pub guard: Arc<TenantGuard>,
    /// Pricing, coverage and claims
    pub billing: Arc<BillingPlatform>,
    /// Patient-access approval workflows
    pub approvals: Arc<ApprovalEngine>,
}

impl AppState {
    /// Create application state with an empty tenant registry
    pub fn new(config: &GuardConfig, approvals: ApprovalConfig) -> Self {
        Self {
            guard: Arc::new(TenantGuard::new(config, TenantRegistry::new())),
            billing: Arc::new(BillingPlatform::new()),
            approvals: Arc::new(ApprovalEngine::new(approvals)),
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Service price catalog
        .route(
            "/service-prices",
            post(handlers::register_service_price).get(handlers::list_service_prices),
        )
        .route("/service-prices/:id", delete(handlers::retire_service_price))
        // Insurance payers and patient policies
        .route(
            "/insurance-providers",
            post(handlers::register_provider).get(handlers::list_providers),
        )
        .route("/patient-insurances", post(handlers::register_patient_insurance))
        .route(
            "/patients/:patient_id/insurances",
            get(handlers::list_patient_insurances),
        )
        // Coverage rules
        .route("/coverage-rules", post(handlers::register_coverage_rule))
        .route("/coverage-rules/:id", delete(handlers::retire_coverage_rule))
        // Claims
        .route("/claims", post(handlers::create_claim).get(handlers::list_claims))
        .route(
            "/claims/:id",
            get(handlers::get_claim).patch(handlers::transition_claim),
        )
        .route("/claims/:id/line-items", post(handlers::add_line_item))
        .route(
            "/claims/:claim_id/line-items/:item_id",
            patch(handlers::update_line_item).delete(handlers::remove_line_item),
        )
        // Patient-access approvals
        .route(
            "/access-requests",
            post(handlers::create_access_request).get(handlers::list_access_requests),
        )
        .route("/access-requests/expire-overdue", post(handlers::expire_overdue))
        .route("/access-requests/:id", get(handlers::get_access_request))
        .route(
            "/access-requests/:id/history",
            get(handlers::access_request_history),
        )
        .route(
            "/access-requests/:id/approve",
            post(handlers::approve_access_request),
        )
        .route("/access-requests/:id/deny", post(handlers::deny_access_request))
        .route("/patients/:patient_id/access", get(handlers::check_patient_access))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
