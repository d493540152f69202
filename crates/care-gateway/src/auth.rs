//! Bearer-credential middleware
//!
//! Every `/api/v1` route runs through [`authenticate`]. The resolved
//! [`Identity`] is attached as a request extension so handlers never touch the
//! raw credential.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use care_common::CoreError;

use crate::error::ApiError;
use crate::AppState;

/// Resolve the `Authorization: Bearer` header into an [`Identity`] extension.
///
/// [`Identity`]: care_tenant::Identity
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credential = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(CoreError::Authentication)?;

    let identity = state.guard.authorize(credential)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
