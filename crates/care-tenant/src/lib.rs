//! Tenant Isolation Guard
//!
//! Resolves opaque credentials into identities and mints the tenant scopes
//! every downstream read and write is keyed by.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  TENANT ISOLATION GUARD                    │
//! │                                                            │
//! │  credential ──► CredentialVerifier ──► Identity            │
//! │                      (HS256 JWT)          │                │
//! │                                           ▼                │
//! │                            scope_for / scope_as_operator   │
//! │                                           │                │
//! │                                           ▼                │
//! │                                      TenantScope           │
//! │            (the only key scoped stores accept)             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `TenantScope` can only be minted through `Identity`, so a query that
//! forgets the caller's tenant filter is unrepresentable. Cross-tenant scopes
//! exist, but only through the explicit operator path.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod credential;
pub mod guard;
pub mod model;

pub use credential::{Claims, CredentialVerifier, GuardConfig};
pub use guard::{Identity, TenantGuard, TenantScope};
pub use model::{Tenant, TenantKind, TenantRegistry, TenantStatus};
