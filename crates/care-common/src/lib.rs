//! OpenCare Common - Shared types for the platform core
//!
//! This crate provides the vocabulary every other core crate speaks:
//! - The error taxonomy (`CoreError`) and its result alias
//! - Entity id aliases
//! - The closed role/capability enumeration
//! - Currency rounding helpers for claim arithmetic

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod ids;
pub mod money;
pub mod roles;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use roles::{Capability, Role};
