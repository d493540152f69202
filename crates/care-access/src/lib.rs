//! OpenCare Access Approvals
//!
//! Multi-level, role-gated approval of patient-data access requests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     ACCESS APPROVAL ENGINE                              │
//! │                                                                         │
//! │   request ──► pending(level 1) ──► pending(level 2) ─ ... ─► approved   │
//! │                  │ deny               │ deny                    │       │
//! │                  ▼                    ▼                         ▼       │
//! │               rejected             rejected              access grant   │
//! │                                                          (time-boxed)   │
//! │                                                                         │
//! │   overdue pending ──► expired     every action ──► append-only trail    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each level of a request's chain is gated to one role; a deny at any level
//! is final. Terminal requests are immutable and their trails never change.

#![warn(missing_docs)]
#![allow(dead_code)]

pub mod engine;
pub mod grants;
pub mod history;
pub mod request;
pub mod workflow;

pub use engine::{ApprovalConfig, ApprovalEngine, ApprovalOutcome, DecisionInput};
pub use grants::{AccessGrant, GrantRegistry};
pub use history::{ApprovalStep, AuditTrail, Decision};
pub use request::{AccessStatus, NewAccessRequest, PatientAccessRequest};
pub use workflow::{ApprovalLevel, ApprovalWorkflow};
