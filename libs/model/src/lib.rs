//! # pitchhub-model
//!
//! Domain vocabulary shared by the pitchhub service.
//!
//! ## Roles
//!
//! A user's role is fixed at registration:
//! - `organiser` creates and owns events, and approves investor access
//! - `startup` enrolls ideas into upcoming events
//! - `investor` requests per-event access and shortlists enrollments once approved
//!
//! ## Lifecycles
//!
//! - Event: `upcoming` ⇄ `closed` (owner-controlled, unrestricted)
//! - Enrollment: `submitted` → `shortlisted` (terminal)
//! - Access grant: `approved` flips freely, owner-controlled

mod error;
mod records;
mod types;

pub use error::ParseError;
pub use records::*;
pub use types::*;
