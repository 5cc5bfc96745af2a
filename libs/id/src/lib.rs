//! # pitchhub-id
//!
//! Record identifiers for pitchhub documents.
//!
//! Natural keys (user email, event name, the `(event, startup)` and
//! `(event, investor)` pairs) carry the uniqueness rules. Every stored record
//! additionally gets a stable system identifier, which is what API responses
//! expose as the stringified `id`.
//!
//! ## ID Format
//!
//! `{prefix}_{ulid}`, for example `evt_01HV4Z2WQXKJNM8GPQY6VBKC3D`.
//!
//! The prefix names the record kind, and the ULID keeps IDs sortable by
//! creation time.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
