//! Error types for parsing domain labels.

use thiserror::Error;

/// A stored or transmitted label did not name a known value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown event status: {0}")]
    UnknownEventStatus(String),

    #[error("unknown enrollment status: {0}")]
    UnknownEnrollmentStatus(String),
}
