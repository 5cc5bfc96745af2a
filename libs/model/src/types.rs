//! Enumerations shared across pitchhub.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// =============================================================================
// Roles
// =============================================================================

/// User role, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Organiser,
    Startup,
    Investor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Organiser, Role::Startup, Role::Investor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Organiser => "organiser",
            Role::Startup => "startup",
            Role::Investor => "investor",
        }
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organiser" => Ok(Role::Organiser),
            "startup" => Ok(Role::Startup),
            "investor" => Ok(Role::Investor),
            other => Err(ParseError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Lifecycle states
// =============================================================================

/// Event lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Closed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Closed => "closed",
        }
    }
}

impl FromStr for EventStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "closed" => Ok(EventStatus::Closed),
            other => Err(ParseError::UnknownEventStatus(other.to_string())),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enrollment lifecycle state. `Shortlisted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Submitted,
    Shortlisted,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Submitted => "submitted",
            EnrollmentStatus::Shortlisted => "shortlisted",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(EnrollmentStatus::Submitted),
            "shortlisted" => Ok(EnrollmentStatus::Shortlisted),
            other => Err(ParseError::UnknownEnrollmentStatus(other.to_string())),
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
