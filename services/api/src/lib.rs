//! pitchhub API library.
//!
//! This crate primarily ships the `pitchhub-api` binary, but exposes its
//! modules so the router can be driven from integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod identity;
pub mod lifecycle;
pub mod state;
