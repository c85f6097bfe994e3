//! Accountability tooling for recurring and one-off work assignments.
//!
//! [`rules`] holds the pure decision units (transition validation, scoring and
//! repeat-issue detection). [`tickets`] is the service layer that feeds those
//! units from storage and applies their results.

pub mod config;
pub mod error;
pub mod rules;
pub mod telemetry;
pub mod tickets;
