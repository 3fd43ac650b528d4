//! Violation types for aggregated constraint failures.
//!
//! This module provides [`ConstraintViolation`] for single failures and
//! [`Violations`] for the non-empty aggregate the engine reports.

mod violation;

pub use violation::{ConstraintViolation, ViolationCollector, Violations};
