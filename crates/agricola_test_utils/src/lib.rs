//! # Agricola Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Game and player fixtures
//! - Scripted and cycling decision sources
//! - Brute-force oracles for the capacity solver
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod oracle;
pub mod sources;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
