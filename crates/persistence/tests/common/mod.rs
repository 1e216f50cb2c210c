//! Test infrastructure for the persistence layer.
//!
//! [`scenarios`] holds backend-agnostic checks written against the facades;
//! each backend's suite runs them over its own [`harness`] backend.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;
pub mod scenarios;

pub use fixtures::*;
pub use harness::*;
