//! Common test utilities for relayctl CLI tests.
//!
//! This module provides:
//! - `TestEnv`: isolated fleet in a temp directory with a fake `ssh`
//! - Fixtures: reusable torrc content and fingerprints

#![allow(dead_code)]

pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
