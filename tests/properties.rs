//! Property tests for relayctl.
//!
//! Properties use randomized torrc content to protect the invariants the
//! rollout relies on: edits are idempotent, never panic, and leave exactly
//! one declaration behind.
//!
//! Run with: `cargo test --test properties`

#[path = "properties/mutator.rs"]
mod mutator;

#[path = "properties/target_parse.rs"]
mod target_parse;
