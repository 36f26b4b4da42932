//! Domain Layer
//!
//! The core of relayctl: what a fleet looks like and how a rollout changes it.
//!
//! ## Structure
//!
//! - `entities/` - Instances, snapshots, credentials, outcomes
//! - `value_objects/` - Targets, topology, layout, FamilyId
//! - `services/` - Enumeration, mutation, privilege, reload, identifier resolution
//! - `ports/` - Interfaces implemented by infrastructure
//!
//! ## Design Principles
//!
//! 1. **No direct I/O** - hosts are reached only through the `HostShell` port
//! 2. **Pure text edits** - config mutation is a string-to-string function
//! 3. **Ports & Adapters** - local and ssh execution are interchangeable

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
