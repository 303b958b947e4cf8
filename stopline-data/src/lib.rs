//! Storage adapters for the Stopline engine.
//!
//! Responsibilities:
//! - Implement [`stopline_core::RouteStore`] against remote route services.
//! - Encapsulate request encoding and transport error mapping.
//!
//! Boundaries:
//! - Do not encode sequencing rules (live in `stopline-core`).
//! - Present a synchronous interface; async IO stays internal.
//!
//! Invariants:
//! - No global mutable state.
//! - Empty persistence records never reach the network.

pub mod remote;
