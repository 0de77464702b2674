//! # confine-contracts
//!
//! Shared types for confine profile generation: snaps, plugs and slots,
//! security systems and tags, desired file state, and the error types.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and the small helpers they need.

pub mod error;
pub mod interfaces;
pub mod security;
pub mod snap;
pub mod state;
