//! # confine-backend
//!
//! Profile backends for seccomp and apparmor, driven by TOML configuration.
//!
//! ## Overview
//!
//! This crate provides [`ProfileBackend`], which implements the
//! [`SecurityBackend`](confine_core::traits::SecurityBackend) trait. A backend
//! collects a snap's snippets from the repository, combines them with its
//! baseline template into one profile per app and hook, and reconciles its
//! profile directory so it holds exactly those files for the snap.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use confine_backend::{all_backends, ConfineConfig};
//!
//! let config = ConfineConfig::from_file(Path::new("/etc/confine.toml"))?;
//! for backend in all_backends(&config)? {
//!     backend.setup(&snap, ConfinementType::Strict, &repo)?;
//! }
//! ```

pub mod backend;
pub mod combine;
pub mod config;
pub mod templates;

pub use backend::{all_backends, ProfileBackend};
pub use combine::{combine, ProfileLayout, SystemProfile};
pub use config::{ConfineConfig, SystemConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
