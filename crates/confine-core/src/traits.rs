//! Core trait definitions for the profile pipeline.
//!
//! - `Interface`:       one kind of capability: validates plugs and slots
//!   and emits policy fragments per security system
//! - `SecurityBackend`: owns the profiles of one security system on disk
//!
//! Interfaces are created once at startup and shared read-only. Backends
//! recompute everything they write on every call.

use confine_contracts::{
    error::{ConfineResult, ValidationError},
    interfaces::{PlugInfo, SlotInfo},
    security::SecuritySystem,
    snap::{ConfinementType, SnapInfo},
    state::ChangeSet,
};

use crate::repository::Repository;

/// A policy fragment, or `None` when the interface has nothing to add.
pub type Snippet = Option<Vec<u8>>;

/// One capability interface, such as `unity8` or `network`.
///
/// Every snippet accessor is total over the known security systems: systems
/// the interface does not use yield `Ok(None)`. Only
/// `SecuritySystem::Other` yields `ConfineError::UnknownSecuritySystem`.
pub trait Interface: Send + Sync {
    /// Stable, unique interface name.
    fn name(&self) -> &'static str;

    /// Validate a plug before it can take part in any connection.
    fn sanitize_plug(&self, plug: &PlugInfo) -> Result<(), ValidationError>;

    /// Validate a slot before it can take part in any connection.
    fn sanitize_slot(&self, slot: &SlotInfo) -> Result<(), ValidationError>;

    /// Connection-independent fragment for the plug side.
    fn permanent_plug_snippet(
        &self,
        plug: &PlugInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet>;

    /// Fragment for the plug side of one live connection.
    fn connected_plug_snippet(
        &self,
        plug: &PlugInfo,
        slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet>;

    /// Connection-independent fragment for the slot side.
    fn permanent_slot_snippet(
        &self,
        slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet>;

    /// Fragment for the slot side of one live connection.
    fn connected_slot_snippet(
        &self,
        plug: &PlugInfo,
        slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet>;

    /// Whether matching plugs and slots may be connected without being asked.
    fn auto_connect(&self) -> bool;
}

/// Maintains the on-disk profiles of one security system.
///
/// Both operations are idempotent. Callers must not run two `setup` calls
/// for the same snap concurrently; calls for different snaps never touch
/// each other's files.
pub trait SecurityBackend: Send + Sync {
    /// Short backend name used in logs and errors, e.g. "seccomp".
    fn name(&self) -> &'static str;

    /// The security system whose snippets this backend consumes.
    fn security_system(&self) -> SecuritySystem;

    /// Regenerate every profile of `snap` and synchronize them to disk.
    fn setup(
        &self,
        snap: &SnapInfo,
        confinement: ConfinementType,
        repo: &Repository,
    ) -> ConfineResult<ChangeSet>;

    /// Delete every profile of the named snap.
    fn remove(&self, snap_name: &str) -> ConfineResult<ChangeSet>;
}
