//! `ProfileBackend`: collect, combine, and reconcile the profiles of one system.
//!
//! Setup walks three steps for a snap:
//!
//! 1. Collect the snap's snippets for this backend's system from the repository.
//! 2. Combine them with the baseline template into one file per security tag.
//! 3. Reconcile the profile directory against that set, scoped to `snap.<name>.*`.
//!
//! Any failure in step 1 aborts before the directory is touched. Errors are
//! wrapped in `ConfineError::Backend` carrying the operation and snap name.

use tracing::{info, warn};

use confine_contracts::{
    error::{ConfineError, ConfineResult},
    security::{security_tag_glob, SecuritySystem},
    snap::{validate_name, ConfinementType, SnapInfo},
    state::{ChangeSet, DesiredState},
};
use confine_core::{traits::SecurityBackend, Repository};
use confine_dirstate::ensure_dir_state;

use crate::combine::{combine, SystemProfile};
use crate::config::ConfineConfig;

/// A `SecurityBackend` writing profiles described by a `SystemProfile`.
#[derive(Debug, Clone)]
pub struct ProfileBackend {
    name: &'static str,
    profile: SystemProfile,
}

impl ProfileBackend {
    pub fn new(name: &'static str, profile: SystemProfile) -> Self {
        Self { name, profile }
    }

    /// The seccomp backend as configured by `config`.
    pub fn seccomp(config: &ConfineConfig) -> ConfineResult<Self> {
        Ok(Self::new("seccomp", config.seccomp_profile()?))
    }

    /// The apparmor backend as configured by `config`.
    pub fn apparmor(config: &ConfineConfig) -> ConfineResult<Self> {
        Ok(Self::new("apparmor", config.apparmor_profile()?))
    }

    pub fn profile(&self) -> &SystemProfile {
        &self.profile
    }

    /// The files Setup would write for `snap`, without touching disk.
    ///
    /// A backend for a system outside the known set has nothing to write.
    pub fn combine(
        &self,
        snap: &SnapInfo,
        confinement: ConfinementType,
        repo: &Repository,
    ) -> ConfineResult<DesiredState> {
        if !self.profile.system.is_known() {
            warn!(
                backend = self.name,
                system = %self.profile.system,
                "unsupported security system, no profiles produced"
            );
            return Ok(DesiredState::new());
        }
        let snippets = repo.security_snippets_for_snap(&snap.name, &self.profile.system)?;
        Ok(combine(snap, confinement, &snippets, &self.profile))
    }

    fn wrap(&self, operation: &'static str, snap: &str, source: ConfineError) -> ConfineError {
        ConfineError::Backend {
            operation,
            backend: self.name.to_string(),
            snap: snap.to_string(),
            source: Box::new(source),
        }
    }
}

impl SecurityBackend for ProfileBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn security_system(&self) -> SecuritySystem {
        self.profile.system.clone()
    }

    fn setup(
        &self,
        snap: &SnapInfo,
        confinement: ConfinementType,
        repo: &Repository,
    ) -> ConfineResult<ChangeSet> {
        validate_name("snap", &snap.name).map_err(|e| self.wrap("setup", &snap.name, e.into()))?;
        let desired = self
            .combine(snap, confinement, repo)
            .map_err(|e| self.wrap("setup", &snap.name, e))?;
        let changes = ensure_dir_state(
            &self.profile.directory,
            &security_tag_glob(&snap.name),
            &desired,
        )
        .map_err(|e| self.wrap("setup", &snap.name, e))?;

        info!(
            backend = self.name,
            snap = %snap.name,
            confinement = ?confinement,
            profiles = desired.len(),
            changed = changes.changed.len(),
            removed = changes.removed.len(),
            "profiles set up"
        );
        Ok(changes)
    }

    fn remove(&self, snap_name: &str) -> ConfineResult<ChangeSet> {
        // The name becomes part of the reconcile glob.
        validate_name("snap", snap_name).map_err(|e| self.wrap("remove", snap_name, e.into()))?;
        let changes = ensure_dir_state(
            &self.profile.directory,
            &security_tag_glob(snap_name),
            &DesiredState::new(),
        )
        .map_err(|e| self.wrap("remove", snap_name, e))?;

        info!(
            backend = self.name,
            snap = %snap_name,
            removed = changes.removed.len(),
            "profiles removed"
        );
        Ok(changes)
    }
}

/// Every backend, seccomp first.
pub fn all_backends(config: &ConfineConfig) -> ConfineResult<Vec<ProfileBackend>> {
    Ok(vec![
        ProfileBackend::seccomp(config)?,
        ProfileBackend::apparmor(config)?,
    ])
}
