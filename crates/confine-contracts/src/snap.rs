//! Snap package identity, applications, and hooks.
//!
//! These are the already-validated results of manifest parsing. The profile
//! pipeline only reads them; it never parses manifests itself.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::security::{app_security_tag, hook_security_tag};

/// Default location snaps are mounted under.
pub const DEFAULT_MOUNT_ROOT: &str = "/snap";

/// The revision of an installed snap.
///
/// Positive values are store revisions, negative values are local
/// (side-loaded) revisions rendered with an `x` prefix, zero is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(pub i64);

impl Revision {
    pub fn is_local(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("unset"),
            n if n < 0 => write!(f, "x{}", n.unsigned_abs()),
            n => write!(f, "{}", n),
        }
    }
}

/// The kind of a snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapType {
    #[default]
    App,
    Gadget,
    Kernel,
    Os,
}

impl fmt::Display for SnapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapType::App => "app",
            SnapType::Gadget => "gadget",
            SnapType::Kernel => "kernel",
            SnapType::Os => "os",
        };
        f.write_str(s)
    }
}

/// How strictly a snap's generated profiles are enforced.
///
/// `Devmode` makes violations non-fatal. `Classic` selects the classic
/// baseline template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfinementType {
    #[default]
    Strict,
    Devmode,
    Classic,
}

/// One application declared by a snap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    /// The daemon kind ("simple", "forking", ...) when the app is a
    /// long-running background service.
    #[serde(default)]
    pub daemon: Option<String>,
}

impl AppInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            daemon: None,
        }
    }

    pub fn daemon(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            daemon: Some(kind.into()),
        }
    }

    pub fn is_daemon(&self) -> bool {
        self.daemon.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// One hook declared by a snap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInfo {
    pub name: String,
}

impl HookInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An installed snap as seen by the profile pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapInfo {
    pub name: String,
    #[serde(default)]
    pub revision: Revision,
    #[serde(default, rename = "type")]
    pub snap_type: SnapType,
    /// Directory snaps are mounted under; the snap itself lives in
    /// `<mount_root>/<name>/<revision>`.
    #[serde(default = "default_mount_root")]
    pub mount_root: PathBuf,
    /// Applications in declaration order.
    #[serde(default)]
    pub apps: Vec<AppInfo>,
    /// Hooks in declaration order.
    #[serde(default)]
    pub hooks: Vec<HookInfo>,
}

fn default_mount_root() -> PathBuf {
    PathBuf::from(DEFAULT_MOUNT_ROOT)
}

impl SnapInfo {
    /// A snap of type `app` at revision 1 with no apps or hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: Revision(1),
            snap_type: SnapType::App,
            mount_root: default_mount_root(),
            apps: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn with_revision(mut self, revision: i64) -> Self {
        self.revision = Revision(revision);
        self
    }

    pub fn with_type(mut self, snap_type: SnapType) -> Self {
        self.snap_type = snap_type;
        self
    }

    pub fn with_mount_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mount_root = root.into();
        self
    }

    pub fn with_app(mut self, app: AppInfo) -> Self {
        self.apps.push(app);
        self
    }

    pub fn with_hook(mut self, hook: HookInfo) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Where the snap's files are mounted.
    pub fn mount_dir(&self) -> PathBuf {
        self.mount_root
            .join(&self.name)
            .join(self.revision.to_string())
    }

    pub fn app(&self, name: &str) -> Option<&AppInfo> {
        self.apps.iter().find(|a| a.name == name)
    }

    pub fn hook(&self, name: &str) -> Option<&HookInfo> {
        self.hooks.iter().find(|h| h.name == name)
    }

    /// All app names, in declaration order.
    pub fn app_names(&self) -> Vec<&str> {
        self.apps.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn app_security_tag(&self, app: &AppInfo) -> String {
        app_security_tag(&self.name, &app.name)
    }

    pub fn hook_security_tag(&self, hook: &HookInfo) -> String {
        hook_security_tag(&self.name, &hook.name)
    }

    /// Every security tag of this snap: one per app, then one per hook.
    pub fn security_tags(&self) -> Vec<String> {
        self.apps
            .iter()
            .map(|a| self.app_security_tag(a))
            .chain(self.hooks.iter().map(|h| self.hook_security_tag(h)))
            .collect()
    }

    /// Check the snap, app, and hook names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("snap", &self.name)?;
        for app in &self.apps {
            validate_name("app", &app.name)?;
        }
        for hook in &self.hooks {
            validate_name("hook", &hook.name)?;
        }
        Ok(())
    }
}

/// Check that `name` matches `^[a-z](?:-?[a-z0-9])*$`.
///
/// The same rule applies to snaps, apps, hooks, plugs, slots and interfaces.
pub fn validate_name(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidName {
        kind,
        name: name.to_string(),
    };

    let bytes = name.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_lowercase() => {}
        _ => return Err(invalid()),
    }
    let mut prev_dash = false;
    for &b in &bytes[1..] {
        match b {
            b'-' if prev_dash => return Err(invalid()),
            b'-' => prev_dash = true,
            b'a'..=b'z' | b'0'..=b'9' => prev_dash = false,
            _ => return Err(invalid()),
        }
    }
    if prev_dash {
        return Err(invalid());
    }
    Ok(())
}
