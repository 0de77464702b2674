//! World description files.
//!
//! A world file declares snaps with their apps, hooks, plugs, and slots, plus
//! the connections between them. Loading one builds a `Repository` over the
//! builtin interfaces, makes the declared connections, and then auto-connects
//! every remaining plug whose interface allows it and that has exactly one
//! candidate slot.
//!
//! ```toml
//! [[snap]]
//! name = "core"
//! type = "os"
//! slot = [{ name = "network" }]
//!
//! [[snap]]
//! name = "browser"
//! revision = 12
//! confinement = "devmode"
//! app = [{ name = "browser" }, { name = "sync", daemon = "simple" }]
//! hooks = ["configure"]
//! plug = [{ name = "network", apps = ["browser"] }]
//!
//! [[connection]]
//! plug = "browser:network"
//! slot = "core:network"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use confine_contracts::{
    error::{ConfineError, ConfineResult},
    interfaces::{Attrs, ConnRef, PlugInfo, PlugRef, SlotInfo, SlotRef},
    snap::{AppInfo, ConfinementType, HookInfo, SnapInfo, SnapType},
};
use confine_core::{repository::Rejection, Repository};
use confine_interfaces::Registry;

// ── File schema ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorldFile {
    /// Auto-connect plugs left unconnected by `[[connection]]` entries.
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    #[serde(default, rename = "snap")]
    pub snaps: Vec<SnapDecl>,
    #[serde(default, rename = "connection")]
    pub connections: Vec<ConnectionDecl>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapDecl {
    pub name: String,
    pub revision: Option<i64>,
    #[serde(default, rename = "type")]
    pub snap_type: SnapType,
    #[serde(default)]
    pub confinement: ConfinementType,
    pub mount_root: Option<PathBuf>,
    #[serde(default, rename = "app")]
    pub apps: Vec<AppDecl>,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default, rename = "plug")]
    pub plugs: Vec<EndpointDecl>,
    #[serde(default, rename = "slot")]
    pub slots: Vec<EndpointDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppDecl {
    pub name: String,
    /// Daemon kind, e.g. "simple"; absent for foreground apps.
    pub daemon: Option<String>,
}

/// A plug or slot declaration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointDecl {
    pub name: String,
    /// Defaults to `name`.
    pub interface: Option<String>,
    /// Defaults to every app of the snap.
    pub apps: Option<Vec<String>>,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default)]
    pub attrs: Attrs,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDecl {
    /// `snap:plug`
    pub plug: String,
    /// `snap:slot`
    pub slot: String,
}

// ── Loaded world ──────────────────────────────────────────────────────────────

/// A populated repository plus what each snap was declared with.
#[derive(Debug)]
pub struct World {
    pub repo: Repository,
    snaps: BTreeMap<String, (Arc<SnapInfo>, ConfinementType)>,
    /// Plugs and slots refused by their interface, per snap.
    pub rejections: Vec<(String, Rejection)>,
    /// Connections made by auto-connect, in the order they were made.
    pub auto_connected: Vec<ConnRef>,
}

impl World {
    pub fn from_toml_str(s: &str, registry: &Registry) -> ConfineResult<Self> {
        let file: WorldFile = toml::from_str(s).map_err(|e| ConfineError::ConfigError {
            reason: format!("failed to parse world TOML: {}", e),
        })?;
        Self::build(file, registry)
    }

    pub fn from_file(path: &Path, registry: &Registry) -> ConfineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfineError::ConfigError {
            reason: format!("failed to read world file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents, registry)
    }

    pub fn build(file: WorldFile, registry: &Registry) -> ConfineResult<Self> {
        let mut world = World {
            repo: registry.repository()?,
            snaps: BTreeMap::new(),
            rejections: Vec::new(),
            auto_connected: Vec::new(),
        };

        for decl in file.snaps {
            world.add_snap(decl)?;
        }

        for decl in &file.connections {
            let conn = ConnRef::new(decl.plug.parse::<PlugRef>()?, decl.slot.parse::<SlotRef>()?);
            world.repo.connect(&conn)?;
            debug!(connection = %conn, "connected");
        }

        if file.auto_connect {
            world.auto_connect()?;
        }
        Ok(world)
    }

    fn add_snap(&mut self, decl: SnapDecl) -> ConfineResult<()> {
        let mut snap = SnapInfo::new(decl.name.as_str()).with_type(decl.snap_type);
        if let Some(revision) = decl.revision {
            snap = snap.with_revision(revision);
        }
        if let Some(root) = decl.mount_root {
            snap = snap.with_mount_root(root);
        }
        for app in decl.apps {
            snap = snap.with_app(match app.daemon {
                Some(kind) => AppInfo::daemon(app.name, kind),
                None => AppInfo::new(app.name),
            });
        }
        for hook in decl.hooks {
            snap = snap.with_hook(HookInfo::new(hook));
        }
        let snap = Arc::new(snap);

        let plugs = decl
            .plugs
            .into_iter()
            .map(|p| {
                let iface = p.interface.unwrap_or_else(|| p.name.clone());
                let plug = PlugInfo::new(&snap, p.name, iface).with_hooks(p.hooks);
                let plug = match p.apps {
                    Some(apps) => plug.with_apps(apps),
                    None => plug.with_all_apps(),
                };
                p.attrs
                    .into_iter()
                    .fold(plug, |plug, (k, v)| plug.with_attr(k, v))
            })
            .collect();
        let slots = decl
            .slots
            .into_iter()
            .map(|s| {
                let iface = s.interface.unwrap_or_else(|| s.name.clone());
                let slot = SlotInfo::new(&snap, s.name, iface).with_hooks(s.hooks);
                let slot = match s.apps {
                    Some(apps) => slot.with_apps(apps),
                    None => slot.with_all_apps(),
                };
                s.attrs
                    .into_iter()
                    .fold(slot, |slot, (k, v)| slot.with_attr(k, v))
            })
            .collect();

        let rejected = self.repo.add_snap(Arc::clone(&snap), plugs, slots)?;
        self.rejections
            .extend(rejected.into_iter().map(|r| (snap.name.clone(), r)));
        self.snaps
            .insert(snap.name.clone(), (snap, decl.confinement));
        Ok(())
    }

    fn auto_connect(&mut self) -> ConfineResult<()> {
        let plugs: Vec<PlugRef> = self
            .repo
            .snaps()
            .into_iter()
            .flat_map(|snap| self.repo.plugs(snap))
            .map(PlugRef::from)
            .collect();

        for plug in plugs {
            if self.repo.connected_slot(&plug).is_some() {
                continue;
            }
            let mut candidates = self.repo.auto_connect_candidates(&plug)?;
            if candidates.len() != 1 {
                debug!(plug = %plug, candidates = candidates.len(), "not auto-connected");
                continue;
            }
            let conn = ConnRef::new(plug, candidates.remove(0));
            self.repo.connect(&conn)?;
            info!(connection = %conn, "auto-connected");
            self.auto_connected.push(conn);
        }
        Ok(())
    }

    /// Snap names, sorted.
    pub fn snap_names(&self) -> Vec<&str> {
        self.snaps.keys().map(String::as_str).collect()
    }

    /// The named snap and its declared confinement.
    pub fn snap(&self, name: &str) -> ConfineResult<(&SnapInfo, ConfinementType)> {
        self.snaps
            .get(name)
            .map(|(snap, confinement)| (snap.as_ref(), *confinement))
            .ok_or_else(|| ConfineError::NoSuchSnap {
                name: name.to_string(),
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
