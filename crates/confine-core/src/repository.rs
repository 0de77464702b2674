//! The connection repository.
//!
//! Holds the known interfaces, the snaps with their sanitized plugs and
//! slots, and the live plug-to-slot connections. Backends ask it for every
//! snippet that applies to one snap under one security system.
//!
//! Collection order is deterministic:
//!
//! 1. slots of the snap, by name: permanent snippet, then one connected
//!    snippet per connected plug (ordered by plug reference)
//! 2. plugs of the snap, by name: permanent snippet, then the connected
//!    snippet for its slot
//!
//! Permanent snippets are deduplicated per security tag; connected ones
//! are not.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use confine_contracts::{
    error::{ConfineError, ConfineResult},
    interfaces::{ConnRef, PlugInfo, PlugRef, SlotInfo, SlotRef},
    security::SecuritySystem,
    snap::{validate_name, SnapInfo},
};

use crate::traits::{Interface, Snippet};

/// Snippets for one snap, keyed by security tag, in collection order.
pub type TagSnippets = BTreeMap<String, Vec<Vec<u8>>>;

/// A plug or slot that `add_snap` refused.
#[derive(Debug)]
pub struct Rejection {
    /// "plug" or "slot".
    pub side: &'static str,
    pub name: String,
    pub error: ConfineError,
}

/// Interfaces, snaps, plugs, slots, and the connections between them.
#[derive(Default)]
pub struct Repository {
    ifaces: BTreeMap<String, Arc<dyn Interface>>,
    snaps: BTreeMap<String, Arc<SnapInfo>>,
    plugs: BTreeMap<String, BTreeMap<String, PlugInfo>>,
    slots: BTreeMap<String, BTreeMap<String, SlotInfo>>,
    plug_slot: BTreeMap<PlugRef, SlotRef>,
    slot_plugs: BTreeMap<SlotRef, BTreeSet<PlugRef>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("interfaces", &self.ifaces.keys().collect::<Vec<_>>())
            .field("snaps", &self.snaps.keys().collect::<Vec<_>>())
            .field("connections", &self.plug_slot)
            .finish()
    }
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository that knows every interface in `ifaces`.
    pub fn with_interfaces<I>(ifaces: I) -> ConfineResult<Self>
    where
        I: IntoIterator<Item = Arc<dyn Interface>>,
    {
        let mut repo = Self::new();
        for iface in ifaces {
            repo.add_interface(iface)?;
        }
        Ok(repo)
    }

    // ── Interfaces ───────────────────────────────────────────────────────────

    pub fn add_interface(&mut self, iface: Arc<dyn Interface>) -> ConfineResult<()> {
        let name = iface.name();
        validate_name("interface", name)?;
        if self.ifaces.contains_key(name) {
            return Err(ConfineError::DuplicateInterface {
                name: name.to_string(),
            });
        }
        self.ifaces.insert(name.to_string(), iface);
        Ok(())
    }

    pub fn interface(&self, name: &str) -> Option<&Arc<dyn Interface>> {
        self.ifaces.get(name)
    }

    /// Names of all known interfaces, sorted.
    pub fn interfaces(&self) -> Vec<&str> {
        self.ifaces.keys().map(String::as_str).collect()
    }

    fn require_interface(&self, name: &str) -> ConfineResult<&Arc<dyn Interface>> {
        self.ifaces
            .get(name)
            .ok_or_else(|| ConfineError::UnknownInterface {
                name: name.to_string(),
            })
    }

    // ── Snaps ────────────────────────────────────────────────────────────────

    /// Register a snap with its plugs and slots.
    ///
    /// Plugs and slots that fail sanitization, or name an unknown interface,
    /// are left out and returned as rejections; the rest are added. Fails
    /// outright only if the snap is already known or its names are invalid.
    pub fn add_snap(
        &mut self,
        snap: Arc<SnapInfo>,
        plugs: Vec<PlugInfo>,
        slots: Vec<SlotInfo>,
    ) -> ConfineResult<Vec<Rejection>> {
        if self.snaps.contains_key(&snap.name) {
            return Err(ConfineError::SnapExists {
                name: snap.name.clone(),
            });
        }
        snap.validate()?;
        self.snaps.insert(snap.name.clone(), Arc::clone(&snap));

        let mut rejected = Vec::new();
        for plug in plugs {
            let name = plug.name.clone();
            if let Err(error) = self.add_plug(plug) {
                warn!(snap = %snap.name, plug = %name, error = %error, "plug rejected");
                rejected.push(Rejection {
                    side: PlugInfo::SIDE,
                    name,
                    error,
                });
            }
        }
        for slot in slots {
            let name = slot.name.clone();
            if let Err(error) = self.add_slot(slot) {
                warn!(snap = %snap.name, slot = %name, error = %error, "slot rejected");
                rejected.push(Rejection {
                    side: SlotInfo::SIDE,
                    name,
                    error,
                });
            }
        }

        debug!(
            snap = %snap.name,
            plugs = self.plugs.get(&snap.name).map_or(0, BTreeMap::len),
            slots = self.slots.get(&snap.name).map_or(0, BTreeMap::len),
            rejected = rejected.len(),
            "snap added"
        );
        Ok(rejected)
    }

    /// Forget a snap and all its plugs and slots. Fails while any of them is connected.
    pub fn remove_snap(&mut self, name: &str) -> ConfineResult<()> {
        if !self.snaps.contains_key(name) {
            return Err(ConfineError::NoSuchSnap {
                name: name.to_string(),
            });
        }
        if !self.connections(name).is_empty() {
            return Err(ConfineError::SnapConnected {
                snap: name.to_string(),
                what: "snap".to_string(),
            });
        }
        self.plugs.remove(name);
        self.slots.remove(name);
        self.snaps.remove(name);
        debug!(snap = %name, "snap removed");
        Ok(())
    }

    pub fn snap(&self, name: &str) -> Option<&Arc<SnapInfo>> {
        self.snaps.get(name)
    }

    /// Names of all known snaps, sorted.
    pub fn snaps(&self) -> Vec<&str> {
        self.snaps.keys().map(String::as_str).collect()
    }

    // ── Plugs and slots ──────────────────────────────────────────────────────

    /// Sanitize and store one plug. The owning snap must already be known.
    pub fn add_plug(&mut self, plug: PlugInfo) -> ConfineResult<()> {
        let snap = plug.snap_name().to_string();
        if !self.snaps.contains_key(&snap) {
            return Err(ConfineError::NoSuchSnap { name: snap });
        }
        plug.validate_names()?;
        plug.check_hooks()?;
        self.require_interface(&plug.interface)?.sanitize_plug(&plug)?;
        let plugs = self.plugs.entry(snap.clone()).or_default();
        if plugs.contains_key(&plug.name) {
            return Err(ConfineError::PlugExists {
                snap,
                plug: plug.name,
            });
        }
        plugs.insert(plug.name.clone(), plug);
        Ok(())
    }

    /// Sanitize and store one slot. The owning snap must already be known.
    pub fn add_slot(&mut self, slot: SlotInfo) -> ConfineResult<()> {
        let snap = slot.snap_name().to_string();
        if !self.snaps.contains_key(&snap) {
            return Err(ConfineError::NoSuchSnap { name: snap });
        }
        slot.validate_names()?;
        slot.check_hooks()?;
        self.require_interface(&slot.interface)?.sanitize_slot(&slot)?;
        let slots = self.slots.entry(snap.clone()).or_default();
        if slots.contains_key(&slot.name) {
            return Err(ConfineError::SlotExists {
                snap,
                slot: slot.name,
            });
        }
        slots.insert(slot.name.clone(), slot);
        Ok(())
    }

    pub fn remove_plug(&mut self, snap: &str, name: &str) -> ConfineResult<PlugInfo> {
        let key = PlugRef::new(snap, name);
        self.require_plug(&key)?;
        if self.plug_slot.contains_key(&key) {
            return Err(ConfineError::SnapConnected {
                snap: snap.to_string(),
                what: format!("plug {:?}", name),
            });
        }
        self.plugs
            .get_mut(snap)
            .and_then(|plugs| plugs.remove(name))
            .ok_or_else(|| ConfineError::NoSuchPlug {
                snap: snap.to_string(),
                plug: name.to_string(),
            })
    }

    pub fn remove_slot(&mut self, snap: &str, name: &str) -> ConfineResult<SlotInfo> {
        let key = SlotRef::new(snap, name);
        self.require_slot(&key)?;
        if self.slot_plugs.get(&key).is_some_and(|p| !p.is_empty()) {
            return Err(ConfineError::SnapConnected {
                snap: snap.to_string(),
                what: format!("slot {:?}", name),
            });
        }
        self.slots
            .get_mut(snap)
            .and_then(|slots| slots.remove(name))
            .ok_or_else(|| ConfineError::NoSuchSlot {
                snap: snap.to_string(),
                slot: name.to_string(),
            })
    }

    pub fn plug(&self, snap: &str, name: &str) -> Option<&PlugInfo> {
        self.plugs.get(snap).and_then(|p| p.get(name))
    }

    pub fn slot(&self, snap: &str, name: &str) -> Option<&SlotInfo> {
        self.slots.get(snap).and_then(|s| s.get(name))
    }

    /// Plugs of `snap`, sorted by name.
    pub fn plugs(&self, snap: &str) -> Vec<&PlugInfo> {
        self.plugs
            .get(snap)
            .map(|p| p.values().collect())
            .unwrap_or_default()
    }

    /// Slots of `snap`, sorted by name.
    pub fn slots(&self, snap: &str) -> Vec<&SlotInfo> {
        self.slots
            .get(snap)
            .map(|s| s.values().collect())
            .unwrap_or_default()
    }

    fn require_plug(&self, key: &PlugRef) -> ConfineResult<&PlugInfo> {
        self.plug(&key.snap, &key.name)
            .ok_or_else(|| ConfineError::NoSuchPlug {
                snap: key.snap.clone(),
                plug: key.name.clone(),
            })
    }

    fn require_slot(&self, key: &SlotRef) -> ConfineResult<&SlotInfo> {
        self.slot(&key.snap, &key.name)
            .ok_or_else(|| ConfineError::NoSuchSlot {
                snap: key.snap.clone(),
                slot: key.name.clone(),
            })
    }

    // ── Connections ──────────────────────────────────────────────────────────

    /// Connect a plug to a slot of the same interface.
    ///
    /// A plug connects to at most one slot. Repeating an existing connection
    /// is a no-op.
    pub fn connect(&mut self, conn: &ConnRef) -> ConfineResult<()> {
        let plug = self.require_plug(&conn.plug)?;
        let slot = self.require_slot(&conn.slot)?;
        if plug.interface != slot.interface {
            return Err(ConfineError::InterfaceMismatch {
                plug: conn.plug.to_string(),
                plug_interface: plug.interface.clone(),
                slot: conn.slot.to_string(),
                slot_interface: slot.interface.clone(),
            });
        }
        match self.plug_slot.get(&conn.plug) {
            Some(existing) if *existing == conn.slot => return Ok(()),
            Some(existing) => {
                return Err(ConfineError::PlugAlreadyConnected {
                    plug: conn.plug.to_string(),
                    slot: existing.to_string(),
                })
            }
            None => {}
        }

        self.plug_slot.insert(conn.plug.clone(), conn.slot.clone());
        self.slot_plugs
            .entry(conn.slot.clone())
            .or_default()
            .insert(conn.plug.clone());
        debug!(plug = %conn.plug, slot = %conn.slot, "connected");
        Ok(())
    }

    pub fn disconnect(&mut self, conn: &ConnRef) -> ConfineResult<()> {
        if self.plug_slot.get(&conn.plug) != Some(&conn.slot) {
            return Err(ConfineError::NotConnected {
                plug: conn.plug.to_string(),
                slot: conn.slot.to_string(),
            });
        }
        self.plug_slot.remove(&conn.plug);
        if let Some(plugs) = self.slot_plugs.get_mut(&conn.slot) {
            plugs.remove(&conn.plug);
            if plugs.is_empty() {
                self.slot_plugs.remove(&conn.slot);
            }
        }
        debug!(plug = %conn.plug, slot = %conn.slot, "disconnected");
        Ok(())
    }

    /// Drop every connection touching `snap`, returning what was disconnected.
    pub fn disconnect_snap(&mut self, snap: &str) -> ConfineResult<Vec<ConnRef>> {
        let conns = self.connections(snap);
        for conn in &conns {
            self.disconnect(conn)?;
        }
        Ok(conns)
    }

    /// Every connection where `snap` owns the plug or the slot, sorted.
    pub fn connections(&self, snap: &str) -> Vec<ConnRef> {
        let conns: BTreeSet<ConnRef> = self
            .plug_slot
            .iter()
            .filter(|(plug, slot)| plug.snap == snap || slot.snap == snap)
            .map(|(plug, slot)| ConnRef::new(plug.clone(), slot.clone()))
            .collect();
        conns.into_iter().collect()
    }

    /// The slot a plug is connected to, if any.
    pub fn connected_slot(&self, plug: &PlugRef) -> Option<&SlotRef> {
        self.plug_slot.get(plug)
    }

    /// Slots a plug may be connected to without being asked, sorted.
    ///
    /// Empty when the interface does not auto-connect.
    pub fn auto_connect_candidates(&self, plug: &PlugRef) -> ConfineResult<Vec<SlotRef>> {
        let plug = self.require_plug(plug)?;
        let iface = self.require_interface(&plug.interface)?;
        if !iface.auto_connect() {
            return Ok(Vec::new());
        }
        Ok(self
            .slots
            .values()
            .flat_map(BTreeMap::values)
            .filter(|slot| slot.interface == plug.interface)
            .map(SlotRef::from)
            .collect())
    }

    // ── Snippets ─────────────────────────────────────────────────────────────

    /// Collect every snippet that applies to `snap` under `system`.
    ///
    /// An unknown snap has no snippets. `SecuritySystem::Other` is rejected
    /// with `UnknownSecuritySystem`. Any interface failure aborts the whole
    /// collection.
    pub fn security_snippets_for_snap(
        &self,
        snap: &str,
        system: &SecuritySystem,
    ) -> ConfineResult<TagSnippets> {
        if !system.is_known() {
            return Err(ConfineError::UnknownSecuritySystem {
                system: system.to_string(),
            });
        }

        let mut out = TagSnippets::new();

        for slot in self.slots(snap) {
            let iface = self.require_interface(&slot.interface)?;
            let tags = slot.security_tags();

            let snippet = iface.permanent_slot_snippet(slot, system);
            add_permanent(&mut out, &tags, collected(snap, iface, system, snippet)?);

            let key = SlotRef::from(slot);
            for plug_ref in self.slot_plugs.get(&key).into_iter().flatten() {
                let plug = self.require_plug(plug_ref)?;
                let snippet = iface.connected_slot_snippet(plug, slot, system);
                add_connected(&mut out, &tags, collected(snap, iface, system, snippet)?);
            }
        }

        for plug in self.plugs(snap) {
            let iface = self.require_interface(&plug.interface)?;
            let tags = plug.security_tags();

            let snippet = iface.permanent_plug_snippet(plug, system);
            add_permanent(&mut out, &tags, collected(snap, iface, system, snippet)?);

            if let Some(slot_ref) = self.plug_slot.get(&PlugRef::from(plug)) {
                let slot = self.require_slot(slot_ref)?;
                let snippet = iface.connected_plug_snippet(plug, slot, system);
                add_connected(&mut out, &tags, collected(snap, iface, system, snippet)?);
            }
        }

        debug!(
            snap = %snap,
            system = %system,
            tags = out.len(),
            snippets = out.values().map(Vec::len).sum::<usize>(),
            "collected security snippets"
        );
        Ok(out)
    }
}

/// Map an interface result into the collection's error taxonomy.
fn collected(
    snap: &str,
    iface: &Arc<dyn Interface>,
    system: &SecuritySystem,
    result: ConfineResult<Snippet>,
) -> ConfineResult<Snippet> {
    result.map_err(|err| match err {
        ConfineError::UnknownSecuritySystem { .. } => ConfineError::InterfaceContract {
            interface: iface.name().to_string(),
            system: system.to_string(),
        },
        other => ConfineError::SnippetCollection {
            snap: snap.to_string(),
            interface: iface.name().to_string(),
            source: Box::new(other),
        },
    })
}

fn add_permanent(out: &mut TagSnippets, tags: &[String], snippet: Snippet) {
    let Some(snippet) = snippet else { return };
    for tag in tags {
        let list = out.entry(tag.clone()).or_default();
        if !list.contains(&snippet) {
            list.push(snippet.clone());
        }
    }
}

fn add_connected(out: &mut TagSnippets, tags: &[String], snippet: Snippet) {
    let Some(snippet) = snippet else { return };
    for tag in tags {
        out.entry(tag.clone()).or_default().push(snippet.clone());
    }
}
