//! # confine-interfaces
//!
//! The builtin capability interfaces and the registry that lists them.
//!
//! | Interface | Plug side                        | Slot side                    |
//! |-----------|----------------------------------|------------------------------|
//! | `network` | client networking when connected | OS snap, nothing extra       |
//! | `unity8`  | shell D-Bus access per app       | Mir access, plug peer label  |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confine_interfaces::builtin_registry;
//!
//! let mut repo = builtin_registry().repository()?;
//! repo.add_snap(snap, plugs, slots)?;
//! ```

mod checks;
pub mod network;
pub mod registry;
pub mod unity8;

pub use network::NetworkInterface;
pub use registry::{all_interfaces, builtin_registry, Registry};
pub use unity8::Unity8Interface;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use tempfile::TempDir;

    use confine_contracts::{
        error::ConfineError,
        interfaces::{ConnRef, PlugInfo, PlugRef, SlotInfo, SlotRef},
        security::SecuritySystem,
        snap::{AppInfo, HookInfo, SnapInfo, SnapType},
    };
    use confine_core::template::unknown_placeholders;

    use super::*;

    // ── Registry ──────────────────────────────────────────────────────────────

    #[test]
    fn builtin_names_are_unique() {
        let names = builtin_registry().names();
        let unique: BTreeSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(Registry::new(all_interfaces()).is_ok());
    }

    #[test]
    fn builtin_registry_is_shared() {
        assert!(std::ptr::eq(builtin_registry(), builtin_registry()));
        assert_eq!(builtin_registry().names(), vec!["network", "unity8"]);
        assert_eq!(builtin_registry().get("unity8").unwrap().name(), "unity8");
        assert!(builtin_registry().get("camera").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let ifaces: Vec<Arc<dyn confine_core::Interface>> =
            vec![Arc::new(Unity8Interface), Arc::new(Unity8Interface)];
        assert!(matches!(
            Registry::new(ifaces),
            Err(ConfineError::DuplicateInterface { name }) if name == "unity8"
        ));
    }

    #[test]
    fn every_template_uses_known_tokens() {
        for text in [
            unity8::CONNECTED_PLUG_APPARMOR,
            unity8::CONNECTED_PLUG_PEER_APPARMOR,
            unity8::PERMANENT_SLOT_APPARMOR,
            unity8::CONNECTED_SLOT_APPARMOR,
            unity8::DBUS_SECCOMP,
            network::CONNECTED_PLUG_APPARMOR,
            network::CONNECTED_PLUG_SECCOMP,
        ] {
            assert!(unknown_placeholders(text).is_empty(), "unknown token in {text}");
        }
    }

    // ── Through the repository ────────────────────────────────────────────────

    fn install_desktop_files(root: &Path, snap: &str, rev: &str, apps: &[&str]) {
        let gui = root.join(snap).join(rev).join("meta").join("gui");
        fs::create_dir_all(&gui).unwrap();
        for app in apps {
            fs::write(gui.join(format!("{app}.desktop")), "").unwrap();
        }
    }

    #[test]
    fn unity8_connection_reaches_both_sides() {
        let tmp = TempDir::new().unwrap();
        install_desktop_files(tmp.path(), "notes", "3", &["notes", "sync"]);
        let notes = Arc::new(
            SnapInfo::new("notes")
                .with_revision(3)
                .with_mount_root(tmp.path())
                .with_app(AppInfo::new("notes"))
                .with_app(AppInfo::daemon("sync", "simple"))
                .with_hook(HookInfo::new("configure")),
        );
        let shell = Arc::new(SnapInfo::new("shell").with_app(AppInfo::new("unity8")));

        let mut repo = builtin_registry().repository().unwrap();
        let rejected = repo
            .add_snap(
                Arc::clone(&notes),
                vec![
                    PlugInfo::new(&notes, "unity8", "unity8").with_apps(["notes"]),
                    PlugInfo::new(&notes, "daemon-gui", "unity8").with_apps(["sync"]),
                ],
                vec![],
            )
            .unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].name, "daemon-gui");

        repo.add_snap(
            Arc::clone(&shell),
            vec![],
            vec![SlotInfo::new(&shell, "unity8", "unity8").with_all_apps()],
        )
        .unwrap();
        repo.connect(&ConnRef::new(
            PlugRef::new("notes", "unity8"),
            SlotRef::new("shell", "unity8"),
        ))
        .unwrap();

        let plug_side = repo
            .security_snippets_for_snap("notes", &SecuritySystem::AppArmor)
            .unwrap();
        assert_eq!(plug_side.keys().collect::<Vec<_>>(), vec!["snap.notes.notes"]);
        let text = String::from_utf8(plug_side["snap.notes.notes"].concat()).unwrap();
        assert!(text.contains("path=/notes_95notes_95_51\n"));
        // The shell declares a single app, so its exact tag is used.
        assert!(text.contains("peer=(label=snap.shell.unity8),"));

        let slot_side = repo
            .security_snippets_for_snap("shell", &SecuritySystem::AppArmor)
            .unwrap();
        let chunks = &slot_side["snap.shell.unity8"];
        assert_eq!(chunks.len(), 2, "permanent then connected");
        assert!(String::from_utf8_lossy(&chunks[0]).contains("mir_socket"));
        // One of two notes apps is bound.
        assert!(String::from_utf8_lossy(&chunks[1]).contains("peer=(label=snap.notes.notes),"));
    }

    #[test]
    fn network_auto_connect_candidate_is_the_os_slot() {
        let core = Arc::new(SnapInfo::new("core").with_type(SnapType::Os));
        let browser = Arc::new(SnapInfo::new("browser").with_app(AppInfo::new("browser")));

        let mut repo = builtin_registry().repository().unwrap();
        repo.add_snap(
            Arc::clone(&core),
            vec![],
            vec![SlotInfo::new(&core, "network", "network")],
        )
        .unwrap();
        repo.add_snap(
            Arc::clone(&browser),
            vec![PlugInfo::new(&browser, "network", "network").with_all_apps()],
            vec![],
        )
        .unwrap();

        let candidates = repo
            .auto_connect_candidates(&PlugRef::new("browser", "network"))
            .unwrap();
        assert_eq!(candidates, vec![SlotRef::new("core", "network")]);

        assert!(repo
            .security_snippets_for_snap("browser", &SecuritySystem::SecComp)
            .unwrap()
            .is_empty());
        repo.connect(&ConnRef::new(
            PlugRef::new("browser", "network"),
            candidates[0].clone(),
        ))
        .unwrap();
        let snippets = repo
            .security_snippets_for_snap("browser", &SecuritySystem::SecComp)
            .unwrap();
        assert_eq!(snippets["snap.browser.browser"].len(), 1);
    }
}
