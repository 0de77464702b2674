//! # confine-core
//!
//! The capability-interface model behind confine profile generation.
//!
//! This crate provides:
//! - The `Interface` and `SecurityBackend` traits
//! - Peer label expressions and D-Bus application identifiers
//! - Placeholder substitution for policy templates
//! - The `Repository` of snaps, plugs, slots, and connections
//!
//! ## Usage
//!
//! ```rust,ignore
//! use confine_core::{Repository, traits::Interface};
//!
//! let mut repo = Repository::with_interfaces(registry.iter().cloned())?;
//! repo.add_snap(snap, plugs, slots)?;
//! let snippets = repo.security_snippets_for_snap("gallery", &SecuritySystem::SecComp)?;
//! ```

pub mod appid;
pub mod label;
pub mod repository;
pub mod template;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use repository::{Repository, TagSnippets};
pub use traits::{Interface, SecurityBackend, Snippet};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confine_contracts::{
        error::{ConfineError, ValidationError},
        interfaces::{ConnRef, PlugInfo, PlugRef, SlotInfo, SlotRef},
        security::SecuritySystem,
        snap::{AppInfo, HookInfo, SnapInfo},
    };

    use crate::testing::{SnippetKind, TestInterface};
    use crate::{Interface, Repository};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn consumer() -> Arc<SnapInfo> {
        Arc::new(
            SnapInfo::new("consumer")
                .with_app(AppInfo::new("app1"))
                .with_app(AppInfo::new("app2"))
                .with_app(AppInfo::new("app3"))
                .with_hook(HookInfo::new("configure")),
        )
    }

    fn producer() -> Arc<SnapInfo> {
        Arc::new(SnapInfo::new("producer").with_app(AppInfo::new("server")))
    }

    fn repo_with(iface: TestInterface) -> Repository {
        let iface: Arc<dyn Interface> = Arc::new(iface);
        Repository::with_interfaces([iface]).unwrap()
    }

    /// consumer:plug (bound to `apps`) and producer:slot, both on "test".
    fn populate(repo: &mut Repository, apps: &[&str]) {
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "test").with_apps(apps.iter().copied());
        let rejected = repo.add_snap(consumer, vec![plug], vec![]).unwrap();
        assert!(rejected.is_empty());

        let producer = producer();
        let slot = SlotInfo::new(&producer, "slot", "test").with_all_apps();
        let rejected = repo.add_snap(producer, vec![], vec![slot]).unwrap();
        assert!(rejected.is_empty());
    }

    fn conn() -> ConnRef {
        ConnRef::new(PlugRef::new("consumer", "plug"), SlotRef::new("producer", "slot"))
    }

    fn text(snippets: &[Vec<u8>]) -> Vec<String> {
        snippets
            .iter()
            .map(|s| String::from_utf8(s.clone()).unwrap())
            .collect()
    }

    // ── Interfaces ────────────────────────────────────────────────────────────

    #[test]
    fn duplicate_interface_is_rejected() {
        let mut repo = repo_with(TestInterface::new("test"));
        match repo.add_interface(Arc::new(TestInterface::new("test"))) {
            Err(ConfineError::DuplicateInterface { name }) => assert_eq!(name, "test"),
            other => panic!("expected DuplicateInterface, got {:?}", other),
        }
        assert_eq!(repo.interfaces(), vec!["test"]);
    }

    #[test]
    fn invalid_interface_name_is_rejected() {
        let mut repo = Repository::new();
        let err = repo
            .add_interface(Arc::new(TestInterface::new("Bad_Name")))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfineError::Validation(ValidationError::InvalidName { kind: "interface", .. })
        ));
    }

    // ── Sanitize gating ───────────────────────────────────────────────────────

    #[test]
    fn sanitize_failure_keeps_plug_out_of_repository() {
        let mut repo = repo_with(TestInterface::new("test").rejecting_plugs(
            ValidationError::NoApps {
                interface: "test".into(),
                side: "plug",
                name: "plug".into(),
            },
        ));
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "test");
        let rejected = repo.add_snap(consumer, vec![plug], vec![]).unwrap();

        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].side, "plug");
        assert!(matches!(
            rejected[0].error,
            ConfineError::Validation(ValidationError::NoApps { .. })
        ));
        assert!(repo.plug("consumer", "plug").is_none());
        assert!(repo.snap("consumer").is_some());
    }

    #[test]
    fn rejected_plug_cannot_be_connected() {
        let mut repo = repo_with(TestInterface::new("test").rejecting_plugs(
            ValidationError::DaemonNotAllowed {
                app: "app1".into(),
                interface: "test".into(),
            },
        ));
        populate_allowing_rejections(&mut repo);
        assert!(matches!(
            repo.connect(&conn()),
            Err(ConfineError::NoSuchPlug { .. })
        ));
    }

    fn populate_allowing_rejections(repo: &mut Repository) {
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "test").with_all_apps();
        repo.add_snap(consumer, vec![plug], vec![]).unwrap();
        let producer = producer();
        let slot = SlotInfo::new(&producer, "slot", "test").with_all_apps();
        repo.add_snap(producer, vec![], vec![slot]).unwrap();
    }

    #[test]
    fn unknown_interface_is_a_rejection() {
        let mut repo = Repository::new();
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "missing");
        let rejected = repo.add_snap(consumer, vec![plug], vec![]).unwrap();
        assert!(matches!(
            rejected[0].error,
            ConfineError::UnknownInterface { .. }
        ));
    }

    #[test]
    fn adding_snap_twice_fails() {
        let mut repo = repo_with(TestInterface::new("test"));
        repo.add_snap(consumer(), vec![], vec![]).unwrap();
        assert!(matches!(
            repo.add_snap(consumer(), vec![], vec![]),
            Err(ConfineError::SnapExists { .. })
        ));
    }

    // ── Connections ───────────────────────────────────────────────────────────

    #[test]
    fn connect_and_disconnect() {
        let mut repo = repo_with(TestInterface::new("test"));
        populate(&mut repo, &["app1"]);

        repo.connect(&conn()).unwrap();
        // Repeating the same connection is a no-op.
        repo.connect(&conn()).unwrap();
        assert_eq!(repo.connections("consumer"), vec![conn()]);
        assert_eq!(repo.connections("producer"), vec![conn()]);

        repo.disconnect(&conn()).unwrap();
        assert!(repo.connections("consumer").is_empty());
        assert!(matches!(
            repo.disconnect(&conn()),
            Err(ConfineError::NotConnected { .. })
        ));
    }

    #[test]
    fn plug_connects_to_at_most_one_slot() {
        let mut repo = repo_with(TestInterface::new("test"));
        populate(&mut repo, &["app1"]);
        let other = Arc::new(SnapInfo::new("other").with_app(AppInfo::new("srv")));
        let slot = SlotInfo::new(&other, "slot", "test").with_all_apps();
        repo.add_snap(other, vec![], vec![slot]).unwrap();

        repo.connect(&conn()).unwrap();
        let second = ConnRef::new(PlugRef::new("consumer", "plug"), SlotRef::new("other", "slot"));
        match repo.connect(&second) {
            Err(ConfineError::PlugAlreadyConnected { slot, .. }) => {
                assert_eq!(slot, "producer:slot")
            }
            other => panic!("expected PlugAlreadyConnected, got {:?}", other),
        }
    }

    #[test]
    fn connect_requires_matching_interfaces() {
        let mut repo = repo_with(TestInterface::new("test"));
        repo.add_interface(Arc::new(TestInterface::new("other"))).unwrap();
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "test").with_all_apps();
        repo.add_snap(consumer, vec![plug], vec![]).unwrap();
        let producer = producer();
        let slot = SlotInfo::new(&producer, "slot", "other").with_all_apps();
        repo.add_snap(producer, vec![], vec![slot]).unwrap();

        assert!(matches!(
            repo.connect(&conn()),
            Err(ConfineError::InterfaceMismatch { .. })
        ));
    }

    #[test]
    fn connected_snap_cannot_be_removed() {
        let mut repo = repo_with(TestInterface::new("test"));
        populate(&mut repo, &["app1"]);
        repo.connect(&conn()).unwrap();

        assert!(matches!(
            repo.remove_snap("producer"),
            Err(ConfineError::SnapConnected { .. })
        ));
        assert!(matches!(
            repo.remove_plug("consumer", "plug"),
            Err(ConfineError::SnapConnected { .. })
        ));

        assert_eq!(repo.disconnect_snap("producer").unwrap(), vec![conn()]);
        repo.remove_snap("producer").unwrap();
        assert!(repo.snap("producer").is_none());
        assert!(repo.slots("producer").is_empty());
    }

    #[test]
    fn auto_connect_candidates_follow_interface_flag() {
        let mut repo = repo_with(TestInterface::new("test").with_auto_connect());
        repo.add_interface(Arc::new(TestInterface::new("manual"))).unwrap();
        populate(&mut repo, &["app1"]);

        let plug = PlugRef::new("consumer", "plug");
        assert_eq!(
            repo.auto_connect_candidates(&plug).unwrap(),
            vec![SlotRef::new("producer", "slot")]
        );

        let snap = Arc::new(SnapInfo::new("quiet").with_app(AppInfo::new("a")));
        let manual = PlugInfo::new(&snap, "p", "manual").with_all_apps();
        let slot = SlotInfo::new(&snap, "s", "manual").with_all_apps();
        repo.add_snap(snap, vec![manual], vec![slot]).unwrap();
        assert!(repo
            .auto_connect_candidates(&PlugRef::new("quiet", "p"))
            .unwrap()
            .is_empty());
    }

    // ── Snippet collection ────────────────────────────────────────────────────

    #[test]
    fn snippets_are_keyed_by_bound_tags_in_collection_order() {
        let iface = TestInterface::new("test")
            .with_snippet(SnippetKind::PermanentPlug, SecuritySystem::SecComp, "perm-plug")
            .with_snippet(SnippetKind::ConnectedPlug, SecuritySystem::SecComp, "conn-plug")
            .with_snippet(SnippetKind::PermanentSlot, SecuritySystem::SecComp, "perm-slot")
            .with_snippet(SnippetKind::ConnectedSlot, SecuritySystem::SecComp, "conn-slot");
        let mut repo = repo_with(iface);
        populate(&mut repo, &["app1", "app2"]);
        repo.connect(&conn()).unwrap();

        let consumer = repo
            .security_snippets_for_snap("consumer", &SecuritySystem::SecComp)
            .unwrap();
        assert_eq!(
            consumer.keys().collect::<Vec<_>>(),
            vec!["snap.consumer.app1", "snap.consumer.app2"]
        );
        assert_eq!(
            text(&consumer["snap.consumer.app1"]),
            vec!["perm-plug", "conn-plug"]
        );

        let producer = repo
            .security_snippets_for_snap("producer", &SecuritySystem::SecComp)
            .unwrap();
        assert_eq!(
            text(&producer["snap.producer.server"]),
            vec!["perm-slot", "conn-slot"]
        );
    }

    #[test]
    fn hooks_bound_to_plug_receive_snippets() {
        let iface = TestInterface::new("test").with_snippet(
            SnippetKind::PermanentPlug,
            SecuritySystem::AppArmor,
            "hook-rule",
        );
        let mut repo = repo_with(iface);
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "test").with_hooks(["configure"]);
        repo.add_snap(consumer, vec![plug], vec![]).unwrap();

        let snippets = repo
            .security_snippets_for_snap("consumer", &SecuritySystem::AppArmor)
            .unwrap();
        assert_eq!(
            text(&snippets["snap.consumer.hook.configure"]),
            vec!["hook-rule"]
        );
    }

    #[test]
    fn plug_bound_to_undeclared_hook_is_rejected() {
        let mut repo = repo_with(TestInterface::new("test").with_snippet(
            SnippetKind::PermanentPlug,
            SecuritySystem::AppArmor,
            "hook-rule",
        ));
        let consumer = consumer();
        let plug = PlugInfo::new(&consumer, "plug", "test").with_hooks(["install"]);
        let rejected = repo.add_snap(consumer, vec![plug], vec![]).unwrap();

        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            rejected[0].error,
            ConfineError::Validation(ValidationError::UnknownHook { ref hook, .. }) if hook == "install"
        ));
        assert!(repo.plug("consumer", "plug").is_none());
        assert!(repo
            .security_snippets_for_snap("consumer", &SecuritySystem::AppArmor)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn identical_permanent_snippets_are_deduplicated_per_tag() {
        let iface = TestInterface::new("test").with_snippet(
            SnippetKind::PermanentPlug,
            SecuritySystem::SecComp,
            "same",
        );
        let mut repo = repo_with(iface);
        let consumer = consumer();
        let first = PlugInfo::new(&consumer, "first", "test").with_apps(["app1"]);
        let second = PlugInfo::new(&consumer, "second", "test").with_apps(["app1", "app2"]);
        repo.add_snap(consumer, vec![first, second], vec![]).unwrap();

        let snippets = repo
            .security_snippets_for_snap("consumer", &SecuritySystem::SecComp)
            .unwrap();
        assert_eq!(text(&snippets["snap.consumer.app1"]), vec!["same"]);
        assert_eq!(text(&snippets["snap.consumer.app2"]), vec!["same"]);
    }

    #[test]
    fn unused_system_yields_no_snippets() {
        let iface = TestInterface::new("test").with_snippet(
            SnippetKind::PermanentPlug,
            SecuritySystem::SecComp,
            "x",
        );
        let mut repo = repo_with(iface);
        populate(&mut repo, &["app1"]);
        let snippets = repo
            .security_snippets_for_snap("consumer", &SecuritySystem::UDev)
            .unwrap();
        assert!(snippets.is_empty());
        assert!(repo
            .security_snippets_for_snap("nobody", &SecuritySystem::SecComp)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_system_is_rejected_up_front() {
        let repo = repo_with(TestInterface::new("test"));
        match repo.security_snippets_for_snap("consumer", &SecuritySystem::Other("foo".into())) {
            Err(ConfineError::UnknownSecuritySystem { system }) => assert_eq!(system, "foo"),
            other => panic!("expected UnknownSecuritySystem, got {:?}", other),
        }
    }

    #[test]
    fn interface_rejecting_known_system_is_a_contract_violation() {
        let mut repo =
            repo_with(TestInterface::new("test").not_recognizing(SecuritySystem::SecComp));
        populate(&mut repo, &["app1"]);
        match repo.security_snippets_for_snap("consumer", &SecuritySystem::SecComp) {
            Err(ConfineError::InterfaceContract { interface, system }) => {
                assert_eq!(interface, "test");
                assert_eq!(system, "seccomp");
            }
            other => panic!("expected InterfaceContract, got {:?}", other),
        }
    }

    #[test]
    fn interface_failure_aborts_collection() {
        let iface = TestInterface::new("test")
            .with_snippet(SnippetKind::PermanentPlug, SecuritySystem::SecComp, "ok")
            .failing(SnippetKind::ConnectedPlug);
        let mut repo = repo_with(iface);
        populate(&mut repo, &["app1"]);
        repo.connect(&conn()).unwrap();

        match repo.security_snippets_for_snap("consumer", &SecuritySystem::SecComp) {
            Err(ConfineError::SnippetCollection { snap, interface, .. }) => {
                assert_eq!(snap, "consumer");
                assert_eq!(interface, "test");
            }
            other => panic!("expected SnippetCollection, got {:?}", other),
        }
    }

    /// The slot's connected snippet names exactly the plug apps bound now.
    #[test]
    fn labels_track_current_plug_binding() {
        let iface = TestInterface::new("test").with_snippet(
            SnippetKind::ConnectedSlot,
            SecuritySystem::AppArmor,
            "peer=(label=\"###PLUG_SECURITY_TAGS###\"),",
        );
        let mut repo = repo_with(iface);
        populate(&mut repo, &["app1", "app3"]);
        repo.connect(&conn()).unwrap();

        let snippets = repo
            .security_snippets_for_snap("producer", &SecuritySystem::AppArmor)
            .unwrap();
        assert_eq!(
            text(&snippets["snap.producer.server"]),
            vec!["peer=(label=\"snap.consumer.{app1,app3}\"),"]
        );

        // Rebind the plug to every app; the next collection widens the label.
        repo.disconnect(&conn()).unwrap();
        repo.remove_plug("consumer", "plug").unwrap();
        let consumer = Arc::clone(repo.snap("consumer").unwrap());
        repo.add_plug(PlugInfo::new(&consumer, "plug", "test").with_all_apps())
            .unwrap();
        repo.connect(&conn()).unwrap();

        let snippets = repo
            .security_snippets_for_snap("producer", &SecuritySystem::AppArmor)
            .unwrap();
        assert_eq!(
            text(&snippets["snap.producer.server"]),
            vec!["peer=(label=\"snap.consumer.*\"),"]
        );
    }
}
