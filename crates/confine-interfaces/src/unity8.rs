//! The `unity8` interface: graphical apps talking to the Unity 8 shell.
//!
//! A `unity8` plug may only be bound to foreground applications of an `app`
//! snap, and each of them must ship `meta/gui/<app>.desktop`. A connection
//! grants the plug side session-bus access to the shell services, with every
//! application-specific path keyed by that app's D-Bus identifier, and grants
//! the slot side session-bus traffic with exactly the plug's bound apps.

use confine_contracts::{
    error::{ConfineResult, ValidationError},
    interfaces::{PlugInfo, SlotInfo},
    security::SecuritySystem,
    snap::SnapType,
};
use confine_core::{
    appid::dbus_app_id,
    label::{plug_app_label_expr, slot_app_label_expr},
    template::{Placeholder, Substitutions},
    traits::{Interface, Snippet},
};

use crate::checks::{interface_is, no_attributes, snap_type_is, unknown_system};

pub const UNITY8: &str = "unity8";

/// AppArmor rules for one plug-side app. `###APP_ID_DBUS###` is replaced per app.
pub(crate) const CONNECTED_PLUG_APPARMOR: &str = r#"
  #include <abstractions/base>
  #include <abstractions/fonts>
  #include <abstractions/X>

  # LP: #1350152
  #include <abstractions/openssl>

  # Mir
  #include <abstractions/mir>
  owner /{,var/}run/user/*/mir_socket rw,

  #include "/usr/share/apparmor/hardware/graphics.d"

  # Session and system bus
  #include <abstractions/dbus-session-strict>
  #include <abstractions/dbus-strict>

  # Shell bottom bar
  dbus (send)
       bus=session
       path="/BottomBarVisibilityCommunicator"
       interface="org.freedesktop.DBus.{Introspectable,Properties}"
       peer=(name=com.canonical.Shell.BottomBarVisibilityCommunicator,label=unconfined),
  dbus (receive)
       bus=session
       path="/BottomBarVisibilityCommunicator"
       interface="com.canonical.Shell.BottomBarVisibilityCommunicator"
       peer=(label=unconfined),

  # On-screen keyboard
  dbus (send)
       bus=session
       path="/org/maliit/server/address"
       interface="org.freedesktop.DBus.Properties"
       member=Get
       peer=(name=org.maliit.server,label=unconfined),
  unix (connect, receive, send)
       type=stream
       peer=(addr="@/tmp/maliit-server/dbus-*"),

  # Clipboard, LP: #1371170
  dbus (receive, send)
       bus=session
       path="/com/canonical/QtMir/Clipboard"
       interface="com.canonical.QtMir.Clipboard"
       peer=(label=unconfined),
  dbus (receive, send)
       bus=session
       path="/com/canonical/QtMir/Clipboard"
       interface="org.freedesktop.DBus.{Introspectable,Properties}"
       peer=(label=unconfined),

  # Haptics
  dbus (send)
       bus=session
       path=/com/canonical/usensord/haptic
       interface=com.canonical.usensord.haptic
       peer=(label=unconfined),

  # URL dispatcher
  dbus (send)
       bus=session
       path="/com/canonical/URLDispatcher"
       interface="com.canonical.URLDispatcher"
       member="DispatchURL"
       peer=(label=unconfined),

  # Opening a URL in an already running instance
  dbus (receive)
       bus=session
       path=/###APP_ID_DBUS###
       interface="org.freedesktop.Application"
       member="Open"
       peer=(label=unconfined),

  # Launcher counters
  dbus (receive, send)
       bus=session
       path=/com/canonical/unity/launcher/###APP_ID_DBUS###
       peer=(label=unconfined),

  # Mir socket of trusted prompt sessions, LP: #1462492
  dbus (receive, send)
       path=/com/canonical/UbuntuAppLaunch/###APP_ID_DBUS###/*
       interface="com.canonical.UbuntuAppLaunch.SocketDemangler"
       member="GetMirSocket"
       bus=session
       peer=(label=unconfined),
  /usr/lib/@{multiarch}/ubuntu-app-launch/socket-demangler rmix,

  # Accessibility
  dbus (send)
       bus=session
       peer=(name=org.a11y.Bus,label=unconfined),
  dbus (receive)
       bus=session
       interface=org.a11y.atspi**
       peer=(label=unconfined),
  dbus (receive, send)
       bus=accessibility
       peer=(label=unconfined),

  # Dangerous services
  deny dbus bus=session
            path=/com/canonical/[Uu]nity/[Dd]ebug**,
  audit deny dbus bus=session
                  interface="com.canonical.snapdecisions",
  deny dbus (send)
       bus=session
       interface="org.gnome.GConf.Server",
  # LP: #1433590
  deny dbus bus=system
            path="/org/freedesktop/Accounts",
  # LP: #1378823
  deny dbus (bind)
       name="org.freedesktop.Application",

  # Paste board
  dbus (receive, send)
       bus=session
       interface="com.ubuntu.content.dbus.Service"
       path="/"
       member="{CreatePaste,GetPasteData,GetLatestPasteData,PasteFormats}"
       peer=(label=unconfined),
  dbus (receive)
       bus=session
       interface="com.ubuntu.content.dbus.Service"
       path="/"
       member="PasteFormatsChanged"
       peer=(label=unconfined),
"#;

/// AppArmor rule letting the plug side talk to the shell processes of the slot.
pub(crate) const CONNECTED_PLUG_PEER_APPARMOR: &str = r#"
  # Shell processes behind the connected slot
  dbus (receive, send)
       bus=session
       peer=(label=###SLOT_SECURITY_TAGS###),
"#;

pub(crate) const PERMANENT_SLOT_APPARMOR: &str = r#"
  # Mir
  #include <abstractions/mir>
  owner /{,var/}run/user/*/mir_socket rw,
"#;

pub(crate) const CONNECTED_SLOT_APPARMOR: &str = r#"
  dbus (receive, send)
       bus=session
       peer=(label=###PLUG_SECURITY_TAGS###),
"#;

/// Syscalls needed to speak D-Bus.
pub(crate) const DBUS_SECCOMP: &str = "
# dbus
connect
getsockname
recvmsg
send
sendto
sendmsg
socket
";

#[derive(Debug, Clone, Copy, Default)]
pub struct Unity8Interface;

impl Unity8Interface {
    fn connected_plug_apparmor(&self, plug: &PlugInfo, slot: &SlotInfo) -> ConfineResult<Vec<u8>> {
        let snap = &plug.snap;
        let mut out = String::new();
        for app in plug.app_infos()? {
            let app_id = dbus_app_id(&snap.name, &app.name, snap.revision);
            out.push_str(
                &Substitutions::new()
                    .with(Placeholder::AppIdDbus, app_id)
                    .apply(CONNECTED_PLUG_APPARMOR),
            );
        }
        out.push_str(
            &Substitutions::new()
                .with(Placeholder::SlotSecurityTags, slot_app_label_expr(slot))
                .apply(CONNECTED_PLUG_PEER_APPARMOR),
        );
        Ok(out.into_bytes())
    }
}

impl Interface for Unity8Interface {
    fn name(&self) -> &'static str {
        UNITY8
    }

    fn sanitize_plug(&self, plug: &PlugInfo) -> Result<(), ValidationError> {
        interface_is(UNITY8, PlugInfo::SIDE, &plug.name, &plug.interface)?;
        snap_type_is(UNITY8, PlugInfo::SIDE, &plug.snap, SnapType::App)?;
        if plug.apps.is_empty() {
            return Err(ValidationError::NoApps {
                interface: UNITY8.to_string(),
                side: PlugInfo::SIDE,
                name: plug.name.clone(),
            });
        }

        let mount_dir = plug.snap.mount_dir();
        for app in plug.app_infos()? {
            let desktop = mount_dir
                .join("meta")
                .join("gui")
                .join(format!("{}.desktop", app.name));
            if !desktop.exists() {
                return Err(ValidationError::MissingDesktopFile {
                    app: app.name.clone(),
                    interface: UNITY8.to_string(),
                    path: desktop,
                });
            }
            if app.is_daemon() {
                return Err(ValidationError::DaemonNotAllowed {
                    app: app.name.clone(),
                    interface: UNITY8.to_string(),
                });
            }
        }

        no_attributes(UNITY8, PlugInfo::SIDE, &plug.attrs)
    }

    fn sanitize_slot(&self, slot: &SlotInfo) -> Result<(), ValidationError> {
        interface_is(UNITY8, SlotInfo::SIDE, &slot.name, &slot.interface)?;
        snap_type_is(UNITY8, SlotInfo::SIDE, &slot.snap, SnapType::App)?;
        no_attributes(UNITY8, SlotInfo::SIDE, &slot.attrs)
    }

    fn permanent_plug_snippet(
        &self,
        _plug: &PlugInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        match system {
            SecuritySystem::Other(_) => Err(unknown_system(system)),
            _ => Ok(None),
        }
    }

    fn connected_plug_snippet(
        &self,
        plug: &PlugInfo,
        slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        match system {
            SecuritySystem::AppArmor => Ok(Some(self.connected_plug_apparmor(plug, slot)?)),
            SecuritySystem::SecComp => Ok(Some(DBUS_SECCOMP.as_bytes().to_vec())),
            SecuritySystem::DBus | SecuritySystem::UDev | SecuritySystem::Mount => Ok(None),
            SecuritySystem::Other(_) => Err(unknown_system(system)),
        }
    }

    fn permanent_slot_snippet(
        &self,
        _slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        match system {
            SecuritySystem::AppArmor => Ok(Some(PERMANENT_SLOT_APPARMOR.as_bytes().to_vec())),
            SecuritySystem::SecComp => Ok(Some(DBUS_SECCOMP.as_bytes().to_vec())),
            SecuritySystem::DBus | SecuritySystem::UDev | SecuritySystem::Mount => Ok(None),
            SecuritySystem::Other(_) => Err(unknown_system(system)),
        }
    }

    fn connected_slot_snippet(
        &self,
        plug: &PlugInfo,
        _slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        match system {
            SecuritySystem::AppArmor => Ok(Some(
                Substitutions::new()
                    .with(Placeholder::PlugSecurityTags, plug_app_label_expr(plug))
                    .apply(CONNECTED_SLOT_APPARMOR)
                    .into_bytes(),
            )),
            SecuritySystem::SecComp
            | SecuritySystem::DBus
            | SecuritySystem::UDev
            | SecuritySystem::Mount => Ok(None),
            SecuritySystem::Other(_) => Err(unknown_system(system)),
        }
    }

    fn auto_connect(&self) -> bool {
        true
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
