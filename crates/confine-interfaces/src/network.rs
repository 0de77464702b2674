//! The `network` interface: outbound network access as a client.
//!
//! The slot is provided by the OS snap. Rules are granted to the plug side
//! only while it is connected.

use confine_contracts::{
    error::{ConfineResult, ValidationError},
    interfaces::{PlugInfo, SlotInfo},
    security::SecuritySystem,
    snap::SnapType,
};
use confine_core::traits::{Interface, Snippet};

use crate::checks::{interface_is, no_attributes, snap_type_is, unknown_system};

pub const NETWORK: &str = "network";

pub(crate) const CONNECTED_PLUG_APPARMOR: &str = "
# Network client access
#include <abstractions/nameservice>
#include <abstractions/ssl_certs>

@{PROC}/sys/net/core/somaxconn r,
";

pub(crate) const CONNECTED_PLUG_SECCOMP: &str = "
# Network client access
bind
connect
getpeername
getsockname
getsockopt
recv
recvfrom
recvmmsg
recvmsg
send
sendmmsg
sendmsg
sendto
setsockopt
shutdown
socket
";

#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkInterface;

impl Interface for NetworkInterface {
    fn name(&self) -> &'static str {
        NETWORK
    }

    fn sanitize_plug(&self, plug: &PlugInfo) -> Result<(), ValidationError> {
        interface_is(NETWORK, PlugInfo::SIDE, &plug.name, &plug.interface)?;
        no_attributes(NETWORK, PlugInfo::SIDE, &plug.attrs)
    }

    fn sanitize_slot(&self, slot: &SlotInfo) -> Result<(), ValidationError> {
        interface_is(NETWORK, SlotInfo::SIDE, &slot.name, &slot.interface)?;
        snap_type_is(NETWORK, SlotInfo::SIDE, &slot.snap, SnapType::Os)?;
        no_attributes(NETWORK, SlotInfo::SIDE, &slot.attrs)
    }

    fn permanent_plug_snippet(
        &self,
        _plug: &PlugInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        nothing_for(system)
    }

    fn connected_plug_snippet(
        &self,
        _plug: &PlugInfo,
        _slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        match system {
            SecuritySystem::AppArmor => Ok(Some(CONNECTED_PLUG_APPARMOR.as_bytes().to_vec())),
            SecuritySystem::SecComp => Ok(Some(CONNECTED_PLUG_SECCOMP.as_bytes().to_vec())),
            _ => nothing_for(system),
        }
    }

    fn permanent_slot_snippet(
        &self,
        _slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        nothing_for(system)
    }

    fn connected_slot_snippet(
        &self,
        _plug: &PlugInfo,
        _slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        nothing_for(system)
    }

    fn auto_connect(&self) -> bool {
        true
    }
}

fn nothing_for(system: &SecuritySystem) -> ConfineResult<Snippet> {
    if system.is_known() {
        Ok(None)
    } else {
        Err(unknown_system(system))
    }
}
