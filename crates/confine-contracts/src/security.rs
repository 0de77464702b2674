//! Security systems and security tags.
//!
//! A security tag names one app or hook of one snap and is the unit of
//! profile generation: each tag gets exactly one profile file per system.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix of every security tag and label expression.
pub const LABEL_NAMESPACE: &str = "snap";

/// An enforcement subsystem that profile fragments are written for.
///
/// `Other` carries an identifier nobody recognizes. Interfaces answer it with
/// `ConfineError::UnknownSecuritySystem`, never with "no fragment".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecuritySystem {
    AppArmor,
    SecComp,
    DBus,
    UDev,
    Mount,
    Other(String),
}

impl SecuritySystem {
    /// The systems this crate family knows about.
    pub const KNOWN: [SecuritySystem; 5] = [
        SecuritySystem::AppArmor,
        SecuritySystem::SecComp,
        SecuritySystem::DBus,
        SecuritySystem::UDev,
        SecuritySystem::Mount,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SecuritySystem::AppArmor => "apparmor",
            SecuritySystem::SecComp => "seccomp",
            SecuritySystem::DBus => "dbus",
            SecuritySystem::UDev => "udev",
            SecuritySystem::Mount => "mount",
            SecuritySystem::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SecuritySystem::Other(_))
    }
}

impl fmt::Display for SecuritySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecuritySystem {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "apparmor" => SecuritySystem::AppArmor,
            "seccomp" => SecuritySystem::SecComp,
            "dbus" => SecuritySystem::DBus,
            "udev" => SecuritySystem::UDev,
            "mount" => SecuritySystem::Mount,
            other => SecuritySystem::Other(other.to_string()),
        })
    }
}

impl From<String> for SecuritySystem {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(system) => system,
            Err(never) => match never {},
        }
    }
}

impl From<SecuritySystem> for String {
    fn from(system: SecuritySystem) -> Self {
        system.as_str().to_string()
    }
}

/// `snap.<snap>.<app>`
pub fn app_security_tag(snap: &str, app: &str) -> String {
    format!("{LABEL_NAMESPACE}.{snap}.{app}")
}

/// `snap.<snap>.hook.<hook>`
pub fn hook_security_tag(snap: &str, hook: &str) -> String {
    format!("{LABEL_NAMESPACE}.{snap}.hook.{hook}")
}

/// Glob matching every security tag of `snap`, used to scope reconciliation.
pub fn security_tag_glob(snap: &str) -> String {
    format!("{LABEL_NAMESPACE}.{snap}.*")
}
