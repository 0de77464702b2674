//! Plugs, slots, and connections between them.
//!
//! A plug consumes a capability and a slot provides it. Both belong to one
//! snap, name one interface, are exposed through an ordered list of apps and
//! hooks, and carry string-keyed attributes that the interface validates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfineError, ValidationError};
use crate::snap::{validate_name, AppInfo, SnapInfo};

/// Attribute values as declared in the manifest.
pub type Attrs = BTreeMap<String, serde_json::Value>;

macro_rules! endpoint_info {
    ($(#[$meta:meta])* $ty:ident, $side:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $ty {
            /// The snap this endpoint belongs to.
            pub snap: Arc<SnapInfo>,
            pub name: String,
            /// Name of the interface this endpoint speaks.
            pub interface: String,
            pub attrs: Attrs,
            /// Apps this endpoint is exposed through, in the snap's declared order.
            pub apps: Vec<String>,
            /// Hooks this endpoint is exposed through, in the snap's declared order.
            pub hooks: Vec<String>,
        }

        impl $ty {
            /// Which end of a connection this type is ("plug" or "slot").
            pub const SIDE: &'static str = $side;

            /// Create an endpoint bound to no apps or hooks.
            pub fn new(
                snap: &Arc<SnapInfo>,
                name: impl Into<String>,
                interface: impl Into<String>,
            ) -> Self {
                Self {
                    snap: Arc::clone(snap),
                    name: name.into(),
                    interface: interface.into(),
                    attrs: Attrs::new(),
                    apps: Vec::new(),
                    hooks: Vec::new(),
                }
            }

            /// Bind to the named apps. Order follows the snap's declarations,
            /// not the order given here.
            pub fn with_apps<I, S>(mut self, apps: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let wanted: Vec<String> = apps.into_iter().map(Into::into).collect();
                let mut ordered: Vec<String> = self
                    .snap
                    .apps
                    .iter()
                    .filter(|a| wanted.contains(&a.name))
                    .map(|a| a.name.clone())
                    .collect();
                // Names the snap does not declare are kept so sanitize can reject them.
                for name in wanted {
                    if !ordered.contains(&name) {
                        ordered.push(name);
                    }
                }
                self.apps = ordered;
                self
            }

            /// Bind to every app the snap declares.
            pub fn with_all_apps(mut self) -> Self {
                self.apps = self.snap.apps.iter().map(|a| a.name.clone()).collect();
                self
            }

            /// Bind to the named hooks, in the snap's declared order.
            pub fn with_hooks<I, S>(mut self, hooks: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let wanted: Vec<String> = hooks.into_iter().map(Into::into).collect();
                let mut ordered: Vec<String> = self
                    .snap
                    .hooks
                    .iter()
                    .filter(|h| wanted.contains(&h.name))
                    .map(|h| h.name.clone())
                    .collect();
                for name in wanted {
                    if !ordered.contains(&name) {
                        ordered.push(name);
                    }
                }
                self.hooks = ordered;
                self
            }

            pub fn with_attr(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
                self.attrs.insert(key.into(), value);
                self
            }

            pub fn snap_name(&self) -> &str {
                &self.snap.name
            }

            /// Resolve the bound apps against the snap, in order.
            ///
            /// Fails with `ValidationError::UnknownApp` for a name the snap
            /// does not declare.
            pub fn app_infos(&self) -> Result<Vec<&AppInfo>, ValidationError> {
                self.apps
                    .iter()
                    .map(|name| {
                        self.snap.app(name).ok_or_else(|| ValidationError::UnknownApp {
                            side: Self::SIDE,
                            name: self.name.clone(),
                            app: name.clone(),
                        })
                    })
                    .collect()
            }

            /// Fails with `ValidationError::UnknownHook` if a bound hook is
            /// not declared by the snap.
            pub fn check_hooks(&self) -> Result<(), ValidationError> {
                match self.hooks.iter().find(|h| self.snap.hook(h).is_none()) {
                    Some(hook) => Err(ValidationError::UnknownHook {
                        side: Self::SIDE,
                        name: self.name.clone(),
                        hook: hook.clone(),
                    }),
                    None => Ok(()),
                }
            }

            /// Security tags of every bound app and hook.
            pub fn security_tags(&self) -> Vec<String> {
                self.apps
                    .iter()
                    .map(|a| crate::security::app_security_tag(&self.snap.name, a))
                    .chain(
                        self.hooks
                            .iter()
                            .map(|h| crate::security::hook_security_tag(&self.snap.name, h)),
                    )
                    .collect()
            }

            /// Check the endpoint and interface names.
            pub fn validate_names(&self) -> Result<(), ValidationError> {
                validate_name(Self::SIDE, &self.name)?;
                validate_name("interface", &self.interface)
            }
        }
    };
}

endpoint_info!(
    /// The consuming end of a capability grant.
    PlugInfo,
    "plug"
);

endpoint_info!(
    /// The providing end of a capability grant.
    SlotInfo,
    "slot"
);

macro_rules! endpoint_ref {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $ty {
            pub snap: String,
            pub name: String,
        }

        impl $ty {
            pub fn new(snap: impl Into<String>, name: impl Into<String>) -> Self {
                Self {
                    snap: snap.into(),
                    name: name.into(),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.snap, self.name)
            }
        }

        impl FromStr for $ty {
            type Err = ConfineError;

            /// Parse `snap:name`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.split_once(':') {
                    Some((snap, name)) if !snap.is_empty() && !name.is_empty() => {
                        Ok(Self::new(snap, name))
                    }
                    _ => Err(ConfineError::ConfigError {
                        reason: format!("expected <snap>:<name>, got {:?}", s),
                    }),
                }
            }
        }
    };
}

endpoint_ref!(
    /// Identifies a plug by snap and plug name.
    PlugRef
);

endpoint_ref!(
    /// Identifies a slot by snap and slot name.
    SlotRef
);

impl From<&PlugInfo> for PlugRef {
    fn from(plug: &PlugInfo) -> Self {
        PlugRef::new(plug.snap.name.clone(), plug.name.clone())
    }
}

impl From<&SlotInfo> for SlotRef {
    fn from(slot: &SlotInfo) -> Self {
        SlotRef::new(slot.snap.name.clone(), slot.name.clone())
    }
}

/// A live binding between one plug and one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnRef {
    pub plug: PlugRef,
    pub slot: SlotRef,
}

impl ConnRef {
    pub fn new(plug: PlugRef, slot: SlotRef) -> Self {
        Self { plug, slot }
    }
}

impl fmt::Display for ConnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.plug, self.slot)
    }
}
