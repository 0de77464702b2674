//! The process-wide catalog of builtin interfaces.
//!
//! The catalog is an explicit list. `builtin_registry()` builds it on first
//! use and shares it read-only for the rest of the process.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use confine_contracts::error::{ConfineError, ConfineResult};
use confine_core::{traits::Interface, Repository};

use crate::network::NetworkInterface;
use crate::unity8::Unity8Interface;

/// Every builtin interface, in catalog order.
pub fn all_interfaces() -> Vec<Arc<dyn Interface>> {
    vec![Arc::new(NetworkInterface), Arc::new(Unity8Interface)]
}

/// An enumerable set of interfaces with unique names.
pub struct Registry {
    interfaces: Vec<Arc<dyn Interface>>,
}

impl Registry {
    /// Build a registry, rejecting duplicate names.
    pub fn new(interfaces: Vec<Arc<dyn Interface>>) -> ConfineResult<Self> {
        for (i, iface) in interfaces.iter().enumerate() {
            if interfaces[..i].iter().any(|seen| seen.name() == iface.name()) {
                return Err(ConfineError::DuplicateInterface {
                    name: iface.name().to_string(),
                });
            }
        }
        Ok(Self { interfaces })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Interface>> {
        self.interfaces.iter().find(|iface| iface.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Interface>> {
        self.interfaces.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interfaces.iter().map(|iface| iface.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// An empty repository that knows every interface in this registry.
    pub fn repository(&self) -> ConfineResult<Repository> {
        Repository::with_interfaces(self.interfaces.iter().cloned())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("interfaces", &self.names())
            .finish()
    }
}

static BUILTIN: OnceLock<Registry> = OnceLock::new();

/// The builtin interfaces, populated once per process.
pub fn builtin_registry() -> &'static Registry {
    // Builtin names are distinct; see the `builtin_names_are_unique` test.
    BUILTIN.get_or_init(|| {
        let registry = Registry {
            interfaces: all_interfaces(),
        };
        debug!(interfaces = ?registry.names(), "builtin interface registry populated");
        registry
    })
}
