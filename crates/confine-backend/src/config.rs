//! Backend configuration schema.
//!
//! A `ConfineConfig` is deserialized from TOML. Every key is optional; what
//! is left out falls back to the built-in directory, template, and mode of
//! the system it configures.
//!
//! ```toml
//! [seccomp]
//! directory = "/var/lib/snapd/seccomp/profiles"
//!
//! [apparmor]
//! directory = "/var/lib/snapd/apparmor/profiles"
//! file_mode = 0o644
//! template = """
//! ###VAR###
//! ###PROFILEATTACH### ###FLAGS### {
//! ###SNIPPETS###
//! }
//! """
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use confine_contracts::{
    error::{ConfineError, ConfineResult},
    security::SecuritySystem,
};
use confine_core::template::{unknown_placeholders, Placeholder};

use crate::combine::{ProfileLayout, SystemProfile};
use crate::templates;

pub const DEFAULT_SECCOMP_DIR: &str = "/var/lib/snapd/seccomp/profiles";
pub const DEFAULT_APPARMOR_DIR: &str = "/var/lib/snapd/apparmor/profiles";
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Settings for the profiles of one security system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    /// Where profiles are written.
    pub directory: Option<PathBuf>,
    /// Baseline template for strict and devmode snaps.
    pub template: Option<String>,
    /// Baseline template for classic snaps.
    pub classic_template: Option<String>,
    /// Permission bits of written profiles.
    pub file_mode: Option<u32>,
}

/// Top-level configuration: one section per backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfineConfig {
    pub seccomp: SystemConfig,
    pub apparmor: SystemConfig,
}

impl ConfineConfig {
    /// Parse `s` as TOML configuration.
    ///
    /// Returns `ConfineError::ConfigError` if the TOML is malformed or has
    /// keys outside the schema.
    pub fn from_toml_str(s: &str) -> ConfineResult<Self> {
        toml::from_str(s).map_err(|e| ConfineError::ConfigError {
            reason: format!("failed to parse configuration TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> ConfineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfineError::ConfigError {
            reason: format!("failed to read configuration file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Resolve the seccomp section against the built-in defaults.
    pub fn seccomp_profile(&self) -> ConfineResult<SystemProfile> {
        resolve(
            &self.seccomp,
            SecuritySystem::SecComp,
            ProfileLayout::Append,
            DEFAULT_SECCOMP_DIR,
            templates::SECCOMP_DEFAULT,
            templates::SECCOMP_CLASSIC,
        )
    }

    /// Resolve the apparmor section against the built-in defaults.
    pub fn apparmor_profile(&self) -> ConfineResult<SystemProfile> {
        resolve(
            &self.apparmor,
            SecuritySystem::AppArmor,
            ProfileLayout::Embed,
            DEFAULT_APPARMOR_DIR,
            templates::APPARMOR_DEFAULT,
            templates::APPARMOR_CLASSIC,
        )
    }
}

fn resolve(
    section: &SystemConfig,
    system: SecuritySystem,
    layout: ProfileLayout,
    default_dir: &str,
    default_template: &str,
    default_classic: &str,
) -> ConfineResult<SystemProfile> {
    let file_mode = section.file_mode.unwrap_or(DEFAULT_FILE_MODE);
    if file_mode & !0o7777 != 0 {
        return Err(ConfineError::ConfigError {
            reason: format!("{}: file_mode {:o} is not a permission mode", system, file_mode),
        });
    }

    let profile = SystemProfile {
        system,
        directory: section
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_dir)),
        template: section
            .template
            .clone()
            .unwrap_or_else(|| default_template.to_string()),
        classic_template: section
            .classic_template
            .clone()
            .unwrap_or_else(|| default_classic.to_string()),
        file_mode,
        layout,
    };
    check_template(&profile, "template", &profile.template)?;
    check_template(&profile, "classic_template", &profile.classic_template)?;
    Ok(profile)
}

/// Reject unknown tokens, and embedded templates with nowhere to put snippets.
fn check_template(profile: &SystemProfile, key: &str, text: &str) -> ConfineResult<()> {
    let unknown = unknown_placeholders(text);
    if !unknown.is_empty() {
        return Err(ConfineError::ConfigError {
            reason: format!(
                "{}: {} uses unknown placeholders {:?}",
                profile.system, key, unknown
            ),
        });
    }
    if profile.layout == ProfileLayout::Embed && !text.contains(Placeholder::Snippets.token()) {
        return Err(ConfineError::ConfigError {
            reason: format!(
                "{}: {} has no {} placeholder",
                profile.system,
                key,
                Placeholder::Snippets.token()
            ),
        });
    }
    Ok(())
}
