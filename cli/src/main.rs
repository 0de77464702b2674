//! confinectl: generate and synchronize confinement profiles.
//!
//! Reads a TOML world description (snaps, plugs, slots, connections), runs it
//! through the builtin interfaces, and writes seccomp and apparmor profiles
//! into the directories named by the configuration.
//!
//! Usage:
//!   confinectl interfaces
//!   confinectl setup --world world.toml [--snap NAME] [--config confine.toml] [--json]
//!   confinectl remove --snap NAME [--config confine.toml] [--json]
//!   confinectl show --world world.toml --snap NAME --system seccomp

mod world;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use confine_backend::{all_backends, ConfineConfig, ProfileBackend};
use confine_contracts::{
    error::{ConfineError, ConfineResult},
    security::SecuritySystem,
    state::ChangeSet,
};
use confine_core::traits::SecurityBackend;
use confine_interfaces::builtin_registry;

use crate::world::World;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Confinement profile generator.
#[derive(Parser)]
#[command(
    name = "confinectl",
    about = "Generate and synchronize seccomp and apparmor profiles for snaps",
    long_about = "Builds the plug/slot connection graph from a world description and\n\
                  keeps each snap's seccomp and apparmor profiles in sync with it."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the builtin interfaces.
    Interfaces,
    /// Write the profiles of every snap, or of one snap.
    Setup {
        #[arg(long)]
        world: PathBuf,
        #[arg(long)]
        snap: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete every profile of a snap.
    Remove {
        #[arg(long)]
        snap: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print the profiles Setup would write for one snap and system.
    Show {
        #[arg(long)]
        world: PathBuf,
        #[arg(long)]
        snap: String,
        #[arg(long)]
        system: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Interfaces => Ok(list_interfaces()),
        Command::Setup {
            world,
            snap,
            config,
            json,
        } => setup(&world, snap.as_deref(), config.as_deref(), json),
        Command::Remove { snap, config, json } => remove(&snap, config.as_deref(), json),
        Command::Show {
            world,
            snap,
            system,
            config,
        } => show(&world, &snap, &system, config.as_deref()),
    };

    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("confinectl: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ProfileReport {
    snap: String,
    backend: &'static str,
    #[serde(flatten)]
    changes: ChangeSet,
}

#[derive(Debug, Serialize)]
struct RejectionReport {
    snap: String,
    side: &'static str,
    name: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct SetupReport {
    auto_connected: Vec<String>,
    rejected: Vec<RejectionReport>,
    profiles: Vec<ProfileReport>,
}

fn to_json<T: Serialize>(value: &T) -> ConfineResult<String> {
    serde_json::to_string_pretty(value)
        .map(|s| s + "\n")
        .map_err(|e| ConfineError::ConfigError {
            reason: format!("cannot encode report: {}", e),
        })
}

fn render_profiles(out: &mut String, profiles: &[ProfileReport]) {
    for p in profiles {
        for name in &p.changes.changed {
            out.push_str(&format!("{:<8} wrote   {}\n", p.backend, name));
        }
        for name in &p.changes.removed {
            out.push_str(&format!("{:<8} removed {}\n", p.backend, name));
        }
        if p.changes.is_empty() {
            out.push_str(&format!("{:<8} {} up to date\n", p.backend, p.snap));
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> ConfineResult<ConfineConfig> {
    match path {
        Some(path) => ConfineConfig::from_file(path),
        None => Ok(ConfineConfig::default()),
    }
}

fn list_interfaces() -> String {
    let mut out = format!("{:<12} {}\n", "NAME", "AUTO-CONNECT");
    for iface in builtin_registry().iter() {
        let auto = if iface.auto_connect() { "yes" } else { "no" };
        out.push_str(&format!("{:<12} {}\n", iface.name(), auto));
    }
    out
}

fn setup(
    world_path: &Path,
    only: Option<&str>,
    config: Option<&Path>,
    json: bool,
) -> ConfineResult<String> {
    let backends = all_backends(&load_config(config)?)?;
    let world = World::from_file(world_path, builtin_registry())?;

    let names: Vec<&str> = match only {
        Some(name) => {
            world.snap(name)?;
            vec![name]
        }
        None => world.snap_names(),
    };

    let mut profiles = Vec::new();
    for name in names {
        let (snap, confinement) = world.snap(name)?;
        for backend in &backends {
            let changes = backend.setup(snap, confinement, &world.repo)?;
            profiles.push(ProfileReport {
                snap: name.to_string(),
                backend: backend.name(),
                changes,
            });
        }
    }

    let report = SetupReport {
        auto_connected: world.auto_connected.iter().map(ToString::to_string).collect(),
        rejected: world
            .rejections
            .iter()
            .map(|(snap, r)| RejectionReport {
                snap: snap.clone(),
                side: r.side,
                name: r.name.clone(),
                error: r.error.to_string(),
            })
            .collect(),
        profiles,
    };
    if json {
        return to_json(&report);
    }

    let mut out = String::new();
    for conn in &report.auto_connected {
        out.push_str(&format!("auto-connected {}\n", conn));
    }
    for r in &report.rejected {
        out.push_str(&format!("rejected {} {}:{}: {}\n", r.side, r.snap, r.name, r.error));
    }
    render_profiles(&mut out, &report.profiles);
    Ok(out)
}

fn remove(snap: &str, config: Option<&Path>, json: bool) -> ConfineResult<String> {
    let mut profiles = Vec::new();
    for backend in all_backends(&load_config(config)?)? {
        let changes = backend.remove(snap)?;
        profiles.push(ProfileReport {
            snap: snap.to_string(),
            backend: backend.name(),
            changes,
        });
    }
    if json {
        return to_json(&profiles);
    }
    let mut out = String::new();
    render_profiles(&mut out, &profiles);
    Ok(out)
}

fn show(
    world_path: &Path,
    snap: &str,
    system: &str,
    config: Option<&Path>,
) -> ConfineResult<String> {
    let system = SecuritySystem::from(system.to_string());
    let backend: ProfileBackend = all_backends(&load_config(config)?)?
        .into_iter()
        .find(|b| b.security_system() == system)
        .ok_or_else(|| ConfineError::ConfigError {
            reason: format!("no backend writes {} profiles", system),
        })?;

    let world = World::from_file(world_path, builtin_registry())?;
    let (info, confinement) = world.snap(snap)?;
    let desired = backend.combine(info, confinement, &world.repo)?;

    let mut out = String::new();
    for (name, state) in &desired {
        out.push_str(&format!(
            "# {} mode={:o} sha256={}\n",
            backend.profile().directory.join(name).display(),
            state.mode,
            state.digest()
        ));
        out.push_str(&String::from_utf8_lossy(&state.content));
        out.push('\n');
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
