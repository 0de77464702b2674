//! Error types for the confine profile pipeline.
//!
//! All fallible operations return `ConfineResult<T>`. Sanitize failures have
//! their own enum, `ValidationError`, so callers can tell each rejection cause
//! apart; it converts into `ConfineError::Validation`.

use std::path::PathBuf;

use thiserror::Error;

/// Why a plug or slot was refused by its interface.
///
/// Every variant renders a different message. A plug or slot that produced
/// one of these is never stored in the repository and never connected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The plug or slot names a different interface than the one sanitizing it.
    #[error("{side} {name:?} uses interface {actual:?}, not {expected:?}")]
    WrongInterface {
        side: &'static str,
        name: String,
        expected: String,
        actual: String,
    },

    /// The owning snap is not of the kind the interface requires.
    #[error("'{interface}' {side} must be on {required} snap, found {found} snap")]
    NotOnApplication {
        interface: String,
        side: &'static str,
        required: String,
        found: String,
    },

    /// The plug or slot is not exposed through any application.
    #[error("'{interface}' {side} {name:?} must be bound to at least one application")]
    NoApps {
        interface: String,
        side: &'static str,
        name: String,
    },

    /// A bound application is not declared by the owning snap.
    #[error("{side} {name:?} is bound to unknown application {app:?}")]
    UnknownApp {
        side: &'static str,
        name: String,
        app: String,
    },

    /// A bound hook is not declared by the owning snap.
    #[error("{side} {name:?} is bound to unknown hook {hook:?}")]
    UnknownHook {
        side: &'static str,
        name: String,
        hook: String,
    },

    /// A bound application lacks the desktop file the interface requires.
    #[error("application '{app}' does not have a required desktop file for interface '{interface}' (expected {})", .path.display())]
    MissingDesktopFile {
        app: String,
        interface: String,
        path: PathBuf,
    },

    /// A bound application is a background service, which the interface forbids.
    #[error("application '{app}' is a daemon, which isn't allowed to have a '{interface}' interface")]
    DaemonNotAllowed { app: String, interface: String },

    /// The plug or slot carries an attribute the interface does not understand.
    #[error("unknown attribute '{attribute}' on '{interface}' {side}")]
    UnknownAttribute {
        interface: String,
        side: &'static str,
        attribute: String,
    },

    /// A snap, app, plug, slot, or interface name is malformed.
    #[error("invalid {kind} name: {name:?}")]
    InvalidName { kind: &'static str, name: String },
}

/// The unified error type for the confine crates.
#[derive(Debug, Error)]
pub enum ConfineError {
    /// A plug or slot failed sanitization.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The security system identifier is not one this system knows.
    ///
    /// Distinct from "recognized but nothing to contribute", which is `Ok(None)`.
    #[error("unknown security system {system:?}")]
    UnknownSecuritySystem { system: String },

    /// An interface rejected a security system the repository recognizes.
    #[error("interface {interface:?} does not recognize security system {system:?}")]
    InterfaceContract { interface: String, system: String },

    /// An interface failed while snippets were collected for a snap.
    #[error("cannot collect {interface:?} snippets for snap {snap:?}: {source}")]
    SnippetCollection {
        snap: String,
        interface: String,
        #[source]
        source: Box<ConfineError>,
    },

    /// A filesystem operation failed during reconciliation.
    #[error("cannot reconcile {}: {source}", .path.display())]
    Reconciliation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The reconciliation glob could not be compiled or is not a bare file pattern.
    #[error("invalid glob {glob:?}: {reason}")]
    InvalidGlob { glob: String, reason: String },

    /// A desired file name does not fall within the reconciliation glob.
    #[error("file {name:?} does not match glob {glob:?}")]
    FileOutsideGlob { name: String, glob: String },

    #[error("unknown interface {name:?}")]
    UnknownInterface { name: String },

    #[error("cannot add interface {name:?}: name already in use")]
    DuplicateInterface { name: String },

    #[error("snap {name:?} is already known")]
    SnapExists { name: String },

    #[error("no such snap {name:?}")]
    NoSuchSnap { name: String },

    #[error("snap {snap:?} has no plug named {plug:?}")]
    NoSuchPlug { snap: String, plug: String },

    #[error("snap {snap:?} has no slot named {slot:?}")]
    NoSuchSlot { snap: String, slot: String },

    #[error("snap {snap:?} already has a plug named {plug:?}")]
    PlugExists { snap: String, plug: String },

    #[error("snap {snap:?} already has a slot named {slot:?}")]
    SlotExists { snap: String, slot: String },

    #[error("cannot connect plug {plug} (interface {plug_interface:?}) to slot {slot} (interface {slot_interface:?})")]
    InterfaceMismatch {
        plug: String,
        plug_interface: String,
        slot: String,
        slot_interface: String,
    },

    #[error("plug {plug} is already connected to slot {slot}")]
    PlugAlreadyConnected { plug: String, slot: String },

    #[error("plug {plug} is not connected to slot {slot}")]
    NotConnected { plug: String, slot: String },

    #[error("cannot remove {what} of snap {snap:?}: it is still connected")]
    SnapConnected { snap: String, what: String },

    /// A backend Setup or Remove failed; carries the snap and the operation.
    #[error("cannot {operation} {backend} profiles for snap {snap:?}: {source}")]
    Backend {
        operation: &'static str,
        backend: String,
        snap: String,
        #[source]
        source: Box<ConfineError>,
    },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the confine crates.
pub type ConfineResult<T> = Result<T, ConfineError>;
