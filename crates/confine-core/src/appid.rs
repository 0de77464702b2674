//! Application identifiers safe to embed in D-Bus object paths.
//!
//! The identifier is `<snap>_<app>_<revision>` with every byte that is not an
//! ASCII letter escaped as `_` followed by its decimal value, zero-padded to
//! two digits. The result only contains `[A-Za-z0-9_]`.
//!
//! Bytes are scanned, not characters: a multi-byte UTF-8 character becomes
//! one escape per byte (three digits each, since every such byte is >= 128).

use std::fmt::Write;

use confine_contracts::snap::Revision;

/// Separator placed between the snap name, app name, and revision.
pub const APP_ID_SEPARATOR: &str = "_";

/// Derive the D-Bus-safe application identifier.
pub fn dbus_app_id(snap: &str, app: &str, revision: Revision) -> String {
    let joined = [snap, app, &revision.to_string()].join(APP_ID_SEPARATOR);
    let mut out = String::with_capacity(joined.len() * 3);
    for b in joined.bytes() {
        if b.is_ascii_alphabetic() {
            out.push(char::from(b));
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "_{:02}", b);
        }
    }
    out
}
