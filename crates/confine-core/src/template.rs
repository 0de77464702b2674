//! Placeholder substitution for policy templates.
//!
//! Templates mark substitution points with `###NAME###` tokens. The token
//! vocabulary is closed: every token a template may contain is a
//! `Placeholder` variant, and `placeholders_in` lets tests check templates
//! against it.

use std::collections::BTreeSet;

/// Token delimiter on both sides of a placeholder name.
const DELIM: &str = "###";

/// Every placeholder token a template may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Placeholder {
    /// The D-Bus-safe identifier of one bound app; substituted once per app.
    AppIdDbus,
    /// Label expression of the connected plug's apps.
    PlugSecurityTags,
    /// Label expression of the connected slot's apps.
    SlotSecurityTags,
    /// The `profile "<tag>"` header of an apparmor profile.
    ProfileAttach,
    /// Profile flags, which carry `complain` in devmode.
    Flags,
    /// Variable definitions at the top of an apparmor profile.
    Vars,
    /// Where collected snippets are spliced into an apparmor profile.
    Snippets,
}

impl Placeholder {
    pub const ALL: [Placeholder; 7] = [
        Placeholder::AppIdDbus,
        Placeholder::PlugSecurityTags,
        Placeholder::SlotSecurityTags,
        Placeholder::ProfileAttach,
        Placeholder::Flags,
        Placeholder::Vars,
        Placeholder::Snippets,
    ];

    /// The literal token, including delimiters.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::AppIdDbus => "###APP_ID_DBUS###",
            Placeholder::PlugSecurityTags => "###PLUG_SECURITY_TAGS###",
            Placeholder::SlotSecurityTags => "###SLOT_SECURITY_TAGS###",
            Placeholder::ProfileAttach => "###PROFILEATTACH###",
            Placeholder::Flags => "###FLAGS###",
            Placeholder::Vars => "###VAR###",
            Placeholder::Snippets => "###SNIPPETS###",
        }
    }

    pub fn from_token(token: &str) -> Option<Placeholder> {
        Placeholder::ALL.into_iter().find(|p| p.token() == token)
    }
}

/// An ordered list of (placeholder, replacement) pairs.
///
/// `apply` replaces every occurrence of each token, in insertion order.
/// Replacement values are not rescanned for tokens of earlier pairs.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    pairs: Vec<(Placeholder, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.pairs.push((placeholder, value.into()));
        self
    }

    pub fn apply(&self, template: &str) -> String {
        self.pairs
            .iter()
            .fold(template.to_string(), |text, (placeholder, value)| {
                text.replace(placeholder.token(), value)
            })
    }
}

/// Every `###NAME###` token in `text`, recognized or not.
///
/// A token name is a non-empty run of uppercase ASCII letters and underscores.
pub fn placeholders_in(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut rest = text;
    while let Some(start) = rest.find(DELIM) {
        let after = &rest[start + DELIM.len()..];
        let name_len = after
            .bytes()
            .take_while(|b| b.is_ascii_uppercase() || *b == b'_')
            .count();
        if name_len > 0 && after[name_len..].starts_with(DELIM) {
            found.insert(format!("{DELIM}{}{DELIM}", &after[..name_len]));
            rest = &after[name_len + DELIM.len()..];
        } else {
            rest = after;
        }
    }
    found
}

/// Tokens in `text` that are not part of the `Placeholder` vocabulary.
pub fn unknown_placeholders(text: &str) -> BTreeSet<String> {
    placeholders_in(text)
        .into_iter()
        .filter(|t| Placeholder::from_token(t).is_none())
        .collect()
}
