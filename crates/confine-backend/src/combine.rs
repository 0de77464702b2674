//! Combining collected snippets into one profile per security tag.
//!
//! Combination is pure: it turns a snap, its confinement, and the snippets
//! the repository collected into a `DesiredState` with exactly one entry per
//! app and hook of the snap. Tags outside the snap are ignored.
//!
//! Two layouts exist:
//!
//! - `Append`: `@complain` line in devmode, then the template, then each
//!   snippet followed by a newline. Used for seccomp.
//! - `Embed`: the template is a profile block; variables, the attach line,
//!   the flags, and the newline-terminated snippets are substituted into its
//!   placeholders. Used for apparmor.

use std::path::PathBuf;

use confine_contracts::{
    security::SecuritySystem,
    snap::{ConfinementType, SnapInfo},
    state::{DesiredState, FileState},
};
use confine_core::{
    template::{Placeholder, Substitutions},
    TagSnippets,
};

/// Directive that makes the seccomp launcher log violations instead of failing.
pub const COMPLAIN_PROLOGUE: &str = "@complain\n";

const FLAGS_ENFORCE: &str = "(attach_disconnected)";
const FLAGS_COMPLAIN: &str = "(attach_disconnected,complain)";

/// How snippets and template are put together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileLayout {
    Append,
    Embed,
}

/// Everything needed to produce and place the profiles of one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProfile {
    pub system: SecuritySystem,
    pub directory: PathBuf,
    pub template: String,
    pub classic_template: String,
    pub file_mode: u32,
    pub layout: ProfileLayout,
}

impl SystemProfile {
    pub fn template_for(&self, confinement: ConfinementType) -> &str {
        match confinement {
            ConfinementType::Classic => &self.classic_template,
            ConfinementType::Strict | ConfinementType::Devmode => &self.template,
        }
    }
}

/// Build the desired profile files of `snap`.
pub fn combine(
    snap: &SnapInfo,
    confinement: ConfinementType,
    snippets: &TagSnippets,
    profile: &SystemProfile,
) -> DesiredState {
    let none = Vec::new();
    snap.security_tags()
        .into_iter()
        .map(|tag| {
            let tag_snippets = snippets.get(&tag).unwrap_or(&none);
            let content = match profile.layout {
                ProfileLayout::Append => append(confinement, profile, tag_snippets),
                ProfileLayout::Embed => embed(snap, &tag, confinement, profile, tag_snippets),
            };
            (tag, FileState::new(content, profile.file_mode))
        })
        .collect()
}

fn append(
    confinement: ConfinementType,
    profile: &SystemProfile,
    snippets: &[Vec<u8>],
) -> Vec<u8> {
    let mut out = Vec::new();
    if confinement == ConfinementType::Devmode {
        out.extend_from_slice(COMPLAIN_PROLOGUE.as_bytes());
    }
    out.extend_from_slice(profile.template_for(confinement).as_bytes());
    for snippet in snippets {
        out.extend_from_slice(snippet);
        out.push(b'\n');
    }
    out
}

fn embed(
    snap: &SnapInfo,
    tag: &str,
    confinement: ConfinementType,
    profile: &SystemProfile,
    snippets: &[Vec<u8>],
) -> Vec<u8> {
    let flags = match confinement {
        ConfinementType::Devmode => FLAGS_COMPLAIN,
        ConfinementType::Strict | ConfinementType::Classic => FLAGS_ENFORCE,
    };
    let text = Substitutions::new()
        .with(Placeholder::Vars, template_vars(snap))
        .with(Placeholder::ProfileAttach, format!("profile \"{}\"", tag))
        .with(Placeholder::Flags, flags)
        .apply(profile.template_for(confinement));

    // Snippet bytes are spliced in verbatim, never decoded or rescanned.
    let mut body = Vec::new();
    for snippet in snippets {
        body.extend_from_slice(snippet);
        body.push(b'\n');
    }
    let mut parts = text.split(Placeholder::Snippets.token());
    let mut out = parts.next().unwrap_or_default().as_bytes().to_vec();
    for part in parts {
        out.extend_from_slice(&body);
        out.extend_from_slice(part.as_bytes());
    }
    out
}

/// AppArmor variable definitions describing the snap.
fn template_vars(snap: &SnapInfo) -> String {
    format!(
        "@{{SNAP_NAME}}=\"{}\"\n@{{SNAP_REVISION}}=\"{}\"\n@{{INSTALL_DIR}}=\"{}\"",
        snap.name,
        snap.revision,
        snap.mount_root.display()
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use confine_contracts::snap::{AppInfo, HookInfo};

    use super::*;

    fn snap() -> SnapInfo {
        SnapInfo::new("gallery")
            .with_revision(7)
            .with_app(AppInfo::new("viewer"))
            .with_app(AppInfo::new("editor"))
            .with_hook(HookInfo::new("configure"))
    }

    fn profile(layout: ProfileLayout, template: &str) -> SystemProfile {
        SystemProfile {
            system: SecuritySystem::SecComp,
            directory: PathBuf::from("/nonexistent"),
            template: template.to_string(),
            classic_template: "CLASSIC\n".to_string(),
            file_mode: 0o640,
            layout,
        }
    }

    fn snippets(entries: &[(&str, &[&str])]) -> TagSnippets {
        entries
            .iter()
            .map(|(tag, list)| {
                (
                    tag.to_string(),
                    list.iter().map(|s| s.as_bytes().to_vec()).collect(),
                )
            })
            .collect()
    }

    fn text(state: &DesiredState, tag: &str) -> String {
        String::from_utf8(state[tag].content.clone()).unwrap()
    }

    // ── Append ────────────────────────────────────────────────────────────────

    #[test]
    fn one_file_per_app_and_hook() {
        let state = combine(
            &snap(),
            ConfinementType::Strict,
            &TagSnippets::new(),
            &profile(ProfileLayout::Append, "T\n"),
        );
        assert_eq!(
            state.keys().collect::<Vec<_>>(),
            vec!["snap.gallery.editor", "snap.gallery.hook.configure", "snap.gallery.viewer"]
        );
        assert!(state.values().all(|f| f.content == b"T\n" && f.mode == 0o640));
    }

    #[test]
    fn snippets_follow_template_in_collection_order() {
        let collected = snippets(&[("snap.gallery.viewer", &["b", "a"][..])]);
        let state = combine(
            &snap(),
            ConfinementType::Strict,
            &collected,
            &profile(ProfileLayout::Append, "T\n"),
        );
        assert_eq!(text(&state, "snap.gallery.viewer"), "T\nb\na\n");
        assert_eq!(text(&state, "snap.gallery.editor"), "T\n");
    }

    #[test]
    fn devmode_starts_with_complain() {
        let collected = snippets(&[("snap.gallery.viewer", &["x"][..])]);
        let p = profile(ProfileLayout::Append, "T\n");
        let strict = combine(&snap(), ConfinementType::Strict, &collected, &p);
        let devmode = combine(&snap(), ConfinementType::Devmode, &collected, &p);

        let strict = text(&strict, "snap.gallery.viewer");
        let devmode = text(&devmode, "snap.gallery.viewer");
        assert!(devmode.starts_with("@complain\n"));
        assert!(!strict.contains("@complain"));
        assert_eq!(devmode.strip_prefix(COMPLAIN_PROLOGUE), Some(strict.as_str()));
    }

    #[test]
    fn classic_uses_classic_template() {
        let state = combine(
            &snap(),
            ConfinementType::Classic,
            &snippets(&[("snap.gallery.viewer", &["x"][..])]),
            &profile(ProfileLayout::Append, "T\n"),
        );
        assert_eq!(text(&state, "snap.gallery.viewer"), "CLASSIC\nx\n");
    }

    #[test]
    fn foreign_tags_are_ignored() {
        let state = combine(
            &snap(),
            ConfinementType::Strict,
            &snippets(&[("snap.other.app", &["x"][..])]),
            &profile(ProfileLayout::Append, "T\n"),
        );
        assert!(!state.contains_key("snap.other.app"));
        assert_eq!(state.len(), 3);
    }

    // ── Embed ─────────────────────────────────────────────────────────────────

    const EMBED: &str = "###VAR###\n###PROFILEATTACH### ###FLAGS### {\n###SNIPPETS###}\n";

    #[test]
    fn embed_fills_every_profile_token() {
        let state = combine(
            &snap(),
            ConfinementType::Strict,
            &snippets(&[("snap.gallery.viewer", &["  rule1,", "  rule2,"][..])]),
            &profile(ProfileLayout::Embed, EMBED),
        );
        assert_eq!(
            text(&state, "snap.gallery.viewer"),
            "@{SNAP_NAME}=\"gallery\"\n\
             @{SNAP_REVISION}=\"7\"\n\
             @{INSTALL_DIR}=\"/snap\"\n\
             profile \"snap.gallery.viewer\" (attach_disconnected) {\n  rule1,\n  rule2,\n}\n"
        );
    }

    #[test]
    fn embed_devmode_sets_complain_flag() {
        let state = combine(
            &snap(),
            ConfinementType::Devmode,
            &TagSnippets::new(),
            &profile(ProfileLayout::Embed, EMBED),
        );
        let hook = text(&state, "snap.gallery.hook.configure");
        assert!(hook.contains("profile \"snap.gallery.hook.configure\" (attach_disconnected,complain) {"));
        assert!(!hook.starts_with("@complain"));
    }

    #[test]
    fn snippet_text_is_not_rescanned() {
        let state = combine(
            &snap(),
            ConfinementType::Strict,
            &snippets(&[("snap.gallery.viewer", &["###FLAGS###"][..])]),
            &profile(ProfileLayout::Embed, EMBED),
        );
        assert!(text(&state, "snap.gallery.viewer").contains("{\n###FLAGS###\n}"));
    }

    #[test]
    fn embed_keeps_snippet_bytes_verbatim() {
        let mut collected = TagSnippets::new();
        collected.insert(
            "snap.gallery.viewer".to_string(),
            vec![b"  /opt/\xff\xfe r,".to_vec()],
        );
        let state = combine(
            &snap(),
            ConfinementType::Strict,
            &collected,
            &profile(ProfileLayout::Embed, "a {\n###SNIPPETS###}\nb {\n###SNIPPETS###}\n"),
        );
        assert_eq!(
            state["snap.gallery.viewer"].content,
            b"a {\n  /opt/\xff\xfe r,\n}\nb {\n  /opt/\xff\xfe r,\n}\n".to_vec()
        );
    }
}
