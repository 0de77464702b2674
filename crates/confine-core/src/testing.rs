//! A configurable interface for tests.
//!
//! `TestInterface` returns whatever snippets it was given, can be told to
//! reject plugs or slots, to fail one accessor, or to claim a known security
//! system is unknown. Connected snippets have `###PLUG_SECURITY_TAGS###` and
//! `###SLOT_SECURITY_TAGS###` substituted with the current label expressions.

use std::collections::BTreeMap;

use confine_contracts::{
    error::{ConfineError, ConfineResult, ValidationError},
    interfaces::{PlugInfo, SlotInfo},
    security::SecuritySystem,
};

use crate::label::{plug_app_label_expr, slot_app_label_expr};
use crate::template::{Placeholder, Substitutions};
use crate::traits::{Interface, Snippet};

/// Which accessor a configured snippet or failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnippetKind {
    PermanentPlug,
    ConnectedPlug,
    PermanentSlot,
    ConnectedSlot,
}

#[derive(Debug, Clone)]
pub struct TestInterface {
    pub name: &'static str,
    pub auto_connect: bool,
    pub snippets: BTreeMap<(SnippetKind, SecuritySystem), String>,
    pub plug_rejection: Option<ValidationError>,
    pub slot_rejection: Option<ValidationError>,
    /// Accessor that fails with a configuration error.
    pub failing: Option<SnippetKind>,
    /// Known system this interface pretends not to recognize.
    pub unrecognized: Option<SecuritySystem>,
}

impl TestInterface {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            auto_connect: false,
            snippets: BTreeMap::new(),
            plug_rejection: None,
            slot_rejection: None,
            failing: None,
            unrecognized: None,
        }
    }

    pub fn with_snippet(
        mut self,
        kind: SnippetKind,
        system: SecuritySystem,
        text: impl Into<String>,
    ) -> Self {
        self.snippets.insert((kind, system), text.into());
        self
    }

    pub fn with_auto_connect(mut self) -> Self {
        self.auto_connect = true;
        self
    }

    pub fn rejecting_plugs(mut self, error: ValidationError) -> Self {
        self.plug_rejection = Some(error);
        self
    }

    pub fn rejecting_slots(mut self, error: ValidationError) -> Self {
        self.slot_rejection = Some(error);
        self
    }

    pub fn failing(mut self, kind: SnippetKind) -> Self {
        self.failing = Some(kind);
        self
    }

    pub fn not_recognizing(mut self, system: SecuritySystem) -> Self {
        self.unrecognized = Some(system);
        self
    }

    fn snippet(
        &self,
        kind: SnippetKind,
        system: &SecuritySystem,
        subs: Substitutions,
    ) -> ConfineResult<Snippet> {
        if !system.is_known() || self.unrecognized.as_ref() == Some(system) {
            return Err(ConfineError::UnknownSecuritySystem {
                system: system.to_string(),
            });
        }
        if self.failing == Some(kind) {
            return Err(ConfineError::ConfigError {
                reason: format!("{} {:?} snippet failure", self.name, kind),
            });
        }
        Ok(self
            .snippets
            .get(&(kind, system.clone()))
            .map(|text| subs.apply(text).into_bytes()))
    }
}

fn connection_subs(plug: &PlugInfo, slot: &SlotInfo) -> Substitutions {
    Substitutions::new()
        .with(Placeholder::PlugSecurityTags, plug_app_label_expr(plug))
        .with(Placeholder::SlotSecurityTags, slot_app_label_expr(slot))
}

impl Interface for TestInterface {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sanitize_plug(&self, _plug: &PlugInfo) -> Result<(), ValidationError> {
        self.plug_rejection.clone().map_or(Ok(()), Err)
    }

    fn sanitize_slot(&self, _slot: &SlotInfo) -> Result<(), ValidationError> {
        self.slot_rejection.clone().map_or(Ok(()), Err)
    }

    fn permanent_plug_snippet(
        &self,
        _plug: &PlugInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        self.snippet(SnippetKind::PermanentPlug, system, Substitutions::new())
    }

    fn connected_plug_snippet(
        &self,
        plug: &PlugInfo,
        slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        self.snippet(SnippetKind::ConnectedPlug, system, connection_subs(plug, slot))
    }

    fn permanent_slot_snippet(
        &self,
        _slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        self.snippet(SnippetKind::PermanentSlot, system, Substitutions::new())
    }

    fn connected_slot_snippet(
        &self,
        plug: &PlugInfo,
        slot: &SlotInfo,
        system: &SecuritySystem,
    ) -> ConfineResult<Snippet> {
        self.snippet(SnippetKind::ConnectedSlot, system, connection_subs(plug, slot))
    }

    fn auto_connect(&self) -> bool {
        self.auto_connect
    }
}
