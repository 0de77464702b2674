//! Sanitize checks shared by the builtin interfaces.

use confine_contracts::{
    error::{ConfineError, ValidationError},
    interfaces::Attrs,
    security::SecuritySystem,
    snap::{SnapInfo, SnapType},
};

/// The endpoint must name `expected` as its interface.
pub(crate) fn interface_is(
    expected: &str,
    side: &'static str,
    name: &str,
    actual: &str,
) -> Result<(), ValidationError> {
    if actual == expected {
        return Ok(());
    }
    Err(ValidationError::WrongInterface {
        side,
        name: name.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// The owning snap must be of type `required`.
pub(crate) fn snap_type_is(
    interface: &str,
    side: &'static str,
    snap: &SnapInfo,
    required: SnapType,
) -> Result<(), ValidationError> {
    if snap.snap_type == required {
        return Ok(());
    }
    Err(ValidationError::NotOnApplication {
        interface: interface.to_string(),
        side,
        required: required.to_string(),
        found: snap.snap_type.to_string(),
    })
}

/// The endpoint must not carry any attribute.
pub(crate) fn no_attributes(
    interface: &str,
    side: &'static str,
    attrs: &Attrs,
) -> Result<(), ValidationError> {
    match attrs.keys().next() {
        None => Ok(()),
        Some(attribute) => Err(ValidationError::UnknownAttribute {
            interface: interface.to_string(),
            side,
            attribute: attribute.clone(),
        }),
    }
}

/// Error for a system identifier outside the known set.
pub(crate) fn unknown_system(system: &SecuritySystem) -> ConfineError {
    ConfineError::UnknownSecuritySystem {
        system: system.to_string(),
    }
}
