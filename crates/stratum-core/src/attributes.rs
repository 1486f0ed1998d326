//! Attribute diffing against a per-element cache.

use indexmap::IndexMap;

use crate::layer::{AttributeSlot, Writer};
use crate::{Applier, NodeError, Value};

/// Attributes reflected as boolean properties rather than string attributes.
pub static BOOLEAN_ATTRIBUTES: [&str; 15] = [
    "autofocus",
    "autoplay",
    "async",
    "checked",
    "defer",
    "disabled",
    "hidden",
    "loop",
    "multiple",
    "muted",
    "nomodule",
    "open",
    "preload",
    "required",
    "selected",
];

pub fn is_boolean_attribute(name: &str) -> bool {
    BOOLEAN_ATTRIBUTES.contains(&name)
}

/// Writes `desired` onto the slot's element and removes the attributes
/// `writer` set last time but no longer wants.
pub(crate) fn apply(
    applier: &mut dyn Applier,
    slot: &mut AttributeSlot,
    writer: Writer,
    desired: &IndexMap<String, Value>,
) -> Result<(), NodeError> {
    for (name, value) in desired {
        if is_boolean_attribute(name) {
            applier.set_property(slot.element, name, value.is_truthy())?;
        } else {
            applier.set_attribute(slot.element, name, &value.to_string())?;
        }
        slot.cache.insert(name.clone(), writer);
    }

    let stale: Vec<String> = slot
        .cache
        .iter()
        .filter(|(name, owner)| **owner == writer && !desired.contains_key(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect();
    for name in stale {
        log::trace!("removing stale attribute `{name}` from node {}", slot.element);
        applier.remove_attribute(slot.element, &name)?;
        slot.cache.shift_remove(&name);
    }
    Ok(())
}

/// Removes every attribute still owned by `writer`.
pub(crate) fn release(
    applier: &mut dyn Applier,
    slot: &mut AttributeSlot,
    writer: Writer,
) -> Result<(), NodeError> {
    let owned: Vec<String> = slot
        .cache
        .iter()
        .filter(|(_, owner)| **owner == writer)
        .map(|(name, _)| name.clone())
        .collect();
    for name in owned {
        if applier.contains(slot.element) {
            applier.remove_attribute(slot.element, &name)?;
        }
        slot.cache.shift_remove(&name);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/attributes_tests.rs"]
mod tests;
