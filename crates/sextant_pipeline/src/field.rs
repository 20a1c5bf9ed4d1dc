//! Declared input and output fields.

use core::fmt;
use std::sync::Arc;

use sextant_action::Fields;
use serde_json::Value;

/// Placeholder shown instead of a sensitive value.
pub const FILTERED: &str = "[FILTERED]";

/// A field an action expects as input or exposes as output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: Arc<str>,
    sensitive: bool,
}

impl Field {
    /// Declares a field.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            sensitive: false,
        }
    }

    /// Marks the field as sensitive so its value is never displayed.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the field is sensitive.
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::new(name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Adds `field` to `fields`, replacing an earlier declaration of the same name.
pub(crate) fn declare(fields: &mut Vec<Field>, field: Field) {
    match fields.iter_mut().find(|existing| existing.name == field.name) {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
}

/// Returns a copy of `values` with every sensitive field replaced by [`FILTERED`].
///
/// Values with no declaration are kept as they are.
#[must_use]
pub fn redact(values: &Fields, declared: &[Field]) -> Fields {
    values
        .iter()
        .map(|(name, value)| {
            let hidden = declared
                .iter()
                .any(|field| field.is_sensitive() && field.name() == name);
            let value = if hidden {
                Value::String(FILTERED.to_owned())
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}
