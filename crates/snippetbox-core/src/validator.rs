//! Field-level validation for submitted forms.
//!
//! A [`Validator`] is embedded in each form type and accumulates at most one
//! message per field key. The free functions are the predicates handlers feed
//! into [`Validator::check_field`].

use std::collections::HashMap;

/// Accumulates field errors for a single form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    field_errors: HashMap<String, String>,
}

impl Validator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field errors have been recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// True when at least one field error has been recorded.
    pub fn invalid(&self) -> bool {
        !self.valid()
    }

    /// Record `message` under `key` unless the key already holds a message.
    ///
    /// The first message for a key wins; later writes are ignored.
    pub fn add_field_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(key.into())
            .or_insert_with(|| message.into());
    }

    /// Record `message` under `key` only if `ok` is false.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    /// The message recorded for `key`, if any.
    pub fn field_error(&self, key: &str) -> Option<&str> {
        self.field_errors.get(key).map(String::as_str)
    }

    /// All recorded field errors keyed by field name.
    pub fn field_errors(&self) -> &HashMap<String, String> {
        &self.field_errors
    }
}

/// True iff `value` is non-empty after trimming surrounding whitespace.
pub fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True iff `value` holds at most `max` characters.
///
/// Counts Unicode scalar values, not bytes.
pub fn max_chars(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// True iff `value` equals one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}
