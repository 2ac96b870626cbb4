//! Declarative decoding of posted form data into typed form structs.
//!
//! Each form type publishes a static table of [`Field`]s mapping a posted key
//! to a parse function that writes into the destination. Decoding walks the
//! posted pairs against that table; there is no runtime type inspection.
//!
//! Two failure classes are kept apart:
//! - [`DecodeError::Malformed`]: the client sent something unparsable.
//! - [`DecodeError::InvalidDestination`]: the field table itself is broken.
//!   This is a programming defect and callers must not report it as the
//!   user's fault.

use std::collections::HashSet;
use std::num::ParseIntError;

use percent_encoding::percent_decode;

/// Writes a raw posted value into the destination form.
pub type ParseFn<T> = fn(&mut T, &str) -> Result<(), FieldParseError>;

/// One entry of a form's decode table.
pub struct Field<T: 'static> {
    /// Posted form key.
    pub key: &'static str,
    /// Parser storing the value into the destination field.
    pub parse: ParseFn<T>,
}

/// A form type that can be decoded from posted key/value pairs.
pub trait FormFields: Default + 'static {
    /// The decode table for this form.
    const FIELDS: &'static [Field<Self>];
}

/// A single posted value could not be parsed into its field type.
#[derive(Debug, thiserror::Error)]
pub enum FieldParseError {
    /// Value is not a valid integer.
    #[error("invalid integer {value:?}: {source}")]
    InvalidInteger {
        /// The raw posted value.
        value: String,
        /// Underlying parse failure.
        source: ParseIntError,
    },
}

/// Form decoding failure.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The posted data could not be parsed.
    #[error("malformed form data: {0}")]
    Malformed(String),

    /// The destination's field table is structurally invalid.
    #[error("invalid decode destination {form}: {reason}")]
    InvalidDestination {
        /// Rust type name of the destination.
        form: &'static str,
        /// What is wrong with the table.
        reason: String,
    },
}

impl DecodeError {
    /// Whether this error is a programming defect rather than bad input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidDestination { .. })
    }
}

/// Parse a posted integer value.
pub fn parse_int(value: &str) -> Result<i64, FieldParseError> {
    value
        .parse()
        .map_err(|source| FieldParseError::InvalidInteger {
            value: value.to_string(),
            source,
        })
}

/// Check that a form's field table can be used for decoding.
///
/// Keys must be non-empty and unique.
pub fn check_table<T: FormFields>() -> Result<(), DecodeError> {
    let form = std::any::type_name::<T>();
    let mut seen = HashSet::new();

    for field in T::FIELDS {
        if field.key.is_empty() {
            return Err(DecodeError::InvalidDestination {
                form,
                reason: "field with empty key".to_string(),
            });
        }
        if !seen.insert(field.key) {
            return Err(DecodeError::InvalidDestination {
                form,
                reason: format!("duplicate field key {:?}", field.key),
            });
        }
    }

    Ok(())
}

/// Decode key/value pairs into a fresh `T`.
///
/// Keys with no entry in the table are ignored. Empty values, and keys that
/// are never posted, leave the destination's default in place. When a key is
/// posted more than once the first value is used.
pub fn decode<T, I, K, V>(pairs: I) -> Result<T, DecodeError>
where
    T: FormFields,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    check_table::<T>()?;

    let mut dst = T::default();
    let mut assigned = HashSet::new();

    for (key, value) in pairs {
        let (key, value) = (key.as_ref(), value.as_ref());

        let Some(field) = T::FIELDS.iter().find(|f| f.key == key) else {
            continue;
        };
        if value.is_empty() || !assigned.insert(field.key) {
            continue;
        }

        (field.parse)(&mut dst, value)
            .map_err(|e| DecodeError::Malformed(format!("field {:?}: {e}", field.key)))?;
    }

    Ok(dst)
}

/// Decode an `application/x-www-form-urlencoded` body into a fresh `T`.
///
/// Decoding is strict: a `%` not followed by two hex digits, or an escape
/// sequence that does not decode to UTF-8, makes the whole body malformed.
pub fn decode_urlencoded<T: FormFields>(body: &[u8]) -> Result<T, DecodeError> {
    let pairs = parse_urlencoded(body)?;
    decode(pairs)
}

/// Split a urlencoded body into decoded key/value pairs.
fn parse_urlencoded(body: &[u8]) -> Result<Vec<(String, String)>, DecodeError> {
    body.split(|&b| b == b'&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = match segment.iter().position(|&b| b == b'=') {
                Some(i) => (&segment[..i], &segment[i + 1..]),
                None => (segment, &[][..]),
            };
            Ok((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &[u8]) -> Result<String, DecodeError> {
    if let Some(i) = invalid_escape(raw) {
        let escape = String::from_utf8_lossy(&raw[i..raw.len().min(i + 3)]);
        return Err(DecodeError::Malformed(format!(
            "invalid percent escape {escape:?}"
        )));
    }

    let plus_as_space: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    let bytes: Vec<u8> = percent_decode(&plus_as_space).collect();

    String::from_utf8(bytes)
        .map_err(|e| DecodeError::Malformed(format!("value is not valid UTF-8: {e}")))
}

/// Position of the first `%` that does not start a two-digit hex escape.
fn invalid_escape(raw: &[u8]) -> Option<usize> {
    raw.iter().enumerate().find_map(|(i, &b)| {
        let valid = b != b'%'
            || raw
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        (!valid).then_some(i)
    })
}
