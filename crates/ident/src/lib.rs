//! Record identifier type for the chartstore system.
//!
//! Every stored document revision carries a `_id`, and every set element a
//! `_set_id`. Both use chartstore's *canonical* identifier representation:
//! **32 lowercase hexadecimal characters** (no hyphens).
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! - Canonical form is *required* for externally supplied identifiers (for
//!   example, set ids arriving from a caller). Use [`RecordId::parse`] to
//!   validate an input string.
//! - Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are
//!   rejected.
//!
//! The type is `Ord`: identifiers order lexicographically, which the revision
//! collapse algorithm relies on for its deterministic tiebreak.

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Errors that can occur when parsing a record identifier.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// The input was not in canonical form (32 lowercase hex characters)
    #[error("identifier must be 32 lowercase hex characters, got {0:?}")]
    NotCanonical(String),
}

/// Chartstore's canonical identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained identifier is guaranteed to be in canonical
/// form. Use this wrapper whenever you are:
/// - Accepting an identifier string from *outside* the core (CLI input,
///   archive content, a caller-supplied set id), or
/// - Minting a fresh identifier for a new document revision or set element.
///
/// # Construction
/// - [`RecordId::generate`] mints a new canonical identifier.
/// - [`RecordId::parse`] validates an externally supplied identifier.
///
/// # Display format
/// Always the canonical 32-character lowercase hex form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Mints a new identifier in canonical form.
    ///
    /// Identifiers are RFC 4122 version 4 UUIDs rendered in simple form, so
    /// collisions are not a practical concern.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms (hyphenated or
    /// uppercase input is rejected); callers must provide the canonical
    /// representation.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::NotCanonical`] if the input is not exactly 32
    /// lowercase hexadecimal characters.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let canonical = input.len() == 32
            && input
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !canonical {
            return Err(IdError::NotCanonical(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the canonical identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_canonical_form() {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn generate_produces_distinct_identifiers() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }

    #[test]
    fn parse_accepts_canonical_input() {
        let id = RecordId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(id.to_string(), "550e8400e29b41d4a716446655440000");
    }

    #[test]
    fn parse_round_trips_generated_identifiers() {
        let id = RecordId::generate();
        let parsed = RecordId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_hyphenated_form() {
        assert!(RecordId::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn parse_rejects_uppercase() {
        assert!(RecordId::parse("550E8400E29B41D4A716446655440000").is_err());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(RecordId::parse("abc123").is_err());
        assert!(RecordId::parse("").is_err());
    }

    #[test]
    fn identifiers_order_lexicographically() {
        let low = RecordId::parse("00000000000000000000000000000001").unwrap();
        let high = RecordId::parse("ffffffffffffffffffffffffffffffff").unwrap();
        assert!(low < high);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let id = RecordId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
