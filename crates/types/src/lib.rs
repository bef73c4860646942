//! Validated string types shared across the chartstore crates.
//!
//! Document types and collection names appear in storage paths and archive
//! member names, so both are validated once at the boundary and then carried
//! as wrapper types that guarantee the invariant for the rest of the system.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The input text contained a character that is not allowed
    #[error("text contains forbidden character {0:?}")]
    ForbiddenCharacter(char),
}

/// Characters that must never appear in a document type or collection name.
///
/// Both values become path components (filesystem storage and archive member
/// names), so separators, parent references, and control characters are
/// rejected outright.
const FORBIDDEN_CHARACTERS: &[char] = &['/', '\\', '.', '\n', '\r', '\t', '\0'];

fn validate_token(input: &str) -> Result<&str, TypeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TypeError::Empty);
    }
    if let Some(forbidden) = trimmed
        .chars()
        .find(|c| FORBIDDEN_CHARACTERS.contains(c) || c.is_whitespace())
    {
        return Err(TypeError::ForbiddenCharacter(forbidden));
    }
    Ok(trimmed)
}

/// A document's logical kind discriminator (the `_type` envelope value).
///
/// Guaranteed non-empty and safe to use as a single path component.
/// Examples from the record modules: `valuesInventory`, `assessment`,
/// `sentinel`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentType(String);

impl DocumentType {
    /// Creates a new `DocumentType` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::Empty` if the trimmed input is empty, or
    /// `TypeError::ForbiddenCharacter` if it contains whitespace or a
    /// path-hostile character.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypeError> {
        Ok(Self(validate_token(input.as_ref())?.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The name of one logical collection (one patient or provider record-set).
///
/// Guaranteed non-empty and safe to use as a single path component, both on
/// the filesystem and as the directory component of an archive member path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionName(String);

impl CollectionName {
    /// Creates a new `CollectionName` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::Empty` if the trimmed input is empty, or
    /// `TypeError::ForbiddenCharacter` if it contains whitespace or a
    /// path-hostile character.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypeError> {
        Ok(Self(validate_token(input.as_ref())?.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_wrapper_impls {
    ($name:ident) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_wrapper_impls!(DocumentType);
string_wrapper_impls!(CollectionName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_case_document_type() {
        let document_type = DocumentType::new("valuesInventory").unwrap();
        assert_eq!(document_type.as_str(), "valuesInventory");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let document_type = DocumentType::new("  assessment  ").unwrap();
        assert_eq!(document_type.as_str(), "assessment");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(DocumentType::new("   "), Err(TypeError::Empty)));
        assert!(matches!(CollectionName::new(""), Err(TypeError::Empty)));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(matches!(
            DocumentType::new("a/b"),
            Err(TypeError::ForbiddenCharacter('/'))
        ));
        assert!(matches!(
            CollectionName::new("..\\escape"),
            Err(TypeError::ForbiddenCharacter('.'))
        ));
    }

    #[test]
    fn rejects_interior_whitespace() {
        assert!(matches!(
            CollectionName::new("patient one"),
            Err(TypeError::ForbiddenCharacter(' '))
        ));
    }

    #[test]
    fn serde_round_trip() {
        let name = CollectionName::new("patients").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"patients\"");
        let back: CollectionName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn deserialising_invalid_name_fails() {
        let result: Result<DocumentType, _> = serde_json::from_str("\"a/b\"");
        assert!(result.is_err());
    }
}
