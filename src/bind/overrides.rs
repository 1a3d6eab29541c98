//! Manual mapping overrides.
//!
//! An override file is a JSON object from template role to profile field
//! path:
//!
//! ```json
//! {
//!   "contact.title": "experience[0].role",
//!   "experience[].dates": "education[].dates"
//! }
//! ```
//!
//! An open index (`[]`) on the field path takes the placeholder's group.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{FieldPath, Role};

/// Role-to-field overrides consulted before the default role match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingOverrides {
    entries: BTreeMap<Role, FieldPath>,
}

impl MappingOverrides {
    /// Create an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from JSON.
    ///
    /// Unknown role keys fail with `Error::UnknownRole`; malformed JSON or
    /// field paths fail with `Error::InvalidOverride`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidOverride(format!("not a JSON object of strings: {}", e)))?;

        let mut overrides = Self::new();
        for (role, field) in raw {
            let role: Role = role.parse()?;
            let field: FieldPath = field.parse()?;
            overrides.insert(role, field);
        }
        Ok(overrides)
    }

    /// Read overrides from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidOverride(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Route `role` to `field`.
    pub fn insert(&mut self, role: Role, field: FieldPath) {
        self.entries.insert(role, field);
    }

    /// Override for a role, if any.
    pub fn get(&self, role: Role) -> Option<FieldPath> {
        self.entries.get(&role).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let overrides = MappingOverrides::from_json(
            r#"{"contact.title": "experience[0].role", "experience[].dates": "education[].dates"}"#,
        )
        .unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(
            overrides.get(Role::ContactTitle),
            Some(FieldPath::entry(Role::ExperienceRole, 0))
        );
        assert_eq!(
            overrides.get(Role::ExperienceDates).map(|f| f.with_group(2)),
            Some(FieldPath::entry(Role::EducationDates, 2))
        );
        assert_eq!(overrides.get(Role::Summary), None);
    }

    #[test]
    fn test_unknown_role_key() {
        let err = MappingOverrides::from_json(r#"{"contact.fax": "summary"}"#).unwrap_err();
        assert!(matches!(err, Error::UnknownRole(_)));
    }

    #[test]
    fn test_bad_field_path() {
        let err = MappingOverrides::from_json(r#"{"summary": "hobbies"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOverride(_)));

        let err = MappingOverrides::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::InvalidOverride(_)));
    }
}
