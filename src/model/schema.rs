//! The closed set of placeholder roles and the field paths they address.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Repeated résumé sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Experience,
    Education,
}

impl Section {
    /// Name used in field paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Experience => "experience",
            Section::Education => "education",
        }
    }
}

/// A placeholder role recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    ContactName,
    ContactTitle,
    ContactEmail,
    ContactPhone,
    Summary,
    ExperienceOrganization,
    ExperienceRole,
    ExperienceDates,
    ExperienceBullets,
    EducationInstitution,
    EducationDegree,
    EducationDates,
    Skills,
}

impl Role {
    /// Every role, in canonical order.
    pub const ALL: [Role; 13] = [
        Role::ContactName,
        Role::ContactTitle,
        Role::ContactEmail,
        Role::ContactPhone,
        Role::Summary,
        Role::ExperienceOrganization,
        Role::ExperienceRole,
        Role::ExperienceDates,
        Role::ExperienceBullets,
        Role::EducationInstitution,
        Role::EducationDegree,
        Role::EducationDates,
        Role::Skills,
    ];

    /// Role name as written in templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ContactName => "contact.name",
            Role::ContactTitle => "contact.title",
            Role::ContactEmail => "contact.email",
            Role::ContactPhone => "contact.phone",
            Role::Summary => "summary",
            Role::ExperienceOrganization => "experience[].organization",
            Role::ExperienceRole => "experience[].role",
            Role::ExperienceDates => "experience[].dates",
            Role::ExperienceBullets => "experience[].bullets",
            Role::EducationInstitution => "education[].institution",
            Role::EducationDegree => "education[].degree",
            Role::EducationDates => "education[].dates",
            Role::Skills => "skills",
        }
    }

    /// The repeated section this role belongs to, if any.
    pub fn section(&self) -> Option<Section> {
        match self {
            Role::ExperienceOrganization
            | Role::ExperienceRole
            | Role::ExperienceDates
            | Role::ExperienceBullets => Some(Section::Experience),
            Role::EducationInstitution | Role::EducationDegree | Role::EducationDates => {
                Some(Section::Education)
            }
            _ => None,
        }
    }

    /// Field name after the section prefix (`role` for `experience[].role`).
    fn leaf(&self) -> &'static str {
        let name = self.as_str();
        name.rsplit_once("].").map(|(_, leaf)| leaf).unwrap_or(name)
    }

    /// Whether the role's content is a list of entries that may be truncated.
    pub fn is_list(&self) -> bool {
        matches!(self, Role::ExperienceBullets | Role::Skills)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::UnknownRole(s.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A path to a value in a [`crate::model::CvProfile`].
///
/// Repeated roles take an entry index (`experience[2].role`); an index of
/// `None` on a repeated role means "the entry matching the placeholder's group".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    pub role: Role,
    pub index: Option<usize>,
}

impl FieldPath {
    /// Path for a single-valued role.
    pub fn new(role: Role) -> Self {
        Self { role, index: None }
    }

    /// Path to one entry of a repeated role.
    pub fn entry(role: Role, index: usize) -> Self {
        Self {
            role,
            index: Some(index),
        }
    }

    /// Fill in the entry index of a repeated role whose index is open.
    pub fn with_group(self, group: usize) -> Self {
        match (self.role.section(), self.index) {
            (Some(_), None) => Self::entry(self.role, group),
            _ => self,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.role.section(), self.index) {
            (Some(section), Some(i)) => write!(f, "{}[{}].{}", section.as_str(), i, self.role.leaf()),
            _ => f.write_str(self.role.as_str()),
        }
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    /// Parse `contact.name`, `experience[].role` or `experience[1].role`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidOverride(format!("invalid field path '{}'", s));

        if let Some((head, leaf)) = s.split_once("].") {
            let (section, index) = head.split_once('[').ok_or_else(invalid)?;
            let role: Role = format!("{}[].{}", section, leaf)
                .parse()
                .map_err(|_| invalid())?;
            let index = if index.is_empty() {
                None
            } else {
                Some(index.parse::<usize>().map_err(|_| invalid())?)
            };
            return Ok(Self { role, index });
        }

        let role: Role = s.parse().map_err(|_| invalid())?;
        Ok(Self::new(role))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
