//! Structured résumé content.

use super::{FieldPath, Role, Section};
use serde::{Deserialize, Serialize};

/// Extracted résumé content.
///
/// Built once by the extractor and only handed out by shared reference
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvProfile {
    /// Contact block
    pub contact: Contact,

    /// Free-text summary
    pub summary: Option<String>,

    /// Work history in document order
    pub experience: Vec<ExperienceEntry>,

    /// Education in document order
    pub education: Vec<EducationEntry>,

    /// Skill strings in document order
    pub skills: Vec<String>,
}

/// Contact block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One position held.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub organization: Option<String>,
    pub role: Option<String>,
    pub dates: Option<String>,
    pub bullets: Vec<String>,
}

impl ExperienceEntry {
    /// Whether the entry carries no content.
    pub fn is_empty(&self) -> bool {
        self.organization.is_none()
            && self.role.is_none()
            && self.dates.is_none()
            && self.bullets.is_empty()
    }
}

/// One education record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub dates: Option<String>,
}

impl EducationEntry {
    /// Whether the entry carries no content.
    pub fn is_empty(&self) -> bool {
        self.institution.is_none() && self.degree.is_none() && self.dates.is_none()
    }
}

impl CvProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.contact == Contact::default()
            && self.summary.is_none()
            && self.experience.is_empty()
            && self.education.is_empty()
            && self.skills.is_empty()
    }

    /// Number of entries in a repeated section.
    pub fn entry_count(&self, section: Section) -> usize {
        match section {
            Section::Experience => self.experience.len(),
            Section::Education => self.education.len(),
        }
    }

    /// Paragraphs of content addressed by a field path.
    ///
    /// Single-valued text yields one paragraph per line; lists yield one
    /// paragraph per item. Returns `None` when the field is absent or empty,
    /// or when a repeated role is addressed without an index.
    pub fn field_items(&self, path: &FieldPath) -> Option<Vec<String>> {
        let single = |value: &Option<String>| value.as_deref().map(split_lines);
        let items = match (path.role, path.index) {
            (Role::ContactName, _) => single(&self.contact.name),
            (Role::ContactTitle, _) => single(&self.contact.title),
            (Role::ContactEmail, _) => single(&self.contact.email),
            (Role::ContactPhone, _) => single(&self.contact.phone),
            (Role::Summary, _) => single(&self.summary),
            (Role::Skills, _) => Some(self.skills.clone()),
            (Role::ExperienceOrganization, Some(i)) => {
                single(&self.experience.get(i)?.organization)
            }
            (Role::ExperienceRole, Some(i)) => single(&self.experience.get(i)?.role),
            (Role::ExperienceDates, Some(i)) => single(&self.experience.get(i)?.dates),
            (Role::ExperienceBullets, Some(i)) => Some(self.experience.get(i)?.bullets.clone()),
            (Role::EducationInstitution, Some(i)) => {
                single(&self.education.get(i)?.institution)
            }
            (Role::EducationDegree, Some(i)) => single(&self.education.get(i)?.degree),
            (Role::EducationDates, Some(i)) => single(&self.education.get(i)?.dates),
            (_, None) => None,
        }?;

        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        (!items.is_empty()).then_some(items)
    }

    /// Every field path that currently holds content, in canonical order.
    pub fn present_fields(&self) -> Vec<FieldPath> {
        let mut fields = Vec::new();
        for role in Role::ALL {
            match role.section() {
                None => {
                    let path = FieldPath::new(role);
                    if self.field_items(&path).is_some() {
                        fields.push(path);
                    }
                }
                Some(section) => {
                    for i in 0..self.entry_count(section) {
                        let path = FieldPath::entry(role, i);
                        if self.field_items(&path).is_some() {
                            fields.push(path);
                        }
                    }
                }
            }
        }
        fields
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|l| l.to_string()).collect()
}
