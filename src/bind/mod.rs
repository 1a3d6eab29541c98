//! Binding extracted content to template placeholders.
//!
//! Binding is a pure function of the template and the profile: placeholders
//! are visited in slide and shape order, each gets at most one field, and
//! anything the template cannot hold is reported as an [`UnboundField`].

mod overrides;
mod template;

pub use overrides::MappingOverrides;
pub use template::{PlaceholderRef, TemplatePlaceholder, TemplateSpec};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{CvProfile, FieldPath, Section};

/// Content bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub slot: PlaceholderRef,
    pub field: FieldPath,
    /// One string per paragraph
    pub content: Vec<String>,
}

/// Why a field was left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnboundReason {
    /// The template has fewer entry groups than the profile has entries.
    ExceedsCapacity,
    /// No placeholder carries the field's role.
    NoMatchingRole,
}

impl fmt::Display for UnboundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnboundReason::ExceedsCapacity => f.write_str("exceeds template capacity"),
            UnboundReason::NoMatchingRole => f.write_str("no placeholder with a matching role"),
        }
    }
}

/// A profile field that did not make it into the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboundField {
    /// Field path, or a whole entry such as `experience[2]`
    pub field: String,
    pub reason: UnboundReason,
}

/// Result of binding a profile to a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Bound placeholders in template order
    pub bindings: Vec<Binding>,

    /// Continuation placeholders available to the layout engine
    pub continuations: Vec<PlaceholderRef>,

    pub unbound: Vec<UnboundField>,
}

impl Mapping {
    /// Binding for a slot.
    pub fn binding(&self, slot: PlaceholderRef) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.slot == slot)
    }
}

/// Bind a profile to a template by role name.
pub fn bind(spec: &TemplateSpec, profile: &CvProfile) -> Mapping {
    bind_with_overrides(spec, profile, &MappingOverrides::default())
}

/// Bind a profile to a template, consulting `overrides` first.
pub fn bind_with_overrides(
    spec: &TemplateSpec,
    profile: &CvProfile,
    overrides: &MappingOverrides,
) -> Mapping {
    let mut mapping = Mapping::default();
    let mut bound: BTreeSet<FieldPath> = BTreeSet::new();

    for placeholder in spec.placeholders() {
        if placeholder.continuation {
            mapping.continuations.push(placeholder.slot);
            continue;
        }

        let field = match overrides.get(placeholder.role) {
            Some(field) => field.with_group(placeholder.group),
            None => FieldPath {
                role: placeholder.role,
                index: placeholder.role.section().map(|_| placeholder.group),
            },
        };

        match profile.field_items(&field) {
            Some(content) => {
                bound.insert(field);
                mapping.bindings.push(Binding {
                    slot: placeholder.slot,
                    field,
                    content,
                });
            }
            None => log::debug!(
                "{} ({}) has no content for {}, left as is",
                placeholder.slot,
                placeholder.role,
                field
            ),
        }
    }

    for section in [Section::Experience, Section::Education] {
        let groups = spec.group_count(section);
        if groups == 0 {
            continue;
        }
        for index in groups..profile.entry_count(section) {
            let field = format!("{}[{}]", section.as_str(), index);
            log::warn!("{} does not fit the template ({} groups)", field, groups);
            mapping.unbound.push(UnboundField {
                field,
                reason: UnboundReason::ExceedsCapacity,
            });
        }
    }

    for field in profile.present_fields() {
        if bound.contains(&field) {
            continue;
        }
        if let (Some(section), Some(index)) = (field.role.section(), field.index) {
            let groups = spec.group_count(section);
            if groups > 0 && index >= groups {
                continue;
            }
        }
        log::warn!("{} has no matching placeholder", field);
        mapping.unbound.push(UnboundField {
            field: field.to_string(),
            reason: UnboundReason::NoMatchingRole,
        });
    }

    mapping
}
