//! Document model types.
//!
//! This module defines the in-memory representation of a presentation
//! package (parts, relationships, slides, shapes, runs) and of the résumé
//! content extracted from it.

mod document;
mod profile;
mod schema;
mod slide;
mod text;

pub use document::{Compression, Document, Metadata, Part, PartId, Relationship};
pub use profile::{Contact, CvProfile, EducationEntry, ExperienceEntry};
pub use schema::{FieldPath, Role, Section};
pub use slide::{Frame, PlaceholderSpec, Shape, ShapeKind, Slide, EMU_PER_POINT};
pub use text::{Insets, Paragraph, Run, RunStyle, TextBody};
