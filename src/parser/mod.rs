//! Presentation package parsing module.

mod options;
mod package;
mod slide;
pub(crate) mod xml;

pub use options::ParseOptions;
pub use package::{PackageParser, CONTENT_TYPES_PART};

pub(crate) use package::{CORE_PROPERTIES_REL, SLIDE_REL};
pub(crate) use slide::parse_slide;
