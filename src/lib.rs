//! # cvdeck
//!
//! Résumé extraction and re-templating for PowerPoint decks.
//!
//! This library reads a CV authored as a `.pptx` presentation, extracts a
//! structured profile from it, and renders that profile into a corporate
//! template deck, resolving text overflow along the way.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cvdeck::{Engine, JobOptions};
//! use std::path::Path;
//!
//! fn main() -> cvdeck::Result<()> {
//!     let engine = Engine::from_template_file("corporate.pptx")?
//!         .with_options(JobOptions::new().with_threshold(0.6));
//!
//!     let output = engine.process_file(Path::new("jane.pptx"), Path::new("out.pptx"))?;
//!     for warning in output.report.warnings() {
//!         eprintln!("warning: {}", warning);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **parser**: decodes the zip container into a [`Document`] of parts
//! - **extract**: classifies slide text into a [`CvProfile`]
//! - **bind**: assigns profile fields to template placeholders
//! - **layout**: shrinks, truncates or paginates content that does not fit
//! - **render**: splices the content into the template and writes the package
//! - **job**: runs the stages under a deadline, alone or in batches

pub mod bind;
pub mod detect;
pub mod error;
pub mod extract;
pub mod job;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use bind::{
    bind, bind_with_overrides, Binding, Mapping, MappingOverrides, PlaceholderRef,
    TemplatePlaceholder, TemplateSpec, UnboundField, UnboundReason,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_package, PackageKind};
pub use error::{Error, Result, Stage};
pub use extract::{extract, extract_with_options, EntryStatus, ExtractOptions, ExtractionReport};
pub use job::{BatchJob, BatchResult, Engine, JobOptions, JobOutput, JobReport};
pub use layout::{resolve, resolve_with_options, FitStrategy, LayoutOptions, ResolvedLayout};
pub use model::{
    Contact, CvProfile, Document, EducationEntry, ExperienceEntry, FieldPath, Role, Section,
};
pub use parser::{PackageParser, ParseOptions};
pub use render::{render, render_with_options, JsonFormat, RenderOptions};

use std::io::Read;
use std::path::Path;

/// Parse a presentation file into a document.
///
/// # Example
///
/// ```no_run
/// use cvdeck::parse_file;
///
/// let doc = parse_file("resume.pptx").unwrap();
/// println!("Slides: {}", doc.slides.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let parser = PackageParser::open(path)?;
    parser.parse()
}

/// Parse a presentation file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let parser = PackageParser::open_with_options(path, options)?;
    parser.parse()
}

/// Parse a presentation from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    let parser = PackageParser::from_bytes(data)?;
    parser.parse()
}

/// Parse a presentation from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    let parser = PackageParser::from_reader(reader)?;
    parser.parse()
}

/// Extract a profile from a presentation file.
///
/// # Example
///
/// ```no_run
/// use cvdeck::extract_file;
///
/// let (profile, report) = extract_file("resume.pptx").unwrap();
/// println!("{:?} ({} ambiguous spans)", profile.contact.name, report.ambiguous_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<(CvProfile, ExtractionReport)> {
    let doc = parse_file(path)?;
    Ok(extract(&doc))
}

/// Run one in-memory job with default options: extract `source` and render
/// it into `template`.
pub fn retemplate(source: &[u8], template: &[u8]) -> Result<JobOutput> {
    let engine = Engine::new(TemplateSpec::from_bytes(template)?);
    engine.process_bytes(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes_rejects_non_zip() {
        let err = parse_bytes(b"%PDF-1.7 not a deck").unwrap_err();
        assert!(matches!(err, Error::CorruptDocument(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_retemplate_rejects_bad_template() {
        let err = retemplate(b"", b"garbage").unwrap_err();
        assert!(err.is_structural());
    }
}
