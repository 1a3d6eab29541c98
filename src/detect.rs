//! Container format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Local file header signature of a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Signature of an empty zip archive (end of central directory only).
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

/// Transitional PresentationML namespace for the main part.
pub const PRESENTATIONML_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

/// Strict (ISO 29500) PresentationML namespace.
pub const STRICT_PRESENTATIONML_NS: &str = "http://purl.oclc.org/ooxml/presentationml/main";

/// Relationship type of the package's main document (transitional).
pub const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type of the package's main document (strict).
pub const STRICT_OFFICE_DOCUMENT_REL: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument";

/// Kind of presentation package, derived from the main part's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    /// `.pptx`
    Presentation,
    /// `.ppsx`
    Slideshow,
    /// `.potx`
    Template,
    /// `.pptm`
    MacroEnabled,
}

impl PackageKind {
    /// Map a main-part content type to a package kind.
    ///
    /// Returns `Error::UnsupportedFormat` for anything that is not a
    /// PresentationML main part (e.g. a Word or Excel package).
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        match content_type {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml" => {
                Ok(PackageKind::Presentation)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.slideshow.main+xml" => {
                Ok(PackageKind::Slideshow)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml" => {
                Ok(PackageKind::Template)
            }
            "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml" => {
                Ok(PackageKind::MacroEnabled)
            }
            other => Err(Error::UnsupportedFormat(format!(
                "main part is not a presentation ({})",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PackageKind::Presentation => "PowerPoint presentation",
            PackageKind::Slideshow => "PowerPoint slideshow",
            PackageKind::Template => "PowerPoint template",
            PackageKind::MacroEnabled => "PowerPoint macro-enabled presentation",
        };
        f.write_str(name)
    }
}

/// Detect whether a file starts like a zip container.
///
/// # Example
/// ```no_run
/// use cvdeck::detect::detect_format_from_path;
///
/// detect_format_from_path("resume.pptx").unwrap();
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::read(path, e))?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .map_err(|_| Error::CorruptDocument("file is too short to be a container".into()))?;
    detect_format_from_bytes(&header)
}

/// Check the zip signature at the start of `data`.
///
/// Any non-zip input is a structural violation, reported as
/// `Error::CorruptDocument`.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<()> {
    if data.len() < ZIP_MAGIC.len() {
        return Err(Error::CorruptDocument(
            "data is too short to be a container".into(),
        ));
    }

    if data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC) {
        Ok(())
    } else {
        Err(Error::CorruptDocument("not a zip container".into()))
    }
}

/// Check whether a relationship type names the main document, and reject the
/// Strict conformance class.
pub fn check_office_document_rel(rel_type: &str) -> Result<bool> {
    if rel_type == STRICT_OFFICE_DOCUMENT_REL {
        return Err(Error::UnsupportedFormat(
            "Strict Open XML packages are not supported".into(),
        ));
    }
    Ok(rel_type == OFFICE_DOCUMENT_REL)
}

/// Check if bytes look like a zip container.
pub fn is_package_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Check if a file looks like a zip container.
pub fn is_package<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_zip() {
        assert!(detect_format_from_bytes(b"PK\x03\x04\x14\x00").is_ok());
        assert!(detect_format_from_bytes(b"PK\x05\x06").is_ok());
    }

    #[test]
    fn test_detect_not_zip() {
        let result = detect_format_from_bytes(b"%PDF-1.7\n");
        assert!(matches!(result, Err(Error::CorruptDocument(_))));
    }

    #[test]
    fn test_detect_too_short() {
        let result = detect_format_from_bytes(b"PK");
        assert!(matches!(result, Err(Error::CorruptDocument(_))));
    }

    #[test]
    fn test_package_kind() {
        let kind = PackageKind::from_content_type(
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        )
        .unwrap();
        assert_eq!(kind, PackageKind::Presentation);

        let word = PackageKind::from_content_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        );
        assert!(matches!(word, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_strict_rel_rejected() {
        assert!(check_office_document_rel(OFFICE_DOCUMENT_REL).unwrap());
        assert!(!check_office_document_rel("http://example.com/other").unwrap());
        assert!(matches!(
            check_office_document_rel(STRICT_OFFICE_DOCUMENT_REL),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
