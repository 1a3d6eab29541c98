//! Package serialization.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{Compression, Document};

/// Write every part of `doc` into a zip archive.
///
/// Entries keep the document's part order and each part's original
/// compression method. Entry timestamps are fixed, so the same document
/// always produces the same bytes.
pub(crate) fn write_package(doc: &Document) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for part in doc.parts() {
        let method = match part.compression {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(zip::DateTime::default());

        zip.start_file(part.name.as_str(), options)
            .map_err(render_err)?;
        zip.write_all(part.data()).map_err(render_err)?;
    }

    let cursor = zip.finish().map_err(render_err)?;
    Ok(cursor.into_inner())
}

fn render_err(e: impl std::fmt::Display) -> Error {
    Error::Render(format!("cannot write package: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PackageKind;
    use crate::model::Part;
    use std::io::Read;
    use zip::ZipArchive;

    fn document() -> Document {
        let mut doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        doc.add_part(Part::new(
            "[Content_Types].xml",
            "",
            Compression::Deflated,
            b"<Types/>".to_vec(),
        ));
        doc.add_part(Part::new(
            "ppt/media/image1.png",
            "image/png",
            Compression::Stored,
            vec![0x89, b'P', b'N', b'G'],
        ));
        doc
    }

    #[test]
    fn test_entry_order_and_compression() {
        let bytes = write_package(&document()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        assert_eq!(archive.len(), 2);
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "[Content_Types].xml");
        assert_eq!(first.compression(), CompressionMethod::Deflated);
        drop(first);

        let mut image = archive.by_index(1).unwrap();
        assert_eq!(image.compression(), CompressionMethod::Stored);
        let mut data = Vec::new();
        image.read_to_end(&mut data).unwrap();
        assert_eq!(data, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_output_is_stable() {
        let doc = document();
        assert_eq!(write_package(&doc).unwrap(), write_package(&doc).unwrap());
    }
}
