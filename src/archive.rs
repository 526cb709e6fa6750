//! Curriculum bundles: ZIP archive unpacking and input format detection.

use crate::error::{Result, ScoreError};
use std::io::{Cursor, Read};
use tracing::debug;

/// Kind of curriculum input, decided by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A ZIP bundle containing the XML export.
    Zip,
    /// A bare XML export.
    Xml,
}

impl InputFormat {
    /// Detect the format from a file name extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else if lower.ends_with(".xml") {
            Ok(Self::Xml)
        } else {
            Err(ScoreError::UnsupportedFormat(name.to_string()))
        }
    }
}

/// Return the contents of the first `.xml` entry of a ZIP archive.
pub fn extract_xml(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ScoreError::Archive(e.to_string()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| ScoreError::Archive(e.to_string()))?;
        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".xml") {
            continue;
        }
        debug!(entry = entry.name(), "Found XML document in archive");
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        return Ok(contents);
    }

    Err(ScoreError::Archive("no XML document found in archive".to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build an in-memory ZIP with the given entries.
    pub(crate) fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(InputFormat::from_file_name("cv.zip").unwrap(), InputFormat::Zip);
        assert_eq!(InputFormat::from_file_name("CV.XML").unwrap(), InputFormat::Xml);
        assert!(matches!(
            InputFormat::from_file_name("cv.pdf"),
            Err(ScoreError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_extract_first_xml_entry() {
        let bytes = zip_with(&[
            ("readme.txt", b"ignore me"),
            ("curriculo.xml", b"<CURRICULO-VITAE/>"),
            ("other.xml", b"<OTHER/>"),
        ]);
        assert_eq!(extract_xml(&bytes).unwrap(), b"<CURRICULO-VITAE/>");
    }

    #[test]
    fn test_archive_without_xml() {
        let bytes = zip_with(&[("notes.txt", b"nothing here")]);
        let err = extract_xml(&bytes).unwrap_err();
        assert!(err.to_string().contains("no XML document"));
    }

    #[test]
    fn test_corrupt_archive() {
        assert!(matches!(
            extract_xml(b"definitely not a zip"),
            Err(ScoreError::Archive(_))
        ));
    }
}
