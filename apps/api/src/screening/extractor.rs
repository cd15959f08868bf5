//! PDF text extraction for uploaded resumes.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Could not read resume file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported resume format '{0}'; only PDF files can be parsed")]
    Unsupported(String),

    #[error("Could not parse PDF: {0}")]
    Pdf(String),

    #[error("Could not extract text from PDF.")]
    Empty,

    #[error("PDF extraction aborted: {0}")]
    Aborted(String),
}

/// Reads a PDF and concatenates each page's text in page order.
///
/// Blocking: parses the whole document on the calling thread.
pub fn extract_text_from_pdf(path: &Path) -> Result<String, ExtractionError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        return Err(ExtractionError::Unsupported(ext));
    }

    let bytes = std::fs::read(path)?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    Ok(strip_control_chars(&pages.concat()))
}

/// Drops control characters other than line breaks and tabs. Postgres `TEXT`
/// rejects NUL, and PDF text streams can carry it.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| matches!(c, '\n' | '\r' | '\t') || !c.is_control())
        .collect()
}

/// Runs [`extract_text_from_pdf`] on the blocking pool.
///
/// The PDF parser can panic on malformed input; a panic is reported as
/// [`ExtractionError::Aborted`] instead of unwinding into the request.
pub async fn extract_text_blocking(path: PathBuf) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || extract_text_from_pdf(&path))
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Writes a PDF with one page per entry of `pages`, each page holding its
    /// lines in Courier.
    pub fn write_pdf(path: &Path, pages: &[&[&str]]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
                }
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::write_pdf;
    use super::*;

    #[test]
    fn test_extracts_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        write_pdf(&path, &[&["Jane Doe", "Rust engineer"], &["Kubernetes"]]);

        let text = extract_text_from_pdf(&path).unwrap();
        let jane = text.find("Jane").expect("first page text present");
        let kube = text.find("Kubernetes").expect("second page text present");
        assert!(jane < kube, "pages out of order: {text:?}");
    }

    #[test]
    fn test_nul_bytes_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nul.pdf");
        write_pdf(&path, &[&["Jane\0Doe", "Python"]]);

        let text = extract_text_from_pdf(&path).unwrap();
        assert!(!text.contains('\0'), "NUL survived: {text:?}");
        assert!(text.contains("JaneDoe"));
        assert!(text.contains("Python"));
    }

    #[test]
    fn test_strip_control_chars_keeps_layout() {
        assert_eq!(
            strip_control_chars("a\0b\u{7}c\n\td\r\n"),
            "abc\n\td\r\n"
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_text_from_pdf(&dir.path().join("nope.pdf")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf at all").unwrap();
        assert!(extract_text_from_pdf(&path).is_err());
    }

    #[test]
    fn test_docx_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        let err = extract_text_from_pdf(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(ext) if ext == "docx"));
    }

    #[tokio::test]
    async fn test_blocking_wrapper_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");
        let err = extract_text_blocking(path).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
