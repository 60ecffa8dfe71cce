//! Document loading.
//!
//! Extracts plain text from `.txt`, `.pdf` and `.docx` files. PDF text comes
//! from `pdf-extract`, DOCX paragraphs from `docx-rs`. Extraction is blocking
//! work and runs on the tokio blocking pool.

use crate::types::{AppError, FileType, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions accepted by the loader, lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "pdf", "docx"];

/// Plain text extracted from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub file_name: String,
    pub text: String,
    pub file_type: FileType,
}

/// Format of `path` judged by its extension.
///
/// # Errors
///
/// [`AppError::UnsupportedFormat`] when the extension is missing or not supported.
pub fn detect_file_type(path: &Path) -> Result<FileType> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    FileType::from_extension(extension).ok_or_else(|| {
        AppError::UnsupportedFormat(format!("Unsupported file type: .{}", extension))
    })
}

/// Extract the trimmed text of a single file.
///
/// Panics raised by the PDF extractor on malformed input are reported as
/// [`AppError::ParseFailure`].
pub async fn parse_document(path: &Path) -> Result<(String, FileType)> {
    let file_type = detect_file_type(path)?;
    if !path.is_file() {
        return Err(AppError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extract_text(&owned, file_type))
        .await
        .map_err(|e| {
            if e.is_panic() {
                AppError::ParseFailure(format!(
                    "Extractor crashed on {}",
                    path.display()
                ))
            } else {
                AppError::Internal(format!("Parsing task failed: {}", e))
            }
        })??;

    Ok((text.trim().to_string(), file_type))
}

/// Supported files directly inside `dir`, ordered by file name.
///
/// Subdirectories are not descended into.
pub fn supported_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        AppError::InvalidInput(format!("Cannot read directory {}: {}", dir.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && detect_file_type(path).is_ok())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!(directory = %dir.display(), files = files.len(), "Listed supported documents");
    Ok(files)
}

/// Load every supported file in `dir`, in file name order.
///
/// Each file gets its own outcome; a file that cannot be loaded is logged and
/// reported as an [`AppError::UnsupportedFormat`] or [`AppError::ParseFailure`]
/// without stopping the others.
///
/// # Errors
///
/// [`AppError::InvalidInput`] when `dir` is not a readable directory.
pub async fn parse_directory(dir: &Path) -> Result<Vec<(String, Result<LoadedDocument>)>> {
    let mut outcomes = Vec::new();

    for path in supported_files(dir)? {
        let file_name = file_name(&path);
        let outcome = load_listed_file(&path).await;
        if let Err(e) = &outcome {
            warn!(file = %file_name, error = %e, "Skipping unparseable document");
        }
        outcomes.push((file_name, outcome));
    }

    Ok(outcomes)
}

/// Load a file returned by [`supported_files`].
///
/// A file removed after the listing is a parse failure of that file.
async fn load_listed_file(path: &Path) -> Result<LoadedDocument> {
    match LoadedDocument::load(path).await {
        Err(AppError::InvalidInput(message)) => Err(AppError::ParseFailure(message)),
        other => other,
    }
}

impl LoadedDocument {
    /// Extract the text of `path`, see [`parse_document`].
    pub async fn load(path: &Path) -> Result<Self> {
        let (text, file_type) = parse_document(path).await?;
        Ok(Self {
            file_name: file_name(path),
            text,
            file_type,
        })
    }
}

/// Final path component as a string, used as the chunk source.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn extract_text(path: &Path, file_type: FileType) -> Result<String> {
    match file_type {
        FileType::Txt => std::fs::read_to_string(path)
            .map_err(|e| AppError::ParseFailure(format!("Error parsing TXT: {}", e))),
        FileType::Pdf => {
            let data = read_bytes(path)?;
            pdf_extract::extract_text_from_mem(&data)
                .map_err(|e| AppError::ParseFailure(format!("Error parsing PDF: {}", e)))
        }
        FileType::Docx => {
            let data = read_bytes(path)?;
            extract_docx(&data)
        }
        FileType::Manual => Err(AppError::UnsupportedFormat(
            "Manual input is not a file format".to_string(),
        )),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| AppError::ParseFailure(format!("Cannot read {}: {}", path.display(), e)))
}

/// Paragraph texts joined by newlines. Tables and other block types are ignored.
fn extract_docx(data: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(data)
        .map_err(|e| AppError::ParseFailure(format!("Error parsing DOCX: {}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .into_iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => Some(
                paragraph
                    .children
                    .into_iter()
                    .filter_map(|child| match child {
                        docx_rs::ParagraphChild::Run(run) => Some(run.children),
                        _ => None,
                    })
                    .flatten()
                    .filter_map(|child| match child {
                        docx_rs::RunChild::Text(t) => Some(t.text),
                        _ => None,
                    })
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let mut docx = docx_rs::Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)),
            );
        }
        let file = fs::File::create(path).unwrap();
        docx.build().pack(file).unwrap();
    }

    #[test]
    fn test_detect_file_type() {
        assert_eq!(detect_file_type(Path::new("a/b.TXT")).unwrap(), FileType::Txt);
        assert_eq!(detect_file_type(Path::new("report.pdf")).unwrap(), FileType::Pdf);
        assert!(matches!(
            detect_file_type(Path::new("notes.md")),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            detect_file_type(Path::new("README")),
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_parse_txt_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "\n  Hello world.  \n\n").unwrap();

        let (text, file_type) = parse_document(&path).await.unwrap();
        assert_eq!(text, "Hello world.");
        assert_eq!(file_type, FileType::Txt);
    }

    #[tokio::test]
    async fn test_parse_txt_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

        let err = parse_document(&path).await.unwrap_err();
        assert!(matches!(err, AppError::ParseFailure(_)));
    }

    #[tokio::test]
    async fn test_parse_corrupt_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"this is not a pdf").unwrap();

        let err = parse_document(&path).await.unwrap_err();
        assert!(matches!(err, AppError::ParseFailure(_)));
    }

    #[tokio::test]
    async fn test_parse_docx_paragraphs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memo.docx");
        write_docx(&path, &["First paragraph.", "Second paragraph."]);

        let (text, file_type) = parse_document(&path).await.unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
        assert_eq!(file_type, FileType::Docx);
    }

    #[tokio::test]
    async fn test_parse_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "a,b").unwrap();

        let err = parse_document(&path).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let err = parse_document(Path::new("/nonexistent/file.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_supported_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.PDF"), "a").unwrap();
        fs::write(dir.path().join("c.md"), "c").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let names: Vec<String> = supported_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.txt"]);
    }

    #[test]
    fn test_supported_files_missing_directory() {
        let err = supported_files(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_parse_directory_reports_each_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.txt"), "Valid text.").unwrap();
        fs::write(dir.path().join("bad.pdf"), b"garbage").unwrap();

        let outcomes = parse_directory(dir.path()).await.unwrap();
        assert_eq!(outcomes.len(), 2);

        let (name, outcome) = &outcomes[0];
        assert_eq!(name, "bad.pdf");
        assert!(matches!(outcome, Err(AppError::ParseFailure(_))));

        let (name, outcome) = &outcomes[1];
        assert_eq!(name, "good.txt");
        let document = outcome.as_ref().unwrap();
        assert_eq!(document.file_name, "good.txt");
        assert_eq!(document.text, "Valid text.");
        assert_eq!(document.file_type, FileType::Txt);
    }

    #[tokio::test]
    async fn test_file_removed_after_listing_is_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.txt");
        fs::write(&path, "Soon deleted.").unwrap();

        let listed = supported_files(dir.path()).unwrap();
        assert_eq!(listed, vec![path.clone()]);
        fs::remove_file(&path).unwrap();

        let err = load_listed_file(&listed[0]).await.unwrap_err();
        assert!(matches!(err, AppError::ParseFailure(_)));
        assert!(err.is_document_error());
    }
}
