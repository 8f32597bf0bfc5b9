pub mod download;
pub mod image;
pub mod sniff;
pub mod upload;

use std::path::Path;

use crate::error::ApiError;

pub use download::{download, Downloaded};
pub use sniff::{sniff, FileKind};
pub use upload::{read_upload, Upload};

const MAX_STEM_CHARS: usize = 128;

/// A document that passed type checks and is ready for the parser.
#[derive(Clone, Debug)]
pub struct PreparedDocument {
    pub stem: String,
    pub source_kind: FileKind,
    pub pdf: Vec<u8>,
    /// Page count read from the PDF itself. `None` when the page tree could
    /// not be read; the parser may still accept such files.
    pub page_count: Option<usize>,
}

/// Sniffs the content, rejects anything that is not a PDF or a supported
/// image, and turns images into a one-page PDF.
///
/// Decoding and page counting are CPU-bound; async callers go through
/// [`prepare_blocking`].
pub fn prepare(bytes: Vec<u8>, filename: &str, max_pixels: u64) -> Result<PreparedDocument, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::Validation("empty file".to_string()));
    }
    let kind = sniff(&bytes).ok_or_else(|| {
        ApiError::Validation("unsupported file type: content is neither PDF nor image".to_string())
    })?;
    let (pdf, page_count) = if kind.is_image() {
        let pdf = image::image_to_pdf(kind, &bytes, max_pixels)
            .map_err(|err| ApiError::Validation(format!("unsupported file type: {}", err)))?;
        (pdf, Some(1))
    } else {
        let pages = pdf_page_count(&bytes);
        (bytes, pages)
    };
    Ok(PreparedDocument {
        stem: document_stem(filename),
        source_kind: kind,
        pdf,
        page_count,
    })
}

/// Runs [`prepare`] on the blocking pool so image decoding never stalls the
/// async workers.
pub async fn prepare_blocking(
    bytes: Vec<u8>,
    filename: String,
    max_pixels: u64,
) -> Result<PreparedDocument, ApiError> {
    tokio::task::spawn_blocking(move || prepare(bytes, &filename, max_pixels))
        .await
        .map_err(|err| ApiError::Internal(format!("document preparation failed: {}", err)))?
}

/// Number of pages in the document's page tree.
pub fn pdf_page_count(pdf: &[u8]) -> Option<usize> {
    match lopdf::Document::load_mem(pdf) {
        Ok(doc) => Some(doc.get_pages().len()).filter(|pages| *pages > 0),
        Err(err) => {
            tracing::debug!("could not read PDF page tree: {}", err);
            None
        }
    }
}

/// File stem safe to use as a single path component.
pub fn document_stem(filename: &str) -> String {
    let raw = Path::new(filename.trim())
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    if cleaned.is_empty() || cleaned.starts_with('.') {
        "document".to_string()
    } else {
        cleaned
    }
}
