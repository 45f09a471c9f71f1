use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::models::{DocumentFingerprint, PageUnit, PdfUpload};
use crate::IngestError;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Reads a PDF from disk into an upload, named after the file.
pub fn read_upload(path: &Path) -> Result<PdfUpload, IngestError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?
        .to_string();

    let bytes = fs::read(path)?;
    Ok(PdfUpload { name, bytes })
}

pub struct SkippedPdf {
    pub name: String,
    pub reason: String,
}

pub struct IngestionReport {
    pub pages: Vec<PageUnit>,
    pub skipped_files: Vec<SkippedPdf>,
}

impl IngestionReport {
    /// True when the batch yielded nothing to index, either because it
    /// was empty or because every file was skipped.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Extracts every upload in the batch. A file that fails to parse or
/// has no extractable text is recorded as skipped; the rest of the
/// batch is unaffected.
pub fn ingest_uploads_best_effort(uploads: &[PdfUpload]) -> IngestionReport {
    let mut pages = Vec::new();
    let mut skipped_files = Vec::new();

    for upload in uploads {
        match ingest_upload(upload) {
            Ok(upload_pages) => pages.extend(upload_pages),
            Err(error) => skipped_files.push(SkippedPdf {
                name: upload.name.clone(),
                reason: error.to_string(),
            }),
        }
    }

    IngestionReport {
        pages,
        skipped_files,
    }
}

fn ingest_upload(upload: &PdfUpload) -> Result<Vec<PageUnit>, IngestError> {
    let fingerprint = fingerprint_upload(upload);
    let extracted = LopdfExtractor.extract_pages(&upload.bytes)?;

    if extracted.is_empty() {
        return Err(IngestError::NoExtractableText(upload.name.clone()));
    }

    Ok(extracted
        .into_iter()
        .map(|page| PageUnit {
            document_id: fingerprint.document_id.clone(),
            document_title: fingerprint.document_title.clone(),
            page_number: page.number,
            text: page.text,
        })
        .collect())
}

pub fn fingerprint_upload(upload: &PdfUpload) -> DocumentFingerprint {
    DocumentFingerprint {
        document_id: digest_bytes(upload.name.as_bytes()),
        document_title: upload.name.clone(),
        checksum: digest_bytes(&upload.bytes),
        ingested_at: Utc::now(),
    }
}
