//! Loading and classifying input files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::OcrError;

/// Kinds of document the OCR service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    /// Paginated; eligible for page selection.
    Pdf,
}

impl DocumentKind {
    /// Classify by MIME type and filename.
    ///
    /// A `.pdf` extension is enough for PDF even if sniffing disagrees.
    pub fn classify(mime: &str, filename: &str) -> Option<Self> {
        let mime = mime.to_lowercase();
        if mime == "application/pdf" || filename.to_lowercase().ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else if mime.starts_with("image/") {
            Some(DocumentKind::Image)
        } else {
            None
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, DocumentKind::Pdf)
    }
}

/// A file chosen for submission, read fully into memory.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl LoadedFile {
    /// Read and classify a file.
    ///
    /// # Errors
    /// `UnsupportedFileType` when the file is neither an image nor a PDF.
    pub fn open(path: &Path) -> Result<Self, OcrError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self::from_bytes(path.to_path_buf(), name, bytes)
    }

    /// Classify in-memory content.
    pub fn from_bytes(path: PathBuf, name: String, bytes: Vec<u8>) -> Result<Self, OcrError> {
        let mime_type = detect_mime(&bytes, &name);
        let kind = DocumentKind::classify(&mime_type, &name)
            .ok_or_else(|| OcrError::UnsupportedFileType(format!("{} ({})", name, mime_type)))?;

        debug!("Loaded {} as {:?} ({})", name, kind, mime_type);

        Ok(Self {
            path,
            name,
            mime_type,
            kind,
            bytes,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Detect MIME type from content, falling back to the file extension.
pub fn detect_mime(bytes: &[u8], filename: &str) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Format a byte count with base-1024 units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut exponent = 0;
    while exponent + 1 < UNITS.len() && bytes >= 1024u64.pow(exponent as u32 + 1) {
        exponent += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}
