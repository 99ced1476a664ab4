//! Input normalizer: turns an attached file into question text.

use std::rc::Rc;
use journal_types::{
    JournalError, Result,
    session::FileRef,
};
use crate::ports::OcrPort;

/// Extensions offered by the file picker
pub const ATTACH_EXTENSIONS: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg"];

pub struct InputNormalizer {
    ocr: Rc<dyn OcrPort>,
    language: String,
}

impl InputNormalizer {
    pub fn new(ocr: Rc<dyn OcrPort>, language: impl Into<String>) -> Self {
        Self {
            ocr,
            language: language.into(),
        }
    }

    /// Whether a MIME type can be turned into text at all
    pub fn supports(mime: &str) -> bool {
        let essence = essence(mime);
        essence.starts_with("image/") || is_textual(&essence)
    }

    /// MIME type from a file name, for files that arrive without one.
    pub fn mime_for(name: &str) -> &'static str {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("txt") => "text/plain",
            Some("pdf") => "application/pdf",
            _ => "application/octet-stream",
        }
    }

    /// Images go through OCR; plain text and PDF files are read as text.
    pub async fn normalize(&self, file: &FileRef) -> Result<String> {
        let mime = essence(&file.mime);

        let text = if mime.starts_with("image/") {
            log::info!(
                "Running {} OCR on {} ({} bytes)",
                self.ocr.engine_name(),
                file.name,
                file.bytes.len()
            );
            self.ocr
                .recognize(&file.bytes, &mime, &self.language)
                .await
                .map_err(|e| match e {
                    JournalError::Normalizer(_) => e,
                    other => JournalError::Normalizer(other.to_string()),
                })?
        } else if is_textual(&mime) {
            String::from_utf8_lossy(&file.bytes).into_owned()
        } else {
            return Err(JournalError::Normalizer(format!(
                "unsupported file type: {}",
                file.mime
            )));
        };

        if text.trim().is_empty() {
            return Err(JournalError::Normalizer(format!(
                "no text could be extracted from {}",
                file.name
            )));
        }
        Ok(text)
    }
}

fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_textual(essence: &str) -> bool {
    matches!(essence, "text/plain" | "application/pdf")
}
