//! Browser adapters for the Journalkollen widget.
//!
//! Each module implements one port from `journal_core::ports`:
//! the proxy client ([`AssistantPort`]), Tesseract.js OCR ([`OcrPort`]),
//! the PDF writer and download sink, and key-value storage.
//!
//! [`AssistantPort`]: journal_core::ports::AssistantPort
//! [`OcrPort`]: journal_core::ports::OcrPort

pub mod assistant;
pub mod download;
pub mod ocr;
pub mod pdf;
pub mod session_store;
pub mod storage;
