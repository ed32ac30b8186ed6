//! barkus-core: library for splitting scanned delivery-order PDFs by barcode
//!
//! This crate provides:
//! - PDF page rendering and subset writing via pdfium
//! - Barcode decoding (rxing) with position hints and candidate-region counts
//! - A retry/enhancement ladder for hard-to-read pages
//! - Content/position classification of decoded barcodes
//! - Policy-driven grouping of pages into output documents

pub mod classify;
pub mod decoder;
pub mod detect;
pub mod enhance;
pub mod grouping;
pub mod pdf;

// Re-exports
pub use classify::{classify, resolve_role, BarcodeRole};
pub use decoder::{BarcodeDecoder, DecodeHit, DecodeScan, PositionHint, RxingDecoder};
pub use detect::{
    DetectionStats, DetectionStatus, PageDetection, PageDetector, ATTEMPTS_PER_ENHANCED_LEVEL,
    MAX_ATTEMPTS,
};
pub use enhance::EnhancementLevel;
pub use grouping::{group_pages, GroupKey, NoBarcodePolicy, PageGroup, ParsePolicyError};
pub use pdf::{PdfSplitter, DEFAULT_DPI, MAX_DPI, MIN_DPI};
