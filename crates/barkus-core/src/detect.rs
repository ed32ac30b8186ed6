//! Per-page detection orchestration
//!
//! Drives the decode/enhance retry ladder for one page at a time and reduces
//! each page to a single immutable [`PageDetection`]. All per-page anomalies
//! are absorbed here into a status code; nothing in this module returns an
//! error (rendering failures are the caller's concern).
//!
//! The ladder: one attempt on the original render, then up to five attempts
//! at each enhancement level 1..=3, for a ceiling of 16 attempts. A page
//! with no barcode-like patterns at all is finalized immediately — escalating
//! enhancement cannot conjure patterns onto a blank page.

use image::DynamicImage;
use tracing::{debug, warn};

use crate::classify::{resolve_role, BarcodeRole};
use crate::decoder::{BarcodeDecoder, DecodeScan};
use crate::enhance::{self, EnhancementLevel};

/// Attempt ceiling per page: 1 original attempt + 3 levels x 5 attempts.
pub const MAX_ATTEMPTS: u32 = 16;

/// Enhanced attempts allowed at each level above the original.
pub const ATTEMPTS_PER_ENHANCED_LEVEL: u32 = 5;

/// Outcome of detection on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStatus {
    /// Both barcode roles decoded with no conflicts.
    Success,
    /// No barcode-like patterns on the page at all.
    NoPatternsFound,
    /// Patterns are present but could not all be decoded into both roles.
    PatternsUnreadable,
    /// Patterns decoded but produced no usable text.
    PatternsCorrupted,
    /// More than one candidate value decoded for the same role.
    MultipleConflicts,
    /// The attempt ceiling was reached without success.
    RetryExhausted,
}

impl DetectionStatus {
    /// Rank used by best-attempt selection; higher is better evidence.
    fn rank(self) -> u8 {
        match self {
            DetectionStatus::Success => 5,
            DetectionStatus::PatternsUnreadable => 4,
            DetectionStatus::PatternsCorrupted => 3,
            DetectionStatus::MultipleConflicts => 2,
            DetectionStatus::NoPatternsFound => 1,
            // Never produced by a single attempt; ranked lowest for totality.
            DetectionStatus::RetryExhausted => 0,
        }
    }

    /// Stable lowercase name for logs and summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionStatus::Success => "success",
            DetectionStatus::NoPatternsFound => "no_patterns_found",
            DetectionStatus::PatternsUnreadable => "patterns_unreadable",
            DetectionStatus::PatternsCorrupted => "patterns_corrupted",
            DetectionStatus::MultipleConflicts => "multiple_conflicts",
            DetectionStatus::RetryExhausted => "retry_exhausted",
        }
    }
}

/// Final detection result for one page. Immutable after creation; the
/// grouping engine consumes these read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDetection {
    /// Zero-based page position; defines document order.
    pub page_index: usize,
    /// Customer-name barcode value, if decoded.
    pub customer_name: Option<String>,
    /// Delivery-number barcode value, if decoded.
    pub delivery_number: Option<String>,
    /// How detection concluded for this page.
    pub status: DetectionStatus,
    /// Candidate barcode-like regions seen (diagnostic only).
    pub patterns_found: u32,
    /// Regions decoded into usable text (diagnostic only). Always
    /// `<= patterns_found`.
    pub readable_patterns: u32,
    /// Enhancement attempts consumed before this result was finalized.
    pub retry_count: u32,
}

impl PageDetection {
    /// Both roles present and the page decoded cleanly.
    pub fn is_success(&self) -> bool {
        self.status == DetectionStatus::Success
    }

    /// At least one role decoded (possibly a partial detection).
    pub fn has_any_barcode(&self) -> bool {
        self.customer_name.is_some() || self.delivery_number.is_some()
    }

    fn roles_populated(&self) -> u8 {
        self.customer_name.is_some() as u8 + self.delivery_number.is_some() as u8
    }

    /// Total-order priority for best-attempt selection: more roles, then
    /// better status, then more readable patterns. Callers break remaining
    /// ties toward the earliest (lowest enhancement level) attempt.
    fn priority_key(&self) -> (u8, u8, u32) {
        (
            self.roles_populated(),
            self.status.rank(),
            self.readable_patterns,
        )
    }
}

/// Aggregated per-run detection statistics for the end-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionStats {
    pub total_pages: usize,
    pub pages_with_barcodes: usize,
    pub pages_complete: usize,
    pub pages_no_patterns: usize,
    pub pages_unreadable: usize,
    pub pages_corrupted: usize,
    pub pages_conflicts: usize,
    pub pages_retry_exhausted: usize,
    pub total_patterns_found: u64,
    pub total_readable_patterns: u64,
}

impl DetectionStats {
    /// Tally statistics over a whole document's results.
    pub fn from_results(results: &[PageDetection]) -> Self {
        let mut stats = Self {
            total_pages: results.len(),
            ..Self::default()
        };
        for r in results {
            if r.has_any_barcode() {
                stats.pages_with_barcodes += 1;
            }
            match r.status {
                DetectionStatus::Success => stats.pages_complete += 1,
                DetectionStatus::NoPatternsFound => stats.pages_no_patterns += 1,
                DetectionStatus::PatternsUnreadable => stats.pages_unreadable += 1,
                DetectionStatus::PatternsCorrupted => stats.pages_corrupted += 1,
                DetectionStatus::MultipleConflicts => stats.pages_conflicts += 1,
                DetectionStatus::RetryExhausted => stats.pages_retry_exhausted += 1,
            }
            stats.total_patterns_found += r.patterns_found as u64;
            stats.total_readable_patterns += r.readable_patterns as u64;
        }
        stats
    }
}

/// Orchestrates the retry ladder over a [`BarcodeDecoder`].
pub struct PageDetector<D> {
    decoder: D,
}

impl<D: BarcodeDecoder> PageDetector<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Detect both barcode roles on one page image, retrying through the
    /// enhancement ladder as needed. Never fails; every anomaly is folded
    /// into the returned status.
    pub fn detect_page(&self, image: &DynamicImage, page_index: usize) -> PageDetection {
        let mut best: Option<PageDetection> = None;
        let mut attempts = 0u32;

        'ladder: for level in EnhancementLevel::ALL {
            let level_attempts = if level == EnhancementLevel::Original {
                1
            } else {
                ATTEMPTS_PER_ENHANCED_LEVEL
            };

            for _ in 0..level_attempts {
                attempts += 1;

                let enhanced;
                let attempt_image = if level == EnhancementLevel::Original {
                    image
                } else {
                    enhanced = enhance::apply(image, level);
                    &enhanced
                };

                let scan = self.decoder.scan(attempt_image);
                let result = interpret_scan(page_index, &scan);

                debug!(
                    page = page_index,
                    attempt = attempts,
                    level = level.index(),
                    status = result.status.as_str(),
                    patterns = result.patterns_found,
                    readable = result.readable_patterns,
                    "decode attempt"
                );

                let retryable = result.status != DetectionStatus::Success
                    && result.patterns_found > 0
                    && result.readable_patterns < result.patterns_found;

                // Strictly-greater keeps the earliest attempt (lowest
                // enhancement level) on ties.
                if best
                    .as_ref()
                    .map_or(true, |b| result.priority_key() > b.priority_key())
                {
                    best = Some(result.clone());
                }

                if result.status == DetectionStatus::Success {
                    return PageDetection {
                        retry_count: attempts - 1,
                        ..result
                    };
                }

                if result.patterns_found == 0 || !retryable {
                    break 'ladder;
                }
            }
        }

        // best is always set: the loop body runs at least once.
        let mut finalized = best.expect("at least one decode attempt");
        finalized.retry_count = attempts - 1;
        if attempts >= MAX_ATTEMPTS && finalized.status != DetectionStatus::Success {
            finalized.status = DetectionStatus::RetryExhausted;
        }

        if finalized.status != DetectionStatus::Success {
            debug!(
                page = page_index,
                status = finalized.status.as_str(),
                retries = finalized.retry_count,
                "page finalized without complete barcodes"
            );
        }

        finalized
    }
}

/// Reduce one decode scan to a per-attempt result: classify every hit into a
/// role slot, detect conflicts, and derive the attempt status.
fn interpret_scan(page_index: usize, scan: &DecodeScan) -> PageDetection {
    let mut customer: Option<String> = None;
    let mut delivery: Option<String> = None;
    let mut conflict = false;
    let mut readable = 0u32;
    let mut corrupted = 0u32;

    for hit in &scan.hits {
        let text = hit.text.trim();
        if text.is_empty() {
            corrupted += 1;
            continue;
        }
        readable += 1;

        let slot = match resolve_role(text, hit.position) {
            Some(BarcodeRole::CustomerName) => &mut customer,
            Some(BarcodeRole::DeliveryNumber) => &mut delivery,
            // Inconclusive content with no position hint: usable text but no
            // role to put it in.
            None => continue,
        };
        match slot {
            Some(existing) if existing.as_str() != text => {
                warn!(
                    page = page_index,
                    first = %existing,
                    second = %text,
                    "conflicting barcode values for the same role"
                );
                conflict = true;
            }
            Some(_) => {}
            None => *slot = Some(text.to_string()),
        }
    }

    // The region scan can undercount when decode outperforms it; keep the
    // readable <= patterns_found invariant honest.
    let patterns_found = scan.patterns_found.max(readable + corrupted);

    let status = if conflict {
        // Ambiguous role values are unusable evidence; drop them so the
        // success invariant (both fields present iff Success) holds.
        customer = None;
        delivery = None;
        DetectionStatus::MultipleConflicts
    } else if customer.is_some() && delivery.is_some() {
        DetectionStatus::Success
    } else if patterns_found == 0 {
        DetectionStatus::NoPatternsFound
    } else if readable == 0 && corrupted > 0 {
        DetectionStatus::PatternsCorrupted
    } else {
        DetectionStatus::PatternsUnreadable
    };

    PageDetection {
        page_index,
        customer_name: customer,
        delivery_number: delivery,
        status,
        patterns_found,
        readable_patterns: readable,
        retry_count: 0,
    }
}
