//! Barcode decoder adapter
//!
//! Wraps the external decode primitive (rxing, a ZXing port) behind the
//! [`BarcodeDecoder`] trait so the detection orchestrator can be exercised
//! with a scripted decoder in tests. The adapter never fails: a malformed or
//! undecodable image yields an empty scan with `patterns_found = 0`.
//!
//! Two pieces of information accompany the raw decoded texts:
//!
//! - a *position hint* per hit (left vs right side of the page), recovered by
//!   re-decoding each half of the page on its own — delivery orders carry the
//!   customer barcode on the left and the delivery-number barcode on the
//!   right, and the hint breaks classification ties;
//! - a decode-independent *candidate region* count: barcode-like areas are
//!   dense bands of black/white stripe transitions, which are visible even
//!   when the symbology itself cannot be decoded. The orchestrator uses this
//!   to distinguish "blank page" from "barcode present but unreadable".

use std::collections::HashSet;

use image::{imageops, DynamicImage, GrayImage};

/// Where on the page a decoded barcode sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionHint {
    /// Left half of the page (customer-name position).
    Left,
    /// Right half of the page (delivery-number position).
    Right,
    /// Position could not be established.
    Unknown,
}

/// One raw decode hit: the decoded text plus its position hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeHit {
    /// Raw decoded text, untrimmed.
    pub text: String,
    /// Left/right placement on the page.
    pub position: PositionHint,
}

/// Result of one decode pass over a page image.
#[derive(Debug, Clone, Default)]
pub struct DecodeScan {
    /// Distinct decode hits, in first-seen order.
    pub hits: Vec<DecodeHit>,
    /// Candidate barcode-like regions detected, independent of decode
    /// success.
    pub patterns_found: u32,
}

/// The decode primitive consumed by the detection orchestrator.
pub trait BarcodeDecoder {
    /// Scan one page image. Must not fail; fail closed with an empty scan.
    fn scan(&self, image: &DynamicImage) -> DecodeScan;
}

impl<D: BarcodeDecoder + ?Sized> BarcodeDecoder for &D {
    fn scan(&self, image: &DynamicImage) -> DecodeScan {
        (**self).scan(image)
    }
}

/// Minimum black/white transitions per row for the row to count as
/// barcode-like stripe content.
const MIN_ROW_TRANSITIONS: u32 = 16;

/// Minimum consecutive stripe rows to count a band as a candidate region.
const MIN_BAND_ROWS: u32 = 6;

/// rxing-backed decoder.
#[derive(Debug, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BarcodeDecoder for RxingDecoder {
    fn scan(&self, image: &DynamicImage) -> DecodeScan {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return DecodeScan::default();
        }

        let patterns_found = count_candidate_regions(&gray);

        let full = decode_texts(&gray);
        let half_width = width / 2;
        let left: HashSet<String> = if half_width > 0 {
            decode_texts(&imageops::crop_imm(&gray, 0, 0, half_width, height).to_image())
                .into_iter()
                .collect()
        } else {
            HashSet::new()
        };
        let right: HashSet<String> = if half_width > 0 {
            decode_texts(
                &imageops::crop_imm(&gray, half_width, 0, width - half_width, height).to_image(),
            )
            .into_iter()
            .collect()
        } else {
            HashSet::new()
        };

        // Merge the three passes: full-page hits first, then anything only a
        // half-page pass managed to decode.
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        for text in full
            .into_iter()
            .chain(left.iter().cloned())
            .chain(right.iter().cloned())
        {
            if !seen.insert(text.clone()) {
                continue;
            }
            let position = match (left.contains(&text), right.contains(&text)) {
                (true, false) => PositionHint::Left,
                (false, true) => PositionHint::Right,
                _ => PositionHint::Unknown,
            };
            hits.push(DecodeHit { text, position });
        }

        DecodeScan {
            hits,
            patterns_found,
        }
    }
}

/// Decode all barcodes in a grayscale image, returning raw texts in
/// first-seen order. Decoder errors (including "nothing found") collapse to
/// an empty list.
fn decode_texts(gray: &GrayImage) -> Vec<String> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    match rxing::helpers::detect_multiple_in_luma(gray.as_raw().clone(), width, height) {
        Ok(results) => results.iter().map(|r| r.getText().to_string()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Count candidate barcode-like regions: bands of rows whose black/white
/// transition density looks like stripe content, evaluated per page half so
/// side-by-side barcodes count separately.
fn count_candidate_regions(gray: &GrayImage) -> u32 {
    let (width, height) = gray.dimensions();
    if width < 2 || height == 0 {
        return 0;
    }

    let raw = gray.as_raw();
    let mean = {
        let sum: u64 = raw.iter().map(|&v| v as u64).sum();
        (sum / raw.len() as u64) as u8
    };

    let half = width / 2;
    let halves = [(0u32, half), (half, width)];

    let mut regions = 0u32;
    for &(start, end) in &halves {
        if end <= start + 1 {
            continue;
        }
        let mut band_rows = 0u32;
        for y in 0..height {
            let row = &raw[(y * width + start) as usize..(y * width + end) as usize];
            let mut transitions = 0u32;
            for pair in row.windows(2) {
                if (pair[0] <= mean) != (pair[1] <= mean) {
                    transitions += 1;
                }
            }
            if transitions >= MIN_ROW_TRANSITIONS {
                band_rows += 1;
            } else {
                if band_rows >= MIN_BAND_ROWS {
                    regions += 1;
                }
                band_rows = 0;
            }
        }
        if band_rows >= MIN_BAND_ROWS {
            regions += 1;
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Paint a vertical-stripe block (a crude barcode lookalike) into a
    /// grayscale image.
    fn paint_stripes(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let v = if (x / 2) % 2 == 0 { 0u8 } else { 255u8 };
                img.put_pixel(x, y, Luma([v]));
            }
        }
    }

    #[test]
    fn blank_page_has_no_candidate_regions() {
        let img = GrayImage::from_pixel(400, 300, Luma([255]));
        assert_eq!(count_candidate_regions(&img), 0);
    }

    #[test]
    fn stripe_blocks_are_counted_per_half() {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
        paint_stripes(&mut img, 20, 40, 120, 30); // left half
        paint_stripes(&mut img, 240, 40, 120, 30); // right half
        assert_eq!(count_candidate_regions(&img), 2);
    }

    #[test]
    fn single_left_stripe_block() {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
        paint_stripes(&mut img, 20, 100, 120, 40);
        assert_eq!(count_candidate_regions(&img), 1);
    }

    #[test]
    fn degenerate_image_scans_empty() {
        let decoder = RxingDecoder::new();
        let scan = decoder.scan(&DynamicImage::new_rgb8(0, 0));
        assert!(scan.hits.is_empty());
        assert_eq!(scan.patterns_found, 0);
    }

    #[test]
    fn blank_image_scans_empty() {
        let decoder = RxingDecoder::new();
        let scan = decoder.scan(&DynamicImage::new_luma8(200, 100));
        assert!(scan.hits.is_empty());
    }
}
