//! CSV audit log and output filename construction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::WriterBuilder;
use serde::Serialize;

use barkus_core::GroupKey;

/// Output name for the collected no-barcode pages.
pub const NO_BARCODE_FILENAME: &str = "no_barcode.pdf";

/// Characters that are invalid in filenames on at least one supported
/// platform; barcode text can contain any of them.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// One audit-log row per written barcode output.
#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    #[serde(rename = "SequenceNo")]
    pub sequence_no: usize,
    #[serde(rename = "DateTime")]
    pub date_time: String,
    #[serde(rename = "Barcode1")]
    pub barcode1: String,
    #[serde(rename = "Barcode2")]
    pub barcode2: String,
    #[serde(rename = "OutputPath")]
    pub output_path: String,
}

/// Timestamped audit-log filename for one run.
pub fn extraction_log_name(now: &DateTime<Local>) -> String {
    format!("extraction_log_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write the audit log. The header row is always written, even for an empty
/// run.
pub fn write_extraction_log(path: &Path, rows: &[LogRow]) -> Result<()> {
    // Header written by hand so an empty run still produces a valid log.
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create audit log: {}", path.display()))?;
    writer.write_record(["SequenceNo", "DateTime", "Barcode1", "Barcode2", "OutputPath"])?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write audit log: {}", path.display()))?;
    Ok(())
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Filename for one output group: `{customer}_{delivery}.pdf` with
/// filesystem-hostile characters replaced, or the fixed no-barcode name.
pub fn group_file_name(key: &GroupKey) -> String {
    match key {
        GroupKey::Barcodes { customer, delivery } => {
            format!("{}_{}.pdf", sanitize(customer), sanitize(delivery))
        }
        GroupKey::NoBarcode => NO_BARCODE_FILENAME.to_string(),
    }
}

/// Resolve `file_name` inside `dir`, appending `_1`, `_2`, ... before the
/// extension until the name is unused. Same barcode pair appearing in two
/// non-adjacent runs must not overwrite the earlier output.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (file_name, ""),
    };
    for n in 1.. {
        let name = if ext.is_empty() {
            format!("{stem}_{n}")
        } else {
            format!("{stem}_{n}.{ext}")
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}
