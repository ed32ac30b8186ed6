//! barkus - split scanned delivery-order PDFs by their barcodes
//!
//! Each page of a delivery-order scan carries a customer-name barcode on the
//! left and a delivery-number barcode on the right. barkus renders every
//! page, decodes both barcodes (retrying through an image-enhancement ladder
//! for hard scans), groups consecutive pages by barcode pair, and writes one
//! output PDF per pair plus a CSV audit log.
//!
//! Usage:
//!   barkus scan.pdf
//!   barkus scan.pdf --output-dir sorted --dpi 400 --no-barcode keep_with_previous

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use barkus_core::{
    group_pages, DetectionStats, GroupKey, NoBarcodePolicy, PageDetector, PdfSplitter,
    RxingDecoder, DEFAULT_DPI,
};

mod report;

use report::LogRow;

#[derive(Parser)]
#[command(name = "barkus", version, about = "Split scanned delivery-order PDFs by barcode")]
struct Cli {
    /// Source PDF to split.
    input_pdf: PathBuf,

    /// Directory for output PDFs and the audit log.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Render resolution for barcode detection (50-1200).
    #[arg(long, default_value_t = DEFAULT_DPI)]
    dpi: f32,

    /// What to do with pages whose barcodes could not be read.
    #[arg(long = "no-barcode", value_enum, default_value_t = PolicyArg::Separate)]
    no_barcode: PolicyArg,

    /// Suppress the progress bar and summary.
    #[arg(long)]
    quiet: bool,

    /// Write diagnostic logs to a file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum PolicyArg {
    /// Drop pages without barcodes.
    Ignore,
    /// Collect them into no_barcode.pdf.
    Separate,
    /// Append each to the preceding barcode group.
    KeepWithPrevious,
    /// Alias of keep_with_previous.
    Sequential,
}

impl From<PolicyArg> for NoBarcodePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Ignore => NoBarcodePolicy::Ignore,
            PolicyArg::Separate => NoBarcodePolicy::Separate,
            PolicyArg::KeepWithPrevious => NoBarcodePolicy::KeepWithPrevious,
            PolicyArg::Sequential => NoBarcodePolicy::Sequential,
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let is_pdf = cli
        .input_pdf
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        bail!("Input must be a PDF file: {}", cli.input_pdf.display());
    }
    if !cli.input_pdf.is_file() {
        bail!("Input file not found: {}", cli.input_pdf.display());
    }

    fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("Failed to create output directory: {}", cli.output_dir.display())
    })?;

    let splitter = PdfSplitter::with_dpi(cli.dpi)?;
    let document = splitter.load(&cli.input_pdf)?;
    let page_count = splitter.page_count(&document);
    if page_count == 0 {
        bail!("Input PDF has no pages: {}", cli.input_pdf.display());
    }

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(page_count as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        pb.set_message("scanning pages");
        pb
    };

    let detector = PageDetector::new(RxingDecoder::new());
    let mut results = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        let image = splitter.render_page(&document, page_index)?;
        results.push(detector.detect_page(&image, page_index));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let policy = NoBarcodePolicy::from(cli.no_barcode);
    let groups = group_pages(&results, policy);

    let now = Local::now();
    let date_time = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut rows: Vec<LogRow> = Vec::new();
    let mut files_written = 0usize;

    for group in &groups {
        let name = report::group_file_name(&group.key);
        let output_path = report::unique_path(&cli.output_dir, &name);
        splitter.write_group(&document, &group.page_indices, &output_path)?;
        files_written += 1;

        if let GroupKey::Barcodes { customer, delivery } = &group.key {
            rows.push(LogRow {
                sequence_no: rows.len() + 1,
                date_time: date_time.clone(),
                barcode1: customer.clone(),
                barcode2: delivery.clone(),
                output_path: output_path.display().to_string(),
            });
        }
    }

    let log_path = cli.output_dir.join(report::extraction_log_name(&now));
    report::write_extraction_log(&log_path, &rows)?;

    if !cli.quiet {
        print_summary(&results, files_written, policy, &log_path);
    }

    Ok(())
}

fn print_summary(
    results: &[barkus_core::PageDetection],
    files_written: usize,
    policy: NoBarcodePolicy,
    log_path: &Path,
) {
    let stats = DetectionStats::from_results(results);
    let no_barcode_pages = stats.total_pages - stats.pages_complete;

    println!("{}", "Split complete!".green().bold());
    println!("  Pages processed:  {}", stats.total_pages.to_string().cyan());
    println!("  Files created:    {}", files_written.to_string().cyan());
    println!(
        "  Complete pages:   {}",
        stats.pages_complete.to_string().cyan()
    );
    if no_barcode_pages > 0 {
        println!(
            "  Without barcodes: {} (policy: {})",
            no_barcode_pages.to_string().yellow(),
            policy.to_string().cyan()
        );
        if stats.pages_retry_exhausted > 0 {
            println!(
                "  Retry exhausted:  {}",
                stats.pages_retry_exhausted.to_string().yellow()
            );
        }
        if stats.pages_conflicts > 0 {
            println!(
                "  Conflicting:      {}",
                stats.pages_conflicts.to_string().yellow()
            );
        }
    }
    println!("  Audit log:        {}", log_path.display().to_string().dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_args_map_onto_core_policies() {
        assert_eq!(
            NoBarcodePolicy::from(PolicyArg::Ignore),
            NoBarcodePolicy::Ignore
        );
        assert_eq!(
            NoBarcodePolicy::from(PolicyArg::Separate),
            NoBarcodePolicy::Separate
        );
        assert_eq!(
            NoBarcodePolicy::from(PolicyArg::KeepWithPrevious),
            NoBarcodePolicy::KeepWithPrevious
        );
        assert_eq!(
            NoBarcodePolicy::from(PolicyArg::Sequential),
            NoBarcodePolicy::Sequential
        );
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["barkus", "scan.pdf"]);
        assert_eq!(cli.input_pdf, PathBuf::from("scan.pdf"));
        assert_eq!(cli.output_dir, PathBuf::from("output"));
        assert_eq!(cli.dpi, DEFAULT_DPI);
        assert!(!cli.quiet);
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn cli_accepts_snake_case_policies() {
        for name in ["ignore", "separate", "keep_with_previous", "sequential"] {
            let cli = Cli::parse_from(["barkus", "scan.pdf", "--no-barcode", name]);
            let _ = NoBarcodePolicy::from(cli.no_barcode);
        }
    }

    #[test]
    fn non_pdf_input_is_rejected() {
        let cli = Cli::parse_from(["barkus", "scan.txt"]);
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("PDF"));
    }
}
