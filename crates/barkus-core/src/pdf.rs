//! PDF rendering and splitting
//!
//! Uses `pdfium-render` both to rasterize pages for barcode detection and to
//! assemble the per-group output documents. Output pages are copied from the
//! source document, so text layers, annotations and form data survive the
//! split untouched.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;

/// Default resolution for rendering pages to images.
/// Higher DPI = better decode rates on dense barcodes but slower processing.
pub const DEFAULT_DPI: f32 = 300.0;

/// Lowest usable render resolution; below this barcode modules collapse into
/// single pixels.
pub const MIN_DPI: f32 = 50.0;

/// Highest accepted render resolution.
pub const MAX_DPI: f32 = 1200.0;

/// PDF renderer/splitter around a bound pdfium instance.
pub struct PdfSplitter {
    pdfium: Pdfium,
    dpi: f32,
}

impl PdfSplitter {
    /// Create a splitter at the default render DPI.
    ///
    /// # Errors
    ///
    /// Returns an error if the pdfium library cannot be loaded.
    pub fn new() -> Result<Self> {
        Self::with_dpi(DEFAULT_DPI)
    }

    /// Create a splitter with a custom render DPI.
    ///
    /// # Errors
    ///
    /// Returns an error if `dpi` is outside `MIN_DPI..=MAX_DPI` or the
    /// pdfium library cannot be loaded.
    pub fn with_dpi(dpi: f32) -> Result<Self> {
        ensure!(
            (MIN_DPI..=MAX_DPI).contains(&dpi),
            "DPI must be between {MIN_DPI} and {MAX_DPI}, got {dpi}"
        );

        let pdfium = Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .context("Failed to bind pdfium library")?,
        );

        Ok(Self { pdfium, dpi })
    }

    /// Render resolution in effect.
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Load a source PDF. The returned document borrows the splitter.
    pub fn load<'a>(&'a self, path: &Path) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .with_context(|| format!("Failed to load PDF: {}", path.display()))
    }

    /// Number of pages in a loaded document.
    pub fn page_count(&self, document: &PdfDocument<'_>) -> usize {
        document.pages().len() as usize
    }

    /// Render one page to an image at the configured DPI.
    pub fn render_page(&self, document: &PdfDocument<'_>, page_index: usize) -> Result<DynamicImage> {
        let page = document
            .pages()
            .get(page_index as u16)
            .with_context(|| format!("Page {page_index} out of range"))?;

        let scale = self.dpi / 72.0; // PDF points are 72 per inch
        let pixel_width = (page.width().value * scale) as i32;
        let pixel_height = (page.height().value * scale) as i32;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(pixel_width)
                    .set_target_height(pixel_height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .with_context(|| format!("Failed to render page {page_index}"))?;

        Ok(bitmap.as_image())
    }

    /// Copy the given source pages, in order, into a new PDF at `output_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `page_indices` is empty, any index is out of
    /// range, or the output file cannot be written.
    pub fn write_group(
        &self,
        document: &PdfDocument<'_>,
        page_indices: &[usize],
        output_path: &Path,
    ) -> Result<()> {
        ensure!(!page_indices.is_empty(), "Cannot write an empty page group");

        let page_count = self.page_count(document);
        let mut output = self.pdfium.create_new_pdf().context("Failed to create output PDF")?;

        for (dest_index, &source_index) in page_indices.iter().enumerate() {
            ensure!(
                source_index < page_count,
                "Page {source_index} out of range (document has {page_count} pages)"
            );
            output
                .pages_mut()
                .copy_page_from_document(document, source_index as u16, dest_index as u16)
                .with_context(|| format!("Failed to copy page {source_index}"))?;
        }

        output
            .save_to_file(output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        tracing::debug!(
            pages = page_indices.len(),
            path = %output_path.display(),
            "wrote output PDF"
        );

        Ok(())
    }
}
