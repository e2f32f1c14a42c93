// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page counting and preview rendering.
//
// Rasterising is done by a pluggable backend. The MuPDF backend is compiled
// in with the `mupdf` feature; without it, previews are unavailable but every
// editing operation keeps working.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use lopdf::Document;
use prism_core::error::{PrismError, Result};
use tracing::{debug, instrument, warn};

/// Number of pages in a PDF byte stream.
pub fn page_count(pdf: &[u8]) -> Result<usize> {
    let document = Document::load_mem(pdf).map_err(|e| PrismError::Parse(e.to_string()))?;
    Ok(document.get_pages().len())
}

/// Turns one page of a PDF into pixels.
pub trait PageRasterizer: Send + Sync {
    /// Render the 1-based `page_number` at `scale` (1.0 = 72 dpi).
    fn rasterize(&self, pdf: &[u8], page_number: usize, scale: f32) -> Result<RgbaImage>;
}

/// The rasterizer compiled into this build, if any.
pub fn default_rasterizer() -> Option<Box<dyn PageRasterizer>> {
    #[cfg(feature = "mupdf")]
    {
        Some(Box::new(mupdf_backend::MupdfRasterizer))
    }
    #[cfg(not(feature = "mupdf"))]
    {
        None
    }
}

/// PNG-encode an RGBA image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
        .map_err(|e| PrismError::Render(format!("failed to encode PNG: {e}")))?;
    Ok(png)
}

/// Render one page as a `data:image/png;base64,...` URI.
#[instrument(skip(rasterizer, pdf), fields(bytes_len = pdf.len()))]
pub fn render_page_to_data_uri(
    rasterizer: &dyn PageRasterizer,
    pdf: &[u8],
    page_number: usize,
    scale: f32,
) -> Result<String> {
    let image = rasterizer.rasterize(pdf, page_number, scale)?;
    let png = encode_png(&image)?;
    debug!(width = image.width(), height = image.height(), png_bytes = png.len(), "page rendered");
    Ok(format!("data:image/png;base64,{}", B64.encode(png)))
}

/// One entry of a thumbnail grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// 1-based page number.
    pub page_number: usize,
    /// The rendered image, or `None` when this page failed to render.
    pub data_uri: Option<String>,
}

/// Render every page of `pdf`. A page that fails to render still gets an
/// entry (without an image) so the grid stays aligned with the page list.
#[instrument(skip(rasterizer, pdf), fields(bytes_len = pdf.len()))]
pub fn render_thumbnails(rasterizer: &dyn PageRasterizer, pdf: &[u8], scale: f32) -> Result<Vec<Thumbnail>> {
    let pages = page_count(pdf)?;
    let thumbnails = (1..=pages)
        .map(|page_number| {
            let data_uri = match render_page_to_data_uri(rasterizer, pdf, page_number, scale) {
                Ok(uri) => Some(uri),
                Err(err) => {
                    warn!(page_number, %err, "thumbnail failed");
                    None
                }
            };
            Thumbnail {
                page_number,
                data_uri,
            }
        })
        .collect();
    Ok(thumbnails)
}

#[cfg(feature = "mupdf")]
mod mupdf_backend {
    use image::RgbaImage;
    use mupdf::{Colorspace, Document as MuDocument, Matrix};
    use prism_core::error::{PrismError, Result};

    use super::PageRasterizer;

    pub struct MupdfRasterizer;

    impl PageRasterizer for MupdfRasterizer {
        fn rasterize(&self, pdf: &[u8], page_number: usize, scale: f32) -> Result<RgbaImage> {
            let render_err = |reason: String| PrismError::Render(format!("page {page_number}: {reason}"));

            let document = MuDocument::from_bytes(pdf, "")
                .map_err(|e| render_err(format!("failed to open document: {e}")))?;
            let index = page_number
                .checked_sub(1)
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| render_err("page numbers start at 1".into()))?;
            let page = document
                .load_page(index)
                .map_err(|e| render_err(format!("failed to load page: {e}")))?;

            let matrix = Matrix::new_scale(scale, scale);
            let pixmap = page
                .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
                .map_err(|e| render_err(format!("failed to render: {e}")))?;

            let (width, height) = (pixmap.width(), pixmap.height());
            let components = pixmap.n() as usize;
            let mut rgba = Vec::with_capacity((width * height * 4) as usize);
            for px in pixmap.samples().chunks(components) {
                match components {
                    4 => rgba.extend_from_slice(px),
                    3 => rgba.extend_from_slice(&[px[0], px[1], px[2], 255]),
                    1 => rgba.extend_from_slice(&[px[0], px[0], px[0], 255]),
                    n => return Err(render_err(format!("unexpected pixel format with {n} components"))),
                }
            }

            RgbaImage::from_raw(width, height, rgba)
                .ok_or_else(|| render_err("failed to create image buffer".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::sample;

    /// Solid-colour pages sized by scale; fails on page 2 when asked to.
    struct FlatRasterizer {
        fail_page: Option<usize>,
    }

    impl PageRasterizer for FlatRasterizer {
        fn rasterize(&self, _pdf: &[u8], page_number: usize, scale: f32) -> Result<RgbaImage> {
            if self.fail_page == Some(page_number) {
                return Err(PrismError::Render("boom".into()));
            }
            let side = (100.0 * scale) as u32;
            Ok(RgbaImage::from_pixel(side, side, Rgba([200, 10, 10, 255])))
        }
    }

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(&sample::sample_pdf(6)).expect("count"), 6);
        assert!(matches!(page_count(b"nope"), Err(PrismError::Parse(_))));
    }

    #[test]
    fn data_uri_decodes_to_png() {
        let rasterizer = FlatRasterizer { fail_page: None };
        let uri = render_page_to_data_uri(&rasterizer, &sample::sample_pdf(1), 1, 0.5).expect("render");

        let encoded = uri.strip_prefix("data:image/png;base64,").expect("prefix");
        let png = B64.decode(encoded).expect("base64");
        let decoded = image::load_from_memory(&png).expect("png");
        assert_eq!((decoded.width(), decoded.height()), (50, 50));
    }

    #[test]
    fn failed_thumbnail_keeps_its_slot() {
        let rasterizer = FlatRasterizer { fail_page: Some(2) };
        let thumbs = render_thumbnails(&rasterizer, &sample::sample_pdf(3), 0.4).expect("thumbs");

        assert_eq!(thumbs.len(), 3);
        assert!(thumbs[0].data_uri.is_some());
        assert_eq!(thumbs[1].page_number, 2);
        assert!(thumbs[1].data_uri.is_none());
        assert!(thumbs[2].data_uri.is_some());
    }

    #[cfg(not(feature = "mupdf"))]
    #[test]
    fn no_backend_without_feature() {
        assert!(default_rasterizer().is_none());
    }
}
