// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding captured frames, rotated rectangular crops, and
// encoding results for handoff. Operates on in-memory images using the
// `image` and `imageproc` crates.

use image::{DynamicImage, ImageFormat, Pixel, Rgba, RgbImage, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use docflat_core::error::DocflatError;
use tracing::{debug, info, instrument};

/// Image wrapper for the boundary steps around rectification.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::open("capture.jpg")?
///     .crop_rotated(40, 40, 600, 380, 90.0, Rgba([255, 255, 255, 255]))
///     .to_jpeg_bytes(95)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DocflatError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            DocflatError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocflatError> {
        let img = image::load_from_memory(data).map_err(|err| {
            DocflatError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded RGBA buffer.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the image as 8-bit RGBA.
    pub fn into_rgba8(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Transformations ------------------------------------------------------

    /// Crop a rectangle and rotate it about its own centre by `degrees`
    /// (clockwise), keeping the crop's dimensions.
    ///
    /// The rectangle is clamped to the image bounds. Corners uncovered by
    /// the rotation are filled with `background`.
    #[instrument(skip(self, background), fields(x, y, width, height, degrees))]
    pub fn crop_rotated(
        self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        degrees: f32,
        background: Rgba<u8>,
    ) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w.saturating_sub(safe_x));
        let safe_h = height.min(img_h.saturating_sub(safe_y));
        info!(safe_x, safe_y, safe_w, safe_h, "Cropping image");

        let cropped = self.image.crop_imm(safe_x, safe_y, safe_w, safe_h).into_rgba8();

        let normalised = degrees.rem_euclid(360.0);
        if normalised < 0.01 || (360.0 - normalised) < 0.01 {
            return Self::from_rgba(cropped);
        }

        let rotated = geometric_transformations::rotate_about_center(
            &cropped,
            degrees.to_radians(),
            Interpolation::Bilinear,
            background,
        );
        debug!("Crop rotated about centre");
        Self::from_rgba(rotated)
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, DocflatError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    ///
    /// JPEG has no alpha channel; transparency is dropped.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>, DocflatError> {
        encode_jpeg(&self.image.to_rgb8(), quality)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), DocflatError> {
        let path = path.as_ref();

        // The JPEG encoder rejects RGBA input.
        let result = if is_jpeg_path(path) {
            self.image.to_rgb8().save(path)
        } else {
            self.image.save(path)
        };
        result.map_err(|err| {
            DocflatError::ImageError(format!(
                "failed to save image to {}: {}",
                path.display(),
                err
            ))
        })
    }
}

// -- Borrowed encoding ---------------------------------------------------------

/// PNG bytes for an RGBA buffer, without taking ownership of it.
pub fn rgba_to_png(image: &RgbaImage) -> Result<Vec<u8>, DocflatError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| DocflatError::ImageError(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// JPEG bytes for an RGBA buffer at `quality` (1-100). Alpha is dropped.
pub fn rgba_to_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, DocflatError> {
    let rgb = RgbImage::from_fn(image.width(), image.height(), |x, y| image.get_pixel(x, y).to_rgb());
    encode_jpeg(&rgb, quality)
}

/// Write an RGBA buffer to `path`. `.jpg`/`.jpeg` use `jpeg_quality`; other
/// extensions go through the `image` crate's format detection.
pub fn save_rgba(
    image: &RgbaImage,
    path: impl AsRef<std::path::Path>,
    jpeg_quality: u8,
) -> Result<(), DocflatError> {
    let path = path.as_ref();
    if is_jpeg_path(path) {
        std::fs::write(path, rgba_to_jpeg(image, jpeg_quality)?)?;
        return Ok(());
    }
    image.save(path).map_err(|err| {
        DocflatError::ImageError(format!(
            "failed to save image to {}: {}",
            path.display(),
            err
        ))
    })
}

fn is_jpeg_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, DocflatError> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| DocflatError::ImageError(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, DocflatError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| DocflatError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
