// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Post-rectification tonal normalisation — brightness-aware contrast lift
// for colour output, plus a weighted-grayscale mode for monochrome scans.

use image::{Rgba, RgbaImage};
use docflat_core::EnhanceMode;
use docflat_core::error::{DocflatError, Result};
use tracing::{debug, info, instrument};

/// Upper clamp for adaptive output. Kept below 255 so bright paper does not
/// wash out to pure white and lose texture.
pub const HEADROOM_CEILING: f64 = 240.0;

/// Linear tone curve `v * contrast + brightness`, clamped at [`HEADROOM_CEILING`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurve {
    pub contrast: f64,
    pub brightness: f64,
}

impl ToneCurve {
    /// Strong lift for dark images (`avg < 90`).
    pub const DARK: Self = Self::new(1.15, 15.0);
    /// `90 <= avg < 120`.
    pub const DIM: Self = Self::new(1.10, 10.0);
    /// `120 <= avg <= 180`.
    pub const NORMAL: Self = Self::new(1.05, 5.0);
    /// Already bright (`avg > 180`): near identity.
    pub const BRIGHT: Self = Self::new(1.02, 0.0);

    pub const fn new(contrast: f64, brightness: f64) -> Self {
        Self {
            contrast,
            brightness,
        }
    }

    /// Pick the curve for an image whose mean luma is `avg_luma`.
    pub fn for_luma(avg_luma: f64) -> Self {
        if avg_luma < 90.0 {
            Self::DARK
        } else if avg_luma < 120.0 {
            Self::DIM
        } else if avg_luma > 180.0 {
            Self::BRIGHT
        } else {
            Self::NORMAL
        }
    }

    /// Map one channel value. Monotonic non-decreasing in `value`.
    pub fn apply(&self, value: u8) -> u8 {
        let mapped = (value as f64 * self.contrast + self.brightness).min(HEADROOM_CEILING);
        mapped.round_ties_even().clamp(0.0, 255.0) as u8
    }
}

/// Mean over all pixels of the unweighted RGB average. Alpha is ignored.
///
/// Returns `None` for an image with no pixels.
pub fn average_luma(image: &RgbaImage) -> Option<f64> {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return None;
    }
    let sum: f64 = image
        .pixels()
        .map(|Rgba([r, g, b, _])| (*r as f64 + *g as f64 + *b as f64) / 3.0)
        .sum();
    Some(sum / count as f64)
}

/// Tonal enhancement applied to the flattened document.
///
/// Runs on the rectified rectangle rather than the raw photograph, so the
/// brightness statistics describe the document and not its surroundings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enhancer {
    mode: EnhanceMode,
}

impl Enhancer {
    pub fn new(mode: EnhanceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EnhanceMode {
        self.mode
    }

    /// Enhance `image` according to the configured mode, returning a new buffer.
    ///
    /// Fails with `InvalidBuffer` for a zero-area image in every mode.
    #[instrument(skip(self, image), fields(mode = ?self.mode, w = image.width(), h = image.height()))]
    pub fn enhance(&self, image: &RgbaImage) -> Result<RgbaImage> {
        match self.mode {
            EnhanceMode::Adaptive => adaptive(image),
            EnhanceMode::Monochrome => monochrome(image),
            EnhanceMode::Off => {
                ensure_non_empty(image)?;
                Ok(image.clone())
            }
        }
    }
}

// -- Adaptive -----------------------------------------------------------------

/// Brightness-bucketed contrast/brightness correction.
///
/// Every colour channel goes through the [`ToneCurve`] selected by the
/// image's mean luma; alpha is copied unchanged.
pub fn adaptive(image: &RgbaImage) -> Result<RgbaImage> {
    let avg_luma = average_luma(image).ok_or_else(empty_buffer)?;
    let curve = ToneCurve::for_luma(avg_luma);
    info!(
        avg_luma,
        contrast = curve.contrast,
        brightness = curve.brightness,
        "Applying adaptive enhancement"
    );

    // Channel values are u8, so a 256-entry table covers every input.
    let table: [u8; 256] = std::array::from_fn(|v| curve.apply(v as u8));

    let mut output = image.clone();
    for Rgba([r, g, b, _]) in output.pixels_mut() {
        *r = table[*r as usize];
        *g = table[*g as usize];
        *b = table[*b as usize];
    }
    Ok(output)
}

// -- Monochrome ---------------------------------------------------------------

const MONO_CONTRAST: f64 = 1.4;
const MONO_BRIGHTNESS: f64 = 10.0;

/// Weighted grayscale (0.3 R + 0.59 G + 0.11 B) with a fixed contrast boost,
/// written to all three colour channels. Clamps to the full 0..=255 range.
pub fn monochrome(image: &RgbaImage) -> Result<RgbaImage> {
    ensure_non_empty(image)?;
    info!("Applying monochrome enhancement");

    let mut output = image.clone();
    for Rgba([r, g, b, _]) in output.pixels_mut() {
        let gray = 0.3 * *r as f64 + 0.59 * *g as f64 + 0.11 * *b as f64;
        let value = (gray * MONO_CONTRAST + MONO_BRIGHTNESS)
            .round_ties_even()
            .clamp(0.0, 255.0) as u8;
        *r = value;
        *g = value;
        *b = value;
    }
    debug!("Monochrome enhancement complete");
    Ok(output)
}

fn ensure_non_empty(image: &RgbaImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(empty_buffer());
    }
    Ok(())
}

fn empty_buffer() -> DocflatError {
    DocflatError::InvalidBuffer("cannot enhance an image with zero width or height".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8, alpha: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 3, Rgba([value, value, value, alpha]))
    }

    #[test]
    fn curve_selection_follows_thresholds() {
        assert_eq!(ToneCurve::for_luma(0.0), ToneCurve::DARK);
        assert_eq!(ToneCurve::for_luma(89.9), ToneCurve::DARK);
        assert_eq!(ToneCurve::for_luma(90.0), ToneCurve::DIM);
        assert_eq!(ToneCurve::for_luma(119.9), ToneCurve::DIM);
        assert_eq!(ToneCurve::for_luma(120.0), ToneCurve::NORMAL);
        assert_eq!(ToneCurve::for_luma(180.0), ToneCurve::NORMAL);
        assert_eq!(ToneCurve::for_luma(180.1), ToneCurve::BRIGHT);
    }

    #[test]
    fn average_luma_ignores_alpha() {
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([30, 60, 90, 0])
            } else {
                Rgba([90, 120, 150, 255])
            }
        });
        assert_eq!(average_luma(&image), Some(90.0));
        assert_eq!(average_luma(&RgbaImage::new(0, 5)), None);
    }

    #[test]
    fn dark_image_gets_strong_lift() {
        let out = adaptive(&solid(50, 255)).expect("enhance");
        // 50 * 1.15 + 15 = 72.5, ties to even.
        assert_eq!(*out.get_pixel(0, 0), Rgba([72, 72, 72, 255]));
    }

    #[test]
    fn output_never_exceeds_headroom_ceiling() {
        let out = adaptive(&solid(250, 255)).expect("enhance");
        assert!(out.pixels().all(|p| p.0[..3].iter().all(|&c| c <= 240)));
    }

    #[test]
    fn bright_image_drift_is_bounded() {
        let image = RgbaImage::from_fn(16, 16, |x, y| {
            let v = 190 + ((x + y) % 30) as u8;
            Rgba([v, v, v, 255])
        });
        assert!(average_luma(&image).expect("non-empty") > 180.0);

        let out = adaptive(&image).expect("enhance");
        for (before, after) in image.pixels().zip(out.pixels()) {
            for c in 0..3 {
                let expected = (before.0[c] as f64 * 1.02).min(240.0);
                assert!((after.0[c] as f64 - expected).abs() <= 0.5);
            }
        }
    }

    #[test]
    fn curve_is_monotonic_for_every_bucket() {
        for curve in [ToneCurve::DARK, ToneCurve::DIM, ToneCurve::NORMAL, ToneCurve::BRIGHT] {
            let mut previous = 0u8;
            for v in 0..=255u8 {
                let mapped = curve.apply(v);
                assert!(mapped >= previous, "{curve:?} decreased at {v}");
                previous = mapped;
            }
        }
    }

    #[test]
    fn alpha_is_left_unmodified() {
        let out = adaptive(&solid(100, 77)).expect("enhance");
        assert!(out.pixels().all(|p| p.0[3] == 77));
    }

    #[test]
    fn empty_buffer_is_rejected_in_every_mode() {
        let empty = RgbaImage::new(0, 0);
        for mode in [EnhanceMode::Adaptive, EnhanceMode::Monochrome, EnhanceMode::Off] {
            let err = Enhancer::new(mode).enhance(&empty).unwrap_err();
            assert!(matches!(err, DocflatError::InvalidBuffer(_)));
        }
    }

    #[test]
    fn monochrome_uses_weighted_gray() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 200]));
        let out = monochrome(&image).expect("enhance");
        // 100 * 1.4 + 10 = 150
        assert_eq!(*out.get_pixel(0, 0), Rgba([150, 150, 150, 200]));

        let white = monochrome(&RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])))
            .expect("enhance");
        assert_eq!(white.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn off_mode_returns_identical_pixels() {
        let image = solid(123, 255);
        let out = Enhancer::new(EnhanceMode::Off).enhance(&image).expect("enhance");
        assert_eq!(out, image);
    }
}
