// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seam for an external document-boundary detector. Detection itself lives
// outside this crate; its output only seeds the corner editor.

use image::RgbaImage;
use docflat_core::error::Result;
use docflat_core::types::CornerHypothesis;

/// Proposes the four document corners for a decoded frame.
///
/// `Ok(None)` means no document boundary was found; the editor then starts
/// without a quadrilateral.
pub trait CornerDetector: Send + Sync {
    fn detect(&self, image: &RgbaImage) -> Result<Option<CornerHypothesis>>;
}

/// A detector that always reports the same hypothesis, e.g. corners that
/// arrived alongside the frame from another process.
#[derive(Debug, Clone, Copy)]
pub struct FixedCorners(pub CornerHypothesis);

impl CornerDetector for FixedCorners {
    fn detect(&self, _image: &RgbaImage) -> Result<Option<CornerHypothesis>> {
        Ok(Some(self.0))
    }
}
