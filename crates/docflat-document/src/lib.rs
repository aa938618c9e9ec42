// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docflat-document — Rectification and enhancement for captured documents.
//
// Provides the interactive corner editor (drag model, coordinate mapping,
// overlay rendering), the two-triangle piecewise-affine rectifier, the
// brightness-adaptive enhancer, and background decoding with readiness gates.

pub mod editor;
pub mod geometry;
pub mod image;
pub mod readiness;
pub mod scan;

// Re-export the primary structs so callers can use `docflat_document::EditorSession` etc.
pub use editor::{EditorSession, OverlayStyle, render_overlay};
pub use geometry::{AffineTransform, Triangle};
pub use crate::image::{DecodeHandle, ImageProcessor, decode_in_background};
pub use readiness::{Readiness, Resolver, readiness};
pub use scan::{CornerDetector, Enhancer, FixedCorners, RectifiedImage, Rectifier, ScanOutput, ScanPipeline};
