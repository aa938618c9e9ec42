// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — two-triangle rectification, adaptive tonal enhancement,
// and the flow that ties a decoded frame and detector seed to both.

pub mod detector;
pub mod enhance;
pub mod pipeline;
pub mod rectify;

pub use detector::{CornerDetector, FixedCorners};
pub use enhance::{Enhancer, ToneCurve};
pub use pipeline::{ScanOutput, ScanPipeline};
pub use rectify::{RectifiedImage, Rectifier};
