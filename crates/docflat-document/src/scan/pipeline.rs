// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline — waits for the decoded frame and the optional detector,
// seeds an editor session, then rectifies and enhances the confirmed
// quadrilateral into the final page.

use std::path::Path;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use docflat_core::ScanConfig;
use docflat_core::error::{DocflatError, Result};
use docflat_core::types::Quadrilateral;
use tracing::{debug, info, instrument, warn};

use crate::editor::session::EditorSession;
use crate::image::decode::DecodeHandle;
use crate::image::processor;
use crate::readiness::Readiness;
use crate::scan::detector::CornerDetector;
use crate::scan::enhance::Enhancer;
use crate::scan::rectify::Rectifier;

/// The rectified, enhanced page ready for handoff.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    image: RgbaImage,
    jpeg_quality: u8,
}

impl ScanOutput {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// JPEG bytes at the configured quality. Alpha is discarded.
    pub fn to_jpeg_bytes(&self) -> Result<Vec<u8>> {
        processor::rgba_to_jpeg(&self.image, self.jpeg_quality)
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        processor::rgba_to_png(&self.image)
    }

    /// Write to `path`; the extension picks the format. JPEG files use the
    /// configured quality rather than the encoder default.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        processor::save_rgba(&self.image, path, self.jpeg_quality)
    }
}

/// Configured rectifier and enhancer plus the flow around the editor.
#[derive(Debug, Clone)]
pub struct ScanPipeline {
    config: ScanConfig,
    rectifier: Rectifier,
    enhancer: Enhancer,
}

impl ScanPipeline {
    /// Build a pipeline, rejecting an invalid configuration.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rectifier: Rectifier::from_config(&config),
            enhancer: Enhancer::new(config.mode),
            config,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn rectifier(&self) -> &Rectifier {
        &self.rectifier
    }

    pub fn enhancer(&self) -> &Enhancer {
        &self.enhancer
    }

    /// Wait for the source to decode, then start an editor session on it.
    ///
    /// When a detector gate is given, it is awaited too and its hypothesis
    /// seeds the quadrilateral. A detector that fails, finds nothing, or is
    /// never delivered leaves the session without a quadrilateral; only a
    /// failed decode is an error.
    #[instrument(skip_all)]
    pub async fn open_session(
        &self,
        decode: &mut DecodeHandle,
        detector: Option<&mut Readiness<Arc<dyn CornerDetector>>>,
    ) -> Result<EditorSession> {
        let source = decode.ready().await?;
        debug!(width = source.width(), height = source.height(), "Source ready");

        let initial = match detector {
            Some(gate) => seed_from_detector(gate, Arc::clone(&source)).await,
            None => None,
        };
        Ok(EditorSession::with_config(source, initial, &self.config))
    }

    /// Rectify `quad` out of `source`, then apply the configured enhancement.
    #[instrument(skip(self, source), fields(mode = ?self.enhancer.mode()))]
    pub fn process(&self, source: &RgbaImage, quad: &Quadrilateral) -> Result<ScanOutput> {
        let rectified = self.rectifier.rectify(source, quad)?;
        let image = self.enhancer.enhance(rectified.as_image())?;
        info!(width = image.width(), height = image.height(), "Scan processed");
        Ok(ScanOutput {
            image,
            jpeg_quality: self.config.jpeg_quality,
        })
    }

    /// Process the session's current quadrilateral. The session is left as is,
    /// so a failure can be corrected and retried.
    pub fn finish(&self, session: &EditorSession) -> Result<ScanOutput> {
        let quad = session
            .quadrilateral()
            .ok_or(DocflatError::NoQuadrilateral)?;
        self.process(session.source(), &quad)
    }

    /// Background colour used for unmapped output pixels.
    pub fn background(&self) -> Rgba<u8> {
        self.rectifier.background()
    }
}

async fn seed_from_detector(
    gate: &mut Readiness<Arc<dyn CornerDetector>>,
    source: Arc<RgbaImage>,
) -> Option<Quadrilateral> {
    let detector = match gate.wait().await {
        Ok(detector) => detector,
        Err(err) => {
            warn!(%err, "Corner detector never became available");
            return None;
        }
    };

    let outcome = tokio::task::spawn_blocking(move || detector.detect(&source)).await;
    match outcome {
        Ok(Ok(Some(hypothesis))) => {
            let quad = Quadrilateral::from(hypothesis);
            if quad.is_finite() {
                debug!(?quad, "Detector seeded corners");
                Some(quad)
            } else {
                warn!("Detector returned non-finite corners; ignoring");
                None
            }
        }
        Ok(Ok(None)) => {
            debug!("Detector found no document");
            None
        }
        Ok(Err(err)) => {
            warn!(%err, "Corner detection failed");
            None
        }
        Err(err) => {
            warn!(%err, "Corner detection task aborted");
            None
        }
    }
}
