// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background decoding of captured frames. Geometry must not run until the
// source raster exists, so decoding is exposed as a readiness gate that
// callers await once instead of polling.

use std::sync::Arc;

use image::RgbaImage;
use docflat_core::error::{DocflatError, Result};
use tracing::{debug, warn};

use crate::image::processor::ImageProcessor;
use crate::readiness::{Readiness, readiness};

/// Decode outcome shared with every waiter. Errors travel as their message
/// because `DocflatError` is not `Clone`.
type DecodeOutcome = std::result::Result<Arc<RgbaImage>, String>;

/// Handle to a source image that may still be decoding.
#[derive(Debug, Clone)]
pub struct DecodeHandle {
    gate: Readiness<DecodeOutcome>,
}

/// Start decoding `bytes` on tokio's blocking pool.
///
/// Must be called from within a tokio runtime.
pub fn decode_in_background(bytes: Vec<u8>) -> DecodeHandle {
    let (resolver, gate) = readiness();
    tokio::task::spawn_blocking(move || {
        let outcome = ImageProcessor::from_bytes(&bytes)
            .map(|processor| Arc::new(processor.into_rgba8()))
            .map_err(|err| match err {
                DocflatError::ImageError(message) => message,
                other => other.to_string(),
            });
        match &outcome {
            Ok(image) => debug!(width = image.width(), height = image.height(), "Background decode finished"),
            Err(message) => warn!(%message, "Background decode failed"),
        }
        resolver.resolve(outcome);
    });
    DecodeHandle { gate }
}

impl DecodeHandle {
    /// A handle for an image that is already decoded.
    pub fn ready_now(image: RgbaImage) -> Self {
        Self {
            gate: Readiness::resolved(Ok(Arc::new(image))),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// The decoded image, without waiting.
    ///
    /// Fails with `DecodeNotReady` while decoding is still in flight.
    pub fn try_image(&self) -> Result<Arc<RgbaImage>> {
        match self.gate.try_get() {
            None => Err(DocflatError::DecodeNotReady),
            Some(outcome) => outcome.map_err(DocflatError::ImageError),
        }
    }

    /// Wait for decoding to finish.
    pub async fn ready(&mut self) -> Result<Arc<RgbaImage>> {
        self.gate.wait().await?.map_err(DocflatError::ImageError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::processor::ImageProcessor;
    use image::Rgba;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(width, height, Rgba([9, 8, 7, 255])))
            .to_png_bytes()
            .expect("encode")
    }

    #[tokio::test]
    async fn background_decode_yields_image() {
        let mut handle = decode_in_background(png_bytes(12, 9));
        let image = handle.ready().await.expect("decoded");
        assert_eq!(image.dimensions(), (12, 9));
        assert!(handle.is_ready());
        assert_eq!(handle.try_image().expect("ready").dimensions(), (12, 9));
    }

    #[tokio::test]
    async fn invalid_bytes_surface_image_error() {
        let mut handle = decode_in_background(b"definitely not a png".to_vec());
        let err = handle.ready().await.unwrap_err();
        assert!(matches!(err, DocflatError::ImageError(_)));
    }

    #[test]
    fn pending_handle_is_not_ready() {
        let (_resolver, gate) = readiness::<DecodeOutcome>();
        let handle = DecodeHandle { gate };
        assert!(matches!(handle.try_image(), Err(DocflatError::DecodeNotReady)));
    }

    #[test]
    fn ready_now_needs_no_runtime() {
        let handle = DecodeHandle::ready_now(RgbaImage::new(3, 2));
        assert_eq!(handle.try_image().expect("ready").dimensions(), (3, 2));
    }
}
