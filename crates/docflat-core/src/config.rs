// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocflatError, Result};

/// Which tonal correction runs after rectification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceMode {
    /// Brightness-bucketed contrast/brightness lift, clamped at 240.
    #[default]
    Adaptive,
    /// Weighted grayscale with a fixed contrast boost.
    Monochrome,
    /// Leave the rectified pixels untouched.
    Off,
}

/// Persistent scan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Pick radius for corner hit testing, in source pixels (zoom independent).
    pub pick_radius: f64,
    /// Overlay outline width in buffer pixels.
    pub outline_width: f32,
    /// Corner marker radius in buffer pixels.
    pub marker_radius: f32,
    /// RGBA colour of the overlay outline and markers.
    pub overlay_color: [u8; 4],
    /// RGBA fill for rectified pixels with no source data behind them.
    pub background: [u8; 4],
    /// JPEG quality for exported images (1-100).
    pub jpeg_quality: u8,
    /// Post-rectification enhancement.
    pub mode: EnhanceMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pick_radius: 25.0,
            outline_width: 2.0,
            marker_radius: 10.0,
            overlay_color: [255, 0, 0, 255],
            background: [255, 255, 255, 255],
            jpeg_quality: 95,
            mode: EnhanceMode::Adaptive,
        }
    }
}

impl ScanConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject settings no scan could run with.
    pub fn validate(&self) -> Result<()> {
        if !self.pick_radius.is_finite() || self.pick_radius <= 0.0 {
            return Err(DocflatError::Config(format!(
                "pick_radius must be positive, got {}",
                self.pick_radius
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(DocflatError::Config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if !(self.outline_width >= 0.0 && self.marker_radius >= 0.0) {
            return Err(DocflatError::Config(
                "overlay sizes must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
