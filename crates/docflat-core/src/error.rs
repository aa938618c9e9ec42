// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docflat.

use thiserror::Error;

use crate::types::Corner;

/// Top-level error type for all docflat operations.
///
/// Every variant is local to the call that produced it: an editor session
/// that sees one of these keeps its quadrilateral exactly as last set.
#[derive(Debug, Error)]
pub enum DocflatError {
    // -- Geometry --
    #[error("invalid quadrilateral geometry: {0}")]
    InvalidGeometry(String),

    #[error("no quadrilateral has been defined for this session")]
    NoQuadrilateral,

    #[error("corner index {0} is out of range (expected 0..=3)")]
    InvalidCorner(usize),

    #[error("zoom must be finite and greater than zero, got {0}")]
    InvalidZoom(f64),

    // -- Editor --
    #[error("a drag is already active on the {0:?} corner")]
    DragInProgress(Corner),

    // -- Pixel buffers --
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("source image has not finished decoding")]
    DecodeNotReady,

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocflatError>;
