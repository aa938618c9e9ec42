// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image boundary helpers — decoding (foreground and background), cropping,
// and encoding for handoff.

pub mod decode;
pub mod processor;

pub use decode::{DecodeHandle, decode_in_background};
pub use processor::ImageProcessor;
