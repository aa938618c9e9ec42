// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docflat — Core types, error definitions and configuration shared across all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{EnhanceMode, ScanConfig};
pub use error::DocflatError;
pub use types::*;
