// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner editor — draggable four-point quadrilateral over a zoomable source.

pub mod overlay;
pub mod session;

pub use overlay::{OverlayStyle, render_overlay};
pub use session::EditorSession;
