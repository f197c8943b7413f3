//! # GPS Interface

use serde::{Deserialize, Serialize};

/// A position and heading fix from the GPS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
}

/// Driver for the GPS receiver.
pub trait Gps: Send {
    /// Poll for a new fix. `None` means no new fix is available this cycle, which is a normal
    /// condition.
    fn poll(&mut self) -> Option<GpsFix>;
}
