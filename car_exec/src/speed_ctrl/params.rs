//! Speed control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for speed control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Limit on the magnitude of the throttle demand.
    #[serde(default = "default_max_throttle")]
    pub max_throttle: f64,

    /// Nominal cruise speed the vehicle returns to after a stop.
    ///
    /// Units: meters/second
    pub cruise_speed_ms: f64,

    /// Optional limit on the magnitude of the integral accumulator.
    ///
    /// When absent the accumulator is unbounded, even while the output is saturated.
    #[serde(default)]
    pub integral_limit: Option<f64>,
}

fn default_max_throttle() -> f64 {
    0.3
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.4,
            k_i: 0.56,
            k_d: 1.2,
            max_throttle: default_max_throttle(),
            cruise_speed_ms: 0.65,
            integral_limit: None,
        }
    }
}
