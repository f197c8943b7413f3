//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Stanley cross-track gain
    pub k_stanley: f64,

    /// Limit on the magnitude of the steering demand.
    ///
    /// Units: radians
    #[serde(default = "default_max_steer_rad")]
    pub max_steer_rad: f64,

    /// Uniform scale applied to every waypoint, insetting the path from the track edges.
    #[serde(default = "default_path_scale")]
    pub path_scale: f64,

    /// If true the path is treated as a closed loop and the segment index wraps.
    #[serde(default = "default_cyclic")]
    pub cyclic: bool,
}

fn default_max_steer_rad() -> f64 {
    std::f64::consts::FRAC_PI_6
}

fn default_path_scale() -> f64 {
    0.98
}

fn default_cyclic() -> bool {
    true
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_stanley: 1.0,
            max_steer_rad: default_max_steer_rad(),
            path_scale: default_path_scale(),
            cyclic: default_cyclic(),
        }
    }
}
