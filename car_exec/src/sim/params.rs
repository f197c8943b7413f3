//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated world
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Acceleration produced by a unit throttle demand.
    ///
    /// Units: meters/second^2
    pub throttle_accel_mss: f64,

    /// Linear drag coefficient, deceleration per unit speed.
    ///
    /// Units: 1/second
    pub drag_per_s: f64,

    /// Mechanical steering limit.
    ///
    /// Units: radians
    pub max_steer_rad: f64,

    /// Period between GPS fixes.
    ///
    /// Units: seconds
    pub gps_period_s: f64,

    /// Camera frame rate.
    ///
    /// Units: Hertz
    pub cam_fps: f64,

    pub cam_width: u32,
    pub cam_height: u32,

    /// Horizontal field of view of the camera.
    ///
    /// Units: radians
    pub cam_fov_rad: f64,

    /// Maximum distance at which objects are detected.
    ///
    /// Units: meters
    pub cam_range_m: f64,

    /// Apparent side length of an object at a distance of one meter, objects shrink with the
    /// inverse of their distance.
    ///
    /// Units: pixels
    pub obj_size_px: f64,

    /// Confidence reported for simulated detections.
    #[serde(default = "default_confidence")]
    pub detection_confidence: f32,

    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

/// A traffic light or stop sign placed in the world.
#[derive(Deserialize, Debug, Clone)]
pub struct Landmark {
    pub kind: LandmarkKind,

    pub x_m: f64,
    pub y_m: f64,

    /// Time a light spends green in each cycle.
    ///
    /// Units: seconds
    #[serde(default)]
    pub green_s: f64,

    /// Time a light spends red in each cycle.
    ///
    /// Units: seconds
    #[serde(default)]
    pub red_s: f64,

    /// Offset of the light's cycle from the start of the simulation.
    ///
    /// Units: seconds
    #[serde(default)]
    pub offset_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    TrafficLight,
    StopSign,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

fn default_confidence() -> f32 {
    0.9
}

impl Default for Params {
    fn default() -> Self {
        Self {
            wheelbase_m: 0.256,
            throttle_accel_mss: 8.0,
            drag_per_s: 2.0,
            max_steer_rad: 0.5,
            gps_period_s: 0.1,
            cam_fps: 30.0,
            cam_width: 320,
            cam_height: 240,
            cam_fov_rad: 1.2,
            cam_range_m: 3.0,
            obj_size_px: 25.0,
            detection_confidence: default_confidence(),
            landmarks: Vec::new(),
        }
    }
}
