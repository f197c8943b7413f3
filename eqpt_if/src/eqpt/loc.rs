//! # Localisation Interface
//!
//! The pose estimator fuses the control inputs, gyroscope and optional GPS fix into a planar pose.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::gps::GpsFix;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Estimated planar pose and longitudinal speed of the vehicle.
///
/// A snapshot taken once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in the map frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// Angle of the vehicle's forward axis to the map X axis.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Longitudinal speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,
}

/// Control inputs applied during the last cycle, used by the estimator's motion model.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct EstInputs {
    /// Speed from the tachometer.
    pub tach_speed_ms: f64,

    /// Steering angle demanded on the previous cycle.
    pub steer_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A pose estimator, for example an extended Kalman filter.
pub trait PoseEstimator: Send {
    /// Advance the estimate by `dt_s`, correcting with `gps_fix` if one is available and falling
    /// back to dead reckoning otherwise.
    fn update(
        &mut self,
        inputs: &EstInputs,
        dt_s: f64,
        gps_fix: Option<&GpsFix>,
        gyro_z_rads: f64,
    ) -> Pose;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad,
            speed_ms: 0.0,
        }
    }

    /// Unit vector pointing along the vehicle's heading.
    pub fn forward2(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// The point `offset_m` ahead of the pose along its heading.
    pub fn project_forward(&self, offset_m: f64) -> Vector2<f64> {
        self.position_m + self.forward2() * offset_m
    }
}
