//! # Vehicle I/O Interface
//!
//! The vehicle I/O driver reads the tachometer and gyroscope and writes the throttle, steering and
//! LED demands. Both are called once per control cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of LEDs driven by the I/O board.
pub const NUM_LEDS: usize = 8;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sensor readings from the vehicle.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct VehicleSens {
    /// Longitudinal speed measured by the motor tachometer.
    ///
    /// Units: meters/second
    pub tach_speed_ms: f64,

    /// Yaw rate from the gyroscope.
    ///
    /// Units: radians/second
    pub gyro_z_rads: f64,
}

/// Demands written to the vehicle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleDems {
    /// Normalised throttle demand.
    pub throttle: f64,

    /// Steering angle demand.
    ///
    /// Units: radians
    pub steer_rad: f64,

    /// LED states, `true` is lit.
    pub leds: [bool; NUM_LEDS],
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Driver for the vehicle's I/O board.
pub trait VehicleIo: Send {
    /// Read the latest sensor values.
    fn read(&mut self) -> Result<VehicleSens, EqptError>;

    /// Write demands to the actuators.
    fn write(&mut self, dems: &VehicleDems) -> Result<(), EqptError>;

    /// Release the underlying hardware handles. Called exactly once, after the final write.
    fn release(&mut self) -> Result<(), EqptError> {
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleDems {
    /// Demands commanding zero throttle and zero steering with all LEDs off.
    pub fn zero() -> Self {
        Self::default()
    }

    /// True if both throttle and steering are exactly zero.
    pub fn is_zero_motion(&self) -> bool {
        self.throttle == 0.0 && self.steer_rad == 0.0
    }
}
