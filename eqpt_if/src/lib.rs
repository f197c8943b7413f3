//! # Equipment interface crate.
//!
//! Provides the data structures and driver traits that make up the boundary between the vehicle
//! software and its external collaborators: the vehicle I/O board, the GPS, the pose estimator,
//! the camera, the object detector and the telemetry sink.
//!
//! Drivers for real hardware implement these traits outside of this workspace, the `car_exec`
//! crate provides simulated implementations.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Equipment data structures and driver traits
pub mod eqpt;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use eqpt::EqptError;
