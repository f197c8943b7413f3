//! # Speed control module
//!
//! Speed control regulates the vehicle's longitudinal speed to a setpoint using a PID controller
//! acting on the speed error, with the output saturated to the throttle limit.
//!
//! The controller assumes a fixed step: the derivative term is the raw difference between
//! successive errors and is not divided by the cycle time, while the integral term is accumulated
//! as `error * dt`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;
