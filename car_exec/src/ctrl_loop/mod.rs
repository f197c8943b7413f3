//! # Control loop
//!
//! The fixed rate control task. Each cycle it reads the vehicle sensors, updates the pose estimate,
//! runs speed and trajectory control through the stop/resume state machine and writes the demands
//! to the vehicle.
//!
//! The state machine, over the time `t` since the loop started:
//!
//! - while `t` is less than the start delay all demands are zero, giving the estimator time to
//!   settle,
//! - after the start delay a pending stop request is consumed, recording the stop time and setting
//!   the speed demand to zero,
//! - for the stop hold after a stop the speed demand is held at zero and the stopped LEDs are lit,
//! - once the hold has elapsed the cruise speed demand is restored and the LEDs cleared.
//!
//! Speed and trajectory control run on every cycle after the start delay, so the vehicle is braked
//! to zero speed rather than coasting during a stop.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use runner::*;
pub use state::*;
