//! # Car library.
//!
//! This library allows the executable, benchmarks and other crates in the workspace to access items
//! defined inside the car crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Coordination state - the flags and speed demand shared by the control and perception loops
pub mod coord;

/// Control loop - fixed rate task running speed and trajectory control
pub mod ctrl_loop;

/// Executable parameters
pub mod params;

/// Perception module - turns detections into stop decisions
pub mod per;

/// Perception loop - asynchronous task publishing stop requests
pub mod per_loop;

/// Simulated equipment - lets the executable run without the vehicle
pub mod sim;

/// Speed control module - PID regulation of the vehicle's speed
pub mod speed_ctrl;

/// Telemetry records and archiving
pub mod tm;

/// Trajectory control module - keeps the vehicle on the path
pub mod traj_ctrl;
