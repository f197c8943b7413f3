//! # Trajectory control module
//!
//! Trajectory control keeps the vehicle on the reference path using the Stanley steering law.
//!
//! The path is a sequence of waypoints in the map frame, each joined to the next to form a
//! segment. The controller tracks one segment at a time, advancing to the next segment once the
//! vehicle's projection onto the current one passes its end. On cyclic paths the segment index
//! wraps around so the vehicle laps the path indefinitely.
//!
//! Each cycle the steering demand is the sum of two terms:
//!
//! - the heading error, the difference between the segment's tangent and the vehicle heading, and
//! - the cross-track term `atan2(k * e, v)`, where `e` is the signed perpendicular distance from
//!   the path to the vehicle and `v` its speed.
//!
//! The sum is wrapped to `[-pi, pi)` and saturated to the steering limit.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
pub mod path;
pub mod road_map;
pub mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use path::*;
pub use road_map::*;
pub use state::*;
