//! # Perception module
//!
//! Perception turns the detections in a camera frame into a pass/stop decision. For each frame:
//!
//! 1. The first detection the detector returns is taken, if it is a traffic light or a stop sign.
//! 2. The proximity of the object is estimated from the ratio of its box area to the frame area.
//! 3. Traffic lights are cropped out and classified as green or red by comparing the brightness of
//!    lit and unlit lamp colour masks. Stop signs are always labelled stop.
//! 4. The label and proximity are passed through the stop decision policy, a two state machine
//!    with separate entry and exit thresholds on the proximity.
//!
//! [`PerMgr`] owns these stages and gates publication of stop requests with a minimum re-trigger
//! interval.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod colour;
pub mod params;
pub mod per_mgr;
pub mod proximity;
pub mod scene_class;
pub mod stop_policy;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use per_mgr::*;
pub use proximity::proximity_ratio;
pub use scene_class::{SceneClassifier, SceneLabel};
pub use stop_policy::{DecisionState, StopPolicy};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Errors raised while setting up perception.
#[derive(Debug, thiserror::Error)]
pub enum PerError {
    #[error("Invalid hex colour string {0:?}")]
    InvalidHexColour(String),

    #[error("The exit proximity threshold ({exit}) must not exceed the entry threshold ({entry})")]
    InvalidThresholds { entry: f64, exit: f64 },

    #[error("The {0} must be finite and non-negative, found {1}")]
    InvalidDuration(&'static str, f64),

    #[error("The detector confidence floor must be in [0, 1], found {0}")]
    InvalidConfidence(f32),
}
