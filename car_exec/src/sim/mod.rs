//! # Simulated equipment
//!
//! A simple simulated world letting the executable run without the vehicle. All simulated
//! equipment shares a [`SimWorld`] holding the true vehicle state:
//!
//! - [`SimVehicle`] integrates a kinematic bicycle model from the written demands,
//! - [`SimGps`] reports the true pose at a fixed period,
//! - [`DeadReckoner`] is a stand-in pose estimator snapping to GPS fixes and dead reckoning from
//!   the tachometer and gyroscope in between,
//! - [`SimCamera`] renders traffic lights and stop signs placed in the world, and [`SimDetector`]
//!   reports their bounding boxes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod estimator;
mod gps;
pub mod params;
mod scene;
mod vehicle;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use estimator::DeadReckoner;
pub use gps::SimGps;
pub use params::{Landmark, LandmarkKind, Params};
pub use scene::{render, visible_object, LightState, SceneObject, SimCamera, SimDetector};
pub use vehicle::{propagate, SimVehicle};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::eqpt::loc::Pose;
use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// True state of the simulated vehicle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Truth {
    pub pose: Pose,

    /// Units: radians/second
    pub yaw_rate_rads: f64,
}

/// The simulated world shared by all simulated equipment.
#[derive(Debug)]
pub struct SimWorld {
    params: Params,
    truth: Mutex<Truth>,
    start_instant: Instant,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimWorld {
    pub fn new(params: Params, initial_pose: Pose) -> Self {
        Self {
            params,
            truth: Mutex::new(Truth {
                pose: initial_pose,
                yaw_rate_rads: 0.0,
            }),
            start_instant: Instant::now(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Time since the world was created.
    pub fn elapsed_s(&self) -> f64 {
        self.start_instant.elapsed().as_secs_f64()
    }

    /// Snapshot of the true state.
    pub fn truth(&self) -> Truth {
        *self.lock()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Truth> {
        // A panic in another simulated driver doesn't invalidate the truth
        match self.truth.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
