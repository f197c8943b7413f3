//! Simulated vehicle I/O

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::{
    eqpt::vehicle::{VehicleDems, VehicleIo, VehicleSens},
    EqptError,
};
use std::{sync::Arc, time::Instant};
use util::maths::{clamp, from_heading2, wrap_to_pi};

use super::{Params, SimWorld, Truth};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated vehicle, advancing the world's truth each time it is read.
pub struct SimVehicle {
    world: Arc<SimWorld>,
    dems: VehicleDems,
    last_read: Option<Instant>,
    released: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Advance the truth by `dt_s` under the given demands using a kinematic bicycle model.
pub fn propagate(truth: &mut Truth, dems: &VehicleDems, dt_s: f64, params: &Params) {
    let steer_rad = clamp(dems.steer_rad, -params.max_steer_rad, params.max_steer_rad);
    let pose = &mut truth.pose;

    let accel_mss = params.throttle_accel_mss * dems.throttle - params.drag_per_s * pose.speed_ms;
    pose.speed_ms += accel_mss * dt_s;

    truth.yaw_rate_rads = pose.speed_ms * steer_rad.tan() / params.wheelbase_m;
    pose.heading_rad = wrap_to_pi(pose.heading_rad + truth.yaw_rate_rads * dt_s);
    pose.position_m += from_heading2(pose.heading_rad) * pose.speed_ms * dt_s;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimVehicle {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self {
            world,
            dems: VehicleDems::zero(),
            last_read: None,
            released: false,
        }
    }
}

impl VehicleIo for SimVehicle {
    fn read(&mut self) -> Result<VehicleSens, EqptError> {
        if self.released {
            return Err(EqptError::NotConnected("simulated vehicle released".into()));
        }

        let now = Instant::now();
        let dt_s = match self.last_read {
            Some(t) => (now - t).as_secs_f64(),
            None => 0.0,
        };
        self.last_read = Some(now);

        let mut truth = self.world.lock();
        propagate(&mut truth, &self.dems, dt_s, self.world.params());

        Ok(VehicleSens {
            tach_speed_ms: truth.pose.speed_ms,
            gyro_z_rads: truth.yaw_rate_rads,
        })
    }

    fn write(&mut self, dems: &VehicleDems) -> Result<(), EqptError> {
        if self.released {
            return Err(EqptError::NotConnected("simulated vehicle released".into()));
        }

        self.dems = *dems;
        Ok(())
    }

    fn release(&mut self) -> Result<(), EqptError> {
        self.dems = VehicleDems::zero();
        self.released = true;
        Ok(())
    }
}
