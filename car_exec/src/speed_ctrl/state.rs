//! Speed control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::convert::Infallible;
use util::{maths::clamp, module::State};

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID speed regulator with a saturated output.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedCtrl {
    #[serde(skip)]
    params: Params,

    /// Previous speed error
    prev_error_ms: f64,

    /// The integral accumulation
    integral: f64,
}

/// Input data to speed control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// Measured speed
    pub speed_ms: f64,

    /// Demanded speed
    pub speed_dem_ms: f64,

    /// Time since the previous update
    pub dt_s: f64,
}

/// Status report for speed control processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Speed error this cycle
    pub error_ms: f64,

    /// Value of the integral accumulator after this cycle
    pub integral: f64,

    /// True if the output was limited by the throttle bound
    pub throttle_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SpeedCtrl {
    /// Create a new controller from the parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            prev_error_ms: 0.0,
            integral: 0.0,
        }
    }

    /// Get the throttle demand for the measured speed and the setpoint.
    ///
    /// The previous error is updated on every call, and the integral accumulates even while the
    /// output is saturated unless an integral limit is configured.
    pub fn update(&mut self, speed_ms: f64, speed_dem_ms: f64, dt_s: f64) -> f64 {
        self.update_with_report(speed_ms, speed_dem_ms, dt_s).0
    }

    /// Current value of the integral accumulator.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    fn update_with_report(
        &mut self,
        speed_ms: f64,
        speed_dem_ms: f64,
        dt_s: f64,
    ) -> (f64, StatusReport) {
        let error = speed_dem_ms - speed_ms;

        self.integral += error * dt_s;
        if let Some(limit) = self.params.integral_limit {
            self.integral = clamp(self.integral, -limit.abs(), limit.abs());
        }

        let deriv = error - self.prev_error_ms;
        self.prev_error_ms = error;

        let raw = self.params.k_p * error + self.params.k_i * self.integral + self.params.k_d * deriv;

        let max = self.params.max_throttle.abs();
        let throttle = clamp(raw, -max, max);

        let report = StatusReport {
            error_ms: error,
            integral: self.integral,
            throttle_limited: throttle != raw,
        };

        (throttle, report)
    }
}

impl State for SpeedCtrl {
    type InitData = Params;
    type InitError = Infallible;

    type InputData = InputData;
    type OutputData = f64;
    type StatusReport = StatusReport;
    type ProcError = Infallible;

    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        Ok(Self::new(init_data))
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        Ok(self.update_with_report(
            input_data.speed_ms,
            input_data.speed_dem_ms,
            input_data.dt_s,
        ))
    }
}
