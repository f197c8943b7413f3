//! Control loop parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::CtrlLoopError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Highest control rate the vehicle I/O supports.
pub const MAX_RATE_HZ: f64 = 500.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control loop
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Duration of the experiment, not including the start delay.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Time at the start of the run during which all demands are zero.
    ///
    /// Units: seconds
    pub start_delay_s: f64,

    /// Target rate of the loop, at most [`MAX_RATE_HZ`].
    ///
    /// Units: Hertz
    pub rate_hz: f64,

    /// Rate at which telemetry is sampled.
    ///
    /// Units: Hertz
    #[serde(default = "default_tm_rate_hz")]
    pub tm_rate_hz: f64,

    /// Time the speed demand is held at zero after a stop request.
    ///
    /// Units: seconds
    pub stop_hold_s: f64,

    /// If false no path is tracked and the steering demand is always zero.
    pub steering_enabled: bool,

    /// Distance ahead of the estimated position of the point tracked by trajectory control.
    ///
    /// Units: meters
    #[serde(default = "default_front_axle_offset_m")]
    pub front_axle_offset_m: f64,

    /// Indexes of the LEDs lit while stopped.
    #[serde(default = "default_stopped_leds")]
    pub stopped_leds: Vec<usize>,
}

fn default_tm_rate_hz() -> f64 {
    10.0
}

fn default_front_axle_offset_m() -> f64 {
    0.2
}

fn default_stopped_leds() -> Vec<usize> {
    vec![4, 5]
}

impl Params {
    pub fn validate(&self) -> Result<(), CtrlLoopError> {
        if !(self.rate_hz > 0.0 && self.rate_hz <= MAX_RATE_HZ) {
            return Err(CtrlLoopError::InvalidRate(self.rate_hz));
        }

        if !(self.tm_rate_hz > 0.0 && self.tm_rate_hz.is_finite()) {
            return Err(CtrlLoopError::InvalidTmRate(self.tm_rate_hz));
        }

        for &(name, value) in &[
            ("duration", self.duration_s),
            ("start delay", self.start_delay_s),
            ("stop hold", self.stop_hold_s),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CtrlLoopError::InvalidDuration(name, value));
            }
        }

        if let Some(&i) = self
            .stopped_leds
            .iter()
            .find(|&&i| i >= eqpt_if::eqpt::vehicle::NUM_LEDS)
        {
            return Err(CtrlLoopError::InvalidLed(i));
        }

        Ok(())
    }

    /// Period of one cycle.
    ///
    /// Units: seconds
    pub fn period_s(&self) -> f64 {
        1.0 / self.rate_hz
    }

    /// Number of cycles between telemetry samples.
    pub fn tm_decimation(&self) -> u64 {
        ((self.rate_hz / self.tm_rate_hz).round() as u64).max(1)
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            duration_s: 3000.0,
            start_delay_s: 1.0,
            rate_hz: MAX_RATE_HZ,
            tm_rate_hz: default_tm_rate_hz(),
            stop_hold_s: 3.0,
            steering_enabled: true,
            front_axle_offset_m: default_front_axle_offset_m(),
            stopped_leds: default_stopped_leds(),
        }
    }
}
