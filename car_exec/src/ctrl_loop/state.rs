//! Control loop state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::{
    eqpt::{
        loc::Pose,
        vehicle::{VehicleDems, VehicleSens, NUM_LEDS},
    },
    EqptError,
};
use log::{debug, info};
use nalgebra::Vector2;
use serde::Serialize;
use util::module::State;

use super::Params;
use crate::{
    coord::CoordState,
    speed_ctrl::{self, SpeedCtrl},
    traj_ctrl::{self, TrajCtrl, TrajCtrlError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop's controllers and stop/resume state.
#[derive(Debug)]
pub struct CtrlLoop {
    params: Params,

    speed_ctrl: SpeedCtrl,

    /// Only present when steering is enabled.
    traj_ctrl: Option<TrajCtrl>,

    cruise_speed_ms: f64,

    speed_dem_ms: f64,

    /// Time the current stop was started, `None` when not stopped.
    stop_time_s: Option<f64>,

    leds: [bool; NUM_LEDS],
}

/// Monitoring quantities of a single cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub phase: Phase,

    pub speed_ms: f64,
    pub speed_dem_ms: f64,
    pub throttle: f64,
    pub steer_rad: f64,

    /// The point tracked by trajectory control.
    pub track_point_m: Vector2<f64>,

    /// Reference point and heading on the path, equal to the tracked point and pose heading when
    /// steering is disabled.
    pub ref_point_m: Vector2<f64>,
    pub ref_heading_rad: f64,

    pub segment_index: usize,

    /// Speed control report, zeroed during warmup.
    pub speed_ctrl: speed_ctrl::StatusReport,

    /// Trajectory control report, `None` during warmup or when steering is disabled.
    pub traj_ctrl: Option<traj_ctrl::StatusReport>,

    /// A stop request was consumed this cycle.
    pub stop_consumed: bool,

    /// The cruise speed was restored this cycle.
    pub resumed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phase of the control state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Before the start delay, all demands are zero.
    Warmup,

    /// Within the stop hold.
    Stopped,

    /// Driving normally.
    Driving,
}

#[derive(Debug, thiserror::Error)]
pub enum CtrlLoopError {
    #[error("Rate must be in (0, 500] Hz, found {0}")]
    InvalidRate(f64),

    #[error("Telemetry rate must be positive and finite, found {0}")]
    InvalidTmRate(f64),

    #[error("The {0} must be finite and non-negative, found {1}")]
    InvalidDuration(&'static str, f64),

    #[error("LED index {0} is out of range")]
    InvalidLed(usize),

    #[error("Steering control is enabled but no path was provided")]
    MissingPath,

    #[error("Could not initialise trajectory control: {0}")]
    TrajCtrlInitError(TrajCtrlError),

    #[error("Could not read from the vehicle: {0}")]
    VehicleReadError(EqptError),

    #[error("Could not write to the vehicle: {0}")]
    VehicleWriteError(EqptError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlLoop {
    /// Create the control loop state.
    ///
    /// `traj_ctrl` must be provided if steering is enabled, and is ignored otherwise.
    pub fn new(
        params: Params,
        speed_params: speed_ctrl::Params,
        traj_ctrl: Option<TrajCtrl>,
    ) -> Result<Self, CtrlLoopError> {
        params.validate()?;

        let traj_ctrl = match (params.steering_enabled, traj_ctrl) {
            (true, Some(t)) => Some(t),
            (true, None) => return Err(CtrlLoopError::MissingPath),
            (false, _) => None,
        };

        let cruise_speed_ms = speed_params.cruise_speed_ms;

        Ok(Self {
            params,
            speed_ctrl: SpeedCtrl::new(speed_params),
            traj_ctrl,
            cruise_speed_ms,
            speed_dem_ms: cruise_speed_ms,
            stop_time_s: None,
            leds: [false; NUM_LEDS],
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn speed_dem_ms(&self) -> f64 {
        self.speed_dem_ms
    }

    pub fn stop_time_s(&self) -> Option<f64> {
        self.stop_time_s
    }

    pub fn traj_ctrl(&self) -> Option<&TrajCtrl> {
        self.traj_ctrl.as_ref()
    }

    /// Run one cycle of the state machine at time `t_s` since the loop started.
    ///
    /// Pending stop requests in `coord` are only consumed after the start delay.
    pub fn step(
        &mut self,
        t_s: f64,
        dt_s: f64,
        sens: &VehicleSens,
        pose: &Pose,
        coord: &CoordState,
    ) -> (VehicleDems, StatusReport) {
        let track_point_m = pose.project_forward(self.params.front_axle_offset_m);

        let mut report = StatusReport {
            phase: Phase::Warmup,
            speed_ms: sens.tach_speed_ms,
            speed_dem_ms: self.speed_dem_ms,
            throttle: 0.0,
            steer_rad: 0.0,
            track_point_m,
            ref_point_m: track_point_m,
            ref_heading_rad: pose.heading_rad,
            segment_index: 0,
            speed_ctrl: speed_ctrl::StatusReport::default(),
            traj_ctrl: None,
            stop_consumed: false,
            resumed: false,
        };

        if t_s < self.params.start_delay_s {
            return (
                VehicleDems {
                    leds: self.leds,
                    ..VehicleDems::zero()
                },
                report,
            );
        }

        // ---- STOP/RESUME ----

        if coord.take_stop_request() {
            info!("Stop request consumed at {:.3} s", t_s);
            self.stop_time_s = Some(t_s);
            self.set_speed_dem(0.0, coord);
            report.stop_consumed = true;
        }

        report.phase = match self.stop_time_s {
            Some(ts) if t_s - ts < self.params.stop_hold_s => {
                self.set_speed_dem(0.0, coord);
                self.set_stopped_leds(true);
                Phase::Stopped
            }
            Some(_) => {
                info!("Stop hold elapsed at {:.3} s, resuming", t_s);
                self.stop_time_s = None;
                self.set_speed_dem(self.cruise_speed_ms, coord);
                self.set_stopped_leds(false);
                report.resumed = true;
                Phase::Driving
            }
            None => Phase::Driving,
        };

        // ---- CONTROLLERS ----

        // Neither controller can fail processing
        let (throttle, speed_report) = self
            .speed_ctrl
            .proc(&speed_ctrl::InputData {
                speed_ms: sens.tach_speed_ms,
                speed_dem_ms: self.speed_dem_ms,
                dt_s,
            })
            .unwrap_or_else(|e| match e {});
        report.speed_ctrl = speed_report;

        let steer_rad = match self.traj_ctrl {
            Some(ref mut tc) => {
                let (steer, traj_report) = tc
                    .proc(&traj_ctrl::InputData {
                        position_m: track_point_m,
                        heading_rad: pose.heading_rad,
                        speed_ms: sens.tach_speed_ms,
                    })
                    .unwrap_or_else(|e| match e {});

                if traj_report.segment_advanced {
                    debug!("TrajCtrl advanced to segment {}", traj_report.segment_index);
                }

                report.ref_point_m = tc.ref_point_m();
                report.ref_heading_rad = tc.ref_heading_rad();
                report.segment_index = traj_report.segment_index;
                report.traj_ctrl = Some(traj_report);
                steer
            }
            None => 0.0,
        };

        report.speed_dem_ms = self.speed_dem_ms;
        report.throttle = throttle;
        report.steer_rad = steer_rad;

        (
            VehicleDems {
                throttle,
                steer_rad,
                leds: self.leds,
            },
            report,
        )
    }

    fn set_speed_dem(&mut self, speed_dem_ms: f64, coord: &CoordState) {
        self.speed_dem_ms = speed_dem_ms;
        coord.set_speed_dem_ms(speed_dem_ms);
    }

    fn set_stopped_leds(&mut self, lit: bool) {
        for &i in &self.params.stopped_leds {
            self.leds[i] = lit;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_ctrl::{self, WaypointPath};
    use assert_approx_eq::assert_approx_eq;

    const DT: f64 = 0.002;

    fn params(steering_enabled: bool) -> Params {
        Params {
            start_delay_s: 1.0,
            stop_hold_s: 3.0,
            steering_enabled,
            ..Params::default()
        }
    }

    fn straight_path() -> TrajCtrl {
        let path = WaypointPath::new(
            vec![Vector2::new(0.0, 0.0), Vector2::new(50.0, 0.0)],
            false,
        )
        .unwrap();
        TrajCtrl::new(
            traj_ctrl::Params {
                path_scale: 1.0,
                cyclic: false,
                ..traj_ctrl::Params::default()
            },
            &path,
        )
        .unwrap()
    }

    fn ctrl_loop() -> CtrlLoop {
        CtrlLoop::new(
            params(true),
            speed_ctrl::Params::default(),
            Some(straight_path()),
        )
        .unwrap()
    }

    fn sens(speed: f64) -> VehicleSens {
        VehicleSens {
            tach_speed_ms: speed,
            gyro_z_rads: 0.7,
        }
    }

    #[test]
    fn test_warmup_zero_output() {
        let mut cl = ctrl_loop();
        let coord = CoordState::new(0.65);

        // Off the path, stationary and with a stop request pending
        coord.request_stop();
        let pose = Pose::new(3.0, -2.0, 1.2);

        let mut t = 0.0;
        while t < 1.0 {
            let (dems, report) = cl.step(t, DT, &sens(t * 3.0 - 1.0), &pose, &coord);
            assert_eq!(dems.throttle, 0.0);
            assert_eq!(dems.steer_rad, 0.0);
            assert_eq!(report.phase, Phase::Warmup);
            t += DT;
        }

        // Request is left for after the start delay
        assert!(coord.is_stop_requested());
        let (dems, report) = cl.step(1.0, DT, &sens(0.0), &pose, &coord);
        assert!(report.stop_consumed);
        assert!(!dems.is_zero_motion());
    }

    #[test]
    fn test_stop_and_resume() {
        let mut cl = ctrl_loop();
        let coord = CoordState::new(0.65);
        let pose = Pose::new(1.0, 0.0, 0.0);

        let (_, report) = cl.step(2.0, DT, &sens(0.6), &pose, &coord);
        assert_eq!(report.phase, Phase::Driving);
        assert_approx_eq!(report.speed_dem_ms, 0.65);

        coord.request_stop();
        let (dems, report) = cl.step(2.5, DT, &sens(0.6), &pose, &coord);
        assert!(report.stop_consumed);
        assert_eq!(report.phase, Phase::Stopped);
        assert_eq!(report.speed_dem_ms, 0.0);
        assert_eq!(cl.stop_time_s(), Some(2.5));
        assert_eq!(coord.speed_dem_ms(), 0.0);
        assert!(dems.leds[4] && dems.leds[5]);
        assert_eq!(dems.leds.iter().filter(|&&l| l).count(), 2);

        // Braking towards zero
        assert!(dems.throttle < 0.0);

        // Still held just before the hold ends
        let (_, report) = cl.step(5.49, DT, &sens(0.0), &pose, &coord);
        assert_eq!(report.phase, Phase::Stopped);

        let (dems, report) = cl.step(5.5, DT, &sens(0.0), &pose, &coord);
        assert!(report.resumed);
        assert_eq!(report.phase, Phase::Driving);
        assert_approx_eq!(cl.speed_dem_ms(), 0.65);
        assert_approx_eq!(coord.speed_dem_ms(), 0.65);
        assert!(dems.leds.iter().all(|&l| !l));
        assert_eq!(cl.stop_time_s(), None);
    }

    #[test]
    fn test_stop_during_hold_restarts_hold() {
        let mut cl = ctrl_loop();
        let coord = CoordState::new(0.65);
        let pose = Pose::new(1.0, 0.0, 0.0);

        coord.request_stop();
        cl.step(2.0, DT, &sens(0.5), &pose, &coord);
        coord.request_stop();
        cl.step(4.0, DT, &sens(0.0), &pose, &coord);

        let (_, report) = cl.step(6.5, DT, &sens(0.0), &pose, &coord);
        assert_eq!(report.phase, Phase::Stopped);

        let (_, report) = cl.step(7.0, DT, &sens(0.0), &pose, &coord);
        assert!(report.resumed);
    }

    #[test]
    fn test_front_axle_tracked() {
        let mut cl = ctrl_loop();
        let coord = CoordState::new(0.65);

        // On the path line heading along it, the front axle is still on the line
        let (dems, report) = cl.step(2.0, DT, &sens(0.5), &Pose::new(4.0, 0.0, 0.0), &coord);
        assert_approx_eq!(report.track_point_m[0], 4.2);
        assert_approx_eq!(dems.steer_rad, 0.0);

        // Rotated about the rear axle the front axle comes off the line to the left
        let (dems, report) = cl.step(2.002, DT, &sens(0.5), &Pose::new(4.0, 0.0, 0.3), &coord);
        assert!(report.track_point_m[1] > 0.0);
        assert!(dems.steer_rad < 0.0);
    }

    #[test]
    fn test_steering_disabled() {
        let mut cl = CtrlLoop::new(params(false), speed_ctrl::Params::default(), None).unwrap();
        let coord = CoordState::new(0.65);

        let (dems, report) = cl.step(2.0, DT, &sens(0.1), &Pose::new(5.0, 5.0, 2.0), &coord);
        assert_eq!(dems.steer_rad, 0.0);
        assert!(dems.throttle > 0.0);
        assert!(report.traj_ctrl.is_none());
    }

    #[test]
    fn test_controller_reports() {
        let mut cl = ctrl_loop();
        let coord = CoordState::new(0.65);
        let pose = Pose::new(4.0, 0.1, 0.0);

        let (_, report) = cl.step(0.5, DT, &sens(0.5), &pose, &coord);
        assert!(report.traj_ctrl.is_none());
        assert_eq!(report.speed_ctrl.error_ms, 0.0);

        let (_, report) = cl.step(2.0, DT, &sens(0.5), &pose, &coord);
        assert_approx_eq!(report.speed_ctrl.error_ms, 0.15);

        let traj_report = report.traj_ctrl.unwrap();
        assert_approx_eq!(traj_report.cross_track_error_m, -0.1);
        assert_eq!(traj_report.segment_index, report.segment_index);
        assert!(!traj_report.degenerate);
    }

    #[test]
    fn test_missing_path() {
        assert!(matches!(
            CtrlLoop::new(params(true), speed_ctrl::Params::default(), None),
            Err(CtrlLoopError::MissingPath)
        ));
    }
}
