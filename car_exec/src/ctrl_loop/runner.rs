//! Control loop task runner

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::eqpt::{
    gps::Gps,
    loc::{EstInputs, PoseEstimator},
    tm::TmSink,
    vehicle::{VehicleDems, VehicleIo},
};
use log::{error, info, warn};
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use super::{CtrlLoop, CtrlLoopError};
use crate::{coord::CoordState, tm::CtrlTm};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Equipment used by the control loop.
pub struct CtrlEqpt {
    pub vehicle: Box<dyn VehicleIo>,

    /// Not needed when steering is disabled.
    pub gps: Option<Box<dyn Gps>>,

    pub estimator: Box<dyn PoseEstimator>,
}

/// Summary of a completed control loop run.
#[derive(Debug, Clone, Copy)]
pub struct CtrlRunSummary {
    pub exit_reason: CtrlExitReason,
    pub num_cycles: u64,
    pub num_overruns: u64,
    pub num_stops: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlExitReason {
    /// The experiment duration elapsed.
    DurationElapsed,

    /// The terminate flag was raised.
    Terminated,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the control loop until the experiment duration elapses, the terminate flag is raised or a
/// vehicle I/O error occurs.
///
/// Whatever the exit path a zero demand is written to the vehicle and the vehicle released before
/// returning, and the terminate flag is raised so that the perception loop also exits.
pub fn run_ctrl_loop(
    mut ctrl: CtrlLoop,
    mut eqpt: CtrlEqpt,
    coord: Arc<CoordState>,
    tm_sink: &mut dyn TmSink<CtrlTm>,
) -> Result<CtrlRunSummary, CtrlLoopError> {
    let params = ctrl.params().clone();
    let period = Duration::from_secs_f64(params.period_s());
    let end_s = params.duration_s + params.start_delay_s;
    let tm_decimation = params.tm_decimation();

    let mut summary = CtrlRunSummary {
        exit_reason: CtrlExitReason::Terminated,
        num_cycles: 0,
        num_overruns: 0,
        num_stops: 0,
    };
    let mut num_consec_overruns = 0u64;
    let mut tm_count = 0u64;
    let mut prev_t_s = 0.0;
    let mut last_dems = VehicleDems::zero();

    info!(
        "Control loop starting at {} Hz for {:.1} s",
        params.rate_hz, end_s
    );

    let start_instant = Instant::now();

    let result = loop {
        let cycle_start_instant = Instant::now();
        let t_s = (cycle_start_instant - start_instant).as_secs_f64();
        let dt_s = t_s - prev_t_s;
        prev_t_s = t_s;

        if coord.is_terminated() {
            info!("Terminate flag set, stopping control loop");
            break Ok(CtrlExitReason::Terminated);
        }

        if t_s >= end_s {
            info!("Experiment duration elapsed");
            break Ok(CtrlExitReason::DurationElapsed);
        }

        // ---- SENSING ----

        let sens = match eqpt.vehicle.read() {
            Ok(s) => s,
            Err(e) => break Err(CtrlLoopError::VehicleReadError(e)),
        };

        let gps_fix = eqpt.gps.as_mut().and_then(|g| g.poll());

        let mut pose = eqpt.estimator.update(
            &EstInputs {
                tach_speed_ms: sens.tach_speed_ms,
                steer_rad: last_dems.steer_rad,
            },
            dt_s,
            gps_fix.as_ref(),
            sens.gyro_z_rads,
        );
        pose.speed_ms = sens.tach_speed_ms;

        // ---- CONTROL ----

        let (dems, report) = ctrl.step(t_s, dt_s, &sens, &pose, &coord);

        if report.stop_consumed {
            summary.num_stops += 1;
        }

        if let Err(e) = eqpt.vehicle.write(&dems) {
            break Err(CtrlLoopError::VehicleWriteError(e));
        }
        last_dems = dems;

        // ---- TELEMETRY ----

        tm_count += 1;
        if tm_count >= tm_decimation && t_s > params.start_delay_s {
            let tm = CtrlTm::new(t_s - params.start_delay_s, &pose, &report);
            if let Err(e) = tm_sink.send(&tm) {
                warn!("Could not send control telemetry: {}", e);
            }
            tm_count = 0;
        }

        // ---- CYCLE MANAGEMENT ----

        summary.num_cycles += 1;

        let cycle_dur = Instant::now() - cycle_start_instant;

        match period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_overruns = 0;
                thread::sleep(d);
            }
            None => {
                num_consec_overruns += 1;
                summary.num_overruns += 1;
                warn!(
                    "Control cycle overran by {:.06} s ({} consecutive)",
                    cycle_dur.as_secs_f64() - period.as_secs_f64(),
                    num_consec_overruns
                );
            }
        }
    };

    // ---- SHUTDOWN ----

    if let Err(ref e) = result {
        error!("Control loop failed: {}", e);
    }

    coord.terminate();

    if let Err(e) = eqpt.vehicle.write(&VehicleDems::zero()) {
        error!("Could not write the final zero demand: {}", e);
    }
    if let Err(e) = eqpt.vehicle.release() {
        error!("Could not release the vehicle: {}", e);
    }

    info!(
        "Control loop stopped after {} cycles ({} overruns, {} stops)",
        summary.num_cycles, summary.num_overruns, summary.num_stops
    );

    result.map(|exit_reason| CtrlRunSummary {
        exit_reason,
        ..summary
    })
}
