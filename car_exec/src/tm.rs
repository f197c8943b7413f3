//! # Telemetry
//!
//! Telemetry records sampled by the control and perception loops, and a sink archiving them to CSV
//! in the session directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::{
    eqpt::{loc::Pose, tm::TmSink},
    EqptError,
};
use serde::Serialize;
use std::marker::PhantomData;
use util::archive::{ArchiveError, Archiver};
use util::session::Session;

use crate::{
    ctrl_loop::{Phase, StatusReport as CtrlReport},
    per::{DecisionState, Evaluation, SceneLabel},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single control loop telemetry sample.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CtrlTm {
    /// Time since the end of the start delay.
    pub time_s: f64,
    pub speed_ms: f64,
    pub speed_dem_ms: f64,
    pub speed_error_ms: f64,
    pub throttle: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub ref_x_m: f64,
    pub ref_y_m: f64,
    pub heading_rad: f64,
    pub ref_heading_rad: f64,
    pub steer_rad: f64,
    pub cross_track_error_m: f64,
    pub segment_index: usize,
    pub stopped: bool,
}

/// A single perception decision record.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PerTm {
    pub time_s: f64,
    pub class_id: u32,
    pub confidence: f32,
    pub proximity: f64,
    pub label: SceneLabel,
    pub decision: DecisionState,
    pub published: bool,

    /// Speed setpoint shared by the control loop when the record was made.
    pub speed_dem_ms: f64,
}

/// Telemetry sink writing each record as a row of a CSV archive.
pub struct ArchTmSink<T> {
    archiver: Archiver,
    _record: PhantomData<fn(&T)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlTm {
    pub fn new(time_s: f64, pose: &Pose, report: &CtrlReport) -> Self {
        Self {
            time_s,
            speed_ms: report.speed_ms,
            speed_dem_ms: report.speed_dem_ms,
            speed_error_ms: report.speed_ctrl.error_ms,
            throttle: report.throttle,
            x_m: pose.position_m[0],
            y_m: pose.position_m[1],
            ref_x_m: report.ref_point_m[0],
            ref_y_m: report.ref_point_m[1],
            heading_rad: pose.heading_rad,
            ref_heading_rad: report.ref_heading_rad,
            steer_rad: report.steer_rad,
            cross_track_error_m: report
                .traj_ctrl
                .map(|r| r.cross_track_error_m)
                .unwrap_or(0.0),
            segment_index: report.segment_index,
            stopped: report.phase == Phase::Stopped,
        }
    }
}

impl PerTm {
    pub fn new(time_s: f64, eval: &Evaluation, published: bool, speed_dem_ms: f64) -> Self {
        Self {
            time_s,
            class_id: eval.class.id(),
            confidence: eval.confidence,
            proximity: eval.proximity,
            label: eval.label,
            decision: eval.decision,
            published,
            speed_dem_ms,
        }
    }
}

impl<T> ArchTmSink<T> {
    /// Create a sink archiving to `path` within the session's archive directory.
    pub fn new(session: &Session, path: &str) -> Result<Self, ArchiveError> {
        Ok(Self::from_archiver(Archiver::from_path(session, path)?))
    }

    pub fn from_archiver(archiver: Archiver) -> Self {
        Self {
            archiver,
            _record: PhantomData,
        }
    }
}

impl<T: Serialize> TmSink<T> for ArchTmSink<T> {
    fn send(&mut self, tm: &T) -> Result<(), EqptError> {
        self.archiver
            .serialise(tm)
            .map_err(|e| EqptError::IoFailure(e.to_string()))
    }
}
