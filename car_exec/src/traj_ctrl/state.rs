//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;
use serde::Serialize;
use util::{
    maths::{clamp, heading2, project2, sign, unit2, wrap_to_pi},
    module::State,
};

use super::{Params, PathError, WaypointPath};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stanley path tracker.
#[derive(Debug, Clone)]
pub struct TrajCtrl {
    params: Params,

    /// The path being tracked, with the path scale already applied.
    path: WaypointPath,

    /// Index of the current segment, always in `[0, N - 1)`.
    segment_index: usize,

    /// Total number of segment advances since the start.
    num_advances: u64,

    /// Last point on the path the vehicle was projected onto.
    ref_point_m: Vector2<f64>,

    /// Tangent heading of the last tracked segment.
    ref_heading_rad: f64,
}

/// Input data to trajectory control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Position of the tracking point (normally the front axle).
    pub position_m: Vector2<f64>,

    /// Vehicle heading.
    pub heading_rad: f64,

    /// Vehicle longitudinal speed.
    pub speed_ms: f64,
}

/// The status report containing monitoring quantities of the last update.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Signed cross-track error, positive when the vehicle is to the right of the path.
    pub cross_track_error_m: f64,

    /// Heading error between the segment tangent and the vehicle heading.
    pub head_error_rad: f64,

    /// Index of the segment being tracked after this update.
    pub segment_index: usize,

    /// True if the vehicle moved onto a new segment in this update.
    pub segment_advanced: bool,

    /// True if the update produced no steering because of a degenerate segment or input.
    pub degenerate: bool,

    /// True if the demand was limited by the steering bound.
    pub steer_limited: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur while initialising trajectory control.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Invalid path: {0}")]
    InvalidPath(PathError),

    #[error("Path scale must be finite and positive, found {0}")]
    InvalidPathScale(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    /// Create a tracker for the given path.
    ///
    /// The path scale from the parameters is applied here, and the path's own cyclic flag is
    /// overridden by the parameters.
    pub fn new(params: Params, path: &WaypointPath) -> Result<Self, TrajCtrlError> {
        if !(params.path_scale.is_finite() && params.path_scale > 0.0) {
            return Err(TrajCtrlError::InvalidPathScale(params.path_scale));
        }

        let path = WaypointPath::new(
            path.scaled(params.path_scale).points().to_vec(),
            params.cyclic,
        )
        .map_err(TrajCtrlError::InvalidPath)?;

        let ref_point_m = path.points()[0];

        Ok(Self {
            params,
            path,
            segment_index: 0,
            num_advances: 0,
            ref_point_m,
            ref_heading_rad: 0.0,
        })
    }

    /// Calculate the steering demand for the given tracking point, heading and speed.
    pub fn update(&mut self, position_m: Vector2<f64>, heading_rad: f64, speed_ms: f64) -> f64 {
        self.update_with_report(position_m, heading_rad, speed_ms).0
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn num_advances(&self) -> u64 {
        self.num_advances
    }

    pub fn ref_point_m(&self) -> Vector2<f64> {
        self.ref_point_m
    }

    pub fn ref_heading_rad(&self) -> f64 {
        self.ref_heading_rad
    }

    pub fn path(&self) -> &WaypointPath {
        &self.path
    }

    fn update_with_report(
        &mut self,
        position_m: Vector2<f64>,
        heading_rad: f64,
        speed_ms: f64,
    ) -> (f64, StatusReport) {
        let mut report = StatusReport {
            segment_index: self.segment_index,
            ..Default::default()
        };

        // A malformed pose gives no steering for this cycle only
        if !(position_m[0].is_finite()
            && position_m[1].is_finite()
            && heading_rad.is_finite()
            && speed_ms.is_finite())
        {
            report.degenerate = true;
            return (0.0, report);
        }

        let (wp_1, wp_2) = self.path.get_segment(self.segment_index);
        let seg = wp_2 - wp_1;
        let seg_len_m = seg.norm();

        // Zero length segments can't be tracked, give no steering. Only projection progress moves
        // the index on.
        let seg_dir = match unit2(&seg) {
            Some(d) => d,
            None => {
                report.degenerate = true;
                return (0.0, report);
            }
        };

        let tangent_rad = heading2(&seg_dir);

        // Distance along the segment of the vehicle's projection
        let s = project2(&position_m, &wp_1, &seg_dir);

        if s >= seg_len_m {
            report.segment_advanced = self.advance();
        }
        report.segment_index = self.segment_index;

        // Cross-track error, the sign is given by which side of the tangent the error vector
        // from the vehicle to the path points
        let proj_m = wp_1 + seg_dir * s;
        let ct = proj_m - position_m;
        let ct_dir = wrap_to_pi(heading2(&ct) - tangent_rad);
        let cross_track_error_m = ct.norm() * sign(ct_dir);

        let head_error_rad = wrap_to_pi(tangent_rad - heading_rad);

        self.ref_point_m = proj_m;
        self.ref_heading_rad = tangent_rad;

        let raw = wrap_to_pi(
            head_error_rad + (self.params.k_stanley * cross_track_error_m).atan2(speed_ms),
        );
        let max = self.params.max_steer_rad.abs();
        let steer_rad = clamp(raw, -max, max);

        report.cross_track_error_m = cross_track_error_m;
        report.head_error_rad = head_error_rad;
        report.steer_limited = steer_rad != raw;

        trace!(
            "TrajCtrl seg {} s {:.3} ect {:.3} psi {:.3} steer {:.3}",
            self.segment_index,
            s,
            cross_track_error_m,
            head_error_rad,
            steer_rad
        );

        (steer_rad, report)
    }

    /// Move to the next segment, wrapping on cyclic paths and holding the final segment on open
    /// ones. Returns true if the index changed.
    fn advance(&mut self) -> bool {
        let num_segs = self.path.get_num_segments();

        if self.path.is_cyclic() {
            self.segment_index = (self.segment_index + 1) % num_segs;
            self.num_advances += 1;
            true
        } else if self.segment_index + 1 < num_segs {
            self.segment_index += 1;
            self.num_advances += 1;
            true
        } else {
            false
        }
    }
}

impl State for TrajCtrl {
    type InitData = (Params, WaypointPath);
    type InitError = TrajCtrlError;

    type InputData = InputData;
    type OutputData = f64;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        Self::new(init_data.0, &init_data.1)
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        Ok(self.update_with_report(
            input_data.position_m,
            input_data.heading_rad,
            input_data.speed_ms,
        ))
    }
}
