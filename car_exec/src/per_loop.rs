//! # Perception loop
//!
//! The asynchronous perception task. Runs as fast as the camera delivers frames, passing each frame
//! through the detector and the perception manager and publishing stop requests to the control
//! loop.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::{
    eqpt::{cam::Camera, detect::Detector, tm::TmSink},
    EqptError,
};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::{sync::Arc, thread, time::Duration, time::Instant};
use util::{module::State, time::interruptible_sleep};

use crate::{
    coord::CoordState,
    per::{self, PerMgr},
    tm::PerTm,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Longest time the hold sleep waits before checking the terminate flag.
const HOLD_SLICE_S: f64 = 0.05;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the perception loop task.
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Number of consecutive camera or detector errors tolerated before the loop fails.
    pub max_consec_eqpt_errors: u64,

    /// Wait after a camera or detector error before trying again.
    ///
    /// Units: seconds
    pub error_retry_s: f64,
}

/// Equipment used by the perception loop.
pub struct PerEqpt {
    pub camera: Box<dyn Camera>,
    pub detector: Box<dyn Detector>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerRunSummary {
    pub num_frames: u64,
    pub num_evaluations: u64,
    pub num_publications: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PerLoopError {
    #[error("Too many consecutive camera errors, last was: {0}")]
    CameraError(EqptError),

    #[error("Too many consecutive detector errors, last was: {0}")]
    DetectorError(EqptError),

    #[error("The equipment error retry wait must be finite and non-negative, found {0}")]
    InvalidRetryWait(f64),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn validate(&self) -> Result<(), PerLoopError> {
        if !(self.error_retry_s.is_finite() && self.error_retry_s >= 0.0) {
            return Err(PerLoopError::InvalidRetryWait(self.error_retry_s));
        }

        Ok(())
    }
}

/// Run the perception loop until the terminate flag is raised or the equipment error budget is
/// exhausted, in which case the terminate flag is raised.
///
/// Invalid parameters also raise the terminate flag, before any frame is read.
pub fn run_per_loop(
    mut mgr: PerMgr,
    mut eqpt: PerEqpt,
    params: &Params,
    coord: Arc<CoordState>,
    tm_sink: &mut dyn TmSink<PerTm>,
) -> Result<PerRunSummary, PerLoopError> {
    if let Err(e) = params.validate() {
        error!("Perception loop not started: {}", e);
        coord.terminate();
        return Err(e);
    }

    let mut summary = PerRunSummary::default();
    let mut num_consec_errors = 0u64;
    let class_filter = mgr.params().class_filter.clone();
    let conf_floor = mgr.params().conf_floor;
    let hold_s = mgr.params().hold_duration_s;

    info!("Perception loop starting");

    let start_instant = Instant::now();

    let result = loop {
        if coord.is_terminated() {
            break Ok(());
        }

        // ---- ACQUISITION ----

        let detections = eqpt
            .camera
            .read_frame()
            .map_err(PerLoopError::CameraError)
            .and_then(|frame| {
                eqpt.detector
                    .infer(&frame.image, &class_filter, conf_floor)
                    .map(|dets| (frame, dets))
                    .map_err(PerLoopError::DetectorError)
            });

        let (frame, detections) = match detections {
            Ok(fd) => {
                num_consec_errors = 0;
                fd
            }
            Err(e) => {
                num_consec_errors += 1;
                if num_consec_errors > params.max_consec_eqpt_errors {
                    break Err(e);
                }
                warn!(
                    "Perception equipment error ({} consecutive): {}",
                    num_consec_errors, e
                );
                thread::sleep(Duration::from_secs_f64(params.error_retry_s));
                continue;
            }
        };

        summary.num_frames += 1;

        // ---- DECISION ----

        let now_s = start_instant.elapsed().as_secs_f64();
        let (output, report) = mgr
            .proc(&per::InputData {
                frame,
                detections,
                now_s,
            })
            .unwrap_or_else(|e| match e {});

        if report.num_detections > 0 && !report.qualified {
            debug!(
                "First of {} detections did not qualify for evaluation",
                report.num_detections
            );
        }

        if let Some(ref eval) = output.evaluation {
            summary.num_evaluations += 1;
            let tm = PerTm::new(now_s, eval, output.publish_stop, coord.speed_dem_ms());
            if let Err(e) = tm_sink.send(&tm) {
                warn!("Could not send perception telemetry: {}", e);
            }
        }

        if output.suppressed {
            debug!("Stop decision suppressed within the re-trigger interval");
        }

        if output.publish_stop {
            if coord.is_stop_requested() {
                warn!("Previous stop request has not been consumed by the control loop");
            }
            coord.request_stop();
            summary.num_publications += 1;

            // No detection work while the vehicle is stopping
            if interruptible_sleep(hold_s, HOLD_SLICE_S, || coord.is_terminated()) {
                break Ok(());
            }
        }
    };

    if let Err(ref e) = result {
        error!("Perception loop failed: {}", e);
        coord.terminate();
    }

    info!(
        "Perception loop stopped after {} frames ({} evaluations, {} stop requests)",
        summary.num_frames, summary.num_evaluations, summary.num_publications
    );

    result.map(|_| summary)
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_consec_eqpt_errors: 10,
            error_retry_s: 0.1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use eqpt_if::eqpt::{
        cam::CamFrame,
        detect::{BoundingBox, Detection, CLASS_ID_STOP_SIGN},
    };
    use image::RgbImage;
    use std::sync::Mutex;

    /// Camera producing blank frames, raising terminate after a number of frames.
    struct MockCamera {
        coord: Arc<CoordState>,
        frames_left: usize,
        fail: bool,
    }

    impl Camera for MockCamera {
        fn read_frame(&mut self) -> Result<CamFrame, EqptError> {
            if self.fail {
                return Err(EqptError::Timeout);
            }

            if self.frames_left == 0 {
                self.coord.terminate();
            } else {
                self.frames_left -= 1;
            }

            Ok(CamFrame::new(RgbImage::new(100, 100)))
        }
    }

    /// Detector always seeing a close stop sign.
    struct StopSignDetector;

    impl Detector for StopSignDetector {
        fn infer(
            &mut self,
            _image: &RgbImage,
            _class_filter: &[u32],
            _conf_floor: f32,
        ) -> Result<Vec<Detection>, EqptError> {
            Ok(vec![Detection {
                class_id: CLASS_ID_STOP_SIGN,
                bbox: BoundingBox::new(10.0, 10.0, 30.0, 30.0),
                confidence: 0.9,
            }])
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<PerTm>>>);

    impl TmSink<PerTm> for RecordingSink {
        fn send(&mut self, tm: &PerTm) -> Result<(), EqptError> {
            self.0.lock().unwrap().push(*tm);
            Ok(())
        }
    }

    fn mgr(hold_duration_s: f64, retrigger_interval_s: f64) -> PerMgr {
        PerMgr::new(per::Params {
            hold_duration_s,
            retrigger_interval_s,
            ..per::Params::default()
        })
        .unwrap()
    }

    #[test]
    fn test_single_publication_within_retrigger() {
        let coord = Arc::new(CoordState::new(0.65));
        let eqpt = PerEqpt {
            camera: Box::new(MockCamera {
                coord: coord.clone(),
                frames_left: 10,
                fail: false,
            }),
            detector: Box::new(StopSignDetector),
        };
        let mut sink = RecordingSink::default();

        let summary = run_per_loop(
            mgr(0.0, 7.0),
            eqpt,
            &Params::default(),
            coord.clone(),
            &mut sink,
        )
        .unwrap();

        // Every frame decided to stop but only the first was published
        let records = sink.0.lock().unwrap();
        assert_eq!(summary.num_publications, 1);
        assert_eq!(records.iter().filter(|r| r.published).count(), 1);
        assert!(records[0].published);
        assert!(records.len() >= 10);
        assert!(records.iter().all(|r| r.speed_dem_ms == 0.65));
        assert!(coord.take_stop_request());
    }

    #[test]
    fn test_hold_cut_short_by_terminate() {
        let coord = Arc::new(CoordState::new(0.65));
        let eqpt = PerEqpt {
            camera: Box::new(MockCamera {
                coord: coord.clone(),
                frames_left: 100,
                fail: false,
            }),
            detector: Box::new(StopSignDetector),
        };

        let c = coord.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            c.terminate();
        });

        let start = Instant::now();
        let summary = run_per_loop(
            mgr(60.0, 7.0),
            eqpt,
            &Params::default(),
            coord,
            &mut eqpt_if::eqpt::tm::NullTmSink,
        )
        .unwrap();
        handle.join().unwrap();

        assert_eq!(summary.num_publications, 1);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_camera_error_budget() {
        let coord = Arc::new(CoordState::new(0.65));
        let eqpt = PerEqpt {
            camera: Box::new(MockCamera {
                coord: coord.clone(),
                frames_left: 0,
                fail: true,
            }),
            detector: Box::new(StopSignDetector),
        };
        let params = Params {
            max_consec_eqpt_errors: 3,
            error_retry_s: 0.0,
        };

        let result = run_per_loop(
            mgr(0.0, 7.0),
            eqpt,
            &params,
            coord.clone(),
            &mut eqpt_if::eqpt::tm::NullTmSink,
        );

        assert!(matches!(result, Err(PerLoopError::CameraError(_))));
        assert!(coord.is_terminated());
    }

    #[test]
    fn test_invalid_retry_wait() {
        assert!(Params::default().validate().is_ok());

        for &bad in [f64::INFINITY, f64::NAN, -0.1].iter() {
            let params = Params {
                error_retry_s: bad,
                ..Params::default()
            };
            assert!(matches!(
                params.validate(),
                Err(PerLoopError::InvalidRetryWait(_))
            ));
        }

        // Rejected before any frame is read, stopping the control loop too
        let coord = Arc::new(CoordState::new(0.65));
        let eqpt = PerEqpt {
            camera: Box::new(MockCamera {
                coord: coord.clone(),
                frames_left: 0,
                fail: true,
            }),
            detector: Box::new(StopSignDetector),
        };
        let params = Params {
            error_retry_s: f64::INFINITY,
            ..Params::default()
        };

        let result = run_per_loop(
            mgr(0.0, 7.0),
            eqpt,
            &params,
            coord.clone(),
            &mut eqpt_if::eqpt::tm::NullTmSink,
        );

        assert!(matches!(result, Err(PerLoopError::InvalidRetryWait(_))));
        assert!(coord.is_terminated());
    }
}
