//! # Perception manager
//!
//! Runs the perception stages on a single frame and decides whether a stop request should be
//! published.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::eqpt::{
    cam::CamFrame,
    detect::{Detection, ObjectClass},
};
use image::RgbImage;
use log::{debug, info};
use serde::Serialize;
use util::module::State;

use super::{
    proximity_ratio,
    scene_class::{crop, LampBrightness},
    DecisionState, Params, PerError, SceneClassifier, SceneLabel, StopPolicy,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Perception manager.
#[derive(Debug, Clone)]
pub struct PerMgr {
    params: Params,

    classifier: SceneClassifier,

    policy: StopPolicy,

    /// Time of the last published stop request, `None` if there hasn't been one.
    last_publication_s: Option<f64>,

    num_publications: u64,
}

/// Result of evaluating the detection in a frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Evaluation {
    pub class: ObjectClass,
    pub confidence: f32,
    pub proximity: f64,
    pub label: SceneLabel,

    /// Lamp brightnesses, only present for traffic lights.
    pub lamps: Option<LampBrightness>,

    /// The decision after this evaluation.
    pub decision: DecisionState,
}

/// Output of a single perception step.
#[derive(Debug, Clone, Copy)]
pub struct PerOutput {
    /// The evaluation of the frame's detection, `None` if there was no qualifying detection.
    pub evaluation: Option<Evaluation>,

    /// True if a stop request should be published this step.
    pub publish_stop: bool,

    /// True if the decision was to stop but the re-trigger interval suppressed publication.
    pub suppressed: bool,
}

/// Input data to the perception manager's `State` implementation.
#[derive(Debug, Clone)]
pub struct InputData {
    pub frame: CamFrame,
    pub detections: Vec<Detection>,

    /// Time of the step.
    ///
    /// Units: seconds
    pub now_s: f64,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// Number of detections the detector returned for the frame.
    pub num_detections: usize,

    /// True if the first detection qualified for evaluation.
    pub qualified: bool,

    /// Total publications since the manager was created.
    pub num_publications: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PerMgr {
    pub fn new(params: Params) -> Result<Self, PerError> {
        params.validate()?;

        let classifier = SceneClassifier::new(&params)?;
        let policy = StopPolicy::new(params.entry_proximity, params.exit_proximity);

        Ok(Self {
            params,
            classifier,
            policy,
            last_publication_s: None,
            num_publications: 0,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn decision(&self) -> DecisionState {
        self.policy.state()
    }

    pub fn last_publication_s(&self) -> Option<f64> {
        self.last_publication_s
    }

    pub fn num_publications(&self) -> u64 {
        self.num_publications
    }

    /// Process one frame and its detections at time `now_s`.
    ///
    /// Only the first detection is evaluated, and only if it is a traffic light or stop sign
    /// meeting the confidence floor. Otherwise the decision is left unchanged and nothing is
    /// published.
    pub fn step(&mut self, image: &RgbImage, detections: &[Detection], now_s: f64) -> PerOutput {
        let mut output = PerOutput {
            evaluation: None,
            publish_stop: false,
            suppressed: false,
        };

        let (det, class) = match detections.first().and_then(|d| self.qualify(d)) {
            Some(q) => q,
            None => return output,
        };

        let proximity = proximity_ratio(&det.bbox, image.width(), image.height());

        let (label, lamps) = match class {
            ObjectClass::TrafficLight => match crop(image, &det.bbox) {
                Some(c) => {
                    let (label, lamps) = self.classifier.classify_with_brightness(&c);
                    (label, Some(lamps))
                }
                None => (SceneLabel::Unknown, None),
            },
            ObjectClass::StopSign => (SceneLabel::Stop, None),
        };

        let decision = self.policy.evaluate(label, proximity);

        debug!(
            "{:?} {:?} at proximity {:.3}: {:?}",
            class, label, proximity, decision
        );

        output.evaluation = Some(Evaluation {
            class,
            confidence: det.confidence,
            proximity,
            label,
            lamps,
            decision,
        });

        if decision == DecisionState::Stop {
            let retriggerable = match self.last_publication_s {
                Some(t) => now_s - t >= self.params.retrigger_interval_s,
                None => true,
            };

            if retriggerable {
                self.last_publication_s = Some(now_s);
                self.num_publications += 1;
                output.publish_stop = true;

                info!(
                    "Stop requested for {:?} at proximity {:.3}",
                    class, proximity
                );
            } else {
                output.suppressed = true;
            }
        }

        output
    }

    fn qualify<'a>(&self, det: &'a Detection) -> Option<(&'a Detection, ObjectClass)> {
        if det.confidence < self.params.conf_floor
            || !self.params.class_filter.contains(&det.class_id)
        {
            return None;
        }

        det.object_class().map(|c| (det, c))
    }
}

impl State for PerMgr {
    type InitData = Params;
    type InitError = PerError;

    type InputData = InputData;
    type OutputData = PerOutput;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        Self::new(init_data)
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let output = self.step(
            &input_data.frame.image,
            &input_data.detections,
            input_data.now_s,
        );

        let report = StatusReport {
            num_detections: input_data.detections.len(),
            qualified: output.evaluation.is_some(),
            num_publications: self.num_publications,
        };

        Ok((output, report))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::colour::parse_hex;
    use eqpt_if::eqpt::detect::{BoundingBox, CLASS_ID_STOP_SIGN, CLASS_ID_TRAFFIC_LIGHT};

    const W: u32 = 200;
    const H: u32 = 100;

    fn mgr() -> PerMgr {
        PerMgr::new(Params::default()).unwrap()
    }

    /// Frame with a light of the given colour in the box (20, 10) to (30, 30).
    fn light_frame(hex: &str) -> (RgbImage, BoundingBox) {
        let mut img = RgbImage::new(W, H);
        let colour = parse_hex(hex).unwrap();
        for y in 10..30 {
            for x in 20..30 {
                img.put_pixel(x, y, colour);
            }
        }
        (img, BoundingBox::new(20.0, 10.0, 30.0, 30.0))
    }

    fn det(class_id: u32, bbox: BoundingBox) -> Detection {
        Detection {
            class_id,
            bbox,
            confidence: 0.9,
        }
    }

    /// Stop sign box covering `percent` of the frame.
    fn stop_sign(percent: f64) -> Detection {
        let w = (percent / 100.0 * (W * H) as f64 / 10.0).round() as f32;
        det(CLASS_ID_STOP_SIGN, BoundingBox::new(0.0, 0.0, w, 10.0))
    }

    #[test]
    fn test_red_light_stop() {
        let (img, bbox) = light_frame("#FB6B51");
        let mut pm = mgr();

        // 200 px box in a 20000 px frame, 1%
        let out = pm.step(&img, &[det(CLASS_ID_TRAFFIC_LIGHT, bbox)], 0.0);
        let eval = out.evaluation.unwrap();

        assert_eq!(eval.label, SceneLabel::Red);
        assert_eq!(eval.proximity, 1.0);
        assert_eq!(eval.decision, DecisionState::Stop);
        assert!(eval.lamps.is_some());
        assert!(out.publish_stop);
    }

    #[test]
    fn test_green_light_pass() {
        let (img, bbox) = light_frame("#78F569");
        let out = mgr().step(&img, &[det(CLASS_ID_TRAFFIC_LIGHT, bbox)], 0.0);

        assert_eq!(out.evaluation.unwrap().label, SceneLabel::Green);
        assert_eq!(out.evaluation.unwrap().decision, DecisionState::Pass);
        assert!(!out.publish_stop);
    }

    #[test]
    fn test_no_detection_no_change() {
        let img = RgbImage::new(W, H);
        let mut pm = mgr();

        pm.step(&img, &[stop_sign(1.0)], 0.0);
        assert_eq!(pm.decision(), DecisionState::Stop);

        let out = pm.step(&img, &[], 1.0);
        assert!(out.evaluation.is_none());
        assert!(!out.publish_stop);
        assert_eq!(pm.decision(), DecisionState::Stop);
    }

    #[test]
    fn test_only_first_detection() {
        let img = RgbImage::new(W, H);
        let mut pm = mgr();

        // An irrelevant first detection hides the stop sign behind it
        let out = pm.step(&img, &[det(3, BoundingBox::default()), stop_sign(1.0)], 0.0);
        assert!(out.evaluation.is_none());

        // Low confidence
        let mut weak = stop_sign(1.0);
        weak.confidence = 0.5;
        assert!(pm.step(&img, &[weak], 0.0).evaluation.is_none());
    }

    #[test]
    fn test_retrigger_suppression() {
        let img = RgbImage::new(W, H);
        let mut pm = mgr();

        let first = pm.step(&img, &[stop_sign(2.0)], 10.0);
        let second = pm.step(&img, &[stop_sign(2.0)], 13.0);

        assert!(first.publish_stop);
        assert!(!second.publish_stop);
        assert!(second.suppressed);
        assert_eq!(pm.num_publications(), 1);
        assert_eq!(pm.last_publication_s(), Some(10.0));

        // Exactly the interval after the first publication is allowed again
        let third = pm.step(&img, &[stop_sign(2.0)], 17.0);
        assert!(third.publish_stop);
        assert_eq!(pm.num_publications(), 2);
    }

    #[test]
    fn test_far_stop_sign_no_publish() {
        let img = RgbImage::new(W, H);
        let out = mgr().step(&img, &[stop_sign(0.3)], 0.0);

        assert_eq!(out.evaluation.unwrap().label, SceneLabel::Stop);
        assert_eq!(out.evaluation.unwrap().decision, DecisionState::Pass);
        assert!(!out.publish_stop);
    }

    #[test]
    fn test_light_outside_frame_unknown() {
        let img = RgbImage::new(W, H);
        let mut pm = mgr();

        let bbox = BoundingBox::new(300.0, 10.0, 320.0, 40.0);
        let out = pm.step(&img, &[det(CLASS_ID_TRAFFIC_LIGHT, bbox)], 0.0);

        assert_eq!(out.evaluation.unwrap().label, SceneLabel::Unknown);
        assert_eq!(pm.decision(), DecisionState::Pass);
    }

    #[test]
    fn test_proc_report() {
        let mut pm = PerMgr::init(Params::default()).unwrap();

        let (out, report) = pm
            .proc(&InputData {
                frame: CamFrame::new(RgbImage::new(W, H)),
                detections: vec![stop_sign(1.0), det(3, BoundingBox::default())],
                now_s: 2.0,
            })
            .unwrap();
        assert!(out.publish_stop);
        assert_eq!(report.num_detections, 2);
        assert!(report.qualified);
        assert_eq!(report.num_publications, 1);

        let (out, report) = pm
            .proc(&InputData {
                frame: CamFrame::new(RgbImage::new(W, H)),
                detections: vec![det(3, BoundingBox::default())],
                now_s: 3.0,
            })
            .unwrap();
        assert!(out.evaluation.is_none());
        assert!(!report.qualified);
        assert_eq!(report.num_publications, 1);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = Params::default();
        params.exit_proximity = 0.6;
        assert!(matches!(
            PerMgr::new(params),
            Err(PerError::InvalidThresholds { .. })
        ));

        let mut params = Params::default();
        params.colours.red_on = String::from("red");
        assert!(matches!(
            PerMgr::new(params),
            Err(PerError::InvalidHexColour(_))
        ));
    }
}
