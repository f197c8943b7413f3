//! Simulated camera and object detector

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::{
    eqpt::{
        cam::{CamFrame, Camera},
        detect::{BoundingBox, Detection, Detector, ObjectClass},
        loc::Pose,
    },
    EqptError,
};
use image::{Rgb, RgbImage};
use nalgebra::Vector2;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use util::maths::{heading2, rem_euclid, wrap_to_pi};

use super::{LandmarkKind, Params, SimWorld};
use crate::per::{colour::parse_hex, params::LampColours, PerError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const BACKGROUND: Rgb<u8> = Rgb([70, 70, 70]);

const STOP_SIGN: Rgb<u8> = Rgb([200, 20, 30]);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object in view of the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub class: ObjectClass,
    pub bbox: BoundingBox,

    /// State of a traffic light, `None` for stop signs.
    pub light: Option<LightState>,
}

/// Camera rendering the nearest landmark in view.
pub struct SimCamera {
    world: Arc<SimWorld>,
    lamps: LampRgb,
    last_frame: Option<Instant>,
}

/// Detector reporting the landmark the camera renders.
pub struct SimDetector {
    world: Arc<SimWorld>,
}

#[derive(Debug, Clone, Copy)]
struct LampRgb {
    green_on: Rgb<u8>,
    green_off: Rgb<u8>,
    red_on: Rgb<u8>,
    red_off: Rgb<u8>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Green,
    Red,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the nearest landmark in view from the given pose at time `t_s`.
pub fn visible_object(params: &Params, pose: &Pose, t_s: f64) -> Option<SceneObject> {
    let half_fov = params.cam_fov_rad / 2.0;
    let w = params.cam_width as f64;
    let h = params.cam_height as f64;

    params
        .landmarks
        .iter()
        .filter_map(|lm| {
            let rel = Vector2::new(lm.x_m, lm.y_m) - pose.position_m;
            let dist_m = rel.norm();
            let bearing = wrap_to_pi(heading2(&rel) - pose.heading_rad);

            if dist_m < 1e-3 || dist_m > params.cam_range_m || bearing.abs() > half_fov {
                return None;
            }

            Some((lm, dist_m, bearing))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(lm, dist_m, bearing)| {
            // Positive bearing is to the left of the image centre
            let side = (params.obj_size_px / dist_m).min(h);
            let cx = w / 2.0 - (bearing / half_fov) * (w / 2.0);
            let cy = h / 2.0;

            let bbox = BoundingBox::new(
                (cx - side / 2.0).max(0.0) as f32,
                (cy - side / 2.0).max(0.0) as f32,
                (cx + side / 2.0).min(w) as f32,
                (cy + side / 2.0).min(h) as f32,
            );

            let (class, light) = match lm.kind {
                LandmarkKind::StopSign => (ObjectClass::StopSign, None),
                LandmarkKind::TrafficLight => {
                    let cycle_s = lm.green_s + lm.red_s;
                    let state = if cycle_s <= 0.0 {
                        LightState::Red
                    } else if rem_euclid(t_s + lm.offset_s, cycle_s) < lm.green_s {
                        LightState::Green
                    } else {
                        LightState::Red
                    };
                    (ObjectClass::TrafficLight, Some(state))
                }
            };

            SceneObject { class, bbox, light }
        })
}

/// Render a camera frame of the given size containing the object.
///
/// Traffic lights are drawn with the red lamp in the upper half of the box and the green lamp in
/// the lower half, one of them lit.
pub fn render(
    width: u32,
    height: u32,
    object: Option<&SceneObject>,
    lamps: &LampColours,
) -> Result<RgbImage, PerError> {
    let lamps = LampRgb::new(lamps)?;
    Ok(render_rgb(width, height, object, &lamps))
}

fn render_rgb(width: u32, height: u32, object: Option<&SceneObject>, lamps: &LampRgb) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let obj = match object {
        Some(o) => o,
        None => return img,
    };

    let (x1, y1, x2, y2) = obj.bbox.to_pixels();
    let x1 = x1.max(0) as u32;
    let y1 = y1.max(0) as u32;
    let x2 = (x2.max(0) as u32).min(width);
    let y2 = (y2.max(0) as u32).min(height);
    let y_mid = y1 + (y2.saturating_sub(y1)) / 2;

    for y in y1..y2 {
        for x in x1..x2 {
            let colour = match obj.light {
                None => STOP_SIGN,
                Some(LightState::Red) if y < y_mid => lamps.red_on,
                Some(LightState::Red) => lamps.green_off,
                Some(LightState::Green) if y < y_mid => lamps.red_off,
                Some(LightState::Green) => lamps.green_on,
            };
            img.put_pixel(x, y, colour);
        }
    }

    img
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LampRgb {
    fn new(colours: &LampColours) -> Result<Self, PerError> {
        Ok(Self {
            green_on: parse_hex(&colours.green_on)?,
            green_off: parse_hex(&colours.green_off)?,
            red_on: parse_hex(&colours.red_on)?,
            red_off: parse_hex(&colours.red_off)?,
        })
    }
}

impl SimCamera {
    pub fn new(world: Arc<SimWorld>, lamps: &LampColours) -> Result<Self, PerError> {
        Ok(Self {
            world,
            lamps: LampRgb::new(lamps)?,
            last_frame: None,
        })
    }
}

impl Camera for SimCamera {
    fn read_frame(&mut self) -> Result<CamFrame, EqptError> {
        let params = self.world.params();
        let period = Duration::from_secs_f64(1.0 / params.cam_fps.max(1e-3));

        // Pace frames at the camera rate
        if let Some(t) = self.last_frame {
            if let Some(wait) = period.checked_sub(t.elapsed()) {
                thread::sleep(wait);
            }
        }
        self.last_frame = Some(Instant::now());

        let pose = self.world.truth().pose;
        let object = visible_object(params, &pose, self.world.elapsed_s());

        Ok(CamFrame::new(render_rgb(
            params.cam_width,
            params.cam_height,
            object.as_ref(),
            &self.lamps,
        )))
    }
}

impl SimDetector {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self { world }
    }
}

impl Detector for SimDetector {
    fn infer(
        &mut self,
        _image: &RgbImage,
        class_filter: &[u32],
        conf_floor: f32,
    ) -> Result<Vec<Detection>, EqptError> {
        let params = self.world.params();
        let confidence = params.detection_confidence;
        let pose = self.world.truth().pose;

        Ok(visible_object(params, &pose, self.world.elapsed_s())
            .map(|o| Detection {
                class_id: o.class.id(),
                bbox: o.bbox,
                confidence,
            })
            .filter(|d| class_filter.contains(&d.class_id) && d.confidence >= conf_floor)
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::{self, DecisionState, PerMgr, SceneLabel};
    use crate::sim::Landmark;

    fn light(x_m: f64, y_m: f64) -> Landmark {
        Landmark {
            kind: LandmarkKind::TrafficLight,
            x_m,
            y_m,
            green_s: 5.0,
            red_s: 10.0,
            offset_s: 0.0,
        }
    }

    fn params(landmarks: Vec<Landmark>) -> Params {
        Params {
            landmarks,
            ..Params::default()
        }
    }

    #[test]
    fn test_object_ahead() {
        let p = params(vec![light(1.0, 0.0)]);
        let obj = visible_object(&p, &Pose::new(0.0, 0.0, 0.0), 1.0).unwrap();

        assert_eq!(obj.class, ObjectClass::TrafficLight);
        assert_eq!(obj.light, Some(LightState::Green));
        assert_eq!(obj.bbox, BoundingBox::new(147.5, 107.5, 172.5, 132.5));

        let obj = visible_object(&p, &Pose::new(0.0, 0.0, 0.0), 6.0).unwrap();
        assert_eq!(obj.light, Some(LightState::Red));
    }

    #[test]
    fn test_object_out_of_view() {
        let p = params(vec![light(1.0, 0.0)]);

        // Behind, too far, and off to the side
        assert!(visible_object(&p, &Pose::new(2.0, 0.0, 0.0), 0.0).is_none());
        assert!(visible_object(&p, &Pose::new(-5.0, 0.0, 0.0), 0.0).is_none());
        assert!(visible_object(&p, &Pose::new(0.0, -1.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_nearest_object() {
        let mut stop = light(0.8, 0.1);
        stop.kind = LandmarkKind::StopSign;
        let p = params(vec![light(2.0, 0.0), stop]);

        let obj = visible_object(&p, &Pose::new(0.0, 0.0, 0.0), 0.0).unwrap();
        assert_eq!(obj.class, ObjectClass::StopSign);
        assert!(obj.light.is_none());

        // Left of centre
        assert!(obj.bbox.x2 < 160.0 + 16.0);
        assert!(obj.bbox.x1 < 160.0 - 16.0);
    }

    #[test]
    fn test_rendered_light_classified() {
        let p = params(vec![light(1.0, 0.0)]);
        let colours = per::params::LampColours::default();
        let mut mgr = PerMgr::new(per::Params::default()).unwrap();

        for &(t_s, label, decision) in &[
            (6.0, SceneLabel::Red, DecisionState::Stop),
            (16.0, SceneLabel::Green, DecisionState::Pass),
        ] {
            let obj = visible_object(&p, &Pose::new(0.0, 0.0, 0.0), t_s).unwrap();
            let img = render(p.cam_width, p.cam_height, Some(&obj), &colours).unwrap();
            let det = Detection {
                class_id: obj.class.id(),
                bbox: obj.bbox,
                confidence: 0.9,
            };

            let eval = mgr.step(&img, &[det], t_s).evaluation.unwrap();
            assert_eq!(eval.label, label);
            assert_eq!(eval.decision, decision);
        }
    }
}
