//! # Object Detector Interface
//!
//! The detector is a pretrained network producing labelled bounding boxes. Class identifiers follow
//! the COCO numbering used by the network.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::EqptError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Detector class ID of a traffic light.
pub const CLASS_ID_TRAFFIC_LIGHT: u32 = 9;

/// Detector class ID of a stop sign.
pub const CLASS_ID_STOP_SIGN: u32 = 11;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Axis aligned bounding box in image pixel coordinates, `(x1, y1)` top left and `(x2, y2)` bottom
/// right.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A single detection from the object detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class identifier of the detected object.
    pub class_id: u32,

    /// Bounding box of the object in the frame.
    pub bbox: BoundingBox,

    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Object classes relevant to the stop decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    TrafficLight,
    StopSign,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Object detection network.
pub trait Detector: Send {
    /// Run inference on the image, returning only detections whose class is in `class_filter` and
    /// whose confidence is at least `conf_floor`.
    fn infer(
        &mut self,
        image: &RgbImage,
        class_filter: &[u32],
        conf_floor: f32,
    ) -> Result<Vec<Detection>, EqptError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box corners truncated to whole pixels, as the detector's float coordinates are cast to
    /// integers before cropping.
    pub fn to_pixels(&self) -> (i64, i64, i64, i64) {
        (
            self.x1 as i64,
            self.y1 as i64,
            self.x2 as i64,
            self.y2 as i64,
        )
    }
}

impl Detection {
    /// The relevant object class of this detection, if any.
    pub fn object_class(&self) -> Option<ObjectClass> {
        ObjectClass::from_id(self.class_id)
    }
}

impl ObjectClass {
    pub fn from_id(class_id: u32) -> Option<Self> {
        match class_id {
            CLASS_ID_TRAFFIC_LIGHT => Some(ObjectClass::TrafficLight),
            CLASS_ID_STOP_SIGN => Some(ObjectClass::StopSign),
            _ => None,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            ObjectClass::TrafficLight => CLASS_ID_TRAFFIC_LIGHT,
            ObjectClass::StopSign => CLASS_ID_STOP_SIGN,
        }
    }
}
