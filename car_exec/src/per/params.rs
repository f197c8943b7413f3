//! Perception parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::eqpt::detect::{CLASS_ID_STOP_SIGN, CLASS_ID_TRAFFIC_LIGHT};
use serde::Deserialize;

use super::PerError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the perception manager
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Detector classes passed to the object detector.
    #[serde(default = "default_class_filter")]
    pub class_filter: Vec<u32>,

    /// Minimum detector confidence.
    pub conf_floor: f32,

    /// Proximity ratio at or above which a red light or stop sign causes a stop.
    ///
    /// Units: percent of frame area
    pub entry_proximity: f64,

    /// Proximity ratio at or above which an existing stop is held.
    ///
    /// Units: percent of frame area
    pub exit_proximity: f64,

    /// Minimum time between two published stop requests.
    ///
    /// Units: seconds
    pub retrigger_interval_s: f64,

    /// Time detection work is suspended for after publishing a stop request.
    ///
    /// Units: seconds
    pub hold_duration_s: f64,

    /// Reference lamp colours, as `#RRGGBB` strings.
    pub colours: LampColours,

    /// Half width of the hue window of each mask, in OpenCV hue units (0-180).
    #[serde(default = "default_hue_window")]
    pub hue_window: i32,

    /// Half width of the saturation and value windows of each mask.
    #[serde(default = "default_sat_val_window")]
    pub sat_val_window: i32,

    /// Lower bound applied to the saturation and value windows.
    #[serde(default = "default_sat_val_floor")]
    pub sat_val_floor: i32,
}

/// Reference colours of the traffic light lamps.
#[derive(Deserialize, Debug, Clone)]
pub struct LampColours {
    pub green_on: String,
    pub green_off: String,
    pub red_on: String,
    pub red_off: String,
}

fn default_class_filter() -> Vec<u32> {
    vec![CLASS_ID_TRAFFIC_LIGHT, CLASS_ID_STOP_SIGN]
}

fn default_hue_window() -> i32 {
    10
}

fn default_sat_val_window() -> i32 {
    40
}

fn default_sat_val_floor() -> i32 {
    100
}

impl Params {
    /// Check the parameters are consistent.
    pub fn validate(&self) -> Result<(), PerError> {
        if !(self.exit_proximity <= self.entry_proximity) {
            return Err(PerError::InvalidThresholds {
                entry: self.entry_proximity,
                exit: self.exit_proximity,
            });
        }

        if !(self.retrigger_interval_s.is_finite() && self.retrigger_interval_s >= 0.0) {
            return Err(PerError::InvalidDuration(
                "re-trigger interval",
                self.retrigger_interval_s,
            ));
        }

        if !(self.hold_duration_s.is_finite() && self.hold_duration_s >= 0.0) {
            return Err(PerError::InvalidDuration(
                "hold duration",
                self.hold_duration_s,
            ));
        }

        if !(0.0..=1.0).contains(&self.conf_floor) {
            return Err(PerError::InvalidConfidence(self.conf_floor));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            class_filter: default_class_filter(),
            conf_floor: 0.7,
            entry_proximity: 0.55,
            exit_proximity: 0.50,
            retrigger_interval_s: 7.0,
            hold_duration_s: 4.0,
            colours: LampColours::default(),
            hue_window: default_hue_window(),
            sat_val_window: default_sat_val_window(),
            sat_val_floor: default_sat_val_floor(),
        }
    }
}

impl Default for LampColours {
    fn default() -> Self {
        Self {
            green_on: String::from("#78F569"),
            green_off: String::from("#20712F"),
            red_on: String::from("#FB6B51"),
            red_off: String::from("#79414E"),
        }
    }
}
