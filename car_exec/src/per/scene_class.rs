//! # Scene classifier
//!
//! Classifies a cropped traffic light as green or red. The crop is converted to HSV and four masks
//! are built, one for each of the lit and unlit green and red lamp colours. The light is green if
//! the lit green mask is brighter than the unlit green mask, otherwise it is red.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::eqpt::detect::BoundingBox;
use image::{imageops, GrayImage, Luma, RgbImage};
use serde::Serialize;

use super::{
    colour::{parse_hex, rgb_to_hsv, HsvRange},
    Params, PerError,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Value of a pixel inside a mask.
const MASK_ON: u8 = 255;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lamp colour mask classifier.
#[derive(Debug, Clone)]
pub struct SceneClassifier {
    green_on: HsvRange,
    green_off: HsvRange,
    red_on: HsvRange,
    red_off: HsvRange,
}

/// Brightness of each of the four lamp masks of a crop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct LampBrightness {
    pub green_on: f64,
    pub green_off: f64,
    pub red_on: f64,
    pub red_off: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Label given to a detected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneLabel {
    Green,
    Red,
    Stop,

    /// The object could not be classified, for instance because its crop was empty.
    Unknown,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Crop the bounding box out of an image.
///
/// The box is truncated to whole pixels and clipped to the image. Returns `None` if nothing of
/// the box lies inside the image.
pub fn crop(image: &RgbImage, bbox: &BoundingBox) -> Option<RgbImage> {
    let (x1, y1, x2, y2) = clip_to_frame(bbox, image.width(), image.height());

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(imageops::crop_imm(image, x1, y1, x2 - x1, y2 - y1).to_image())
}

/// Clip the pixel corners of a box to a frame of the given size.
pub(crate) fn clip_to_frame(bbox: &BoundingBox, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let (x1, y1, x2, y2) = bbox.to_pixels();
    let cx = |x: i64| x.max(0).min(width as i64) as u32;
    let cy = |y: i64| y.max(0).min(height as i64) as u32;

    (cx(x1), cy(y1), cx(x2), cy(y2))
}

/// Build a mask of the pixels of `image` which fall inside `range`.
///
/// Pixels inside the range are 255, all others 0.
pub fn mask(image: &RgbImage, range: &HsvRange) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if range.contains(&rgb_to_hsv(image.get_pixel(x, y))) {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

/// Mean intensity of the non-zero pixels of a mask, or 0 if the mask is empty.
pub fn brightness(mask: &GrayImage) -> f64 {
    let (sum, count) = mask
        .pixels()
        .filter(|p| p[0] != 0)
        .fold((0u64, 0u64), |(sum, count), p| (sum + p[0] as u64, count + 1));

    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SceneClassifier {
    /// Build the classifier's lamp windows from the perception parameters.
    pub fn new(params: &Params) -> Result<Self, PerError> {
        let range = |hex: &str| -> Result<HsvRange, PerError> {
            Ok(HsvRange::around(
                rgb_to_hsv(&parse_hex(hex)?),
                params.hue_window,
                params.sat_val_window,
                params.sat_val_floor,
            ))
        };

        Ok(Self {
            green_on: range(&params.colours.green_on)?,
            green_off: range(&params.colours.green_off)?,
            red_on: range(&params.colours.red_on)?,
            red_off: range(&params.colours.red_off)?,
        })
    }

    /// Classify a traffic light crop.
    ///
    /// An empty crop is [`SceneLabel::Unknown`].
    pub fn classify(&self, crop: &RgbImage) -> SceneLabel {
        self.classify_with_brightness(crop).0
    }

    /// Classify a traffic light crop, also returning the brightness of each mask.
    pub fn classify_with_brightness(&self, crop: &RgbImage) -> (SceneLabel, LampBrightness) {
        if crop.width() == 0 || crop.height() == 0 {
            return (SceneLabel::Unknown, LampBrightness::default());
        }

        let lamps = LampBrightness {
            green_on: brightness(&mask(crop, &self.green_on)),
            green_off: brightness(&mask(crop, &self.green_off)),
            red_on: brightness(&mask(crop, &self.red_on)),
            red_off: brightness(&mask(crop, &self.red_off)),
        };

        let label = if lamps.green_on > lamps.green_off {
            SceneLabel::Green
        } else {
            SceneLabel::Red
        };

        (label, lamps)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    fn classifier() -> SceneClassifier {
        SceneClassifier::new(&Params::default()).unwrap()
    }

    fn solid(w: u32, h: u32, hex: &str) -> RgbImage {
        RgbImage::from_pixel(w, h, parse_hex(hex).unwrap())
    }

    #[test]
    fn test_green_lit() {
        let (label, lamps) = classifier().classify_with_brightness(&solid(12, 30, "#78F569"));

        assert_eq!(label, SceneLabel::Green);
        assert_eq!(lamps.green_on, 255.0);
        assert_eq!(lamps.green_off, 0.0);
    }

    #[test]
    fn test_red_lit() {
        let (label, lamps) = classifier().classify_with_brightness(&solid(12, 30, "#FB6B51"));

        assert_eq!(label, SceneLabel::Red);
        assert_eq!(lamps.red_on, 255.0);
        assert_eq!(lamps.green_on, 0.0);
    }

    #[test]
    fn test_unlit_green_is_red() {
        // An unlit green lamp on its own means the light is not green
        assert_eq!(
            classifier().classify(&solid(10, 10, "#20712F")),
            SceneLabel::Red
        );
    }

    #[test]
    fn test_mixed_light() {
        // Lit green lamp at the bottom, unlit red lamp at the top
        let mut img = solid(10, 30, "#79414E");
        let green = parse_hex("#78F569").unwrap();
        for y in 20..30 {
            for x in 0..10 {
                img.put_pixel(x, y, green);
            }
        }

        let (label, lamps) = classifier().classify_with_brightness(&img);
        assert_eq!(label, SceneLabel::Green);
        assert_eq!(lamps.red_off, 255.0);
    }

    #[test]
    fn test_empty_crop() {
        assert_eq!(
            classifier().classify(&RgbImage::new(0, 0)),
            SceneLabel::Unknown
        );
    }

    #[test]
    fn test_brightness() {
        assert_eq!(brightness(&GrayImage::new(4, 4)), 0.0);

        let mut m = GrayImage::new(4, 4);
        m.put_pixel(0, 0, Luma([255]));
        m.put_pixel(1, 0, Luma([105]));
        assert_eq!(brightness(&m), 180.0);
    }

    #[test]
    fn test_crop() {
        let mut img = RgbImage::new(40, 20);
        img.put_pixel(10, 5, Rgb([1, 2, 3]));

        let c = crop(&img, &BoundingBox::new(10.7, 5.2, 20.9, 15.0)).unwrap();
        assert_eq!(c.dimensions(), (10, 10));
        assert_eq!(c.get_pixel(0, 0), &Rgb([1, 2, 3]));

        // Clipped to the frame
        let c = crop(&img, &BoundingBox::new(-5.0, 10.0, 50.0, 30.0)).unwrap();
        assert_eq!(c.dimensions(), (40, 10));

        // Outside or inverted
        assert!(crop(&img, &BoundingBox::new(50.0, 0.0, 60.0, 10.0)).is_none());
        assert!(crop(&img, &BoundingBox::new(20.0, 10.0, 10.0, 5.0)).is_none());
    }
}
