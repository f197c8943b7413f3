//! # Proximity estimator
//!
//! Without depth information the size of an object's bounding box relative to the frame is used
//! as a proxy for how close it is.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use eqpt_if::eqpt::detect::BoundingBox;
use util::maths::round_dp;

use super::scene_class::clip_to_frame;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Area of the box as a percentage of the frame area, rounded to 3 decimal places.
///
/// The box is truncated to whole pixels and clipped to the frame first, so the result is always in
/// `[0, 100]`. A frame with no area gives 0.
pub fn proximity_ratio(bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> f64 {
    let frame_area = frame_width as f64 * frame_height as f64;
    if frame_area == 0.0 {
        return 0.0;
    }

    let (x1, y1, x2, y2) = clip_to_frame(bbox, frame_width, frame_height);
    let box_area = x2.saturating_sub(x1) as f64 * y2.saturating_sub(y1) as f64;

    round_dp(100.0 * box_area / frame_area, 3)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quarter_frame() {
        assert_eq!(
            proximity_ratio(&BoundingBox::new(0.0, 0.0, 100.0, 100.0), 200, 200),
            25.0
        );
    }

    #[test]
    fn test_rounding_and_truncation() {
        // 7 x 9 px box in a 640 x 480 frame is 0.0205078...%
        assert_eq!(
            proximity_ratio(&BoundingBox::new(10.9, 20.2, 17.99, 29.5), 640, 480),
            0.021
        );
    }

    #[test]
    fn test_bounds() {
        let full = proximity_ratio(&BoundingBox::new(-50.0, -50.0, 1000.0, 1000.0), 640, 480);
        assert_eq!(full, 100.0);

        let inverted = proximity_ratio(&BoundingBox::new(30.0, 30.0, 10.0, 10.0), 640, 480);
        assert_eq!(inverted, 0.0);

        assert_eq!(
            proximity_ratio(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0, 480),
            0.0
        );
    }
}
