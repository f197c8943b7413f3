//! # Colour space helpers
//!
//! HSV values use the 8-bit convention of common vision libraries: hue in `[0, 180)` (half
//! degrees), saturation and value in `[0, 255]`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::Rgb;
use serde::Serialize;

use super::PerError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An 8-bit HSV colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Inclusive box in HSV space.
///
/// Bounds are kept as signed integers as the hue window of a colour near zero hue extends below
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    lower: [i32; 3],
    upper: [i32; 3],
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an 8-bit RGB pixel into 8-bit HSV.
pub fn rgb_to_hsv(rgb: &Rgb<u8>) -> Hsv {
    let r = rgb[0] as f64;
    let g = rgb[1] as f64;
    let b = rgb[2] as f64;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = max - min;

    let s = if max > 0.0 {
        round_half_up(diff * 255.0 / max)
    } else {
        0.0
    };

    let h = if diff == 0.0 {
        0.0
    } else {
        let sector = if max == r {
            g - b
        } else if max == g {
            b - r + 2.0 * diff
        } else {
            r - g + 4.0 * diff
        };

        let h = round_half_up(sector * 30.0 / diff);
        if h < 0.0 {
            h + 180.0
        } else {
            h
        }
    };

    Hsv {
        h: h as u8,
        s: s as u8,
        v: max as u8,
    }
}

/// Parse a `#RRGGBB` (or `RRGGBB`) string into an RGB colour.
pub fn parse_hex(hex: &str) -> Result<Rgb<u8>, PerError> {
    let digits = hex.trim().trim_start_matches('#');

    if digits.len() != 6 || !digits.is_ascii() {
        return Err(PerError::InvalidHexColour(hex.to_string()));
    }

    let mut rgb = [0u8; 3];
    for (i, c) in rgb.iter_mut().enumerate() {
        *c = u8::from_str_radix(&digits[2 * i..2 * i + 2], 16)
            .map_err(|_| PerError::InvalidHexColour(hex.to_string()))?;
    }

    Ok(Rgb(rgb))
}

fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Hsv {
    pub fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

impl HsvRange {
    /// Build the window around a reference colour.
    ///
    /// Hue spans `h +/- hue_window`. Saturation and value span `+/- sat_val_window`, with the lower
    /// bound raised to at least `sat_val_floor` and the upper bound capped at 255.
    pub fn around(reference: Hsv, hue_window: i32, sat_val_window: i32, sat_val_floor: i32) -> Self {
        let h = reference.h as i32;
        let s = reference.s as i32;
        let v = reference.v as i32;

        Self {
            lower: [
                h - hue_window,
                (s - sat_val_window).max(sat_val_floor),
                (v - sat_val_window).max(sat_val_floor),
            ],
            upper: [
                h + hue_window,
                (s + sat_val_window).min(255),
                (v + sat_val_window).min(255),
            ],
        }
    }

    pub fn lower(&self) -> [i32; 3] {
        self.lower
    }

    pub fn upper(&self) -> [i32; 3] {
        self.upper
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        let px = [hsv.h as i32, hsv.s as i32, hsv.v as i32];

        px.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(p, (lo, hi))| lo <= p && p <= hi)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_primaries() {
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), Hsv::new(0, 255, 255));
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), Hsv::new(60, 255, 255));
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), Hsv::new(120, 255, 255));
        assert_eq!(rgb_to_hsv(&Rgb([255, 255, 0])), Hsv::new(30, 255, 255));
    }

    #[test]
    fn test_greys() {
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), Hsv::new(0, 0, 0));
        assert_eq!(rgb_to_hsv(&Rgb([255, 255, 255])), Hsv::new(0, 0, 255));
        assert_eq!(rgb_to_hsv(&Rgb([90, 90, 90])), Hsv::new(0, 0, 90));
    }

    #[test]
    fn test_hue_below_zero_wraps() {
        // Magenta-red, max is red with blue above green
        let hsv = rgb_to_hsv(&Rgb([255, 0, 128]));
        assert!(hsv.h > 160 && hsv.h < 180);
    }

    #[test]
    fn test_lamp_colours() {
        let green_on = rgb_to_hsv(&parse_hex("#78F569").unwrap());
        assert_eq!(green_on, Hsv::new(57, 146, 245));

        let red_on = rgb_to_hsv(&parse_hex("#FB6B51").unwrap());
        assert_eq!(red_on, Hsv::new(5, 173, 251));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#20712F").unwrap(), Rgb([0x20, 0x71, 0x2F]));
        assert_eq!(parse_hex("79414e").unwrap(), Rgb([0x79, 0x41, 0x4E]));

        for bad in &["", "#", "#12345", "#1234567", "#GG0000", "#12é45"] {
            assert!(
                matches!(parse_hex(bad), Err(PerError::InvalidHexColour(_))),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_range_around() {
        let range = HsvRange::around(Hsv::new(57, 146, 245), 10, 40, 100);
        assert_eq!(range.lower(), [47, 106, 205]);
        assert_eq!(range.upper(), [67, 186, 255]);

        assert!(range.contains(&Hsv::new(57, 146, 245)));
        assert!(range.contains(&Hsv::new(47, 106, 205)));
        assert!(!range.contains(&Hsv::new(46, 146, 245)));
        assert!(!range.contains(&Hsv::new(57, 187, 245)));

        // Floor on saturation and value, hue window below zero
        let range = HsvRange::around(Hsv::new(3, 60, 80), 10, 40, 100);
        assert_eq!(range.lower(), [-7, 100, 100]);
        assert_eq!(range.upper(), [13, 100, 120]);
        assert!(range.contains(&Hsv::new(0, 100, 110)));
    }
}
