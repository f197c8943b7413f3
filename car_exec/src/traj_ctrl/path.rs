//! # Path
//!
//! This module defines the waypoint path followed by trajectory control.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered sequence of planar waypoints.
///
/// A path always holds at least two points and no two consecutive points are equal. On a cyclic
/// path the last point closes the loop back onto the first, so segment `N - 2` ends at point `0`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct WaypointPath {
    points_m: Vec<Vector2<f64>>,

    cyclic: bool,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A path needs at least 2 points, found {0}")]
    TooFewPoints(usize),

    #[error("Path point {0} is not finite")]
    NonFinitePoint(usize),

    #[error("Node {0} is not in the road map")]
    UnknownNode(usize),

    #[error("The node sequence must contain at least 2 nodes")]
    NodeSequenceTooShort,

    #[error("Waypoint separation must be positive, found {0}")]
    InvalidSeparation(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointPath {
    /// Create a new path, validating that it has at least two finite points.
    ///
    /// Repeated consecutive points are merged so that the path has no zero length segments.
    pub fn new(mut points_m: Vec<Vector2<f64>>, cyclic: bool) -> Result<Self, PathError> {
        if points_m.len() < 2 {
            return Err(PathError::TooFewPoints(points_m.len()));
        }

        if let Some(i) = points_m
            .iter()
            .position(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            return Err(PathError::NonFinitePoint(i));
        }

        points_m.dedup();
        if points_m.len() < 2 {
            return Err(PathError::TooFewPoints(points_m.len()));
        }

        Ok(Self { points_m, cyclic })
    }

    /// Return a copy of the path with every point multiplied by `scale`.
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            points_m: self.points_m.iter().map(|p| p * scale).collect(),
            cyclic: self.cyclic,
        }
    }

    pub fn get_num_points(&self) -> usize {
        self.points_m.len()
    }

    /// Number of trackable segments, `N - 1`.
    pub fn get_num_segments(&self) -> usize {
        self.points_m.len() - 1
    }

    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    pub fn points(&self) -> &[Vector2<f64>] {
        &self.points_m
    }

    /// Get the start and end points of the given segment.
    ///
    /// Segment indices are taken modulo the number of segments. On a cyclic path the end of the
    /// final segment wraps to point 0, on an open path it is the final point.
    pub fn get_segment(&self, index: usize) -> (Vector2<f64>, Vector2<f64>) {
        let num_segs = self.get_num_segments();
        let i = index % num_segs;

        let end = if self.cyclic {
            (i + 1) % num_segs
        } else {
            i + 1
        };

        (self.points_m[i], self.points_m[end])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square(cyclic: bool) -> WaypointPath {
        WaypointPath::new(
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(1.0, 1.0),
                Vector2::new(0.0, 1.0),
                Vector2::new(0.0, 0.0),
            ],
            cyclic,
        )
        .unwrap()
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            WaypointPath::new(vec![], true),
            Err(PathError::TooFewPoints(0))
        ));
        assert!(matches!(
            WaypointPath::new(vec![Vector2::new(1.0, 2.0)], false),
            Err(PathError::TooFewPoints(1))
        ));
        assert!(matches!(
            WaypointPath::new(vec![Vector2::new(1.0, 2.0), Vector2::new(f64::NAN, 0.0)], false),
            Err(PathError::NonFinitePoint(1))
        ));
    }

    #[test]
    fn test_repeated_points_merged() {
        let path = WaypointPath::new(
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(2.0, 0.0),
            ],
            false,
        )
        .unwrap();

        assert_eq!(path.get_num_segments(), 2);
        assert_eq!(
            path.get_segment(1),
            (Vector2::new(1.0, 0.0), Vector2::new(2.0, 0.0))
        );

        // A single repeated point is not a path
        assert!(matches!(
            WaypointPath::new(vec![Vector2::new(3.0, 1.0); 4], true),
            Err(PathError::TooFewPoints(1))
        ));
    }

    #[test]
    fn test_cyclic_segments_wrap() {
        let path = square(true);
        assert_eq!(path.get_num_segments(), 4);

        assert_eq!(
            path.get_segment(0),
            (Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0))
        );
        // Final segment closes onto point 0
        assert_eq!(
            path.get_segment(3),
            (Vector2::new(0.0, 1.0), Vector2::new(0.0, 0.0))
        );
        // Indices beyond the end wrap
        assert_eq!(path.get_segment(5), path.get_segment(1));
    }

    #[test]
    fn test_open_final_segment() {
        let path = WaypointPath::new(
            vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(2.0, 0.0),
            ],
            false,
        )
        .unwrap();

        assert_eq!(
            path.get_segment(1),
            (Vector2::new(1.0, 0.0), Vector2::new(2.0, 0.0))
        );
    }

    #[test]
    fn test_scaled() {
        let path = square(true).scaled(0.98);
        assert_eq!(path.points()[2], Vector2::new(0.98, 0.98));
        assert!(path.is_cyclic());
    }
}
