//! # Road map
//!
//! Generation of the waypoint path from a sequence of road map nodes. Real road maps are
//! external, [`TableRoadMap`] joins a table of node positions with straight lines and stands in
//! for them in simulation and tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::eqpt::loc::Pose;
use nalgebra::Vector2;
use serde::Deserialize;

use super::PathError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of paths between road map nodes.
pub trait RoadMap {
    /// Generate the ordered waypoints visiting each node of `node_sequence` in turn.
    fn generate_path(&self, node_sequence: &[usize]) -> Result<Vec<Vector2<f64>>, PathError>;

    /// Get the pose of a node, used as the vehicle's initial pose.
    fn get_node_pose(&self, node: usize) -> Result<Pose, PathError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single road map node.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RoadNode {
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
}

/// Parameters of a [`TableRoadMap`].
#[derive(Debug, Clone, Deserialize)]
pub struct RoadMapParams {
    /// Node table, indexed by node number.
    pub nodes: Vec<RoadNode>,

    /// Nodes to visit, in order.
    pub node_sequence: Vec<usize>,

    /// Maximum separation between generated waypoints.
    ///
    /// Units: meters
    pub point_sep_m: f64,
}

/// Road map joining nodes with straight segments.
#[derive(Debug, Clone)]
pub struct TableRoadMap {
    nodes: Vec<RoadNode>,

    point_sep_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TableRoadMap {
    pub fn new(nodes: Vec<RoadNode>, point_sep_m: f64) -> Result<Self, PathError> {
        if !(point_sep_m > 0.0) {
            return Err(PathError::InvalidSeparation(point_sep_m));
        }

        Ok(Self { nodes, point_sep_m })
    }

    pub fn from_params(params: &RoadMapParams) -> Result<Self, PathError> {
        Self::new(params.nodes.clone(), params.point_sep_m)
    }

    fn node(&self, node: usize) -> Result<&RoadNode, PathError> {
        self.nodes.get(node).ok_or(PathError::UnknownNode(node))
    }
}

impl RoadMap for TableRoadMap {
    fn generate_path(&self, node_sequence: &[usize]) -> Result<Vec<Vector2<f64>>, PathError> {
        if node_sequence.len() < 2 {
            return Err(PathError::NodeSequenceTooShort);
        }

        let mut points: Vec<Vector2<f64>> = Vec::new();

        for pair in node_sequence.windows(2) {
            let from = self.node(pair[0])?.position();
            let to = self.node(pair[1])?.position();

            let diff_vec = to - from;
            let dist = diff_vec.norm();

            // Number of points needed so that no two are further apart than the separation
            let num_steps = (dist / self.point_sep_m).ceil().max(1.0) as usize;
            let delta = diff_vec / num_steps as f64;

            // The start of each leg is the end of the previous one, so only push it for the
            // first leg
            if points.is_empty() {
                points.push(from);
            }

            for i in 1..=num_steps {
                let p = from + delta * i as f64;

                // Skip coincident points, which would form zero length segments
                if points.last().map_or(true, |l| (p - l).norm() > 0.0) {
                    points.push(p);
                }
            }
        }

        Ok(points)
    }

    fn get_node_pose(&self, node: usize) -> Result<Pose, PathError> {
        let n = self.node(node)?;
        Ok(Pose::new(n.x_m, n.y_m, n.heading_rad))
    }
}

impl RoadNode {
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x_m, self.y_m)
    }
}
