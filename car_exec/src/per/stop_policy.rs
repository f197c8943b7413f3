//! # Stop decision policy
//!
//! Two state machine deciding whether the vehicle should stop for the object in view. Red lights
//! and stop signs cause a stop once they are close enough, with a lower threshold for holding an
//! existing stop than for entering one so that the decision doesn't toggle while the proximity
//! hovers around the boundary.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::SceneLabel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The stop decision state machine.
#[derive(Debug, Clone)]
pub struct StopPolicy {
    state: DecisionState,

    entry_proximity: f64,
    exit_proximity: f64,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecisionState {
    Pass,
    Stop,
}

/// Where a proximity ratio sits relative to the entry and exit thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProximityBand {
    /// At or above the entry threshold
    Near,

    /// At or above the exit threshold but below the entry threshold
    Approaching,

    /// Below the exit threshold
    Far,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DecisionState {
    fn default() -> Self {
        DecisionState::Pass
    }
}

impl StopPolicy {
    /// Create a new policy in the [`DecisionState::Pass`] state.
    pub fn new(entry_proximity: f64, exit_proximity: f64) -> Self {
        Self {
            state: DecisionState::Pass,
            entry_proximity,
            exit_proximity,
        }
    }

    pub fn state(&self) -> DecisionState {
        self.state
    }

    /// Update the decision with the label and proximity of the object in the current frame.
    ///
    /// Only call this for frames containing a qualifying detection, frames without one leave the
    /// decision unchanged.
    pub fn evaluate(&mut self, label: SceneLabel, proximity: f64) -> DecisionState {
        self.state = self.transition(label, proximity);
        self.state
    }

    fn transition(&self, label: SceneLabel, proximity: f64) -> DecisionState {
        use DecisionState::*;
        use ProximityBand::*;

        match label {
            SceneLabel::Green => Pass,
            SceneLabel::Unknown => self.state,
            SceneLabel::Red | SceneLabel::Stop => match (self.state, self.band(proximity)) {
                (_, Near) => Stop,
                (Stop, Approaching) => Stop,
                (Stop, Far) => Pass,
                (Pass, Approaching) | (Pass, Far) => Pass,
            },
        }
    }

    fn band(&self, proximity: f64) -> ProximityBand {
        if proximity >= self.entry_proximity {
            ProximityBand::Near
        } else if proximity >= self.exit_proximity {
            ProximityBand::Approaching
        } else {
            ProximityBand::Far
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn policy_in(state: DecisionState) -> StopPolicy {
        let mut p = StopPolicy::new(0.55, 0.50);
        p.state = state;
        p
    }

    #[test]
    fn test_red_near_enters_stop() {
        let mut p = policy_in(DecisionState::Pass);
        assert_eq!(p.evaluate(SceneLabel::Red, 0.60), DecisionState::Stop);
    }

    #[test]
    fn test_red_far_leaves_stop() {
        let mut p = policy_in(DecisionState::Stop);
        assert_eq!(p.evaluate(SceneLabel::Red, 0.48), DecisionState::Pass);
    }

    #[test]
    fn test_green_always_passes() {
        for &state in &[DecisionState::Pass, DecisionState::Stop] {
            for &ratio in &[0.0, 0.49, 0.52, 0.55, 10.0, 100.0] {
                let mut p = policy_in(state);
                assert_eq!(p.evaluate(SceneLabel::Green, ratio), DecisionState::Pass);
            }
        }
    }

    #[test]
    fn test_hysteresis_band() {
        // Between the thresholds the previous decision is kept
        let mut p = policy_in(DecisionState::Pass);
        assert_eq!(p.evaluate(SceneLabel::Stop, 0.52), DecisionState::Pass);

        let mut p = policy_in(DecisionState::Stop);
        assert_eq!(p.evaluate(SceneLabel::Stop, 0.52), DecisionState::Stop);
        assert_eq!(p.evaluate(SceneLabel::Stop, 0.50), DecisionState::Stop);
        assert_eq!(p.evaluate(SceneLabel::Stop, 0.499), DecisionState::Pass);
    }

    #[test]
    fn test_entry_threshold_inclusive() {
        let mut p = policy_in(DecisionState::Pass);
        assert_eq!(p.evaluate(SceneLabel::Stop, 0.55), DecisionState::Stop);
    }

    #[test]
    fn test_approach_sequence() {
        // Vehicle approaches a red light, it then turns green
        let mut p = StopPolicy::new(0.55, 0.50);
        let seq = [
            (SceneLabel::Red, 0.2, DecisionState::Pass),
            (SceneLabel::Red, 0.53, DecisionState::Pass),
            (SceneLabel::Red, 0.56, DecisionState::Stop),
            (SceneLabel::Red, 0.54, DecisionState::Stop),
            (SceneLabel::Unknown, 0.0, DecisionState::Stop),
            (SceneLabel::Green, 0.58, DecisionState::Pass),
            (SceneLabel::Red, 0.52, DecisionState::Pass),
        ];

        for (i, (label, ratio, expected)) in seq.iter().enumerate() {
            assert_eq!(p.evaluate(*label, *ratio), *expected, "step {}", i);
        }
    }
}
