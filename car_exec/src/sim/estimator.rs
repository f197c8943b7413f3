//! Dead reckoning pose estimator

use eqpt_if::eqpt::{
    gps::GpsFix,
    loc::{EstInputs, Pose, PoseEstimator},
};
use util::maths::{from_heading2, wrap_to_pi};

/// Pose estimator taking GPS fixes as truth and propagating from the tachometer speed and
/// gyroscope between fixes.
///
/// This is not a filter, it stands in for the vehicle's Kalman filter when running in simulation.
#[derive(Debug, Clone)]
pub struct DeadReckoner {
    pose: Pose,
}

impl DeadReckoner {
    pub fn new(initial_pose: Pose) -> Self {
        Self { pose: initial_pose }
    }
}

impl PoseEstimator for DeadReckoner {
    fn update(
        &mut self,
        inputs: &EstInputs,
        dt_s: f64,
        gps_fix: Option<&GpsFix>,
        gyro_z_rads: f64,
    ) -> Pose {
        match gps_fix {
            Some(fix) => {
                self.pose.position_m[0] = fix.x_m;
                self.pose.position_m[1] = fix.y_m;
                self.pose.heading_rad = fix.heading_rad;
            }
            None => {
                self.pose.heading_rad = wrap_to_pi(self.pose.heading_rad + gyro_z_rads * dt_s);
                self.pose.position_m +=
                    from_heading2(self.pose.heading_rad) * inputs.tach_speed_ms * dt_s;
            }
        }

        self.pose.speed_ms = inputs.tach_speed_ms;
        self.pose
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_dead_reckoning() {
        let mut est = DeadReckoner::new(Pose::new(0.0, 0.0, FRAC_PI_2));
        let inputs = EstInputs {
            tach_speed_ms: 1.0,
            steer_rad: 0.0,
        };

        let pose = est.update(&inputs, 0.5, None, 0.0);
        assert_approx_eq!(pose.position_m[0], 0.0);
        assert_approx_eq!(pose.position_m[1], 0.5);
        assert_approx_eq!(pose.speed_ms, 1.0);
    }

    #[test]
    fn test_gps_snap() {
        let mut est = DeadReckoner::new(Pose::new(0.0, 0.0, 0.0));
        let inputs = EstInputs::default();
        let fix = GpsFix {
            x_m: 3.0,
            y_m: -1.0,
            heading_rad: 1.0,
        };

        let pose = est.update(&inputs, 0.1, Some(&fix), 5.0);
        assert_eq!(pose.position_m[0], 3.0);
        assert_eq!(pose.position_m[1], -1.0);
        assert_eq!(pose.heading_rad, 1.0);
    }
}
