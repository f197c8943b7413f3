//! Simulated GPS

use eqpt_if::eqpt::gps::{Gps, GpsFix};
use std::{sync::Arc, time::Instant};

use super::SimWorld;

/// GPS reporting the true pose once per GPS period.
pub struct SimGps {
    world: Arc<SimWorld>,
    last_fix: Option<Instant>,
}

impl SimGps {
    pub fn new(world: Arc<SimWorld>) -> Self {
        Self {
            world,
            last_fix: None,
        }
    }
}

impl Gps for SimGps {
    fn poll(&mut self) -> Option<GpsFix> {
        let now = Instant::now();

        if let Some(t) = self.last_fix {
            if (now - t).as_secs_f64() < self.world.params().gps_period_s {
                return None;
            }
        }
        self.last_fix = Some(now);

        let pose = self.world.truth().pose;
        Some(GpsFix {
            x_m: pose.position_m[0],
            y_m: pose.position_m[1],
            heading_rad: pose.heading_rad,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::Params;
    use eqpt_if::eqpt::loc::Pose;

    #[test]
    fn test_fix_rate() {
        let params = Params {
            gps_period_s: 60.0,
            ..Params::default()
        };
        let world = Arc::new(SimWorld::new(params, Pose::new(1.0, 2.0, 0.5)));
        let mut gps = SimGps::new(world);

        let fix = gps.poll().unwrap();
        assert_eq!(
            fix,
            GpsFix {
                x_m: 1.0,
                y_m: 2.0,
                heading_rad: 0.5
            }
        );

        // No new fix until the period has elapsed
        assert!(gps.poll().is_none());
    }
}
