//! Velocity command synthesis from centroid summaries.
//!
//! The lateral correction is deliberately noisy: instead of a smooth
//! proportional turn, the controller draws a banded random angular rate
//! each cycle, which keeps the robot hunting across the target instead of
//! locking onto one edge of it. Inside the lateral dead zone it falls back
//! to the last drawn turn direction.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::filter::CentroidSummary;

/// Minimum in-volume point count before the centroid is trusted.
pub const MIN_TRACKING_POINTS: u32 = 4000;

/// Forward speed while closing on the target (m/s)
const APPROACH_SPEED: f64 = 0.2;

/// Forward speed while seeking with no target in view (m/s)
const CRAWL_SPEED: f64 = 0.2;

/// Lateral band around center where no fresh turn is drawn (meters)
const DEAD_ZONE: f64 = 0.2;

/// A velocity command for the base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Command {
    /// Linear velocity (m/s)
    pub linear_x: f64,
    /// Angular velocity (rad/s)
    pub angular_z: f64,
}

impl Command {
    pub fn new(linear_x: f64, angular_z: f64) -> Self {
        Self {
            linear_x,
            angular_z,
        }
    }

    /// All-zero command.
    pub fn stop() -> Self {
        Self::default()
    }
}

/// Turn direction memory for the dead zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TurnDirection {
    Left,
    Right,
}

/// Maps centroid summaries to velocity commands.
pub struct VelocityController {
    rng: SmallRng,
    last_direction: TurnDirection,
}

impl VelocityController {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            last_direction: TurnDirection::Left,
        }
    }

    /// Deterministic controller for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            last_direction: TurnDirection::Left,
        }
    }

    /// Command while the target is still farther than the standoff depth.
    ///
    /// Drives forward at a fixed speed; the angular term is drawn from a
    /// seventh-step grid and banded, biased toward the centroid side.
    pub fn approach(&mut self, summary: &CentroidSummary) -> Command {
        let mut cmd = Command::new(APPROACH_SPEED, 0.0);

        if summary.x > DEAD_ZONE {
            self.last_direction = TurnDirection::Right;
            let r = self.rng.gen_range(0..7) as f64 / 7.0;
            cmd.angular_z = if r > 0.7 {
                0.4
            } else if r > 0.4 {
                r
            } else {
                0.3
            };
            tracing::debug!("approach right: draw={:.3} angular={:.3}", r, cmd.angular_z);
        } else if summary.x < -DEAD_ZONE {
            self.last_direction = TurnDirection::Left;
            let r = self.rng.gen_range(0..7) as f64 / 7.0 - 1.0;
            cmd.angular_z = if r < -0.7 {
                -0.36
            } else if r < -0.5 {
                r
            } else {
                -0.2
            };
            tracing::debug!("approach left: draw={:.3} angular={:.3}", r, cmd.angular_z);
        } else {
            cmd.angular_z = self.dead_zone_turn();
        }

        cmd
    }

    /// Command once the target is at or inside the standoff depth.
    ///
    /// Holds position (zero linear) and keeps hunting laterally with a
    /// tenth-step random grid.
    pub fn arrived(&mut self, summary: &CentroidSummary) -> Command {
        let mut cmd = Command::stop();

        if summary.x > DEAD_ZONE {
            self.last_direction = TurnDirection::Right;
            let ang = self.rng.gen_range(0..10) as f64 / 10.0;
            cmd.angular_z = if ang > 0.7 {
                0.4
            } else if ang > 0.4 {
                ang
            } else {
                0.3
            };
            tracing::debug!("hold right: draw={:.2} angular={:.3}", ang, cmd.angular_z);
        } else if summary.x < -DEAD_ZONE {
            self.last_direction = TurnDirection::Left;
            let ang = self.rng.gen_range(0..10) as f64 / 10.0 - 1.0;
            cmd.angular_z = if ang < -0.7 {
                -0.2
            } else if ang < -0.4 {
                ang
            } else {
                -0.2
            };
            tracing::debug!("hold left: draw={:.2} angular={:.3}", ang, cmd.angular_z);
        } else {
            cmd.angular_z = self.dead_zone_turn();
        }

        cmd
    }

    /// Straight crawl used when too few points are in view.
    pub fn crawl() -> Command {
        Command::new(CRAWL_SPEED, 0.0)
    }

    fn dead_zone_turn(&self) -> f64 {
        match self.last_direction {
            TurnDirection::Right => 0.3,
            TurnDirection::Left => -0.3,
        }
    }
}

impl Default for VelocityController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_at(x: f64) -> CentroidSummary {
        CentroidSummary {
            x,
            y: -0.3,
            z_min: 1.0,
            count: 5000,
        }
    }

    #[test]
    fn approach_right_band_membership() {
        let mut controller = VelocityController::with_seed(7);

        for _ in 0..200 {
            let cmd = controller.approach(&summary_at(0.5));
            assert_eq!(cmd.linear_x, 0.2);
            let a = cmd.angular_z;
            // 0.3, 0.4, or a raw draw from (0.4, 0.7]
            assert!(
                a == 0.3 || a == 0.4 || (a > 0.4 && a <= 0.7),
                "angular {} outside forward-right bands",
                a
            );
        }
    }

    #[test]
    fn approach_left_band_membership() {
        let mut controller = VelocityController::with_seed(7);

        for _ in 0..200 {
            let cmd = controller.approach(&summary_at(-0.5));
            assert_eq!(cmd.linear_x, 0.2);
            let a = cmd.angular_z;
            assert!(
                a == -0.36 || a == -0.2 || (a >= -0.7 && a < -0.5),
                "angular {} outside forward-left bands",
                a
            );
        }
    }

    #[test]
    fn arrived_holds_position() {
        let mut controller = VelocityController::with_seed(3);

        for x in [0.5, -0.5, 0.0] {
            let cmd = controller.arrived(&summary_at(x));
            assert_eq!(cmd.linear_x, 0.0);
        }
    }

    #[test]
    fn arrived_band_membership() {
        let mut controller = VelocityController::with_seed(11);

        for _ in 0..200 {
            let a = controller.arrived(&summary_at(0.5)).angular_z;
            assert!(a == 0.3 || a == 0.4 || (a > 0.4 && a <= 0.7));

            let a = controller.arrived(&summary_at(-0.5)).angular_z;
            assert!(a == -0.2 || (a >= -0.7 && a < -0.4));
        }
    }

    #[test]
    fn dead_zone_reuses_last_direction() {
        let mut controller = VelocityController::with_seed(1);

        controller.approach(&summary_at(0.5));
        assert_eq!(controller.approach(&summary_at(0.0)).angular_z, 0.3);

        controller.approach(&summary_at(-0.5));
        assert_eq!(controller.approach(&summary_at(0.0)).angular_z, -0.3);

        // Memory is shared with the arrived regime
        assert_eq!(controller.arrived(&summary_at(0.1)).angular_z, -0.3);
    }

    #[test]
    fn initial_dead_zone_turns_left() {
        let mut controller = VelocityController::with_seed(1);
        assert_eq!(controller.approach(&summary_at(0.0)).angular_z, -0.3);
    }

    #[test]
    fn crawl_is_straight_forward() {
        assert_eq!(VelocityController::crawl(), Command::new(0.2, 0.0));
    }
}
