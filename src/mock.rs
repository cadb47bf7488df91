//! Hardware-free mock target for exercising the full control loop.
//!
//! Synthesizes a planar target that starts beyond the tracking box and
//! closes to the standoff depth, with a scripted bumper press along the
//! way. Deterministic when seeded, so a mock run can be replayed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bumper::{BumperEvent, BumperSide, BumperTransition};
use crate::config::TrackingParams;
use crate::error::Result;
use crate::filter::Point3;
use crate::node::FollowerHandle;

/// Script for one mock run.
#[derive(Clone, Debug)]
pub struct MockScenario {
    /// Cloud delivery rate (Hz)
    pub cloud_rate_hz: f64,
    /// Points per synthesized cloud (above the trust threshold)
    pub points_per_cloud: usize,
    /// Initial target depth (meters)
    pub start_depth: f64,
    /// Depth closed per cloud (meters)
    pub approach_step: f64,
    /// Depth at which the target stops closing (meters)
    pub hold_depth: f64,
    /// Lateral offset of the target center (meters)
    pub lateral_offset: f64,
    /// Cloud index at which the left bumper is pressed, if any
    pub bumper_press_at: Option<u32>,
    /// Total clouds to deliver
    pub cycles: u32,
    /// RNG seed; 0 draws from entropy
    pub seed: u64,
}

impl Default for MockScenario {
    fn default() -> Self {
        Self {
            cloud_rate_hz: 10.0,
            points_per_cloud: 5000,
            start_depth: 2.0,
            approach_step: 0.02,
            hold_depth: 0.45,
            lateral_offset: 0.3,
            bumper_press_at: Some(30),
            cycles: 150,
            seed: 0,
        }
    }
}

/// Drive the node through the scenario on the calling thread.
///
/// Widens the tracking box first so the off-center target stays inside
/// it, which also exercises the reconfigure push path.
pub fn run(handle: &FollowerHandle, scenario: &MockScenario, running: &AtomicBool) -> Result<()> {
    let mut rng = if scenario.seed == 0 {
        SmallRng::from_entropy()
    } else {
        SmallRng::seed_from_u64(scenario.seed)
    };

    handle.reconfigure(TrackingParams {
        min_x: -0.5,
        max_x: 0.5,
        ..Default::default()
    })?;

    let period = Duration::from_secs_f64(1.0 / scenario.cloud_rate_hz);
    let mut depth = scenario.start_depth;

    tracing::info!(
        "Mock target: {} clouds at {:.0} Hz, depth {:.2} -> {:.2}",
        scenario.cycles,
        scenario.cloud_rate_hz,
        scenario.start_depth,
        scenario.hold_depth
    );

    for cycle in 0..scenario.cycles {
        if !running.load(Ordering::Acquire) {
            tracing::info!("Mock target interrupted at cycle {}", cycle);
            break;
        }

        handle.deliver_cloud(synthesize_cloud(scenario, depth, &mut rng))?;

        if scenario.bumper_press_at == Some(cycle) {
            tracing::info!("Mock bumper: left press at cycle {}", cycle);
            handle.deliver_bumper(BumperEvent {
                side: BumperSide::Left,
                transition: BumperTransition::Pressed,
            })?;
        }
        // Release shortly after the press; the maneuver keeps running
        if scenario.bumper_press_at.map(|c| c + 5) == Some(cycle) {
            handle.deliver_bumper(BumperEvent {
                side: BumperSide::Left,
                transition: BumperTransition::Released,
            })?;
        }

        depth = (depth - scenario.approach_step).max(scenario.hold_depth);
        std::thread::sleep(period);
    }

    tracing::info!("Mock target finished");
    Ok(())
}

fn synthesize_cloud(scenario: &MockScenario, depth: f64, rng: &mut SmallRng) -> Vec<Point3> {
    (0..scenario.points_per_cloud)
        .map(|_| {
            Point3::new(
                scenario.lateral_offset + rng.gen_range(-0.05..0.05),
                rng.gen_range(-0.45..-0.15),
                depth + rng.gen_range(0.0..0.05),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{BoundingVolume, PointFilter};

    #[test]
    fn synthesized_cloud_lands_in_the_widened_box() {
        let scenario = MockScenario {
            seed: 9,
            ..Default::default()
        };
        let mut rng = SmallRng::seed_from_u64(scenario.seed);
        let cloud = synthesize_cloud(&scenario, 0.7, &mut rng);

        let volume = BoundingVolume::from_params(&TrackingParams {
            min_x: -0.5,
            max_x: 0.5,
            ..Default::default()
        });
        let summary = PointFilter::new(volume).summarize(&cloud);

        assert_eq!(summary.count as usize, scenario.points_per_cloud);
        assert!((summary.x - scenario.lateral_offset).abs() < 0.02);
        assert!(summary.z_min >= 0.7 && summary.z_min < 0.75);
    }
}
