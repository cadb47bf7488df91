//! Follow-behavior state machine.
//!
//! Orchestrates one control cycle: an armed evasive maneuver preempts
//! everything and advances one tick; otherwise the point cloud is reduced
//! to a centroid summary and handed to the velocity controller. The
//! enable flag gates only the no-target crawl; a tracked target is
//! followed regardless (see DESIGN.md before unifying that gating).

use crate::bumper::{BumperEvent, BumperReactor};
use crate::config::{ConfigStore, FollowConfig, TrackingParams};
use crate::controller::{Command, VelocityController, MIN_TRACKING_POINTS};
use crate::error::Result;
use crate::filter::{BoundingVolume, CentroidSummary, Point3, PointFilter};
use crate::markers::{centroid_marker, volume_marker, Marker};

/// Mutually exclusive control regime for one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    /// Following disabled and no target in view
    Disabled,
    /// Too few points to trust the centroid; crawling forward
    Seeking,
    /// Target in view, still farther than the standoff depth
    Approaching,
    /// Target at or inside the standoff depth
    Arrived,
    /// Bumper-triggered maneuver in progress
    Evading,
}

/// Toggle service request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowState {
    Stopped,
    Follow,
}

/// Toggle service response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowResponse {
    Ok,
}

/// Outcome of one control cycle.
#[derive(Clone, Debug)]
pub struct CycleOutput {
    pub regime: Regime,
    /// Command to publish this cycle, if any
    pub command: Option<Command>,
    /// Diagnostic markers, emitted every cycle
    pub markers: Vec<Marker>,
}

/// The perception + control + reactive-override core.
pub struct FollowerStateMachine {
    store: ConfigStore,
    bumper: BumperReactor,
    controller: VelocityController,
    frame_id: String,
    /// Most recent centroid summary, kept for the diagnostic sphere
    last_summary: CentroidSummary,
}

impl FollowerStateMachine {
    pub fn new(config: &FollowConfig) -> Result<Self> {
        Ok(Self {
            store: ConfigStore::new(&config.tracking)?,
            bumper: BumperReactor::new(),
            controller: VelocityController::new(),
            frame_id: config.diagnostics.frame_id.clone(),
            last_summary: CentroidSummary::empty(),
        })
    }

    /// Deterministic variant for tests and reproducible mock runs.
    pub fn with_seed(config: &FollowConfig, seed: u64) -> Result<Self> {
        let mut machine = Self::new(config)?;
        machine.controller = VelocityController::with_seed(seed);
        Ok(machine)
    }

    /// Feed one bumper transition into the reactor.
    pub fn handle_bumper(&mut self, event: BumperEvent) {
        self.bumper.handle_event(event);
    }

    /// Replace the tracking parameters with a pushed snapshot.
    ///
    /// A rejected snapshot leaves the previous parameters in effect.
    pub fn reconfigure(&mut self, params: TrackingParams) {
        match self.store.apply(params) {
            Ok(()) => tracing::debug!("Tracking parameters reconfigured"),
            Err(e) => tracing::warn!("Rejected reconfigure push: {}", e),
        }
    }

    /// Toggle service: start or stop following.
    ///
    /// Stopping while enabled also yields a zero command to publish
    /// immediately. Requests matching the current state are no-ops but
    /// still answered Ok.
    pub fn set_follow_state(&mut self, state: FollowState) -> (FollowResponse, Option<Command>) {
        match state {
            FollowState::Stopped if self.store.enabled() => {
                tracing::info!("Follow state change: following stopped");
                self.store.set_enabled(false);
                (FollowResponse::Ok, Some(Command::stop()))
            }
            FollowState::Follow if !self.store.enabled() => {
                tracing::info!("Follow state change: following (re)started");
                self.store.set_enabled(true);
                (FollowResponse::Ok, None)
            }
            _ => (FollowResponse::Ok, None),
        }
    }

    pub fn enabled(&self) -> bool {
        self.store.enabled()
    }

    /// Run one control cycle.
    ///
    /// `cloud` is the latest point cloud delivered since the previous
    /// cycle, if any. An armed evasion consumes the cycle without looking
    /// at the cloud.
    pub fn cycle(&mut self, cloud: Option<&[Point3]>) -> CycleOutput {
        let params = self.store.snapshot();
        let volume = BoundingVolume::from_params(&params);

        if let Some(maneuver) = self.bumper.evasion_tick() {
            return CycleOutput {
                regime: Regime::Evading,
                command: Some(maneuver.command()),
                markers: self.markers(&volume),
            };
        }

        let Some(points) = cloud else {
            // Nothing new to perceive this tick
            return CycleOutput {
                regime: self.idle_regime(),
                command: None,
                markers: self.markers(&volume),
            };
        };

        let summary = PointFilter::new(volume).summarize(points);
        self.last_summary = summary;

        let (regime, command) = if summary.count > MIN_TRACKING_POINTS {
            if summary.z_min - params.goal_z > 0.0 {
                tracing::debug!(
                    "approaching: centroid=({:.2}, {:.2}) z_min={:.2} points={}",
                    summary.x,
                    summary.y,
                    summary.z_min,
                    summary.count
                );
                (
                    Regime::Approaching,
                    Some(self.controller.approach(&summary)),
                )
            } else {
                tracing::debug!(
                    "arrived: z_min={:.2} goal_z={:.2} points={}",
                    summary.z_min,
                    params.goal_z,
                    summary.count
                );
                (Regime::Arrived, Some(self.controller.arrived(&summary)))
            }
        } else if self.store.enabled() {
            tracing::debug!("seeking: {} points in volume", summary.count);
            (Regime::Seeking, Some(VelocityController::crawl()))
        } else {
            (Regime::Disabled, None)
        };

        CycleOutput {
            regime,
            command,
            markers: self.markers(&volume),
        }
    }

    fn idle_regime(&self) -> Regime {
        if self.store.enabled() {
            Regime::Seeking
        } else {
            Regime::Disabled
        }
    }

    fn markers(&self, volume: &BoundingVolume) -> Vec<Marker> {
        vec![
            centroid_marker(&self.frame_id, &self.last_summary),
            volume_marker(&self.frame_id, volume),
        ]
    }
}
