//! Control-loop thread and lifecycle around the follow state machine.
//!
//! All inputs (point clouds, bumper transitions, toggle requests, and
//! reconfigure pushes) arrive as events on one bounded channel and are
//! applied inside a single control thread, so at most one handler body
//! runs at a time. The loop ticks at a fixed cadence; each tick drains
//! pending events (latest cloud wins) and runs one cycle, which is also
//! what paces an evasive maneuver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;

use crate::bumper::BumperEvent;
use crate::config::{FollowConfig, TrackingParams};
use crate::controller::Command;
use crate::error::{FollowError, Result};
use crate::filter::Point3;
use crate::follower::{FollowResponse, FollowState, FollowerStateMachine, Regime};
use crate::markers::Marker;

/// Depth of the inbound event queue. Clouds beyond it are dropped;
/// only the most recent one is consulted per tick anyway.
const EVENT_QUEUE_DEPTH: usize = 32;

/// Collaborator accepting velocity commands.
pub trait CommandSink: Send {
    fn publish(&mut self, command: &Command) -> Result<()>;
}

/// Collaborator accepting diagnostic markers.
pub trait MarkerSink: Send {
    fn publish(&mut self, marker: &Marker) -> Result<()>;
}

/// Command sink that logs through tracing. Default for the binary when
/// no real transport is wired up.
pub struct TracingCommandSink;

impl CommandSink for TracingCommandSink {
    fn publish(&mut self, command: &Command) -> Result<()> {
        tracing::info!(
            "cmd_vel: linear={:.2} angular={:.2}",
            command.linear_x,
            command.angular_z
        );
        Ok(())
    }
}

/// Marker sink that discards everything.
pub struct NullMarkerSink;

impl MarkerSink for NullMarkerSink {
    fn publish(&mut self, _marker: &Marker) -> Result<()> {
        Ok(())
    }
}

/// An input for the control loop.
pub enum FollowEvent {
    /// Latest depth cloud; replaces any cloud still queued
    Cloud(Vec<Point3>),
    Bumper(BumperEvent),
    SetFollowState {
        state: FollowState,
        reply: Sender<FollowResponse>,
    },
    Reconfigure(TrackingParams),
}

/// Handle to a running follower node.
///
/// Dropping the handle does not stop the node; call [`shutdown`] for a
/// clean stop (a zero command is sent on the way out).
///
/// [`shutdown`]: FollowerHandle::shutdown
pub struct FollowerHandle {
    events: Sender<FollowEvent>,
    shutdown: Arc<AtomicBool>,
    regime: Arc<RwLock<Regime>>,
    thread: JoinHandle<()>,
}

/// Set up the control loop from a loaded configuration and collaborators.
pub fn initialize(
    config: FollowConfig,
    command_sink: Box<dyn CommandSink>,
    marker_sink: Box<dyn MarkerSink>,
) -> Result<FollowerHandle> {
    let machine = FollowerStateMachine::new(&config)?;

    if config.control.tick_rate_hz <= 0.0 {
        return Err(FollowError::Config(format!(
            "tick_rate_hz ({}) must be positive",
            config.control.tick_rate_hz
        )));
    }
    let tick_interval = Duration::from_secs_f64(1.0 / config.control.tick_rate_hz);

    let (events_tx, events_rx) = bounded(EVENT_QUEUE_DEPTH);
    let shutdown = Arc::new(AtomicBool::new(false));
    let regime = Arc::new(RwLock::new(Regime::Seeking));

    let loop_shutdown = Arc::clone(&shutdown);
    let loop_regime = Arc::clone(&regime);

    let thread = thread::Builder::new()
        .name("follow-control".into())
        .spawn(move || {
            let mut control = ControlLoop {
                machine,
                events: events_rx,
                command_sink,
                marker_sink,
                shutdown: loop_shutdown,
                regime: loop_regime,
                tick_interval,
            };
            control.run();
        })
        .map_err(|e| FollowError::Channel(format!("Failed to spawn control thread: {}", e)))?;

    Ok(FollowerHandle {
        events: events_tx,
        shutdown,
        regime,
        thread,
    })
}

impl FollowerHandle {
    /// Deliver the latest point cloud. If the loop is saturated the cloud
    /// is dropped; a newer one will arrive before the next tick anyway.
    pub fn deliver_cloud(&self, points: Vec<Point3>) -> Result<()> {
        match self.events.try_send(FollowEvent::Cloud(points)) {
            Ok(()) => Ok(()),
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                tracing::debug!("Event queue full, dropping cloud");
                Ok(())
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                Err(FollowError::Channel("control loop exited".into()))
            }
        }
    }

    /// Deliver one bumper transition.
    pub fn deliver_bumper(&self, event: BumperEvent) -> Result<()> {
        self.events
            .send(FollowEvent::Bumper(event))
            .map_err(|_| FollowError::Channel("control loop exited".into()))
    }

    /// Toggle service: request start/stop and wait for the response.
    pub fn set_follow_state(&self, state: FollowState) -> Result<FollowResponse> {
        let (reply_tx, reply_rx) = bounded(1);
        self.events
            .send(FollowEvent::SetFollowState {
                state,
                reply: reply_tx,
            })
            .map_err(|_| FollowError::Channel("control loop exited".into()))?;

        reply_rx
            .recv_timeout(Duration::from_secs(2))
            .map_err(|_| FollowError::Channel("no response from control loop".into()))
    }

    /// Push a full tracking-parameter snapshot.
    pub fn reconfigure(&self, params: TrackingParams) -> Result<()> {
        self.events
            .send(FollowEvent::Reconfigure(params))
            .map_err(|_| FollowError::Channel("control loop exited".into()))
    }

    /// Regime of the most recent cycle, for monitoring.
    pub fn regime(&self) -> Regime {
        *self.regime.read()
    }

    /// Stop the control loop and wait for it to exit.
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::Release);
        if self.thread.join().is_err() {
            tracing::error!("Control thread panicked");
        }
    }
}

struct ControlLoop {
    machine: FollowerStateMachine,
    events: Receiver<FollowEvent>,
    command_sink: Box<dyn CommandSink>,
    marker_sink: Box<dyn MarkerSink>,
    shutdown: Arc<AtomicBool>,
    regime: Arc<RwLock<Regime>>,
    tick_interval: Duration,
}

impl ControlLoop {
    fn run(&mut self) {
        tracing::info!(
            "Control loop started ({:.0} Hz)",
            1.0 / self.tick_interval.as_secs_f64()
        );

        loop {
            let tick_start = Instant::now();

            if self.shutdown.load(Ordering::Acquire) {
                tracing::info!("Control loop shutting down");
                self.publish(&Command::stop());
                break;
            }

            let cloud = self.drain_events();
            let output = self.machine.cycle(cloud.as_deref());

            *self.regime.write() = output.regime;

            if let Some(command) = output.command {
                self.publish(&command);
            }
            for marker in &output.markers {
                if let Err(e) = self.marker_sink.publish(marker) {
                    tracing::warn!("Failed to publish marker: {}", e);
                }
            }

            // Maintain the tick cadence
            let elapsed = tick_start.elapsed();
            if elapsed < self.tick_interval {
                thread::sleep(self.tick_interval - elapsed);
            }
        }

        tracing::info!("Control loop exited");
    }

    /// Apply all pending events; returns the newest cloud, if any.
    fn drain_events(&mut self) -> Option<Vec<Point3>> {
        let mut latest_cloud = None;

        while let Ok(event) = self.events.try_recv() {
            match event {
                FollowEvent::Cloud(points) => latest_cloud = Some(points),
                FollowEvent::Bumper(bumper) => self.machine.handle_bumper(bumper),
                FollowEvent::SetFollowState { state, reply } => {
                    let (response, command) = self.machine.set_follow_state(state);
                    if let Some(command) = command {
                        self.publish(&command);
                    }
                    let _ = reply.send(response);
                }
                FollowEvent::Reconfigure(params) => self.machine.reconfigure(params),
            }
        }

        latest_cloud
    }

    fn publish(&mut self, command: &Command) {
        if let Err(e) = self.command_sink.publish(command) {
            tracing::error!("Failed to publish command: {}", e);
        }
    }
}
