//! Bumper press tracking and evasive-maneuver arming.
//!
//! Presses are edge-triggered: the first press on a side arms a timed
//! evasive maneuver and latches that side's parameters. A press on a
//! different side while evading re-latches (last press wins, no queueing).
//! Releases only clear the side's pressed flag; a running maneuver always
//! plays out its full tick budget.

use crate::controller::Command;

/// Physical bumper segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BumperSide {
    Left,
    Center,
    Right,
}

/// Press/release transition reported by the base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BumperTransition {
    Pressed,
    Released,
}

/// A discrete bumper event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BumperEvent {
    pub side: BumperSide,
    pub transition: BumperTransition,
}

/// Fixed maneuver parameters for one bumper side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvadeManeuver {
    pub linear_x: f64,
    pub angular_z: f64,
    /// Number of 10 Hz control ticks the maneuver runs for
    pub ticks: u32,
}

impl EvadeManeuver {
    pub fn command(&self) -> Command {
        Command::new(self.linear_x, self.angular_z)
    }
}

impl BumperSide {
    /// Back away turning out of the contact: hits on the left or center
    /// turn clockwise, hits on the right turn counter-clockwise.
    pub fn maneuver(self) -> EvadeManeuver {
        match self {
            BumperSide::Left => EvadeManeuver {
                linear_x: -0.2,
                angular_z: -0.4,
                ticks: 15,
            },
            BumperSide::Center => EvadeManeuver {
                linear_x: -0.2,
                angular_z: -0.5,
                ticks: 20,
            },
            BumperSide::Right => EvadeManeuver {
                linear_x: -0.2,
                angular_z: 0.4,
                ticks: 15,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveEvasion {
    side: BumperSide,
    remaining: u32,
}

/// Tracks per-side press state and the active evasive maneuver.
#[derive(Debug, Default)]
pub struct BumperReactor {
    left_pressed: bool,
    center_pressed: bool,
    right_pressed: bool,
    active: Option<ActiveEvasion>,
}

impl BumperReactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one bumper transition.
    pub fn handle_event(&mut self, event: BumperEvent) {
        match event.transition {
            BumperTransition::Pressed => {
                if !self.is_pressed(event.side) {
                    *self.pressed_mut(event.side) = true;
                    self.arm(event.side);
                }
            }
            BumperTransition::Released => {
                // Only the pressed flag; the maneuver keeps running
                *self.pressed_mut(event.side) = false;
            }
        }
    }

    fn arm(&mut self, side: BumperSide) {
        tracing::info!("Bumper {:?} pressed, arming evasive maneuver", side);
        self.active = Some(ActiveEvasion {
            side,
            remaining: side.maneuver().ticks,
        });
    }

    fn pressed_mut(&mut self, side: BumperSide) -> &mut bool {
        match side {
            BumperSide::Left => &mut self.left_pressed,
            BumperSide::Center => &mut self.center_pressed,
            BumperSide::Right => &mut self.right_pressed,
        }
    }

    /// Whether an evasive maneuver is in progress.
    pub fn is_evading(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the given side is currently held pressed.
    pub fn is_pressed(&self, side: BumperSide) -> bool {
        match side {
            BumperSide::Left => self.left_pressed,
            BumperSide::Center => self.center_pressed,
            BumperSide::Right => self.right_pressed,
        }
    }

    /// Advance the active maneuver by one control tick.
    ///
    /// Returns the maneuver to execute this tick, or `None` when no
    /// evasion is armed. The maneuver self-terminates exactly at its
    /// tick budget.
    pub fn evasion_tick(&mut self) -> Option<EvadeManeuver> {
        let active = self.active.as_mut()?;
        let maneuver = active.side.maneuver();

        active.remaining -= 1;
        if active.remaining == 0 {
            tracing::info!("Evasive maneuver complete ({:?})", active.side);
            self.active = None;
        }

        Some(maneuver)
    }
}
