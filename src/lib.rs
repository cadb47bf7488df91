//! Anugami - follow-behavior controller for VacuumTiger
//!
//! Consumes 3D depth point clouds, extracts the centroid and closest
//! depth of a bounded target region, and emits velocity commands that
//! hold a standoff distance from whatever is in front of the sensor.
//! Collision-bumper events preempt tracking with a fixed-duration
//! evasive maneuver.
//!
//! ## Architecture
//!
//! A single control thread runs the [`follower::FollowerStateMachine`]
//! at a fixed cadence; clouds, bumper events, toggle requests, and
//! reconfigure pushes arrive over one event channel ([`node`]). Command
//! and marker outputs go to collaborator sinks.

pub mod bumper;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod follower;
pub mod markers;
pub mod mock;
pub mod node;

// Re-export commonly used types
pub use config::{FollowConfig, TrackingParams};
pub use error::{FollowError, Result};
pub use follower::{FollowResponse, FollowState, FollowerStateMachine, Regime};
pub use node::{initialize, FollowerHandle};
