//! # NavMgr module
//!
//! This module implements the [`NavMgr`] state machine, which reacts to the latest perception by
//! choosing the rover's drive command. The state machine is broken down into a number of modes:
//!
//! - `Forward` - Drive along the navigable terrain, or towards a sample if one is visible.
//! - `Stop` - Too little navigable terrain is visible, brake until some is.
//! - `Stuck` - The navigable area is small, turn in place until it opens up.
//! - `Sampling` - A sample is within reach, brake until it is no longer seen.
//!
//! Independently of the mode the manager requests a pickup whenever the rover is stationary next
//! to a sample.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod forward;
mod params;
mod sampling;
mod stop;
mod stuck;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::drive::DriveCmd;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use self::params::NavMgrParams;
use super::per::PolarObservation;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Navigation Manager
#[derive(Debug, Clone)]
pub struct NavMgr {
    pub params: NavMgrParams,
}

/// Everything the state machine reads in a single tick.
#[derive(Debug, Clone, Copy)]
pub struct NavInput<'a> {
    /// Navigable observation, `None` if there was no usable frame this tick.
    pub navigable: Option<&'a PolarObservation>,

    pub sample: &'a PolarObservation,

    /// Number of navigable pixels in the full warped view.
    pub nav_area: usize,

    /// Distance of the navigable point closest to straight ahead.
    pub forward_dist: Option<f64>,

    /// Units: meters/second
    pub speed: f64,

    pub near_sample: bool,
    pub picking_up: bool,
}

/// Output of a mode's step function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    /// Mode to switch to, if any.
    pub transition: Option<NavMode>,

    /// Command for this tick.
    pub cmd: DriveCmd,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavMode {
    Forward,
    Stop,
    Stuck,
    Sampling,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Forward
    }
}

impl Display for NavMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NavMode::Forward => "forward",
            NavMode::Stop => "stop",
            NavMode::Stuck => "stuck",
            NavMode::Sampling => "sampling",
        };

        write!(f, "{}", label)
    }
}

impl StepOutput {
    /// Remain in the current mode with the given command.
    pub fn stay(cmd: DriveCmd) -> Self {
        Self {
            transition: None,
            cmd,
        }
    }

    /// Switch to `mode` with the given command.
    pub fn to(mode: NavMode, cmd: DriveCmd) -> Self {
        Self {
            transition: Some(mode),
            cmd,
        }
    }
}

impl NavMgr {
    pub fn new(params: NavMgrParams) -> Self {
        Self { params }
    }

    /// Step the state machine, returning the new mode and the command for this tick.
    pub fn step(&self, mode: NavMode, input: &NavInput) -> (NavMode, DriveCmd) {
        let output = match input.navigable {
            // No usable frame, cruise without changing mode
            None => {
                debug!("No navigable perception, cruising at {}", self.params.throttle_set);
                StepOutput::stay(DriveCmd::new(self.params.throttle_set, 0.0, 0.0))
            }
            Some(navigable) => match mode {
                NavMode::Forward => forward::step(&self.params, navigable, input),
                NavMode::Stop => stop::step(&self.params, navigable, input),
                NavMode::Stuck => stuck::step(&self.params, input),
                NavMode::Sampling => sampling::step(&self.params, input),
            },
        };

        let new_mode = match output.transition {
            Some(next) if next != mode => {
                info!("NavMgr mode change: {} -> {}", mode, next);
                next
            }
            _ => mode,
        };

        let mut cmd = output.cmd;
        cmd.pickup = should_pickup(input);

        if cmd.pickup {
            info!("Requesting sample pickup");
        }

        (new_mode, cmd)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The rover can pick up a sample when it is stationary next to one and not already doing so.
fn should_pickup(input: &NavInput) -> bool {
    input.near_sample && input.speed == 0.0 && !input.picking_up
}
