//! # Drive Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum throttle demand the vehicle accepts.
pub const MAX_THROTTLE: f64 = 2.0;

/// Maximum absolute steer demand the vehicle accepts.
///
/// Units: degrees
pub const MAX_STEER_DEG: f64 = 15.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the vehicle each tick.
///
/// A command is recomputed in full every tick, fields are never carried over from a previous
/// command.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCmd {
    /// Throttle demand, in the range [0, 2].
    pub throttle: f64,

    /// Brake demand, always non-negative.
    pub brake: f64,

    /// Steer demand, positive to the left.
    ///
    /// Units: degrees, in the range [-15, 15]
    pub steer_deg: f64,

    /// Request the vehicle to pick up the sample it is next to.
    pub pickup: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveCmd {
    /// Build a command with no pickup request.
    pub fn new(throttle: f64, brake: f64, steer_deg: f64) -> Self {
        Self {
            throttle,
            brake,
            steer_deg,
            pickup: false,
        }
    }

    /// Returns true if all demands are within the ranges the vehicle accepts.
    pub fn is_valid(&self) -> bool {
        (0.0..=MAX_THROTTLE).contains(&self.throttle)
            && self.brake >= 0.0
            && (-MAX_STEER_DEG..=MAX_STEER_DEG).contains(&self.steer_deg)
    }
}
