//! # Localisation module
//!
//! The rover's pose is supplied by the simulator each tick, the autonomy core never corrects or
//! mutates it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::tlm::{RecordedTlm, Telemetry};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose of the rover in the world frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {
    /// The position in the world frame, in world map cells.
    pub position: Vector2<f64>,

    /// Heading of the rover, measured from the world X axis.
    ///
    /// Units: degrees, in the range [0, 360]
    pub yaw_deg: f64,

    /// Units: degrees, in the range [0, 360]
    pub pitch_deg: f64,

    /// Units: degrees, in the range [0, 360]
    pub roll_deg: f64,

    /// Scalar ground speed of the rover.
    pub speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Return the heading of the rover in radians.
    pub fn get_heading(&self) -> f64 {
        self.yaw_deg.to_radians()
    }
}

impl From<&Telemetry> for Pose {
    fn from(tlm: &Telemetry) -> Self {
        Self {
            position: Vector2::new(tlm.position[0], tlm.position[1]),
            yaw_deg: tlm.yaw,
            pitch_deg: tlm.pitch,
            roll_deg: tlm.roll,
            speed_ms: tlm.speed,
        }
    }
}

impl From<&RecordedTlm> for Pose {
    fn from(row: &RecordedTlm) -> Self {
        Self {
            position: Vector2::new(row.x_position, row.y_position),
            yaw_deg: row.yaw,
            pitch_deg: row.pitch,
            roll_deg: row.roll,
            speed_ms: row.speed,
        }
    }
}
