//! # NavMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMgrParams {
    /// Minimum number of in-range navigable points required to keep driving forward.
    pub stop_forward: usize,

    /// Speed above which the rover is considered to be overspeeding.
    ///
    /// Units: meters/second
    pub max_vel: f64,

    /// Throttle applied when no perception is available.
    pub throttle_set: f64,

    /// Brake applied while stopping.
    pub brake_set: f64,

    /// Distance used in place of the forward distance estimate when there is none.
    pub dist_to_obstacle: f64,

    /// The rover is considered stuck when the navigable area is strictly between
    /// `stuck_area_min` and `stuck_area_max`.
    ///
    /// Units: pixels
    pub stuck_area_min: usize,

    /// Navigable area above which a stuck rover resumes driving forward.
    ///
    /// Units: pixels
    pub stuck_area_max: usize,

    /// A sample is within reach when it is closer than this factor times the current speed.
    pub sample_reach_factor: f64,

    /// Brake applied when leaving Forward for Stuck or Sampling, and while Sampling.
    pub transition_brake: f64,

    /// Throttle demanded per unit of drive distance.
    pub dist_throttle_gain: f64,

    /// Throttle removed per unit of current speed.
    pub speed_throttle_gain: f64,

    pub max_throttle: f64,

    /// Units: degrees
    pub max_steer_deg: f64,

    /// Speed above which the Stop mode keeps braking.
    ///
    /// Units: meters/second
    pub stop_speed_threshold: f64,

    /// Steer demand used to turn in place while Stuck.
    ///
    /// Units: degrees
    pub stuck_steer_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavMgrParams {
    fn default() -> Self {
        Self {
            stop_forward: 50,
            max_vel: 2.0,
            throttle_set: 0.2,
            brake_set: 10.0,
            dist_to_obstacle: 0.0,
            stuck_area_min: 10,
            stuck_area_max: 650,
            sample_reach_factor: 5.0,
            transition_brake: 10.0,
            dist_throttle_gain: 0.005,
            speed_throttle_gain: 0.2,
            max_throttle: comms_if::drive::MAX_THROTTLE,
            max_steer_deg: comms_if::drive::MAX_STEER_DEG,
            stop_speed_threshold: 0.2,
            stuck_steer_deg: -15.0,
        }
    }
}
