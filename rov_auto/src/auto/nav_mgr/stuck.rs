//! # [`NavMode::Stuck`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::DriveCmd;

use super::{NavInput, NavMgrParams, NavMode, StepOutput};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Step the Stuck mode.
///
/// Turns in place until the navigable area exceeds `stuck_area_max`, then returns to Forward.
/// Samples in view do not end the mode.
pub(super) fn step(params: &NavMgrParams, input: &NavInput) -> StepOutput {
    let cmd = DriveCmd::new(0.0, 0.0, params.stuck_steer_deg);

    if input.nav_area > params.stuck_area_max {
        StepOutput::to(NavMode::Forward, cmd)
    } else {
        StepOutput::stay(cmd)
    }
}
