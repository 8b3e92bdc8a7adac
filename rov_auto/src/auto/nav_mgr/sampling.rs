//! # [`NavMode::Sampling`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::DriveCmd;

use super::{NavInput, NavMgrParams, NavMode, StepOutput};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Step the Sampling mode.
///
/// Brakes while the rover is moving, returning to Forward once no sample is in view.
pub(super) fn step(params: &NavMgrParams, input: &NavInput) -> StepOutput {
    let cmd = if input.speed != 0.0 {
        DriveCmd::new(0.0, params.transition_brake, 0.0)
    } else {
        DriveCmd::default()
    };

    if input.sample.is_empty() {
        StepOutput::to(NavMode::Forward, cmd)
    } else {
        StepOutput::stay(cmd)
    }
}
