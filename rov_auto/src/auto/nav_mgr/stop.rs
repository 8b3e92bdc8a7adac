//! # [`NavMode::Stop`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::DriveCmd;

use super::{NavInput, NavMgrParams, NavMode, StepOutput};
use crate::auto::per::PolarObservation;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Step the Stop mode.
///
/// Brakes while the rover is still moving. Transitions to Forward as soon as any navigable
/// terrain is in range.
pub(super) fn step(
    params: &NavMgrParams,
    navigable: &PolarObservation,
    input: &NavInput,
) -> StepOutput {
    let cmd = if input.speed > params.stop_speed_threshold {
        DriveCmd::new(0.0, params.brake_set, 0.0)
    } else {
        DriveCmd::default()
    };

    if navigable.is_empty() {
        StepOutput::stay(cmd)
    } else {
        StepOutput::to(NavMode::Forward, cmd)
    }
}
