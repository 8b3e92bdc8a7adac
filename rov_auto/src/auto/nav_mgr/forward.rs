//! # [`NavMode::Forward`] implementation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::drive::DriveCmd;
use log::trace;
use util::maths::clamp;

use super::{NavInput, NavMgrParams, NavMode, StepOutput};
use crate::auto::per::PolarObservation;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Step the Forward mode.
///
/// Possible transitions, checked in order:
/// - Stuck, if the navigable area is small but non-zero
/// - Sampling, if a sample will be reached soon at the current speed
/// - Stop, if too few navigable points are in range
pub(super) fn step(
    params: &NavMgrParams,
    navigable: &PolarObservation,
    input: &NavInput,
) -> StepOutput {
    let stop_cmd = DriveCmd::new(0.0, params.transition_brake, 0.0);

    if input.nav_area > params.stuck_area_min && input.nav_area < params.stuck_area_max {
        trace!("Navigable area {} px, rover is stuck", input.nav_area);
        return StepOutput::to(NavMode::Stuck, stop_cmd);
    }

    let sample_dist = input.sample.min_dist();

    if let Some(d) = sample_dist {
        if d < params.sample_reach_factor * input.speed {
            trace!("Sample {:.2} away, stopping to collect", d);
            return StepOutput::to(NavMode::Sampling, stop_cmd);
        }
    }

    if navigable.len() < params.stop_forward {
        return StepOutput::to(NavMode::Stop, DriveCmd::default());
    }

    // Head for the sample if one is visible, otherwise follow the navigable terrain
    let (bearings, dist) = match sample_dist {
        Some(d) => (input.sample, d),
        None => (
            navigable,
            input.forward_dist.unwrap_or(params.dist_to_obstacle),
        ),
    };

    StepOutput::stay(drive_cmd(params, bearings, dist, input.speed))
}

/// Command driving along the mean of the bearings, with throttle growing with the free distance
/// ahead and shrinking with speed.
fn drive_cmd(params: &NavMgrParams, bearings: &PolarObservation, dist: f64, speed: f64) -> DriveCmd {
    let throttle = clamp(
        dist * params.dist_throttle_gain - speed * params.speed_throttle_gain,
        0.0,
        params.max_throttle,
    );

    let steer_deg = clamp(
        bearings.mean_bearing_deg().unwrap_or(0.0),
        -params.max_steer_deg,
        params.max_steer_deg,
    );

    DriveCmd::new(throttle, 0.0, steer_deg)
}

#[cfg(test)]
mod test {
    use super::super::test::{fan, input};
    use super::*;

    #[test]
    fn test_drive_along_navigable() {
        let params = NavMgrParams::default();
        let navigable = PolarObservation {
            dists: vec![100.0; 60],
            bearings_rad: vec![0.1; 60],
        };
        let empty = PolarObservation::default();

        let mut inp = input(Some(&navigable), &empty);
        inp.nav_area = 2000;
        inp.speed = 1.0;

        let out = step(&params, &navigable, &inp);

        assert_eq!(out.transition, None);
        assert!((out.cmd.throttle - (100.0 * 0.005 - 0.2)).abs() < 1e-9);
        assert!((out.cmd.steer_deg - 0.1f64.to_degrees()).abs() < 1e-9);
        assert_eq!(out.cmd.brake, 0.0);
        assert!(!out.cmd.pickup);
    }

    #[test]
    fn test_drive_towards_sample() {
        let params = NavMgrParams::default();
        let navigable = fan(1000, 50.0, 0.6);
        let sample = PolarObservation {
            dists: vec![30.0, 20.0],
            bearings_rad: vec![-0.1, -0.2],
        };

        // Stationary, so the sample is not yet within reach
        let inp = input(Some(&navigable), &sample);
        let out = step(&params, &navigable, &inp);

        assert_eq!(out.transition, None);
        assert!((out.cmd.throttle - 20.0 * 0.005).abs() < 1e-9);
        assert!((out.cmd.steer_deg - (-0.15f64).to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_forward_dist_fallback() {
        let params = NavMgrParams {
            dist_to_obstacle: 100.0,
            ..Default::default()
        };
        let navigable = fan(1000, 50.0, 0.6);
        let empty = PolarObservation::default();

        let mut inp = input(Some(&navigable), &empty);
        inp.forward_dist = None;

        let out = step(&params, &navigable, &inp);
        assert!((out.cmd.throttle - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stuck_bounds_are_exclusive() {
        let params = NavMgrParams::default();
        let navigable = fan(100, 50.0, 0.6);
        let empty = PolarObservation::default();

        let mut inp = input(Some(&navigable), &empty);

        inp.nav_area = 10;
        assert_ne!(step(&params, &navigable, &inp).transition, Some(NavMode::Stuck));

        inp.nav_area = 650;
        assert_ne!(step(&params, &navigable, &inp).transition, Some(NavMode::Stuck));

        inp.nav_area = 11;
        assert_eq!(step(&params, &navigable, &inp).transition, Some(NavMode::Stuck));
    }
}
