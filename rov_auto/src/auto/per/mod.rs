//! # Perception module
//!
//! Converts camera frames into classified, rover-centric observations of the terrain.
//!
//! Procedure for each frame:
//!  - Warp the frame into a top-down view ([`Projector::warp`])
//!  - Threshold the warped view into one mask per terrain class ([`classify`])
//!  - Convert the set pixels of each mask to rover-centric points, dropping any beyond the
//!    sensing radius
//!  - Convert those points to polar form

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod classifier;
pub mod projector;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use log::trace;
use serde::{Deserialize, Serialize};

pub use classifier::{classify, ClassMask, ClassMasks, ColourThreshold, TerrainClass};
pub use projector::{
    CalibParams, Homography, PolarObservation, Projector, ProjectorError, RoverCentricPoints,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Manages the perception algorithm, converting camera frames into terrain observations.
#[derive(Debug, Clone)]
pub struct PerMgr {
    pub params: PerMgrParams,

    projector: Projector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerMgrParams {
    /// Width of the camera frames.
    ///
    /// Units: pixels
    pub frame_width: u32,

    /// Height of the camera frames.
    ///
    /// Units: pixels
    pub frame_height: u32,

    /// Perspective calibration of the camera.
    pub calib: CalibParams,

    /// Points further than this from the rover are ignored.
    ///
    /// Units: warped pixels (decimeters)
    pub sensing_radius: f64,

    /// Colour range of navigable ground.
    pub navigable_thresh: ColourThreshold,

    /// Colour range of rock samples.
    pub sample_thresh: ColourThreshold,
}

/// The result of processing a single frame.
#[derive(Debug, Clone)]
pub struct Perception {
    /// Masks of the warped frame.
    pub masks: ClassMasks,

    pub navigable: PolarObservation,
    pub sample: PolarObservation,
    pub obstacle: PolarObservation,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PerMgrParams {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 160,
            calib: CalibParams::default(),
            sensing_radius: 80.0,
            navigable_thresh: ColourThreshold::above([160, 160, 160]),
            sample_thresh: ColourThreshold {
                low: [140, 120, 0],
                high: [255, 230, 80],
            },
        }
    }
}

impl PerMgr {
    /// Create a new perception manager, calculating the perspective transform.
    pub fn new(params: PerMgrParams) -> Result<Self, ProjectorError> {
        let projector = Projector::new(
            &params.calib,
            params.frame_width,
            params.frame_height,
            params.sensing_radius,
        )?;

        Ok(Self { params, projector })
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    /// Returns true if the frame has the dimensions the camera was calibrated for.
    pub fn accepts(&self, frame: &RgbImage) -> bool {
        frame.dimensions() == self.projector.dimensions()
    }

    /// Process a camera frame.
    ///
    /// The frame should have the calibrated dimensions, see [`PerMgr::accepts`].
    pub fn process(&self, frame: &RgbImage) -> Perception {
        let warped = self.projector.warp(frame);

        let masks = classify(
            &warped,
            &self.params.navigable_thresh,
            &self.params.sample_thresh,
        );

        let observe = |class| self.projector.to_rover_centric(masks.get(class)).to_polar();

        let navigable = observe(TerrainClass::Navigable);
        let sample = observe(TerrainClass::Sample);
        let obstacle = observe(TerrainClass::Obstacle);

        trace!(
            "Perception: {} navigable, {} sample, {} obstacle points in range",
            navigable.len(),
            sample.len(),
            obstacle.len()
        );

        Perception {
            masks,
            navigable,
            sample,
            obstacle,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_process_uniform_ground() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let frame = RgbImage::from_pixel(320, 160, Rgb([200, 190, 180]));

        assert!(per_mgr.accepts(&frame));
        assert!(!per_mgr.accepts(&RgbImage::new(160, 80)));

        let per = per_mgr.process(&frame);

        // Ground is visible ahead of the rover, the black border of the warp is obstacle
        assert!(!per.navigable.is_empty());
        assert!(!per.obstacle.is_empty());
        assert!(per.sample.is_empty());
        assert!(per.masks.area(TerrainClass::Navigable) > 0);

        // Everything is within the sensing radius and in front of the rover
        assert!(per.navigable.dists.iter().all(|&d| d < 80.0));
        assert!(per
            .navigable
            .bearings_rad
            .iter()
            .all(|b| b.abs() <= std::f64::consts::FRAC_PI_2));
    }

    #[test]
    fn test_process_dark_frame() {
        let per_mgr = PerMgr::new(PerMgrParams::default()).unwrap();
        let per = per_mgr.process(&RgbImage::new(320, 160));

        assert!(per.navigable.is_empty());
        assert!(per.sample.is_empty());
        assert_eq!(per.masks.area(TerrainClass::Navigable), 0);
        assert_eq!(per.masks.area(TerrainClass::Obstacle), 320 * 160);
    }
}
