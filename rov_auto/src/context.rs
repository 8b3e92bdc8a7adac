//! # Rover Context
//!
//! All data the autonomy pipeline works on during a tick. The context is owned by the caller and
//! moved through each stage of [`crate::auto::pipeline::Pipeline::tick`], which returns it updated.

use comms_if::drive::DriveCmd;
use image::RgbImage;

use crate::auto::{
    loc::Pose,
    map::{WorldMap, WorldMapParams},
    nav_mgr::NavMode,
    per::PolarObservation,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RoverContext {
    // Tick management
    /// Number of ticks already executed
    pub num_ticks: u64,

    // Telemetry
    pub pose: Pose,
    pub near_sample: bool,
    pub picking_up: bool,

    // Perception
    /// Navigable observation, `None` when this tick had no usable frame. A frame with no navigable
    /// terrain in range gives an empty observation.
    pub nav_obs: Option<PolarObservation>,
    pub sample_obs: PolarObservation,
    pub obstacle_obs: PolarObservation,

    /// Number of navigable pixels in the warped view, including those beyond the sensing radius.
    pub nav_area: usize,

    /// Distance of the navigable point closest to straight ahead.
    pub forward_dist: Option<f64>,

    /// False colour view of the latest classification.
    pub vision_image: Option<RgbImage>,

    // Map
    pub world_map: WorldMap,

    // Navigation
    pub mode: NavMode,
    pub cmd: DriveCmd,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl RoverContext {
    /// Create the context for the start of a run, with an empty world map.
    pub fn new(map_params: WorldMapParams) -> Self {
        Self {
            num_ticks: 0,
            pose: Pose::default(),
            near_sample: false,
            picking_up: false,
            nav_obs: None,
            sample_obs: PolarObservation::default(),
            obstacle_obs: PolarObservation::default(),
            nav_area: 0,
            forward_dist: None,
            vision_image: None,
            world_map: WorldMap::new(map_params),
            mode: NavMode::default(),
            cmd: DriveCmd::default(),
        }
    }

    /// Clear everything derived from the previous tick's frame.
    pub fn clear_perception(&mut self) {
        self.nav_obs = None;
        self.sample_obs = PolarObservation::default();
        self.obstacle_obs = PolarObservation::default();
        self.nav_area = 0;
        self.forward_dist = None;
        self.vision_image = None;
    }
}
