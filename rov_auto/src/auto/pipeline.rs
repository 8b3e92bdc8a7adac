//! # Autonomy Pipeline
//!
//! Runs one tick of the autonomy system. The stages of a tick are:
//!
//!  - Telemetry: take the pose and vehicle flags from the tick input
//!  - Perception: warp and classify the frame, converting each class to a polar observation
//!  - Mapping: project the observations into the world and add them to the [`WorldMap`]
//!  - Navigation: step the [`NavMgr`] to get the new mode and drive command
//!
//! Each stage takes the [`RoverContext`] by value and returns it updated. A tick always
//! completes, degraded input only leads to a more conservative command.
//!
//! [`WorldMap`]: super::map::WorldMap

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::tlm::{RecordedTlm, Telemetry};
use image::RgbImage;
use log::{debug, trace, warn};

use super::{
    loc::Pose,
    map::ProjectedCells,
    nav_mgr::{NavInput, NavMgr},
    per::{PerMgr, ProjectorError, TerrainClass},
};
use crate::{context::RoverContext, params::RovAutoParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The autonomy pipeline.
///
/// Holds only the fixed configuration of the run, all state carried between ticks lives in the
/// [`RoverContext`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub params: RovAutoParams,

    per_mgr: PerMgr,
    nav_mgr: NavMgr,
}

/// Input data for a single tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Camera frame captured this tick, if any.
    pub frame: Option<RgbImage>,

    pub pose: Pose,

    pub near_sample: bool,
    pub picking_up: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to initialise perception: {0}")]
    PerInitError(ProjectorError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TickInput {
    /// Build the input from a live telemetry packet.
    ///
    /// A frame that cannot be decoded is dropped with a warning, the tick then runs without
    /// perception.
    pub fn from_telemetry(tlm: &Telemetry) -> Self {
        let frame = match tlm.decode_frame() {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("Dropping telemetry frame: {}", e);
                None
            }
        };

        debug!(
            "Vehicle applying throttle {:.2}, steer {:.1} deg, {} samples collected",
            tlm.throttle, tlm.steering_angle, tlm.samples_collected
        );

        Self {
            frame,
            pose: Pose::from(tlm),
            near_sample: tlm.near_sample,
            picking_up: tlm.picking_up,
        }
    }

    /// Build the input from a row of a recorded run and its already loaded frame.
    ///
    /// Recordings do not carry the sample flags, so no pickup is ever requested during a replay.
    pub fn from_recorded(row: &RecordedTlm, frame: Option<RgbImage>) -> Self {
        Self {
            frame,
            pose: Pose::from(row),
            near_sample: false,
            picking_up: false,
        }
    }
}

impl Pipeline {
    /// Create a new pipeline, calculating the perspective transform of the camera.
    pub fn new(params: RovAutoParams) -> Result<Self, PipelineError> {
        let per_mgr = PerMgr::new(params.per.clone()).map_err(PipelineError::PerInitError)?;
        let nav_mgr = NavMgr::new(params.nav.clone());

        Ok(Self {
            params,
            per_mgr,
            nav_mgr,
        })
    }

    /// Create the context for the start of a run.
    pub fn init_context(&self) -> RoverContext {
        RoverContext::new(self.params.map.clone())
    }

    /// Run a single tick of the pipeline.
    pub fn tick(&self, ctx: RoverContext, input: TickInput) -> RoverContext {
        let ctx = self.set_telemetry(ctx, &input);
        let ctx = self.perceive(ctx, input.frame.as_ref());
        let ctx = self.update_map(ctx);
        self.navigate(ctx)
    }

    fn set_telemetry(&self, mut ctx: RoverContext, input: &TickInput) -> RoverContext {
        ctx.num_ticks += 1;
        ctx.pose = input.pose;
        ctx.near_sample = input.near_sample;
        ctx.picking_up = input.picking_up;

        if ctx.pose.speed_ms > self.params.nav.max_vel {
            warn!(
                "Rover speed {:.2} m/s exceeds the maximum of {:.2} m/s",
                ctx.pose.speed_ms, self.params.nav.max_vel
            );
        }

        ctx
    }

    fn perceive(&self, mut ctx: RoverContext, frame: Option<&RgbImage>) -> RoverContext {
        ctx.clear_perception();

        let frame = match frame {
            Some(f) if self.per_mgr.accepts(f) => f,
            Some(f) => {
                warn!(
                    "Frame is {:?} but the camera is calibrated for {:?}, frame dropped",
                    f.dimensions(),
                    self.per_mgr.projector().dimensions()
                );
                return ctx;
            }
            None => {
                debug!("No frame this tick");
                return ctx;
            }
        };

        let per = self.per_mgr.process(frame);

        ctx.nav_area = per.masks.area(TerrainClass::Navigable);
        ctx.vision_image = Some(per.masks.vision_image());

        // An empty navigable observation is still a perception, the state machine stops on it
        ctx.forward_dist = per.navigable.forward_dist();
        ctx.nav_obs = Some(per.navigable);
        ctx.sample_obs = per.sample;
        ctx.obstacle_obs = per.obstacle;

        ctx
    }

    fn update_map(&self, mut ctx: RoverContext) -> RoverContext {
        let world_size = self.params.map.world_size;
        let scale = self.params.map.scale;

        let cells = ProjectedCells {
            obstacle: ctx.obstacle_obs.to_world(&ctx.pose, world_size, scale),
            sample: ctx.sample_obs.to_world(&ctx.pose, world_size, scale),
            navigable: ctx
                .nav_obs
                .as_ref()
                .map(|o| o.to_world(&ctx.pose, world_size, scale))
                .unwrap_or_default(),
        };

        let updated = ctx.world_map.update(&cells, &ctx.pose);

        trace!(
            "Map {}: {} obstacle, {} sample, {} navigable cells observed",
            if updated { "updated" } else { "unchanged" },
            cells.obstacle.len(),
            cells.sample.len(),
            cells.navigable.len()
        );

        ctx
    }

    fn navigate(&self, mut ctx: RoverContext) -> RoverContext {
        let input = NavInput {
            navigable: ctx.nav_obs.as_ref(),
            sample: &ctx.sample_obs,
            nav_area: ctx.nav_area,
            forward_dist: ctx.forward_dist,
            speed: ctx.pose.speed_ms,
            near_sample: ctx.near_sample,
            picking_up: ctx.picking_up,
        };

        let (mode, cmd) = self.nav_mgr.step(ctx.mode, &input);

        trace!("NavMgr {}: {:?}", mode, cmd);

        ctx.mode = mode;
        ctx.cmd = cmd;

        ctx
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::{map::WorldMapLayer, nav_mgr::NavMode, per::CalibParams};
    use comms_if::drive::DriveCmd;
    use image::Rgb;
    use nalgebra::Vector2;

    fn pipeline() -> Pipeline {
        Pipeline::new(RovAutoParams::default()).unwrap()
    }

    fn ground_input() -> TickInput {
        TickInput {
            frame: Some(RgbImage::from_pixel(320, 160, Rgb([200, 190, 180]))),
            pose: Pose {
                position: Vector2::new(100.0, 100.0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_init_context() {
        let pipeline = pipeline();
        let ctx = pipeline.init_context();

        assert_eq!(ctx.num_ticks, 0);
        assert_eq!(ctx.mode, NavMode::Forward);
        assert_eq!(ctx.world_map.size(), 200);
        assert_eq!(ctx.world_map.num_cells_set(WorldMapLayer::Navigable), 0);
    }

    #[test]
    fn test_degenerate_calibration() {
        let mut params = RovAutoParams::default();
        params.per.calib = CalibParams {
            src_points: [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [30.0, 0.0]],
            ..Default::default()
        };

        assert!(matches!(
            Pipeline::new(params),
            Err(PipelineError::PerInitError(ProjectorError::Degenerate))
        ));
    }

    #[test]
    fn test_tick_without_frame() {
        let pipeline = pipeline();
        let mut ctx = pipeline.init_context();
        ctx.mode = NavMode::Stuck;

        let ctx = pipeline.tick(ctx, TickInput::default());

        assert_eq!(ctx.num_ticks, 1);
        assert_eq!(ctx.mode, NavMode::Stuck);
        assert!(ctx.nav_obs.is_none());
        assert!(ctx.vision_image.is_none());
        assert_eq!(ctx.cmd, DriveCmd::new(0.2, 0.0, 0.0));
    }

    #[test]
    fn test_tick_wrong_frame_size() {
        let pipeline = pipeline();

        let mut input = ground_input();
        input.frame = Some(RgbImage::from_pixel(160, 80, Rgb([200, 190, 180])));

        let ctx = pipeline.tick(pipeline.init_context(), input);

        assert!(ctx.nav_obs.is_none());
        assert_eq!(ctx.cmd, DriveCmd::new(0.2, 0.0, 0.0));
        assert_eq!(ctx.world_map.num_cells_set(WorldMapLayer::Obstacle), 0);
    }

    #[test]
    fn test_tick_open_ground() {
        let pipeline = pipeline();
        let ctx = pipeline.tick(pipeline.init_context(), ground_input());

        assert_eq!(ctx.num_ticks, 1);
        assert!(ctx.nav_obs.is_some());
        assert!(ctx.nav_area > 650);
        assert!(ctx.forward_dist.is_some());
        assert_eq!(
            ctx.vision_image.as_ref().map(|v| v.dimensions()),
            Some((320, 160))
        );

        // Plenty of ground ahead, keep driving
        assert_eq!(ctx.mode, NavMode::Forward);
        assert!(ctx.cmd.throttle > 0.0);
        assert_eq!(ctx.cmd.brake, 0.0);
        assert!(ctx.cmd.is_valid());

        // Facing +x from (100, 100), so the ground ahead is mapped at larger x
        let map = &ctx.world_map;
        assert!(map.num_cells_set(WorldMapLayer::Navigable) > 0);
        assert!(map.get(WorldMapLayer::Navigable, 102, 100).unwrap_or(0) > 0);
        assert_eq!(map.get(WorldMapLayer::Navigable, 95, 100), Some(0));
    }

    #[test]
    fn test_tick_tilted_does_not_map() {
        let pipeline = pipeline();

        let mut input = ground_input();
        input.pose.pitch_deg = 5.0;

        let ctx = pipeline.tick(pipeline.init_context(), input);

        assert!(ctx.nav_obs.is_some());
        assert_eq!(ctx.world_map.num_cells_set(WorldMapLayer::Navigable), 0);
        assert_eq!(ctx.world_map.num_cells_set(WorldMapLayer::Obstacle), 0);
    }

    #[test]
    fn test_tick_dark_frame() {
        let pipeline = pipeline();

        let mut input = ground_input();
        input.frame = Some(RgbImage::new(320, 160));

        let ctx = pipeline.tick(pipeline.init_context(), input);

        // Nothing navigable in view, so the rover stops rather than cruising
        assert_eq!(ctx.nav_obs.as_ref().map(|o| o.len()), Some(0));
        assert_eq!(ctx.nav_area, 0);
        assert_eq!(ctx.forward_dist, None);
        assert_eq!(ctx.mode, NavMode::Stop);
        assert_eq!(ctx.cmd, DriveCmd::new(0.0, 0.0, 0.0));

        // The obstacles are still mapped
        assert!(ctx.world_map.num_cells_set(WorldMapLayer::Obstacle) > 0);
    }

    #[test]
    fn test_tick_dark_frame_keeps_braking() {
        let pipeline = pipeline();
        let mut ctx = pipeline.init_context();
        ctx.mode = NavMode::Stop;

        let mut input = ground_input();
        input.frame = Some(RgbImage::new(320, 160));
        input.pose.speed_ms = 1.5;

        let ctx = pipeline.tick(ctx, input);

        assert_eq!(ctx.mode, NavMode::Stop);
        assert_eq!(ctx.cmd, DriveCmd::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_tick_does_not_reuse_previous_perception() {
        let pipeline = pipeline();

        let mut first = ground_input();
        first.frame = Some(RgbImage::from_fn(320, 160, |x, _| {
            if x > 200 {
                Rgb([200, 170, 30])
            } else {
                Rgb([200, 190, 180])
            }
        }));

        let ctx = pipeline.tick(pipeline.init_context(), first);
        assert!(!ctx.sample_obs.is_empty());
        assert!(!ctx.obstacle_obs.is_empty());
        assert!(ctx.nav_area > 0);
        assert!(ctx.forward_dist.is_some());
        let map_after_first = ctx.world_map.clone();
        assert!(map_after_first.num_cells_set(WorldMapLayer::Navigable) > 0);

        // Second tick has no frame, nothing from the first frame may drive it
        let ctx = pipeline.tick(ctx, TickInput::default());

        assert_eq!(ctx.num_ticks, 2);
        assert!(ctx.nav_obs.is_none());
        assert!(ctx.sample_obs.is_empty());
        assert!(ctx.obstacle_obs.is_empty());
        assert_eq!(ctx.nav_area, 0);
        assert_eq!(ctx.forward_dist, None);
        assert!(ctx.vision_image.is_none());
        assert_eq!(ctx.cmd, DriveCmd::new(0.2, 0.0, 0.0));

        // The map persists across ticks
        assert_eq!(ctx.world_map, map_after_first);
    }

    #[test]
    fn test_input_from_telemetry_without_image() {
        let tlm = Telemetry {
            speed: 0.0,
            position: [99.7, 85.6],
            yaw: 56.8,
            near_sample: true,
            image: Some("not base64!".into()),
            ..Default::default()
        };

        let input = TickInput::from_telemetry(&tlm);
        assert!(input.frame.is_none());
        assert_eq!(input.pose.position, Vector2::new(99.7, 85.6));
        assert_eq!(input.pose.yaw_deg, 56.8);
        assert!(input.near_sample);

        // The tick still runs, cruising and requesting the pickup
        let pipeline = pipeline();
        let ctx = pipeline.tick(pipeline.init_context(), input);
        assert_eq!(ctx.cmd, DriveCmd { pickup: true, ..DriveCmd::new(0.2, 0.0, 0.0) });
    }

    #[test]
    fn test_tick_pickup() {
        let pipeline = pipeline();

        let mut input = ground_input();
        input.near_sample = true;

        let ctx = pipeline.tick(pipeline.init_context(), input);
        assert!(ctx.cmd.pickup);
    }
}
