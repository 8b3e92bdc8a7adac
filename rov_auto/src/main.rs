//! Rover autonomy replay executable.
//!
//! Runs the autonomy pipeline over a run recorded by the simulator.
//!
//! # Usage
//!
//! ```text
//! rov_auto <recording_dir>
//! ```
//!
//! The recording directory must contain the simulator's `robot_log.csv`, with image paths
//! relative to the recording directory.
//!
//! # Architecture
//!
//!     - Initialise session, logger and parameters
//!     - Load the recording
//!     - For each recorded row:
//!         - Load the camera frame
//!         - Run one tick of the pipeline
//!         - Archive the resulting command
//!     - Save the final world map into the session

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::{env, path::PathBuf};

// Internal
use comms_if::tlm;
use rov_lib::{
    auto::{map::WorldMapLayer, Pipeline, TickInput},
    params::RovAutoParams,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the log file written by the simulator into a recording directory.
const RECORDING_LOG_NAME: &str = "robot_log.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One row of the command archive.
#[derive(Serialize)]
struct TickRecord<'a> {
    tick: u64,
    image_path: &'a str,
    mode: String,
    throttle: f64,
    brake: f64,
    steer_deg: f64,
    pickup: bool,
    nav_area: usize,
    nav_points: usize,
    sample_points: usize,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        return Err(eyre!(
            "Expected the path to a recording directory as the only argument, found {} arguments",
            args.len() - 1
        ));
    }

    let recording_dir = PathBuf::from(&args[1]);

    // Initialise session
    let session = Session::new("rov_auto", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Rover Autonomy Replay\n");
    info!("Session directory: {:?}", session.session_root);
    info!("Recording directory: {:?}\n", recording_dir);

    // ---- LOAD PARAMETERS ----

    let params: RovAutoParams =
        util::params::load("rov_auto.toml").wrap_err("Could not load rov_auto params")?;

    debug!("Parameters: {:#?}", params);

    // ---- INITIALISE PIPELINE ----

    let pipeline = Pipeline::new(params).wrap_err("Failed to initialise the pipeline")?;
    let mut ctx = pipeline.init_context();

    let mut cmd_archive =
        Archiver::from_session(&session, "cmd.csv").wrap_err("Failed to create the archive")?;

    info!("Pipeline initialised");

    // ---- LOAD RECORDING ----

    let rows = tlm::read_recording(recording_dir.join(RECORDING_LOG_NAME))
        .wrap_err("Failed to read the recording")?;

    info!("Loaded recording with {} rows\n", rows.len());

    // ---- MAIN LOOP ----

    let mut num_dropped_frames = 0usize;

    for row in rows.iter() {
        let frame = match row.load_frame(&recording_dir) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("Could not load frame {:?}: {}", row.image_path, e);
                num_dropped_frames += 1;
                None
            }
        };

        ctx = pipeline.tick(ctx, TickInput::from_recorded(row, frame));

        cmd_archive
            .serialise(TickRecord {
                tick: ctx.num_ticks,
                image_path: &row.image_path,
                mode: ctx.mode.to_string(),
                throttle: ctx.cmd.throttle,
                brake: ctx.cmd.brake,
                steer_deg: ctx.cmd.steer_deg,
                pickup: ctx.cmd.pickup,
                nav_area: ctx.nav_area,
                nav_points: ctx.nav_obs.as_ref().map(|o| o.len()).unwrap_or(0),
                sample_points: ctx.sample_obs.len(),
            })
            .wrap_err("Failed to archive the tick")?;
    }

    // ---- SHUTDOWN ----

    info!("End of recording reached after {} ticks", ctx.num_ticks);

    if num_dropped_frames > 0 {
        warn!("{} frames could not be loaded", num_dropped_frames);
    }

    for layer in WorldMapLayer::ALL.iter() {
        info!(
            "{:?} cells set: {}",
            layer,
            ctx.world_map.num_cells_set(*layer)
        );
    }

    session.save("world_map.json", ctx.world_map);

    session.exit();

    Ok(())
}
