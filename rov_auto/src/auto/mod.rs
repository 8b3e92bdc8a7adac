//! # Autonomy Module
//!
//! This module provides the reactive autonomy of the rover, turning each camera frame and
//! telemetry packet into a drive command while building up a map of the terrain.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use pipeline::{Pipeline, PipelineError, TickInput};

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Localisation module - the pose of the rover as reported by the vehicle
pub mod loc;

/// Map module - accumulates observations into the world map
pub mod map;

/// Navigation manager - the reactive navigation state machine
pub mod nav_mgr;

/// Perception module - converts camera frames into terrain observations
pub mod per;

/// Pipeline - runs all autonomy stages for a single tick
pub mod pipeline;
