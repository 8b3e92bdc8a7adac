//! # Map
//!
//! This module implements the [`WorldMap`], the persistent record of all terrain the rover has
//! observed during a run.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`WorldMap`] type
mod world_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use world_map::{is_level, ProjectedCells, WorldMap, WorldMapLayer, WorldMapParams};
