//! # Rover autonomy library.
//!
//! This library allows other crates in the workspace to access items defined inside the rover
//! autonomy crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy - perception, mapping and navigation
pub mod auto;

/// Rover context - the data passed through each tick of the pipeline
pub mod context;

/// Parameters of the autonomy pipeline
pub mod params;
