//! # Communications interface crate.
//!
//! Provides the interface types exchanged between the rover's autonomy core and its external
//! collaborators: the simulator (telemetry and camera frames) and the actuators (drive commands).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive demands sent to the vehicle
pub mod drive;

/// Telemetry received from the vehicle, live or recorded
pub mod tlm;
