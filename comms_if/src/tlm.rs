//! # Vehicle Telemetry
//!
//! Telemetry arrives either live from the simulator, as a JSON packet carrying a base64 encoded
//! camera frame ([`Telemetry`]), or from a recorded run, as rows of a `;` separated CSV log
//! ([`RecordedTlm`]) whose image paths are relative to the recording directory.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::Path;

use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single telemetry packet from the simulator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Telemetry {
    /// Vehicle speed.
    ///
    /// Units: meters/second
    pub speed: f64,

    /// World position of the vehicle, `[x, y]`.
    pub position: [f64; 2],

    /// Heading of the vehicle.
    ///
    /// Units: degrees, in the range [0, 360]
    pub yaw: f64,

    /// Units: degrees, in the range [0, 360]
    pub pitch: f64,

    /// Units: degrees, in the range [0, 360]
    pub roll: f64,

    /// Throttle currently applied by the vehicle.
    #[serde(default)]
    pub throttle: f64,

    /// Steering angle currently applied by the vehicle.
    ///
    /// Units: degrees
    #[serde(default)]
    pub steering_angle: f64,

    /// True if the vehicle is close enough to a sample to pick it up.
    #[serde(default)]
    pub near_sample: bool,

    /// True while the vehicle is executing a pickup.
    #[serde(default)]
    pub picking_up: bool,

    /// Number of samples already collected.
    #[serde(default)]
    pub samples_collected: u32,

    /// Base64 encoded camera frame (PNG or JPEG), if one was captured this tick.
    #[serde(default)]
    pub image: Option<String>,
}

/// One row of a recorded run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedTlm {
    /// Path to the camera frame, relative to the recording directory.
    #[serde(rename = "Path")]
    pub image_path: String,

    #[serde(rename = "SteerAngle")]
    pub steer_angle: f64,

    #[serde(rename = "Throttle")]
    pub throttle: f64,

    #[serde(rename = "Brake")]
    pub brake: f64,

    #[serde(rename = "Speed")]
    pub speed: f64,

    #[serde(rename = "X_Position")]
    pub x_position: f64,

    #[serde(rename = "Y_Position")]
    pub y_position: f64,

    #[serde(rename = "Pitch")]
    pub pitch: f64,

    #[serde(rename = "Yaw")]
    pub yaw: f64,

    #[serde(rename = "Roll")]
    pub roll: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur while decoding telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TlmError {
    #[error("The telemetry packet contains no image")]
    NoImage,

    #[error("Failed to decode the image from base64: {0}")]
    Base64DecodeError(base64::DecodeError),

    #[error("Failed to decode the image data: {0}")]
    ImageDecodeError(image::ImageError),

    #[error("Failed to parse the telemetry packet: {0}")]
    JsonError(serde_json::Error),

    #[error("Failed to read the recording: {0}")]
    RecordingError(csv::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Telemetry {
    /// Parse a telemetry packet from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, TlmError> {
        serde_json::from_str(json).map_err(TlmError::JsonError)
    }

    /// Decode the camera frame carried by this packet.
    pub fn decode_frame(&self) -> Result<RgbImage, TlmError> {
        let b64 = self.image.as_ref().ok_or(TlmError::NoImage)?;

        let bytes = base64::decode(b64).map_err(TlmError::Base64DecodeError)?;

        let image = image::load_from_memory(&bytes).map_err(TlmError::ImageDecodeError)?;

        Ok(image.to_rgb8())
    }
}

impl RecordedTlm {
    /// Load the camera frame of this row, resolving its path against the recording directory.
    pub fn load_frame<P: AsRef<Path>>(&self, recording_dir: P) -> Result<RgbImage, TlmError> {
        let image = image::open(recording_dir.as_ref().join(&self.image_path))
            .map_err(TlmError::ImageDecodeError)?;

        Ok(image.to_rgb8())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read all rows of a recorded run from a `;` separated CSV log.
pub fn read_recording<P: AsRef<Path>>(log_path: P) -> Result<Vec<RecordedTlm>, TlmError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_path(log_path.as_ref())
        .map_err(TlmError::RecordingError)?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RecordedTlm>, csv::Error>>()
        .map_err(TlmError::RecordingError)?;

    debug!("Read {} rows from {:?}", rows.len(), log_path.as_ref());

    Ok(rows)
}
