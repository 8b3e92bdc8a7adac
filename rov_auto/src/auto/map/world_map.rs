//! # World Map
//!
//! Fixed size grid with one `u8` layer per terrain class. Each update adds to the layers of the
//! cells that were observed, so a layer's value grows with the number of times the rover has seen
//! that class in the cell. Navigable observations always win: after every update a cell with any
//! navigable count has its obstacle layer cleared.

// ------------------------------------------------------------------------------------------------
// INCLUDES
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;
use ndarray::{Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::auto::loc::Pose;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// World Map
///
/// Data is indexed `[[y, x, layer]]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldMap {
    params: WorldMapParams,

    data: Array3<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldMapParams {
    /// Number of cells along each side of the map.
    pub world_size: usize,

    /// Number of rover-centric units (warped pixels) per map cell.
    pub scale: f64,

    /// Maximum pitch and roll at which observations are still added to the map. When the rover
    /// is tilted the perspective calibration no longer holds.
    ///
    /// Units: degrees
    pub level_tol_deg: f64,

    /// Amount added to a layer each time its class is observed in a cell.
    pub map_increment: u8,
}

/// Map cells covered by each class of a single perception.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedCells {
    pub obstacle: Vec<Vector2<usize>>,
    pub sample: Vec<Vector2<usize>>,
    pub navigable: Vec<Vector2<usize>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible layers in a [`WorldMap`]
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub enum WorldMapLayer {
    Obstacle = 0,
    Sample = 1,
    Navigable = 2,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for WorldMapParams {
    fn default() -> Self {
        Self {
            world_size: 200,
            scale: 10.0,
            level_tol_deg: 1.0,
            map_increment: 1,
        }
    }
}

impl WorldMapLayer {
    pub const ALL: [WorldMapLayer; 3] = [
        WorldMapLayer::Obstacle,
        WorldMapLayer::Sample,
        WorldMapLayer::Navigable,
    ];
}

impl WorldMap {
    /// Create a new empty map.
    pub fn new(params: WorldMapParams) -> Self {
        let data = Array3::zeros((params.world_size, params.world_size, WorldMapLayer::ALL.len()));

        Self { params, data }
    }

    pub fn params(&self) -> &WorldMapParams {
        &self.params
    }

    /// Number of cells along each side of the map.
    pub fn size(&self) -> usize {
        self.params.world_size
    }

    /// Get the value of a layer in the given cell, or `None` if the cell is outside the map.
    pub fn get(&self, layer: WorldMapLayer, x: usize, y: usize) -> Option<u8> {
        self.data.get([y, x, layer as usize]).copied()
    }

    /// View of a single layer, indexed `[[y, x]]`.
    pub fn layer(&self, layer: WorldMapLayer) -> ArrayView2<u8> {
        self.data.index_axis(Axis(2), layer as usize)
    }

    /// Number of cells with a non-zero value in the layer.
    pub fn num_cells_set(&self, layer: WorldMapLayer) -> usize {
        self.layer(layer).iter().filter(|&&v| v > 0).count()
    }

    /// Add a perception to the map.
    ///
    /// The map is only updated if the rover is level, returns whether or not the update was
    /// applied.
    pub fn update(&mut self, cells: &ProjectedCells, pose: &Pose) -> bool {
        if !is_level(pose.pitch_deg, pose.roll_deg, self.params.level_tol_deg) {
            trace!(
                "Rover not level (pitch {:.2}, roll {:.2}), map not updated",
                pose.pitch_deg,
                pose.roll_deg
            );
            return false;
        }

        self.increment(WorldMapLayer::Obstacle, &cells.obstacle);
        self.increment(WorldMapLayer::Sample, &cells.sample);
        self.increment(WorldMapLayer::Navigable, &cells.navigable);

        // Navigable observations override obstacles
        for mut cell in self.data.lanes_mut(Axis(2)) {
            if cell[WorldMapLayer::Navigable as usize] > 0 {
                cell[WorldMapLayer::Obstacle as usize] = 0;
            }
        }

        true
    }

    fn increment(&mut self, layer: WorldMapLayer, cells: &[Vector2<usize>]) {
        let inc = self.params.map_increment;

        for cell in cells {
            if let Some(v) = self.data.get_mut([cell.y, cell.x, layer as usize]) {
                *v = v.saturating_add(inc);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Returns true if both pitch and roll (degrees, in the range [0, 360]) are within `tol_deg` of
/// level.
pub fn is_level(pitch_deg: f64, roll_deg: f64, tol_deg: f64) -> bool {
    util::maths::is_near_zero_deg(pitch_deg, tol_deg)
        && util::maths::is_near_zero_deg(roll_deg, tol_deg)
}
