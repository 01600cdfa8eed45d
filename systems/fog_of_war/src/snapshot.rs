//! Persistable view of the exploration state.

use fogline_core::GridCoordinate;
use serde::{Deserialize, Serialize};

/// Explored and visible cells captured for save games.
///
/// Coordinates are stored in row-major order. Restoring a snapshot validates
/// the dimensions, that every cell lies on the grid, and that every visible
/// cell has been explored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FogSnapshot {
    /// Number of columns of the tracked grid.
    pub columns: u32,
    /// Number of rows of the tracked grid.
    pub rows: u32,
    /// Cells that have been seen at least once.
    pub explored: Vec<GridCoordinate>,
    /// Cells visible during the last reconciled frame.
    pub visible: Vec<GridCoordinate>,
}
