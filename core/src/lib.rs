#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Fogline map engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired map mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! to react to deterministically. Systems such as the pathfinder and the
//! fog-of-war tracker only ever read the grid through immutable views.

use std::fmt;

use serde::{Deserialize, Serialize};

/// World-space point expressed in the same units as the tile dimensions.
pub type WorldPosition = glam::Vec2;

/// Default width of a single tile measured in world units.
pub const DEFAULT_TILE_WIDTH: u32 = 60;

/// Default height of a single tile measured in world units.
pub const DEFAULT_TILE_HEIGHT: u32 = 50;

/// Smallest terrain movement-cost multiplier a tile may carry.
pub const MIN_TERRAIN_COST: f32 = 1.0;

/// Distance factor applied to edges between orthogonal neighbours.
pub const ORTHOGONAL_STEP: f32 = 1.0;

/// Distance factor applied to edges between diagonal neighbours.
pub const DIAGONAL_STEP: f32 = 1.4;

/// Offsets of the eight cells surrounding a coordinate.
pub const ADJACENT_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Commands that express all permissible map mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current grid and generates a new one from the configuration.
    GenerateMap {
        /// Dimensions, tile size and terrain parameters of the new grid.
        config: MapConfig,
    },
    /// Overrides the terrain movement-cost multiplier of a single cell.
    ///
    /// Edge costs stay stale until [`Command::RecomputeEdgeCosts`] is applied.
    SetTerrainCost {
        /// Cell whose terrain changes.
        cell: GridCoordinate,
        /// New terrain movement-cost multiplier; must be at least [`MIN_TERRAIN_COST`].
        cost: f32,
    },
    /// Recomputes every precomputed neighbour traversal cost.
    RecomputeEdgeCosts,
    /// Marks a cell as occupied by a unit, or clears it when `unit` is `None`.
    SetUnitOccupancy {
        /// Cell whose unit occupancy changes.
        cell: GridCoordinate,
        /// Unit now standing on the cell.
        unit: Option<EntityId>,
    },
    /// Marks a cell as occupied by a building, or clears it when `building` is `None`.
    SetBuildingOccupancy {
        /// Cell whose building occupancy changes.
        cell: GridCoordinate,
        /// Building now covering the cell.
        building: Option<EntityId>,
    },
    /// Replaces every unit and building occupancy with a persisted snapshot.
    RestoreOccupancy {
        /// Occupancy tables captured by a previous session.
        snapshot: OccupancySnapshot,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a new grid replaced the previous one.
    MapGenerated {
        /// Number of columns in the generated grid.
        columns: u32,
        /// Number of rows in the generated grid.
        rows: u32,
    },
    /// Confirms that a cell received a new terrain cost.
    TerrainChanged {
        /// Cell whose terrain changed.
        cell: GridCoordinate,
        /// Terrain cost applied to the cell.
        cost: f32,
    },
    /// Confirms that neighbour traversal costs were rebuilt.
    EdgeCostsRecomputed,
    /// Reports that a cell's occupancy changed on one of its layers.
    OccupancyChanged {
        /// Cell whose occupancy changed.
        cell: GridCoordinate,
        /// Layer that was written.
        layer: OccupancyLayer,
        /// Entity that occupied the layer before the write.
        previous: Option<EntityId>,
        /// Entity that occupies the layer after the write.
        current: Option<EntityId>,
    },
    /// Confirms that occupancy tables were replaced from a snapshot.
    OccupancyRestored {
        /// Number of cells now occupied by units.
        units: usize,
        /// Number of cells now occupied by buildings.
        buildings: usize,
    },
    /// Reports that a command was refused and the world left untouched.
    CommandRejected {
        /// Specific reason the command failed.
        reason: GridError,
    },
}

/// Occupancy layer carried by every map node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupancyLayer {
    /// Transient blocking by a unit standing on the cell.
    Unit,
    /// Long-lived blocking by a building footprint.
    Building,
}

/// Rule deciding which occupied cells a path may cross.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Traversal {
    /// Only cells free of units and buildings may be entered.
    #[default]
    Walkable,
    /// Units are ignored and only buildings block movement, which lets a
    /// path reach cells currently enclosed by other units.
    Pathable,
}

/// Single occupied cell captured in an [`OccupancySnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccupantRecord {
    /// Occupied cell.
    pub cell: GridCoordinate,
    /// Entity occupying the cell.
    pub entity: EntityId,
}

/// Plain coordinate collections describing who blocks which cell.
///
/// Edge costs are not captured; hosts recompute them after loading.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    /// Cells occupied by units, ordered by coordinate.
    pub units: Vec<OccupantRecord>,
    /// Cells occupied by buildings, ordered by coordinate.
    pub buildings: Vec<OccupantRecord>,
}

/// Location of a single map cell expressed as column and row coordinates.
///
/// Components are signed so that converting a world position left of or above
/// the map yields a coordinate outside the grid instead of wrapping around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoordinate {
    column: i32,
    row: i32,
}

impl GridCoordinate {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self {
            column: self.column.saturating_add(columns),
            row: self.row.saturating_add(rows),
        }
    }

    /// Reports whether both components differ from `other`.
    #[must_use]
    pub const fn is_diagonal_to(self, other: GridCoordinate) -> bool {
        self.column != other.column && self.row != other.row
    }

    /// Straight-line distance to `other` measured in cells.
    #[must_use]
    pub fn euclidean_distance(self, other: GridCoordinate) -> f32 {
        let dx = (i64::from(self.column) - i64::from(other.column)) as f32;
        let dy = (i64::from(self.row) - i64::from(other.row)) as f32;
        dx.hypot(dy)
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoordinate) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Unclipped iterator over the eight surrounding coordinates.
    pub fn adjacent(self) -> impl Iterator<Item = GridCoordinate> {
        ADJACENT_OFFSETS
            .into_iter()
            .map(move |(columns, rows)| self.offset(columns, rows))
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Unique identifier assigned to a unit or building by external game logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Three-state fog classification of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FogState {
    /// The cell has never been revealed.
    Unseen,
    /// The cell was revealed before but nobody observes it right now.
    Dimmed,
    /// At least one observer sees the cell in the current frame.
    Clear,
}

/// Ordered world positions leading from a start cell to a goal cell.
///
/// An empty path signals that the goal is unreachable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<WorldPosition>,
}

impl Path {
    /// Path that signals an unreachable goal.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            waypoints: Vec::new(),
        }
    }

    /// Wraps waypoints already ordered from start to goal.
    #[must_use]
    pub fn from_waypoints(waypoints: Vec<WorldPosition>) -> Self {
        Self { waypoints }
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[WorldPosition] {
        &self.waypoints
    }

    /// Number of waypoints, including start and goal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Reports whether the path signals an unreachable goal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Position of the start cell, if the path is non-empty.
    #[must_use]
    pub fn first(&self) -> Option<WorldPosition> {
        self.waypoints.first().copied()
    }

    /// Position of the goal cell, if the path is non-empty.
    #[must_use]
    pub fn last(&self) -> Option<WorldPosition> {
        self.waypoints.last().copied()
    }

    /// Consumes the path, yielding the underlying waypoints.
    #[must_use]
    pub fn into_vec(self) -> Vec<WorldPosition> {
        self.waypoints
    }
}

/// Parameters that drive map generation.
///
/// Unknown keys are rejected when the configuration is deserialised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Number of tile columns laid out in the grid.
    pub columns: u32,
    /// Number of tile rows laid out in the grid.
    pub rows: u32,
    /// Width of a single tile in world units.
    #[serde(default = "default_tile_width")]
    pub tile_width: u32,
    /// Height of a single tile in world units.
    #[serde(default = "default_tile_height")]
    pub tile_height: u32,
    /// Terrain cost generation parameters.
    #[serde(default)]
    pub terrain: TerrainConfig,
}

impl MapConfig {
    /// Creates a configuration with default tile size and flat terrain.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            terrain: TerrainConfig::default(),
        }
    }

    /// Replaces the tile dimensions.
    #[must_use]
    pub fn with_tile_size(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.tile_width = tile_width;
        self.tile_height = tile_height;
        self
    }

    /// Replaces the terrain generation parameters.
    #[must_use]
    pub fn with_terrain(mut self, terrain: TerrainConfig) -> Self {
        self.terrain = terrain;
        self
    }

    /// Checks that the configuration describes a usable grid.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::configuration(format!(
                "grid must have at least one column and one row, got {}x{}",
                self.columns, self.rows
            )));
        }
        if i32::try_from(self.columns).is_err() || i32::try_from(self.rows).is_err() {
            return Err(GridError::configuration(format!(
                "grid of {}x{} exceeds the addressable coordinate range",
                self.columns, self.rows
            )));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(GridError::configuration(format!(
                "tile dimensions must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        self.terrain.validate()
    }
}

/// Seeded terrain cost generation parameters.
///
/// Every tile receives `base_cost + roughness * u` where `u` is drawn
/// uniformly from `[0, 1)` by a generator seeded with `seed`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TerrainConfig {
    /// Cost shared by every tile before roughness is applied.
    pub base_cost: f32,
    /// Upper bound of the random surcharge added to each tile.
    pub roughness: f32,
    /// Seed feeding the terrain generator.
    pub seed: u64,
}

impl TerrainConfig {
    /// Checks that generated costs can never drop below [`MIN_TERRAIN_COST`].
    pub fn validate(&self) -> Result<(), GridError> {
        if !self.base_cost.is_finite() || self.base_cost < MIN_TERRAIN_COST {
            return Err(GridError::configuration(format!(
                "terrain base cost must be at least {MIN_TERRAIN_COST}, got {}",
                self.base_cost
            )));
        }
        if !self.roughness.is_finite() || self.roughness < 0.0 {
            return Err(GridError::configuration(format!(
                "terrain roughness must be a non-negative number, got {}",
                self.roughness
            )));
        }
        Ok(())
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            base_cost: MIN_TERRAIN_COST,
            roughness: 0.0,
            seed: 0,
        }
    }
}

fn default_tile_width() -> u32 {
    DEFAULT_TILE_WIDTH
}

fn default_tile_height() -> u32 {
    DEFAULT_TILE_HEIGHT
}

/// Failures surfaced by grid, pathfinding and fog operations.
///
/// An unreachable goal is not an error; pathfinding reports it with an empty
/// [`Path`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum GridError {
    /// Map generation parameters were invalid.
    #[error("invalid map configuration: {reason}")]
    Configuration {
        /// Human readable description of the problem.
        reason: String,
    },
    /// A coordinate fell outside the generated grid.
    #[error("cell {cell} lies outside the map")]
    OutOfBounds {
        /// Offending coordinate.
        cell: GridCoordinate,
    },
    /// A terrain cost below the minimum or not a finite number was supplied.
    #[error("terrain cost {cost} for cell {cell} must be a finite value of at least {min}", min = MIN_TERRAIN_COST)]
    InvalidTerrainCost {
        /// Cell the cost was meant for.
        cell: GridCoordinate,
        /// Rejected cost.
        cost: f32,
    },
    /// Persisted occupancy or fog state did not match the grid.
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot {
        /// Human readable description of the mismatch.
        reason: String,
    },
}

impl GridError {
    /// Builds a configuration error from the provided description.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Builds an out-of-bounds error for the provided coordinate.
    #[must_use]
    pub const fn out_of_bounds(cell: GridCoordinate) -> Self {
        Self::OutOfBounds { cell }
    }

    /// Builds a snapshot validation error from the provided description.
    #[must_use]
    pub fn invalid_snapshot(reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            reason: reason.into(),
        }
    }
}
