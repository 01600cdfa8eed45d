//! Map nodes and their precomputed neighbour costs.

use fogline_core::{EntityId, GridCoordinate, OccupancyLayer, Traversal, WorldPosition};

/// Precomputed traversal cost from a node to one of its in-bounds neighbours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCost {
    neighbour: GridCoordinate,
    index: usize,
    cost: f32,
}

impl EdgeCost {
    pub(crate) const fn new(neighbour: GridCoordinate, index: usize, cost: f32) -> Self {
        Self {
            neighbour,
            index,
            cost,
        }
    }

    /// Coordinate of the neighbouring cell.
    #[must_use]
    pub const fn neighbour(&self) -> GridCoordinate {
        self.neighbour
    }

    /// Dense row-major index of the neighbouring cell within its grid.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Cost of stepping from the owning node onto the neighbour.
    #[must_use]
    pub const fn cost(&self) -> f32 {
        self.cost
    }
}

/// Single cell of the map.
///
/// A node is walkable iff neither a unit nor a building occupies it. The
/// world-space centre and the coordinate never change after generation; the
/// terrain cost only changes through explicit editor commands.
#[derive(Clone, Debug, PartialEq)]
pub struct MapNode {
    cell: GridCoordinate,
    position: WorldPosition,
    terrain_cost: f32,
    unit: Option<EntityId>,
    building: Option<EntityId>,
    edges: Vec<EdgeCost>,
}

impl MapNode {
    pub(crate) fn new(cell: GridCoordinate, position: WorldPosition, terrain_cost: f32) -> Self {
        Self {
            cell,
            position,
            terrain_cost,
            unit: None,
            building: None,
            edges: Vec::new(),
        }
    }

    /// Coordinate identifying the node.
    #[must_use]
    pub const fn cell(&self) -> GridCoordinate {
        self.cell
    }

    /// World-space centre of the tile.
    #[must_use]
    pub const fn position(&self) -> WorldPosition {
        self.position
    }

    /// Terrain movement-cost multiplier, never below one.
    #[must_use]
    pub const fn terrain_cost(&self) -> f32 {
        self.terrain_cost
    }

    /// Unit standing on the node, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<EntityId> {
        self.unit
    }

    /// Building covering the node, if any.
    #[must_use]
    pub const fn building(&self) -> Option<EntityId> {
        self.building
    }

    /// Entity occupying the requested layer.
    #[must_use]
    pub const fn occupant(&self, layer: OccupancyLayer) -> Option<EntityId> {
        match layer {
            OccupancyLayer::Unit => self.unit,
            OccupancyLayer::Building => self.building,
        }
    }

    /// Reports whether neither a unit nor a building blocks the node.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.unit.is_none() && self.building.is_none()
    }

    /// Reports whether no building blocks the node, ignoring units.
    #[must_use]
    pub const fn is_pathable(&self) -> bool {
        self.building.is_none()
    }

    /// Reports whether a path following `traversal` may enter the node.
    #[must_use]
    pub const fn permits(&self, traversal: Traversal) -> bool {
        match traversal {
            Traversal::Walkable => self.is_walkable(),
            Traversal::Pathable => self.is_pathable(),
        }
    }

    /// Precomputed costs towards every in-bounds neighbour.
    #[must_use]
    pub fn edges(&self) -> &[EdgeCost] {
        &self.edges
    }

    /// Precomputed cost of stepping onto `neighbour`, if it is adjacent.
    #[must_use]
    pub fn cost_to(&self, neighbour: GridCoordinate) -> Option<f32> {
        self.edges
            .iter()
            .find(|edge| edge.neighbour == neighbour)
            .map(EdgeCost::cost)
    }

    pub(crate) fn set_terrain_cost(&mut self, cost: f32) {
        self.terrain_cost = cost;
    }

    pub(crate) fn set_edges(&mut self, edges: Vec<EdgeCost>) {
        self.edges = edges;
    }

    pub(crate) fn slot_mut(&mut self, layer: OccupancyLayer) -> &mut Option<EntityId> {
        match layer {
            OccupancyLayer::Unit => &mut self.unit,
            OccupancyLayer::Building => &mut self.building,
        }
    }
}
