//! Authoritative tile grid with occupancy and precomputed edge costs.

use std::collections::BTreeMap;

use fogline_core::{
    EntityId, GridCoordinate, GridError, MapConfig, OccupancyLayer, OccupancySnapshot,
    OccupantRecord, TerrainConfig, Traversal, WorldPosition, DIAGONAL_STEP, MIN_TERRAIN_COST,
    ORTHOGONAL_STEP,
};

use crate::{
    node::{EdgeCost, MapNode},
    terrain,
};

/// Dense row-major grid of map nodes.
///
/// The grid is the single source of truth for walkability and traversal cost.
/// Besides the per-node occupancy flags it keeps reverse-lookup tables from
/// coordinates to occupying entities; a coordinate is a key in a table iff the
/// matching node flag is set, and every occupancy write updates both before
/// returning.
#[derive(Clone, Debug)]
pub struct GridIndex {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
    terrain: TerrainConfig,
    nodes: Vec<MapNode>,
    unit_at: BTreeMap<GridCoordinate, EntityId>,
    building_at: BTreeMap<GridCoordinate, EntityId>,
    edge_costs_stale: bool,
}

impl GridIndex {
    /// Allocates one node per coordinate in `[0, columns) x [0, rows)`.
    ///
    /// Terrain costs come from the seeded terrain generator and edge costs are
    /// computed before the grid is returned, so it is immediately ready for
    /// path queries.
    pub fn generate(config: &MapConfig) -> Result<Self, GridError> {
        config.validate()?;

        let cell_count_u64 = u64::from(config.columns) * u64::from(config.rows);
        let cell_count = usize::try_from(cell_count_u64).map_err(|_| {
            GridError::configuration(format!(
                "grid of {}x{} does not fit in memory",
                config.columns, config.rows
            ))
        })?;
        let costs = terrain::generate_costs(&config.terrain, cell_count);

        let mut grid = Self {
            columns: config.columns,
            rows: config.rows,
            tile_width: config.tile_width,
            tile_height: config.tile_height,
            terrain: config.terrain,
            nodes: Vec::with_capacity(cell_count),
            unit_at: BTreeMap::new(),
            building_at: BTreeMap::new(),
            edge_costs_stale: true,
        };

        let mut costs = costs.into_iter();
        for row in 0..config.rows {
            for column in 0..config.columns {
                let cell = GridCoordinate::new(column as i32, row as i32);
                let terrain_cost = costs.next().unwrap_or(config.terrain.base_cost);
                let position = grid.grid_to_position(cell);
                grid.nodes.push(MapNode::new(cell, position, terrain_cost));
            }
        }

        grid.compute_edge_costs();
        tracing::debug!(
            columns = grid.columns,
            rows = grid.rows,
            nodes = grid.nodes.len(),
            "generated map nodes"
        );
        Ok(grid)
    }

    /// Rebuilds the traversal cost from every node to each in-bounds neighbour.
    ///
    /// Orthogonal edges cost `1.0 * (a + b)` and diagonal edges `1.4 * (a + b)`
    /// where `a` and `b` are the terrain costs of both endpoints. Running it
    /// again with unchanged terrain produces identical tables.
    pub fn compute_edge_costs(&mut self) {
        for index in 0..self.nodes.len() {
            let cell = self.nodes[index].cell();
            let own_cost = self.nodes[index].terrain_cost();
            let edges: Vec<EdgeCost> = cell
                .adjacent()
                .filter_map(|neighbour| {
                    let neighbour_index = self.index_of(neighbour)?;
                    let step = if Self::is_diagonal(cell, neighbour) {
                        DIAGONAL_STEP
                    } else {
                        ORTHOGONAL_STEP
                    };
                    let terrain = own_cost + self.nodes[neighbour_index].terrain_cost();
                    Some(EdgeCost::new(neighbour, neighbour_index, step * terrain))
                })
                .collect();
            self.nodes[index].set_edges(edges);
        }
        self.edge_costs_stale = false;
    }

    /// Overrides the terrain cost of a single cell.
    ///
    /// Edge costs are left untouched until [`GridIndex::compute_edge_costs`]
    /// runs again.
    pub fn set_terrain_cost(&mut self, cell: GridCoordinate, cost: f32) -> Result<(), GridError> {
        let index = self.require_index(cell)?;
        if !cost.is_finite() || cost < MIN_TERRAIN_COST {
            return Err(GridError::InvalidTerrainCost { cell, cost });
        }
        self.nodes[index].set_terrain_cost(cost);
        self.edge_costs_stale = true;
        Ok(())
    }

    /// Parameters the grid was generated from.
    ///
    /// Terrain edits made through [`GridIndex::set_terrain_cost`] are not
    /// reflected.
    #[must_use]
    pub fn config(&self) -> MapConfig {
        MapConfig::new(self.columns, self.rows)
            .with_tile_size(self.tile_width, self.tile_height)
            .with_terrain(self.terrain)
    }

    /// Reports whether terrain changed since edge costs were last computed.
    #[must_use]
    pub const fn edge_costs_stale(&self) -> bool {
        self.edge_costs_stale
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile width and height in world units.
    #[must_use]
    pub const fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the grid holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reports whether the coordinate addresses a generated node.
    #[must_use]
    pub fn contains(&self, cell: GridCoordinate) -> bool {
        self.index_of(cell).is_some()
    }

    /// Dense row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index_of(&self, cell: GridCoordinate) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Converts world coordinates to the cell containing them.
    ///
    /// The result may lie outside the grid; lookups with it fail with
    /// [`GridError::OutOfBounds`]. A NaN component maps to `i32::MIN` so it
    /// never lands on the grid.
    #[must_use]
    pub fn position_to_grid(&self, x: f32, y: f32) -> GridCoordinate {
        GridCoordinate::new(tile_index(x, self.tile_width), tile_index(y, self.tile_height))
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn grid_to_position(&self, cell: GridCoordinate) -> WorldPosition {
        let tile_width = i64::from(self.tile_width);
        let tile_height = i64::from(self.tile_height);
        let x = i64::from(cell.column()) * tile_width + tile_width / 2;
        let y = i64::from(cell.row()) * tile_height + tile_height / 2;
        WorldPosition::new(x as f32, y as f32)
    }

    /// Node stored at the coordinate.
    pub fn node_at(&self, cell: GridCoordinate) -> Result<&MapNode, GridError> {
        self.get(cell).ok_or(GridError::out_of_bounds(cell))
    }

    /// Node stored at the coordinate, if it lies within the grid.
    #[must_use]
    pub fn get(&self, cell: GridCoordinate) -> Option<&MapNode> {
        self.index_of(cell).and_then(|index| self.nodes.get(index))
    }

    /// Node stored at a dense row-major index.
    #[must_use]
    pub fn node_by_index(&self, index: usize) -> Option<&MapNode> {
        self.nodes.get(index)
    }

    /// Iterator over all nodes in row-major order.
    pub fn nodes(&self) -> impl Iterator<Item = &MapNode> {
        self.nodes.iter()
    }

    /// Iterator over all coordinates in row-major order.
    pub fn coordinates(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.nodes.iter().map(MapNode::cell)
    }

    /// Reports whether neither a unit nor a building blocks the cell.
    pub fn is_walkable(&self, cell: GridCoordinate) -> Result<bool, GridError> {
        self.node_at(cell).map(MapNode::is_walkable)
    }

    /// Reports whether two coordinates differ in both components.
    #[must_use]
    pub const fn is_diagonal(a: GridCoordinate, b: GridCoordinate) -> bool {
        a.is_diagonal_to(b)
    }

    /// Up to eight neighbours of the cell, clipped to the grid bounds.
    pub fn adjacent_in_bounds(&self, cell: GridCoordinate) -> Result<Vec<&MapNode>, GridError> {
        let _ = self.require_index(cell)?;
        Ok(cell
            .adjacent()
            .filter_map(|neighbour| self.get(neighbour))
            .collect())
    }

    /// In-bounds neighbours free of units and buildings.
    pub fn walkable_adjacent(&self, cell: GridCoordinate) -> Result<Vec<&MapNode>, GridError> {
        self.traversable_adjacent(cell, Traversal::Walkable)
    }

    /// In-bounds neighbours free of buildings, ignoring units.
    pub fn pathable_adjacent(&self, cell: GridCoordinate) -> Result<Vec<&MapNode>, GridError> {
        self.traversable_adjacent(cell, Traversal::Pathable)
    }

    /// In-bounds neighbours a path following `traversal` may enter.
    pub fn traversable_adjacent(
        &self,
        cell: GridCoordinate,
        traversal: Traversal,
    ) -> Result<Vec<&MapNode>, GridError> {
        let mut adjacent = self.adjacent_in_bounds(cell)?;
        adjacent.retain(|node| node.permits(traversal));
        Ok(adjacent)
    }

    /// Records the unit standing on the cell, returning the previous one.
    ///
    /// Writing over another unit replaces it; passing `None` clears the cell.
    pub fn set_unit_occupancy(
        &mut self,
        cell: GridCoordinate,
        unit: Option<EntityId>,
    ) -> Result<Option<EntityId>, GridError> {
        self.set_occupancy(cell, OccupancyLayer::Unit, unit)
    }

    /// Records the building covering the cell, returning the previous one.
    ///
    /// Writing over another building replaces it; passing `None` clears the cell.
    pub fn set_building_occupancy(
        &mut self,
        cell: GridCoordinate,
        building: Option<EntityId>,
    ) -> Result<Option<EntityId>, GridError> {
        self.set_occupancy(cell, OccupancyLayer::Building, building)
    }

    /// Unit standing on the cell according to the reverse-lookup table.
    #[must_use]
    pub fn unit_at(&self, cell: GridCoordinate) -> Option<EntityId> {
        self.unit_at.get(&cell).copied()
    }

    /// Building covering the cell according to the reverse-lookup table.
    #[must_use]
    pub fn building_at(&self, cell: GridCoordinate) -> Option<EntityId> {
        self.building_at.get(&cell).copied()
    }

    /// Cells occupied by units in coordinate order.
    pub fn units(&self) -> impl Iterator<Item = (GridCoordinate, EntityId)> + '_ {
        self.unit_at.iter().map(|(cell, unit)| (*cell, *unit))
    }

    /// Cells occupied by buildings in coordinate order.
    pub fn buildings(&self) -> impl Iterator<Item = (GridCoordinate, EntityId)> + '_ {
        self.building_at
            .iter()
            .map(|(cell, building)| (*cell, *building))
    }

    /// Captures both occupancy tables as plain coordinate collections.
    #[must_use]
    pub fn occupancy_snapshot(&self) -> OccupancySnapshot {
        let record = |(cell, entity): (GridCoordinate, EntityId)| OccupantRecord { cell, entity };
        OccupancySnapshot {
            units: self.units().map(record).collect(),
            buildings: self.buildings().map(record).collect(),
        }
    }

    /// Replaces all occupancy with the snapshot contents.
    ///
    /// The snapshot is validated first; on failure the grid is left untouched.
    pub fn restore_occupancy(&mut self, snapshot: &OccupancySnapshot) -> Result<(), GridError> {
        self.validate_records(&snapshot.units, OccupancyLayer::Unit)?;
        self.validate_records(&snapshot.buildings, OccupancyLayer::Building)?;

        self.clear_occupancy();
        for record in &snapshot.units {
            let _ = self.set_occupancy(record.cell, OccupancyLayer::Unit, Some(record.entity))?;
        }
        for record in &snapshot.buildings {
            let _ = self.set_occupancy(
                record.cell,
                OccupancyLayer::Building,
                Some(record.entity),
            )?;
        }
        Ok(())
    }

    fn validate_records(
        &self,
        records: &[OccupantRecord],
        layer: OccupancyLayer,
    ) -> Result<(), GridError> {
        let mut seen = BTreeMap::new();
        for record in records {
            if !self.contains(record.cell) {
                return Err(GridError::invalid_snapshot(format!(
                    "{layer:?} record at {} lies outside the {}x{} map",
                    record.cell, self.columns, self.rows
                )));
            }
            if seen.insert(record.cell, record.entity).is_some() {
                return Err(GridError::invalid_snapshot(format!(
                    "{layer:?} layer lists cell {} more than once",
                    record.cell
                )));
            }
        }
        Ok(())
    }

    fn clear_occupancy(&mut self) {
        for node in &mut self.nodes {
            *node.slot_mut(OccupancyLayer::Unit) = None;
            *node.slot_mut(OccupancyLayer::Building) = None;
        }
        self.unit_at.clear();
        self.building_at.clear();
    }

    fn set_occupancy(
        &mut self,
        cell: GridCoordinate,
        layer: OccupancyLayer,
        occupant: Option<EntityId>,
    ) -> Result<Option<EntityId>, GridError> {
        let index = self.require_index(cell)?;
        let ledger = match layer {
            OccupancyLayer::Unit => &mut self.unit_at,
            OccupancyLayer::Building => &mut self.building_at,
        };
        let previous = std::mem::replace(self.nodes[index].slot_mut(layer), occupant);

        match occupant {
            Some(entity) => {
                let _ = ledger.insert(cell, entity);
            }
            None => {
                let _ = ledger.remove(&cell);
            }
        }

        if let (Some(previous), Some(current)) = (previous, occupant) {
            if previous != current {
                tracing::debug!(
                    %cell,
                    ?layer,
                    previous = previous.get(),
                    current = current.get(),
                    "occupancy overwritten"
                );
            }
        }

        Ok(previous)
    }

    fn require_index(&self, cell: GridCoordinate) -> Result<usize, GridError> {
        self.index_of(cell).ok_or(GridError::out_of_bounds(cell))
    }
}

fn tile_index(value: f32, tile: u32) -> i32 {
    if value.is_nan() {
        return i32::MIN;
    }
    (value / tile as f32).floor() as i32
}
