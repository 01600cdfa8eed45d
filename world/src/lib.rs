#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative map state management for Fogline.

mod grid;
mod node;
mod terrain;

use fogline_core::{Command, Event, GridError, MapConfig, OccupancyLayer};

pub use grid::GridIndex;
pub use node::{EdgeCost, MapNode};

/// Represents the authoritative Fogline map state.
#[derive(Clone, Debug)]
pub struct World {
    grid: GridIndex,
}

impl World {
    /// Creates a world around a freshly generated grid.
    pub fn new(config: &MapConfig) -> Result<Self, GridError> {
        Ok(Self {
            grid: GridIndex::generate(config)?,
        })
    }

    fn execute(&mut self, command: Command, out_events: &mut Vec<Event>) -> Result<(), GridError> {
        match command {
            Command::GenerateMap { config } => {
                self.grid = GridIndex::generate(&config)?;
                out_events.push(Event::MapGenerated {
                    columns: self.grid.columns(),
                    rows: self.grid.rows(),
                });
            }
            Command::SetTerrainCost { cell, cost } => {
                self.grid.set_terrain_cost(cell, cost)?;
                out_events.push(Event::TerrainChanged { cell, cost });
            }
            Command::RecomputeEdgeCosts => {
                self.grid.compute_edge_costs();
                out_events.push(Event::EdgeCostsRecomputed);
            }
            Command::SetUnitOccupancy { cell, unit } => {
                let previous = self.grid.set_unit_occupancy(cell, unit)?;
                out_events.push(Event::OccupancyChanged {
                    cell,
                    layer: OccupancyLayer::Unit,
                    previous,
                    current: unit,
                });
            }
            Command::SetBuildingOccupancy { cell, building } => {
                let previous = self.grid.set_building_occupancy(cell, building)?;
                out_events.push(Event::OccupancyChanged {
                    cell,
                    layer: OccupancyLayer::Building,
                    previous,
                    current: building,
                });
            }
            Command::RestoreOccupancy { snapshot } => {
                self.grid.restore_occupancy(&snapshot)?;
                out_events.push(Event::OccupancyRestored {
                    units: snapshot.units.len(),
                    buildings: snapshot.buildings.len(),
                });
            }
        }
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that fail leave the world untouched and broadcast
/// [`Event::CommandRejected`] instead.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if let Err(reason) = world.execute(command, out_events) {
        tracing::warn!(%reason, "command rejected");
        out_events.push(Event::CommandRejected { reason });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use fogline_core::{GridCoordinate, GridError, OccupancySnapshot};

    use super::{GridIndex, MapNode, World};

    /// Provides read-only access to the world's grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridIndex {
        &world.grid
    }

    /// Number of columns and rows in the current grid.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.grid.columns(), world.grid.rows())
    }

    /// Node stored at the coordinate.
    pub fn node_at(world: &World, cell: GridCoordinate) -> Result<&MapNode, GridError> {
        world.grid.node_at(cell)
    }

    /// Reports whether neither a unit nor a building blocks the cell.
    pub fn is_walkable(world: &World, cell: GridCoordinate) -> Result<bool, GridError> {
        world.grid.is_walkable(cell)
    }

    /// Captures the occupancy tables for persistence.
    #[must_use]
    pub fn occupancy_snapshot(world: &World) -> OccupancySnapshot {
        world.grid.occupancy_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use fogline_core::{EntityId, GridCoordinate};

    use super::*;

    fn world() -> World {
        World::new(&MapConfig::new(4, 3)).expect("valid configuration")
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        assert!(World::new(&MapConfig::new(0, 3)).is_err());
    }

    #[test]
    fn apply_regenerates_grid() {
        let mut world = world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::GenerateMap {
                config: MapConfig::new(12, 8),
            },
            &mut events,
        );

        assert_eq!(query::dimensions(&world), (12, 8));
        assert_eq!(events, vec![Event::MapGenerated { columns: 12, rows: 8 }]);
    }

    #[test]
    fn invalid_generation_keeps_previous_grid() {
        let mut world = world();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::GenerateMap {
                config: MapConfig::new(0, 0),
            },
            &mut events,
        );

        assert_eq!(query::dimensions(&world), (4, 3));
        assert!(matches!(
            events.as_slice(),
            [Event::CommandRejected {
                reason: GridError::Configuration { .. }
            }]
        ));
    }

    #[test]
    fn occupancy_commands_report_previous_occupant() {
        let mut world = world();
        let mut events = Vec::new();
        let cell = GridCoordinate::new(2, 1);

        apply(
            &mut world,
            Command::SetUnitOccupancy {
                cell,
                unit: Some(EntityId::new(1)),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SetUnitOccupancy { cell, unit: None },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::OccupancyChanged {
                    cell,
                    layer: OccupancyLayer::Unit,
                    previous: None,
                    current: Some(EntityId::new(1)),
                },
                Event::OccupancyChanged {
                    cell,
                    layer: OccupancyLayer::Unit,
                    previous: Some(EntityId::new(1)),
                    current: None,
                },
            ]
        );
        assert_eq!(query::is_walkable(&world, cell), Ok(true));
    }
}
