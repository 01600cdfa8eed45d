use fogline_core::{EntityId, GridCoordinate, GridError, MapConfig, TerrainConfig, Traversal};
use fogline_system_pathfinding::Pathfinder;
use fogline_world::GridIndex;

fn grid(columns: u32, rows: u32) -> GridIndex {
    GridIndex::generate(&MapConfig::new(columns, rows)).expect("valid grid")
}

fn place_building(grid: &mut GridIndex, column: i32, row: i32, id: u32) {
    let _ = grid
        .set_building_occupancy(GridCoordinate::new(column, row), Some(EntityId::new(id)))
        .expect("cell within grid");
}

#[test]
fn start_equal_to_goal_yields_single_waypoint() {
    let grid = grid(5, 5);
    let mut pathfinder = Pathfinder::new();
    let cell = GridCoordinate::new(2, 3);

    let path = pathfinder.find_path(&grid, cell, cell).expect("in bounds");

    assert_eq!(path.len(), 1);
    assert_eq!(path.first(), Some(grid.grid_to_position(cell)));
}

#[test]
fn open_grid_diagonal_costs_four_diagonal_steps() {
    let grid = grid(5, 5);
    let mut pathfinder = Pathfinder::new();

    let plan = pathfinder
        .plan(
            &grid,
            GridCoordinate::new(0, 0),
            GridCoordinate::new(4, 4),
            Traversal::Walkable,
        )
        .expect("in bounds");

    assert!((plan.cost() - 11.2).abs() < 1e-4, "cost {}", plan.cost());
    assert_eq!(
        plan.cells(),
        &[
            GridCoordinate::new(0, 0),
            GridCoordinate::new(1, 1),
            GridCoordinate::new(2, 2),
            GridCoordinate::new(3, 3),
            GridCoordinate::new(4, 4),
        ]
    );
    assert_eq!(plan.path().len(), 5);
    assert_eq!(plan.path().first(), Some(grid.grid_to_position(GridCoordinate::new(0, 0))));
    assert_eq!(plan.path().last(), Some(grid.grid_to_position(GridCoordinate::new(4, 4))));
}

#[test]
fn enclosed_goal_is_unreachable() {
    let mut grid = grid(5, 5);
    let goal = GridCoordinate::new(2, 2);
    for (index, neighbour) in goal.adjacent().enumerate() {
        place_building(&mut grid, neighbour.column(), neighbour.row(), index as u32 + 1);
    }
    let mut pathfinder = Pathfinder::new();

    let plan = pathfinder
        .plan(&grid, GridCoordinate::new(0, 0), goal, Traversal::Walkable)
        .expect("in bounds");

    assert!(!plan.is_reachable());
    assert!(plan.path().is_empty());
    assert!(plan.cost().is_infinite());
}

#[test]
fn occupied_goal_is_unreachable_when_walking() {
    let mut grid = grid(3, 1);
    let goal = GridCoordinate::new(2, 0);
    let _ = grid
        .set_unit_occupancy(goal, Some(EntityId::new(9)))
        .expect("in bounds");
    let mut pathfinder = Pathfinder::new();

    let walking = pathfinder
        .find_path(&grid, GridCoordinate::new(0, 0), goal)
        .expect("in bounds");
    assert!(walking.is_empty());

    let pathing = pathfinder
        .find_path_with(&grid, GridCoordinate::new(0, 0), goal, Traversal::Pathable)
        .expect("in bounds");
    assert_eq!(pathing.len(), 3);
}

#[test]
fn pathable_traversal_passes_units_but_not_buildings() {
    let mut grid = grid(3, 1);
    let _ = grid
        .set_unit_occupancy(GridCoordinate::new(1, 0), Some(EntityId::new(1)))
        .expect("in bounds");
    let mut pathfinder = Pathfinder::new();
    let start = GridCoordinate::new(0, 0);
    let goal = GridCoordinate::new(2, 0);

    assert!(pathfinder
        .find_path(&grid, start, goal)
        .expect("in bounds")
        .is_empty());
    assert_eq!(
        pathfinder
            .find_path_with(&grid, start, goal, Traversal::Pathable)
            .expect("in bounds")
            .len(),
        3
    );

    place_building(&mut grid, 1, 0, 2);
    assert!(pathfinder
        .find_path_with(&grid, start, goal, Traversal::Pathable)
        .expect("in bounds")
        .is_empty());
}

#[test]
fn occupied_start_does_not_block_departure() {
    let mut grid = grid(4, 1);
    let start = GridCoordinate::new(0, 0);
    let _ = grid
        .set_unit_occupancy(start, Some(EntityId::new(1)))
        .expect("in bounds");
    let mut pathfinder = Pathfinder::new();

    let path = pathfinder
        .find_path(&grid, start, GridCoordinate::new(3, 0))
        .expect("in bounds");

    assert_eq!(path.len(), 4);
}

#[test]
fn out_of_bounds_endpoints_are_errors() {
    let grid = grid(3, 3);
    let mut pathfinder = Pathfinder::new();
    let outside = GridCoordinate::new(3, 0);

    assert_eq!(
        pathfinder.find_path(&grid, GridCoordinate::new(0, 0), outside),
        Err(GridError::OutOfBounds { cell: outside })
    );
    assert_eq!(
        pathfinder.find_path(&grid, GridCoordinate::new(-1, 0), GridCoordinate::new(0, 0)),
        Err(GridError::OutOfBounds {
            cell: GridCoordinate::new(-1, 0)
        })
    );
}

#[test]
fn route_detours_around_building_wall() {
    let mut grid = grid(5, 5);
    for row in 0..4 {
        place_building(&mut grid, 2, row, row as u32 + 1);
    }
    let mut pathfinder = Pathfinder::new();

    let plan = pathfinder
        .plan(
            &grid,
            GridCoordinate::new(0, 0),
            GridCoordinate::new(4, 0),
            Traversal::Walkable,
        )
        .expect("in bounds");

    assert!(plan.is_reachable());
    assert!(plan.cells().contains(&GridCoordinate::new(2, 4)));
    assert!(plan
        .cells()
        .iter()
        .all(|cell| grid.is_walkable(*cell).expect("in bounds")));
    assert_consecutive_cells_adjacent(plan.cells());
}

#[test]
fn expensive_terrain_is_avoided_once_edges_are_recomputed() {
    let mut grid = grid(3, 3);
    let start = GridCoordinate::new(0, 1);
    let goal = GridCoordinate::new(2, 1);
    let swamp = GridCoordinate::new(1, 1);
    grid.set_terrain_cost(swamp, 20.0).expect("valid cost");
    let mut pathfinder = Pathfinder::new();

    let stale = pathfinder
        .plan(&grid, start, goal, Traversal::Walkable)
        .expect("in bounds");
    assert!(stale.cells().contains(&swamp));
    assert!((stale.cost() - 4.0).abs() < 1e-4);

    grid.compute_edge_costs();
    let fresh = pathfinder
        .plan(&grid, start, goal, Traversal::Walkable)
        .expect("in bounds");
    assert!(!fresh.cells().contains(&swamp));
    assert!((fresh.cost() - 5.6).abs() < 1e-4, "cost {}", fresh.cost());
}

#[test]
fn matches_exhaustive_search_on_random_maps() {
    let mut seed = 0x5eed_u64;
    let mut pathfinder = Pathfinder::new();

    for round in 0..24 {
        let terrain = TerrainConfig {
            base_cost: 1.0,
            roughness: 3.0,
            seed: round,
        };
        let config = MapConfig::new(9, 7).with_terrain(terrain);
        let mut grid = GridIndex::generate(&config).expect("valid grid");

        let cells: Vec<_> = grid.coordinates().collect();
        for (id, cell) in cells.iter().enumerate() {
            if next_random(&mut seed) % 4 == 0 {
                let _ = grid
                    .set_building_occupancy(*cell, Some(EntityId::new(id as u32)))
                    .expect("in bounds");
            }
        }

        let start = cells[(next_random(&mut seed) as usize) % cells.len()];
        let goal = cells[(next_random(&mut seed) as usize) % cells.len()];

        let plan = pathfinder
            .plan(&grid, start, goal, Traversal::Walkable)
            .expect("in bounds");
        let expected = reference_cost(&grid, start, goal);

        match expected {
            Some(cost) => {
                assert!(plan.is_reachable(), "round {round}: expected a route");
                assert!(
                    (plan.cost() - cost).abs() < 1e-3,
                    "round {round}: {} != {cost}",
                    plan.cost()
                );
                assert_eq!(plan.cells().first(), Some(&start));
                assert_eq!(plan.cells().last(), Some(&goal));
                assert_consecutive_cells_adjacent(plan.cells());
            }
            None => assert!(!plan.is_reachable(), "round {round}: expected no route"),
        }
    }
}

fn assert_consecutive_cells_adjacent(cells: &[GridCoordinate]) {
    for pair in cells.windows(2) {
        let column_step = (pair[0].column() - pair[1].column()).abs();
        let row_step = (pair[0].row() - pair[1].row()).abs();
        assert_eq!(
            column_step.max(row_step),
            1,
            "{} and {} are not adjacent",
            pair[0],
            pair[1]
        );
    }
}

/// Plain Dijkstra over the same graph, quadratic but obviously correct.
fn reference_cost(grid: &GridIndex, start: GridCoordinate, goal: GridCoordinate) -> Option<f32> {
    let start_index = grid.index_of(start)?;
    let goal_index = grid.index_of(goal)?;
    let mut distance = vec![f32::INFINITY; grid.len()];
    let mut done = vec![false; grid.len()];
    distance[start_index] = 0.0;

    loop {
        let current = (0..grid.len())
            .filter(|index| !done[*index] && distance[*index].is_finite())
            .min_by(|a, b| distance[*a].total_cmp(&distance[*b]))?;
        if current == goal_index {
            return Some(distance[current]);
        }
        done[current] = true;

        let node = grid.node_by_index(current)?;
        for edge in node.edges() {
            let neighbour = grid.node_by_index(edge.index())?;
            if !neighbour.is_walkable() {
                continue;
            }
            let total = distance[current] + edge.cost();
            if total < distance[edge.index()] {
                distance[edge.index()] = total;
            }
        }
    }
}

fn next_random(seed: &mut u64) -> u64 {
    *seed = seed
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407);
    *seed >> 33
}
