#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* pathfinding over the Fogline grid.
//!
//! The [`Pathfinder`] answers one query at a time against an immutable
//! [`GridIndex`]. It keeps scratch buffers between calls to avoid repeated
//! allocations, but every query starts from a clean slate: nothing learned
//! while answering one request influences the next.

mod frontier;
mod requests;

use std::collections::VecDeque;

use fogline_core::{GridCoordinate, GridError, Path, Traversal};
use fogline_world::GridIndex;

use frontier::Frontier;

pub use requests::{PathRequest, PathRequestQueue, PathResponse};

/// Multiplier applied to the heuristic when ordering the frontier.
///
/// Slightly favouring nodes closer to the goal breaks ties between equally
/// long symmetric routes.
pub const HEURISTIC_WEIGHT: f32 = 1.001;

/// Detailed outcome of a single search.
#[derive(Clone, Debug, PartialEq)]
pub struct PathPlan {
    cells: Vec<GridCoordinate>,
    path: Path,
    cost: f32,
    expanded: usize,
}

impl PathPlan {
    fn unreachable(expanded: usize) -> Self {
        Self {
            cells: Vec::new(),
            path: Path::empty(),
            cost: f32::INFINITY,
            expanded,
        }
    }

    /// Cells visited from start to goal inclusive; empty when unreachable.
    #[must_use]
    pub fn cells(&self) -> &[GridCoordinate] {
        &self.cells
    }

    /// World positions of the visited cells.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the plan, yielding the world-space path.
    #[must_use]
    pub fn into_path(self) -> Path {
        self.path
    }

    /// Sum of the edge costs along the route; infinite when unreachable.
    #[must_use]
    pub const fn cost(&self) -> f32 {
        self.cost
    }

    /// Number of nodes finalised while searching.
    #[must_use]
    pub const fn expanded(&self) -> usize {
        self.expanded
    }

    /// Reports whether the goal could be reached.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        !self.cells.is_empty()
    }
}

/// A* solver with reusable scratch buffers.
#[derive(Debug, Default)]
pub struct Pathfinder {
    frontier: Frontier,
    best_cost: Vec<f32>,
    previous: Vec<Option<usize>>,
    closed: Vec<bool>,
}

impl Pathfinder {
    /// Creates a new pathfinder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the cheapest route through walkable cells.
    ///
    /// Both coordinates must lie on the map. Neither has to be walkable, but
    /// every other cell on the route, goal included, must be; an occupied goal
    /// therefore yields an empty path. An empty path is a valid "unreachable"
    /// answer, not an error.
    pub fn find_path(
        &mut self,
        grid: &GridIndex,
        start: GridCoordinate,
        goal: GridCoordinate,
    ) -> Result<Path, GridError> {
        self.find_path_with(grid, start, goal, Traversal::Walkable)
    }

    /// Finds the cheapest route under the provided traversal rule.
    pub fn find_path_with(
        &mut self,
        grid: &GridIndex,
        start: GridCoordinate,
        goal: GridCoordinate,
        traversal: Traversal,
    ) -> Result<Path, GridError> {
        self.plan(grid, start, goal, traversal)
            .map(PathPlan::into_path)
    }

    /// Runs the search and reports the route together with its cost.
    pub fn plan(
        &mut self,
        grid: &GridIndex,
        start: GridCoordinate,
        goal: GridCoordinate,
        traversal: Traversal,
    ) -> Result<PathPlan, GridError> {
        let start_index = grid
            .index_of(start)
            .ok_or(GridError::out_of_bounds(start))?;
        let goal_index = grid.index_of(goal).ok_or(GridError::out_of_bounds(goal))?;

        if grid.edge_costs_stale() {
            tracing::debug!("searching with edge costs that predate the latest terrain change");
        }

        self.reset(grid.len());
        self.best_cost[start_index] = 0.0;
        self.frontier
            .push(start_index, 0.0, heuristic(start, goal) * HEURISTIC_WEIGHT);

        let mut expanded = 0;
        while let Some(entry) = self.frontier.pop() {
            if entry.cost > self.best_cost[entry.index] {
                continue;
            }
            if entry.index == goal_index {
                let plan = self.reconstruct(grid, goal_index, entry.cost, expanded);
                tracing::debug!(
                    %start,
                    %goal,
                    cost = plan.cost,
                    steps = plan.cells.len(),
                    expanded,
                    "path found"
                );
                return Ok(plan);
            }
            if self.closed[entry.index] {
                continue;
            }
            self.closed[entry.index] = true;
            expanded += 1;

            let Some(node) = grid.node_by_index(entry.index) else {
                continue;
            };
            for edge in node.edges() {
                let neighbour_index = edge.index();
                if self.closed[neighbour_index] {
                    continue;
                }
                let Some(neighbour) = grid.node_by_index(neighbour_index) else {
                    continue;
                };
                if !neighbour.permits(traversal) {
                    continue;
                }

                let total = entry.cost + edge.cost();
                if total < self.best_cost[neighbour_index] {
                    self.best_cost[neighbour_index] = total;
                    self.previous[neighbour_index] = Some(entry.index);
                    let priority = total + heuristic(edge.neighbour(), goal) * HEURISTIC_WEIGHT;
                    self.frontier.push(neighbour_index, total, priority);
                }
            }
        }

        tracing::debug!(%start, %goal, expanded, "goal unreachable");
        Ok(PathPlan::unreachable(expanded))
    }

    /// Nearest walkable cell within `max_radius` rings around `origin`.
    ///
    /// Rings are searched outwards; within a ring the cell with the smallest
    /// straight-line distance wins, ties resolved in row-major order. Rings
    /// that lie entirely outside the grid are never visited.
    pub fn closest_walkable(
        grid: &GridIndex,
        origin: GridCoordinate,
        max_radius: u32,
    ) -> Result<Option<GridCoordinate>, GridError> {
        if grid.node_at(origin)?.is_walkable() {
            return Ok(Some(origin));
        }

        let max_radius = max_radius.min(grid.columns().max(grid.rows()));
        let max_radius = i32::try_from(max_radius).unwrap_or(i32::MAX);
        for radius in 1..=max_radius {
            let mut best: Option<(f32, GridCoordinate)> = None;
            for cell in ring(origin, radius) {
                if !grid.get(cell).is_some_and(|node| node.is_walkable()) {
                    continue;
                }
                let distance = origin.euclidean_distance(cell);
                if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                    best = Some((distance, cell));
                }
            }
            if let Some((_, cell)) = best {
                return Ok(Some(cell));
            }
        }
        Ok(None)
    }

    /// Up to `count` distinct walkable cells gathered around `origin`.
    ///
    /// Cells are collected breadth-first over walkable neighbours, so every
    /// returned cell is connected to `origin`. The origin itself leads the
    /// list when it is walkable. Fewer than `count` cells are returned when
    /// the connected area is smaller.
    pub fn group_of_waypoints(
        grid: &GridIndex,
        origin: GridCoordinate,
        count: usize,
    ) -> Result<Vec<GridCoordinate>, GridError> {
        let origin_index = grid
            .index_of(origin)
            .ok_or(GridError::out_of_bounds(origin))?;

        let mut waypoints = Vec::with_capacity(count.min(grid.len()));
        if count == 0 {
            return Ok(waypoints);
        }
        if grid.node_at(origin)?.is_walkable() {
            waypoints.push(origin);
        }

        let mut visited = vec![false; grid.len()];
        visited[origin_index] = true;
        let mut queue = VecDeque::from([origin]);
        while waypoints.len() < count {
            let Some(cell) = queue.pop_front() else {
                tracing::debug!(
                    %origin,
                    requested = count,
                    found = waypoints.len(),
                    "waypoint area exhausted"
                );
                break;
            };
            for neighbour in grid.walkable_adjacent(cell)? {
                let Some(index) = grid.index_of(neighbour.cell()) else {
                    continue;
                };
                if visited[index] {
                    continue;
                }
                visited[index] = true;
                waypoints.push(neighbour.cell());
                queue.push_back(neighbour.cell());
                if waypoints.len() == count {
                    break;
                }
            }
        }
        Ok(waypoints)
    }

    fn reset(&mut self, node_count: usize) {
        self.frontier.clear();
        self.best_cost.clear();
        self.best_cost.resize(node_count, f32::INFINITY);
        self.previous.clear();
        self.previous.resize(node_count, None);
        self.closed.clear();
        self.closed.resize(node_count, false);
    }

    fn reconstruct(
        &self,
        grid: &GridIndex,
        goal_index: usize,
        cost: f32,
        expanded: usize,
    ) -> PathPlan {
        let mut indices = vec![goal_index];
        let mut current = goal_index;
        while let Some(previous) = self.previous[current] {
            indices.push(previous);
            current = previous;
        }
        indices.reverse();

        let nodes: Vec<_> = indices
            .into_iter()
            .filter_map(|index| grid.node_by_index(index))
            .collect();
        PathPlan {
            cells: nodes.iter().map(|node| node.cell()).collect(),
            path: Path::from_waypoints(nodes.iter().map(|node| node.position()).collect()),
            cost,
            expanded,
        }
    }
}

/// Cells on the square ring at Chebyshev distance `radius`, row-major.
fn ring(origin: GridCoordinate, radius: i32) -> impl Iterator<Item = GridCoordinate> {
    let side = usize::try_from(radius.max(1)).unwrap_or(1) * 2;
    (-radius..=radius).flat_map(move |row| {
        let step = if row.abs() == radius { 1 } else { side };
        (-radius..=radius)
            .step_by(step)
            .map(move |column| origin.offset(column, row))
    })
}

fn heuristic(from: GridCoordinate, to: GridCoordinate) -> f32 {
    from.euclidean_distance(to)
}
