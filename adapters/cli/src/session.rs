//! Frame-stepped session tying the world, pathfinding and fog together.

use anyhow::{bail, Context, Result};
use fogline_core::{Command, Event, FogState, GridCoordinate};
use fogline_system_fog_of_war::{FogDelta, VisibilityTracker};
use fogline_system_pathfinding::{PathRequest, PathRequestQueue, PathResponse, Pathfinder};
use fogline_world::{self as world, query, World};

use crate::{
    scenario::{Observer, Scenario},
    snapshot_transfer::SessionSnapshot,
};

/// Outcome of a single simulated frame.
#[derive(Debug)]
pub(crate) struct FrameReport {
    pub(crate) frame: u32,
    pub(crate) fog: FogDelta,
    pub(crate) responses: Vec<PathResponse>,
    pub(crate) searches: usize,
}

/// Owns every piece of state a host keeps between frames.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    pathfinder: Pathfinder,
    requests: PathRequestQueue,
    fog: VisibilityTracker,
    observers: Vec<Observer>,
    frame: u32,
}

impl Session {
    /// Builds the map, places occupants and queues the scenario's path orders.
    pub(crate) fn from_scenario(scenario: &Scenario) -> Result<Self> {
        let mut world = World::new(&scenario.map).context("failed to generate map")?;

        let mut commands = Vec::new();
        commands.extend(scenario.buildings.iter().map(|placement| {
            Command::SetBuildingOccupancy {
                cell: placement.cell(),
                building: Some(placement.entity()),
            }
        }));
        commands.extend(
            scenario
                .units
                .iter()
                .map(|placement| Command::SetUnitOccupancy {
                    cell: placement.cell(),
                    unit: Some(placement.entity()),
                }),
        );
        apply_all(&mut world, commands)?;

        let mut requests = PathRequestQueue::new();
        for order in &scenario.paths {
            requests.request_with(PathRequest {
                requester: order.requester(),
                start: order.start(),
                goal: order.goal(),
                traversal: order.traversal,
            });
        }

        let fog = VisibilityTracker::for_grid(query::grid(&world));
        tracing::info!(
            columns = scenario.map.columns,
            rows = scenario.map.rows,
            buildings = scenario.buildings.len(),
            units = scenario.units.len(),
            observers = scenario.observers.len(),
            paths = requests.len(),
            "session ready"
        );

        Ok(Self {
            world,
            pathfinder: Pathfinder::new(),
            requests,
            fog,
            observers: scenario.observers.clone(),
            frame: 0,
        })
    }

    /// Replaces map, occupancy and exploration with a previously exported snapshot.
    ///
    /// The session is left untouched when any part of the snapshot is rejected.
    pub(crate) fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let mut world = World::new(&snapshot.map).context("failed to restore map")?;
        apply_all(
            &mut world,
            vec![Command::RestoreOccupancy {
                snapshot: snapshot.occupancy.clone(),
            }],
        )
        .context("failed to restore occupancy")?;

        let mut fog = VisibilityTracker::for_grid(query::grid(&world));
        fog.restore(&snapshot.fog)
            .context("failed to restore fog of war")?;

        self.world = world;
        self.fog = fog;
        tracing::info!(
            explored = self.fog.explored_count(),
            visible = self.fog.visible_count(),
            "session restored"
        );
        Ok(())
    }

    /// Reports observer visibility, reconciles fog and answers queued path requests.
    pub(crate) fn step(&mut self, path_budget: usize) -> FrameReport {
        for observer in &self.observers {
            self.fog
                .report_observer(observer.position_at(self.frame), observer.radius);
        }
        let fog = self.fog.reconcile();

        let mut responses = Vec::new();
        let searches = self.requests.process(
            &mut self.pathfinder,
            query::grid(&self.world),
            path_budget,
            &mut responses,
        );

        let report = FrameReport {
            frame: self.frame,
            fog,
            responses,
            searches,
        };
        self.frame += 1;
        report
    }

    /// Number of path requests still waiting for a route.
    pub(crate) fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Explored and total cell counts.
    pub(crate) fn exploration(&self) -> (usize, usize) {
        (
            self.fog.explored_count(),
            self.fog.explored_count() + self.fog.unexplored_count(),
        )
    }

    /// Captures everything needed to resume the session later.
    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            map: query::grid(&self.world).config(),
            occupancy: query::occupancy_snapshot(&self.world),
            fog: self.fog.snapshot(),
        }
    }

    /// Text rendering of the map as the player currently sees it.
    ///
    /// Buildings show once explored, units only while in clear sight.
    pub(crate) fn render_fog(&self) -> String {
        let grid = query::grid(&self.world);
        let mut output = String::new();
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                let cell = GridCoordinate::new(column as i32, row as i32);
                let state = self.fog.fog_state(cell);
                let glyph = match state {
                    FogState::Unseen => '?',
                    _ if grid.building_at(cell).is_some() => '#',
                    FogState::Clear if grid.unit_at(cell).is_some() => '@',
                    FogState::Clear => '.',
                    FogState::Dimmed => '~',
                };
                output.push(glyph);
            }
            output.push('\n');
        }
        output
    }
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Result<()> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
        if let Some(Event::CommandRejected { reason }) = events.last() {
            bail!("command rejected: {reason}");
        }
    }
    Ok(())
}
