//! TOML scenario files describing a map, its occupants and the observers.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use fogline_core::{EntityId, GridCoordinate, MapConfig, Traversal};
use serde::Deserialize;

/// Scenario bundled with the binary and used when no file is supplied.
const BUILTIN_SCENARIO: &str = include_str!("../scenarios/outpost.toml");

/// Map, occupants, observers and path orders driving a session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Map generation parameters.
    pub(crate) map: MapConfig,
    /// Buildings placed before the first frame.
    #[serde(default)]
    pub(crate) buildings: Vec<Placement>,
    /// Units placed before the first frame.
    #[serde(default)]
    pub(crate) units: Vec<Placement>,
    /// Observers reporting visibility every frame.
    #[serde(default)]
    pub(crate) observers: Vec<Observer>,
    /// Path requests queued before the first frame.
    #[serde(default)]
    pub(crate) paths: Vec<PathOrder>,
}

impl Scenario {
    /// Parses the scenario shipped with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_SCENARIO).context("built-in scenario is malformed")
    }

    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(contents)?;
        scenario.map.validate()?;
        Ok(scenario)
    }
}

/// Single occupant placed on the map.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Placement {
    id: u32,
    column: i32,
    row: i32,
}

impl Placement {
    pub(crate) const fn entity(&self) -> EntityId {
        EntityId::new(self.id)
    }

    pub(crate) const fn cell(&self) -> GridCoordinate {
        GridCoordinate::new(self.column, self.row)
    }
}

/// Viewer revealing a circular area, optionally moving every frame.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Observer {
    column: i32,
    row: i32,
    /// Sight radius measured in tiles.
    pub(crate) radius: f32,
    /// Columns and rows travelled per frame.
    #[serde(default)]
    drift: [i32; 2],
}

impl Observer {
    /// Cell the observer stands on during `frame`.
    pub(crate) fn position_at(&self, frame: u32) -> GridCoordinate {
        let frame = i32::try_from(frame).unwrap_or(i32::MAX);
        GridCoordinate::new(self.column, self.row).offset(
            self.drift[0].saturating_mul(frame),
            self.drift[1].saturating_mul(frame),
        )
    }
}

/// Route requested on behalf of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PathOrder {
    requester: u32,
    start: [i32; 2],
    goal: [i32; 2],
    #[serde(default)]
    pub(crate) traversal: Traversal,
}

impl PathOrder {
    pub(crate) const fn requester(&self) -> EntityId {
        EntityId::new(self.requester)
    }

    pub(crate) const fn start(&self) -> GridCoordinate {
        GridCoordinate::new(self.start[0], self.start[1])
    }

    pub(crate) const fn goal(&self) -> GridCoordinate {
        GridCoordinate::new(self.goal[0], self.goal[1])
    }
}
