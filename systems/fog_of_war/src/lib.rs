#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Incremental fog-of-war tracking.
//!
//! Observers report the cells they can see during a frame; reconciliation then
//! turns the accumulated reports into the authoritative visible set. A cell is
//! [`FogState::Unseen`] until it is first reported, [`FogState::Clear`] while it
//! was reported during the last reconciled frame, and [`FogState::Dimmed`]
//! afterwards. Exploration only grows.

mod area;
mod snapshot;

use fogline_core::{FogState, GridCoordinate, GridError};
use fogline_world::GridIndex;

pub use area::visible_cells_within;
pub use snapshot::FogSnapshot;

/// Cells whose fog state changed during one reconciliation.
///
/// Every list is ordered row-major.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FogDelta {
    /// Cells that became [`FogState::Clear`].
    pub revealed: Vec<GridCoordinate>,
    /// Cells that went from [`FogState::Clear`] to [`FogState::Dimmed`].
    pub dimmed: Vec<GridCoordinate>,
    /// Cells seen for the very first time; always a subset of `revealed`.
    pub newly_explored: Vec<GridCoordinate>,
}

impl FogDelta {
    /// Reports whether no cell changed state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty() && self.dimmed.is_empty()
    }
}

/// Per-grid exploration and visibility bookkeeping.
///
/// State is stored densely so [`VisibilityTracker::fog_state`] is a constant
/// time lookup; index lists keep reconciliation proportional to the number of
/// reported and previously visible cells rather than the grid size.
#[derive(Clone, Debug)]
pub struct VisibilityTracker {
    columns: u32,
    rows: u32,
    explored: Vec<bool>,
    explored_count: usize,
    visible: Vec<bool>,
    visible_cells: Vec<usize>,
    pending: Vec<bool>,
    pending_cells: Vec<usize>,
}

impl VisibilityTracker {
    /// Creates a tracker where every cell of a `columns` by `rows` grid is unseen.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let len = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            explored: vec![false; len],
            explored_count: 0,
            visible: vec![false; len],
            visible_cells: Vec::new(),
            pending: vec![false; len],
            pending_cells: Vec::new(),
        }
    }

    /// Creates a tracker matching the dimensions of `grid`.
    #[must_use]
    pub fn for_grid(grid: &GridIndex) -> Self {
        Self::new(grid.columns(), grid.rows())
    }

    /// Number of tracked columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tracked rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Adds cells seen this frame to the pending set.
    ///
    /// Cells outside the tracked grid are ignored, as are repeated reports of
    /// the same cell.
    pub fn report_visible<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = GridCoordinate>,
    {
        for cell in cells {
            let Some(index) = self.index_of(cell) else {
                continue;
            };
            if !self.pending[index] {
                self.pending[index] = true;
                self.pending_cells.push(index);
            }
        }
    }

    /// Reports every cell within `radius` tiles of `center`.
    pub fn report_observer(&mut self, center: GridCoordinate, radius: f32) {
        let cells = visible_cells_within(center, radius, self.columns, self.rows);
        self.report_visible(cells);
    }

    /// Makes the pending reports authoritative and clears them for the next frame.
    pub fn reconcile(&mut self) -> FogDelta {
        let mut dimmed = Vec::new();
        for &index in &self.visible_cells {
            if !self.pending[index] {
                self.visible[index] = false;
                dimmed.push(index);
            }
        }

        let mut revealed = Vec::new();
        let mut newly_explored = Vec::new();
        for &index in &self.pending_cells {
            if !self.visible[index] {
                self.visible[index] = true;
                revealed.push(index);
            }
            if !self.explored[index] {
                self.explored[index] = true;
                newly_explored.push(index);
            }
            self.pending[index] = false;
        }
        self.explored_count += newly_explored.len();

        self.visible_cells.clear();
        std::mem::swap(&mut self.visible_cells, &mut self.pending_cells);

        let delta = FogDelta {
            revealed: self.to_cells(revealed),
            dimmed: self.to_cells(dimmed),
            newly_explored: self.to_cells(newly_explored),
        };
        tracing::debug!(
            revealed = delta.revealed.len(),
            dimmed = delta.dimmed.len(),
            newly_explored = delta.newly_explored.len(),
            visible = self.visible_cells.len(),
            "fog reconciled"
        );
        delta
    }

    /// Fog state of the cell; cells outside the grid are always unseen.
    #[must_use]
    pub fn fog_state(&self, cell: GridCoordinate) -> FogState {
        match self.index_of(cell) {
            Some(index) if self.visible[index] => FogState::Clear,
            Some(index) if self.explored[index] => FogState::Dimmed,
            _ => FogState::Unseen,
        }
    }

    /// Cells never reported visible, in row-major order.
    pub fn unexplored(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cells_where(&self.explored, false)
    }

    /// Cells reported visible at least once, in row-major order.
    pub fn explored(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cells_where(&self.explored, true)
    }

    /// Cells visible during the last reconciled frame, in row-major order.
    pub fn visible(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.cells_where(&self.visible, true)
    }

    /// Number of explored cells.
    #[must_use]
    pub const fn explored_count(&self) -> usize {
        self.explored_count
    }

    /// Number of cells never reported visible.
    #[must_use]
    pub fn unexplored_count(&self) -> usize {
        self.explored.len() - self.explored_count
    }

    /// Number of currently visible cells.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible_cells.len()
    }

    /// Captures exploration and visibility for persistence.
    ///
    /// Reports made since the last reconciliation are not captured.
    #[must_use]
    pub fn snapshot(&self) -> FogSnapshot {
        FogSnapshot {
            columns: self.columns,
            rows: self.rows,
            explored: self.explored().collect(),
            visible: self.visible().collect(),
        }
    }

    /// Replaces the tracked state with a previously captured snapshot.
    ///
    /// The tracker is left untouched when the snapshot does not describe a
    /// grid of the same size or violates the exploration invariants.
    pub fn restore(&mut self, snapshot: &FogSnapshot) -> Result<(), GridError> {
        if (snapshot.columns, snapshot.rows) != (self.columns, self.rows) {
            return Err(GridError::invalid_snapshot(format!(
                "fog snapshot covers {}x{} cells but the tracker covers {}x{}",
                snapshot.columns, snapshot.rows, self.columns, self.rows
            )));
        }

        let mut explored = vec![false; self.explored.len()];
        for &cell in &snapshot.explored {
            let index = self.index_of(cell).ok_or_else(|| {
                GridError::invalid_snapshot(format!("explored cell {cell} is outside the grid"))
            })?;
            explored[index] = true;
        }

        let mut visible = vec![false; self.visible.len()];
        let mut visible_cells = Vec::new();
        for &cell in &snapshot.visible {
            let index = self.index_of(cell).ok_or_else(|| {
                GridError::invalid_snapshot(format!("visible cell {cell} is outside the grid"))
            })?;
            if !explored[index] {
                return Err(GridError::invalid_snapshot(format!(
                    "visible cell {cell} was never explored"
                )));
            }
            if !visible[index] {
                visible[index] = true;
                visible_cells.push(index);
            }
        }

        self.explored_count = explored.iter().filter(|seen| **seen).count();
        self.explored = explored;
        self.visible = visible;
        self.visible_cells = visible_cells;
        for index in self.pending_cells.drain(..) {
            self.pending[index] = false;
        }
        Ok(())
    }

    fn index_of(&self, cell: GridCoordinate) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    fn cell_at(&self, index: usize) -> GridCoordinate {
        let columns = self.columns as usize;
        // Indices are bounded by columns * rows, both u32.
        GridCoordinate::new((index % columns) as i32, (index / columns) as i32)
    }

    fn to_cells(&self, mut indices: Vec<usize>) -> Vec<GridCoordinate> {
        indices.sort_unstable();
        indices.into_iter().map(|index| self.cell_at(index)).collect()
    }

    fn cells_where<'a>(
        &'a self,
        flags: &'a [bool],
        wanted: bool,
    ) -> impl Iterator<Item = GridCoordinate> + 'a {
        flags
            .iter()
            .enumerate()
            .filter(move |(_, flag)| **flag == wanted)
            .map(move |(index, _)| self.cell_at(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(column: i32, row: i32) -> GridCoordinate {
        GridCoordinate::new(column, row)
    }

    #[test]
    fn fresh_tracker_is_entirely_unseen() {
        let tracker = VisibilityTracker::new(3, 2);
        assert_eq!(tracker.unexplored_count(), 6);
        assert_eq!(tracker.explored_count(), 0);
        assert_eq!(tracker.visible_count(), 0);
        assert_eq!(tracker.unexplored().count(), 6);
        assert_eq!(tracker.fog_state(cell(2, 1)), FogState::Unseen);
    }

    #[test]
    fn reports_only_apply_after_reconciliation() {
        let mut tracker = VisibilityTracker::new(3, 3);
        tracker.report_visible([cell(1, 1)]);
        assert_eq!(tracker.fog_state(cell(1, 1)), FogState::Unseen);

        let delta = tracker.reconcile();
        assert_eq!(tracker.fog_state(cell(1, 1)), FogState::Clear);
        assert_eq!(delta.revealed, vec![cell(1, 1)]);
        assert_eq!(delta.newly_explored, vec![cell(1, 1)]);
        assert!(delta.dimmed.is_empty());
    }

    #[test]
    fn delta_tracks_transitions_between_frames() {
        let mut tracker = VisibilityTracker::new(4, 1);
        tracker.report_visible([cell(0, 0), cell(1, 0)]);
        let _ = tracker.reconcile();

        tracker.report_visible([cell(1, 0), cell(2, 0)]);
        let delta = tracker.reconcile();

        assert_eq!(delta.revealed, vec![cell(2, 0)]);
        assert_eq!(delta.dimmed, vec![cell(0, 0)]);
        assert_eq!(delta.newly_explored, vec![cell(2, 0)]);

        tracker.report_visible([cell(0, 0)]);
        let delta = tracker.reconcile();
        assert_eq!(delta.revealed, vec![cell(0, 0)]);
        assert!(delta.newly_explored.is_empty());
        assert_eq!(delta.dimmed, vec![cell(1, 0), cell(2, 0)]);
    }

    #[test]
    fn unchanged_frame_produces_empty_delta() {
        let mut tracker = VisibilityTracker::new(2, 2);
        tracker.report_visible([cell(0, 0)]);
        let _ = tracker.reconcile();
        tracker.report_visible([cell(0, 0)]);
        assert!(tracker.reconcile().is_empty());
    }

    #[test]
    fn duplicate_and_foreign_reports_are_ignored() {
        let mut tracker = VisibilityTracker::new(2, 2);
        tracker.report_visible([
            cell(0, 0),
            cell(0, 0),
            cell(-1, 0),
            cell(2, 0),
            cell(0, 5),
        ]);
        let delta = tracker.reconcile();

        assert_eq!(delta.revealed, vec![cell(0, 0)]);
        assert_eq!(tracker.visible_count(), 1);
        assert_eq!(tracker.fog_state(cell(-1, 0)), FogState::Unseen);
    }

    #[test]
    fn report_observer_uses_circular_coverage() {
        let mut tracker = VisibilityTracker::new(5, 5);
        tracker.report_observer(cell(2, 2), 1.0);
        let _ = tracker.reconcile();

        assert_eq!(tracker.visible_count(), 5);
        assert_eq!(tracker.fog_state(cell(1, 1)), FogState::Unseen);
        assert_eq!(tracker.fog_state(cell(2, 1)), FogState::Clear);
    }

    #[test]
    fn restore_rejects_mismatched_snapshots_without_side_effects() {
        let mut tracker = VisibilityTracker::new(3, 3);
        tracker.report_visible([cell(0, 0)]);
        let _ = tracker.reconcile();
        let before = tracker.snapshot();

        let wrong_size = FogSnapshot {
            columns: 4,
            ..before.clone()
        };
        assert!(tracker.restore(&wrong_size).is_err());

        let outside = FogSnapshot {
            explored: vec![cell(3, 0)],
            ..before.clone()
        };
        assert!(tracker.restore(&outside).is_err());

        let unexplored_visible = FogSnapshot {
            explored: Vec::new(),
            visible: vec![cell(1, 1)],
            ..before.clone()
        };
        assert!(matches!(
            tracker.restore(&unexplored_visible),
            Err(GridError::InvalidSnapshot { .. })
        ));

        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn restore_discards_pending_reports() {
        let mut tracker = VisibilityTracker::new(2, 2);
        let snapshot = FogSnapshot {
            columns: 2,
            rows: 2,
            explored: vec![cell(0, 0), cell(1, 1)],
            visible: vec![cell(1, 1)],
        };
        tracker.report_visible([cell(1, 0)]);

        tracker.restore(&snapshot).expect("valid snapshot");
        assert_eq!(tracker.fog_state(cell(0, 0)), FogState::Dimmed);
        assert_eq!(tracker.fog_state(cell(1, 1)), FogState::Clear);
        assert_eq!(tracker.explored_count(), 2);

        let delta = tracker.reconcile();
        assert_eq!(delta.dimmed, vec![cell(1, 1)]);
        assert!(delta.revealed.is_empty());
        assert_eq!(tracker.fog_state(cell(1, 0)), FogState::Unseen);
    }
}
