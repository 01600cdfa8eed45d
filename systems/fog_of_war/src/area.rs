//! Observer coverage on a square grid.

use fogline_core::GridCoordinate;

/// Cells whose centre lies within `radius` tiles of `center`.
///
/// The result is clipped to `[0, columns) x [0, rows)` and ordered row-major.
/// A negative or non-finite radius covers nothing; a radius of zero covers
/// only `center` when it lies on the grid. Line of sight is not considered.
#[must_use]
pub fn visible_cells_within(
    center: GridCoordinate,
    radius: f32,
    columns: u32,
    rows: u32,
) -> Vec<GridCoordinate> {
    if !radius.is_finite() || radius < 0.0 {
        return Vec::new();
    }

    // Keeps `center +- reach` within i64; the loops below are clipped to the grid.
    let reach = (radius.floor() as i64).min(i64::from(u32::MAX));
    let center_column = i64::from(center.column());
    let center_row = i64::from(center.row());
    let first_column = (center_column - reach).max(0);
    let last_column = (center_column + reach).min(i64::from(columns) - 1);
    let first_row = (center_row - reach).max(0);
    let last_row = (center_row + reach).min(i64::from(rows) - 1);

    let radius_squared = f64::from(radius) * f64::from(radius);
    let mut cells = Vec::new();
    for row in first_row..=last_row {
        for column in first_column..=last_column {
            let dx = (column - center_column) as f64;
            let dy = (row - center_row) as f64;
            if dx * dx + dy * dy <= radius_squared {
                // Both bounds were clipped to u32 grid dimensions.
                cells.push(GridCoordinate::new(column as i32, row as i32));
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_one_covers_plus_shape() {
        let cells = visible_cells_within(GridCoordinate::new(2, 2), 1.0, 5, 5);
        assert_eq!(
            cells,
            vec![
                GridCoordinate::new(2, 1),
                GridCoordinate::new(1, 2),
                GridCoordinate::new(2, 2),
                GridCoordinate::new(3, 2),
                GridCoordinate::new(2, 3),
            ]
        );
    }

    #[test]
    fn diagonal_neighbours_need_radius_above_one_point_four() {
        assert_eq!(
            visible_cells_within(GridCoordinate::new(2, 2), 1.5, 5, 5).len(),
            9
        );
    }

    #[test]
    fn coverage_is_clipped_to_grid() {
        let cells = visible_cells_within(GridCoordinate::new(0, 0), 2.0, 3, 3);
        assert!(cells
            .iter()
            .all(|cell| cell.column() >= 0 && cell.row() >= 0));
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn degenerate_radius_covers_nothing_or_centre() {
        let center = GridCoordinate::new(1, 1);
        assert!(visible_cells_within(center, -1.0, 3, 3).is_empty());
        assert!(visible_cells_within(center, f32::NAN, 3, 3).is_empty());
        assert_eq!(visible_cells_within(center, 0.0, 3, 3), vec![center]);
        assert!(visible_cells_within(GridCoordinate::new(9, 9), 0.5, 3, 3).is_empty());
    }

    #[test]
    fn huge_radius_covers_whole_grid() {
        let cells = visible_cells_within(GridCoordinate::new(1, 1), f32::MAX, 3, 3);
        assert_eq!(cells.len(), 9);
        assert_eq!(cells.first(), Some(&GridCoordinate::new(0, 0)));
        assert_eq!(cells.last(), Some(&GridCoordinate::new(2, 2)));

        let distant = visible_cells_within(GridCoordinate::new(-40, 7), 1.0e9, 3, 3);
        assert_eq!(distant.len(), 9);
    }

    #[test]
    fn empty_grid_covers_nothing() {
        assert!(visible_cells_within(GridCoordinate::new(0, 0), 3.0, 0, 0).is_empty());
    }
}
