use std::fmt;

/// A (row, column) position on the grid.
///
/// Cells carry no bounds of their own; the grid dimensions are always supplied by
/// whoever owns the grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Whether this cell lies inside a `height` x `width` grid.
    pub fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }

    /// All in-bounds cells within one row and one column of this one, excluding itself.
    /// Corners yield 3 cells, edges 5, interior cells 8.
    pub fn neighbors(self, height: usize, width: usize) -> impl Iterator<Item = Cell> {
        (-1isize..=1).flat_map(move |dr| {
            (-1isize..=1).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let row = self.row as isize + dr;
                let col = self.col as isize + dc;

                if row >= 0 && row < height as isize && col >= 0 && col < width as isize {
                    Some(Cell::new(row as usize, col as usize))
                } else {
                    None
                }
            })
        })
    }

    /// Every cell of a `height` x `width` grid in row-major order.
    pub fn grid(height: usize, width: usize) -> impl Iterator<Item = Cell> {
        (0..height).flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell::new(row, col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_counts() {
        // Corner, edge and interior cells of a 3x3 grid
        assert_eq!(Cell::new(0, 0).neighbors(3, 3).count(), 3);
        assert_eq!(Cell::new(0, 1).neighbors(3, 3).count(), 5);
        assert_eq!(Cell::new(1, 1).neighbors(3, 3).count(), 8);
    }

    #[test]
    fn test_neighbors_exclude_self_and_stay_in_bounds() {
        let cell = Cell::new(2, 3);
        for neighbor in cell.neighbors(3, 4) {
            assert_ne!(neighbor, cell);
            assert!(neighbor.in_bounds(3, 4));
            assert!(neighbor.row.abs_diff(cell.row) <= 1);
            assert!(neighbor.col.abs_diff(cell.col) <= 1);
        }
    }

    #[test]
    fn test_single_cell_grid_has_no_neighbors() {
        assert_eq!(Cell::new(0, 0).neighbors(1, 1).count(), 0);
    }

    #[test]
    fn test_grid_is_row_major() {
        let cells: Vec<Cell> = Cell::grid(2, 3).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[2], Cell::new(0, 2));
        assert_eq!(cells[3], Cell::new(1, 0));
    }
}
