use crate::cell::Cell;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// Cells are held in a `BTreeSet` so two constraints over the same cells compare,
/// hash and print identically regardless of the order they were built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    /// Panics if `count` exceeds the number of distinct cells, since no assignment of
    /// mines could ever satisfy such a statement.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        assert!(
            count <= cells.len(),
            "constraint claims {count} mines among only {} cells",
            cells.len()
        );
        Constraint { cells, count }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// A constraint over no cells carries no information and should be dropped.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.cells.contains(cell)
    }

    /// Every member is forced one way: all mines or all safe.
    pub fn is_settled(&self) -> bool {
        self.count == 0 || self.count == self.cells.len()
    }

    /// All member cells if every one of them must be a mine, otherwise nothing.
    pub fn known_mines(&self) -> BTreeSet<Cell> {
        if !self.cells.is_empty() && self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// All member cells if none of them can be a mine, otherwise nothing.
    pub fn known_safes(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a cell whose status has been proven elsewhere. Returns whether the cell
    /// was a member.
    pub fn reduce_known(&mut self, cell: Cell, is_mine: bool) -> bool {
        if !self.cells.remove(&cell) {
            return false;
        }
        if is_mine {
            self.count = self
                .count
                .checked_sub(1)
                .unwrap_or_else(|| panic!("{cell} marked a mine in a constraint with no mines left"));
        }
        assert!(
            self.count <= self.cells.len(),
            "{cell} marked safe but the remaining {} cells cannot hold {} mines",
            self.cells.len(),
            self.count
        );
        true
    }

    pub fn is_subset(&self, other: &Constraint) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// Subset resolution: when one constraint's cells are contained in the other's,
    /// the cells only the larger one covers hold exactly the difference of the counts.
    ///
    /// Returns `None` when neither is a subset of the other or the cell sets are equal.
    pub fn resolve(&self, other: &Constraint) -> Option<Constraint> {
        let (small, large) = if self.is_subset(other) {
            (self, other)
        } else if other.is_subset(self) {
            (other, self)
        } else {
            return None;
        };

        if small.cells.len() == large.cells.len() {
            assert_eq!(
                small.count, large.count,
                "contradictory counts for the same cells {small} / {large}"
            );
            return None;
        }

        let count = large.count.checked_sub(small.count).unwrap_or_else(|| {
            panic!("subset {small} holds more mines than its superset {large}")
        });

        Some(Constraint::new(
            large.cells.difference(&small.cells).copied(),
            count,
        ))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}
