use crate::cell::Cell;
use crate::constraint::Constraint;
use itertools::Itertools;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{BTreeSet, HashSet};

/// What a single propagation pass changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PassSummary {
    marked: usize,
    removed: usize,
    added: usize,
}

impl PassSummary {
    fn made_progress(&self) -> bool {
        self.marked > 0 || self.removed > 0 || self.added > 0
    }
}

/// Totals for one run of the propagation loop, returned by
/// [`InferenceAgent::record_observation`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    /// Full passes over the knowledge base, including the final one that changed nothing.
    pub passes: usize,
    /// Cells newly proven to be mines or safe.
    pub facts: usize,
    /// Constraints dropped because they were fully explained or duplicated.
    pub removed: usize,
    /// Constraints derived by subset resolution.
    pub derived: usize,
}

/// A knowledge-based minesweeper player.
///
/// The agent never probes the board itself. It is fed `(cell, count)` observations,
/// keeps every fact it can prove, and proposes the next probe on request.
#[derive(Debug, Clone)]
pub struct InferenceAgent {
    height: usize,
    width: usize,
    /// Cells already probed. Grows monotonically.
    moves_made: BTreeSet<Cell>,
    /// Cells proven to be mines. Grows monotonically.
    mines: BTreeSet<Cell>,
    /// Cells proven to be safe. Grows monotonically.
    safes: BTreeSet<Cell>,
    /// Active constraints. Every member cell is still unknown and no two are equal.
    knowledge: Vec<Constraint>,
}

impl InferenceAgent {
    pub fn new(height: usize, width: usize) -> Self {
        InferenceAgent {
            height,
            width,
            moves_made: BTreeSet::new(),
            mines: BTreeSet::new(),
            safes: BTreeSet::new(),
            knowledge: Vec::new(),
        }
    }

    /// Builds an agent that has seen `observations`, in order.
    pub fn replay(
        height: usize,
        width: usize,
        observations: impl IntoIterator<Item = (Cell, u8)>,
    ) -> Self {
        let mut agent = InferenceAgent::new(height, width);
        for (cell, count) in observations {
            agent.record_observation(cell, count);
        }
        agent
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn known_mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn known_safes(&self) -> &BTreeSet<Cell> {
        &self.safes
    }

    pub fn knowledge(&self) -> &[Constraint] {
        &self.knowledge
    }

    /// Every cell is either probed or a known mine.
    pub fn is_solved(&self) -> bool {
        Cell::grid(self.height, self.width)
            .all(|cell| self.moves_made.contains(&cell) || self.mines.contains(&cell))
    }

    /// Records `cell` as a mine and removes it from every constraint.
    /// Returns `false` if it was already known.
    pub fn mark_mine(&mut self, cell: Cell) -> bool {
        assert!(
            !self.safes.contains(&cell),
            "{cell} is already known to be safe and cannot be a mine"
        );
        if !self.mines.insert(cell) {
            return false;
        }
        log::debug!("mine: {cell}");
        for constraint in &mut self.knowledge {
            constraint.reduce_known(cell, true);
        }
        true
    }

    /// Records `cell` as safe and removes it from every constraint.
    /// Returns `false` if it was already known.
    pub fn mark_safe(&mut self, cell: Cell) -> bool {
        assert!(
            !self.mines.contains(&cell),
            "{cell} is already known to be a mine and cannot be safe"
        );
        if !self.safes.insert(cell) {
            return false;
        }
        log::debug!("safe: {cell}");
        for constraint in &mut self.knowledge {
            constraint.reduce_known(cell, false);
        }
        true
    }

    /// Called once per probe: `cell` was safe and `count` of its neighbours are mines.
    ///
    /// Folds the observation into the knowledge base and runs propagation until no
    /// pass makes progress.
    ///
    /// # Panics
    ///
    /// If `cell` is outside the grid or `count` cannot be reconciled with what is
    /// already known. Both mean the caller fed a wrong observation, and continuing
    /// could mark a real mine as safe.
    pub fn record_observation(&mut self, cell: Cell, count: u8) -> Propagation {
        assert!(
            cell.in_bounds(self.height, self.width),
            "observation at {cell} is outside the {}x{} grid",
            self.height,
            self.width
        );

        self.moves_made.insert(cell);
        self.mark_safe(cell);

        let mut remaining = count as usize;
        let mut unknown = BTreeSet::new();
        for neighbor in cell.neighbors(self.height, self.width) {
            if self.mines.contains(&neighbor) {
                remaining = remaining.checked_sub(1).unwrap_or_else(|| {
                    panic!("observation {count} at {cell} is below its known mine neighbours")
                });
            } else if !self.moves_made.contains(&neighbor) && !self.safes.contains(&neighbor) {
                unknown.insert(neighbor);
            }
        }
        assert!(
            remaining <= unknown.len(),
            "observation {count} at {cell} exceeds its {} unknown neighbours",
            unknown.len()
        );

        if remaining == 0 {
            for neighbor in unknown {
                self.mark_safe(neighbor);
            }
        } else if remaining == unknown.len() {
            for neighbor in unknown {
                self.mark_mine(neighbor);
            }
        } else {
            let constraint = Constraint::new(unknown, remaining);
            if !self.knowledge.contains(&constraint) {
                log::debug!("observed: {constraint}");
                self.knowledge.push(constraint);
            }
        }

        self.propagate()
    }

    /// Any cell proven safe that has not been probed yet.
    ///
    /// Does not change the agent; the caller is expected to probe the cell and
    /// report it through [`record_observation`](Self::record_observation).
    pub fn propose_safe_move(&self) -> Option<Cell> {
        self.safes.difference(&self.moves_made).next().copied()
    }

    /// A uniformly random cell that is neither probed nor a known mine, or `None`
    /// when no such cell is left.
    pub fn propose_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let candidates: Vec<Cell> = Cell::grid(self.height, self.width)
            .filter(|cell| !self.moves_made.contains(cell) && !self.mines.contains(cell))
            .collect();
        candidates.choose(rng).copied()
    }

    /// Checks the knowledge base invariants, returning the first violation found.
    pub fn check_consistency(&self) -> anyhow::Result<()> {
        if let Some(cell) = self.mines.intersection(&self.safes).next() {
            anyhow::bail!("{cell} is known to be both a mine and safe");
        }
        if let Some(cell) = self.moves_made.intersection(&self.mines).next() {
            anyhow::bail!("{cell} was probed but is known to be a mine");
        }

        let mut seen = HashSet::new();
        for constraint in &self.knowledge {
            anyhow::ensure!(!constraint.is_empty(), "empty constraint left active");
            anyhow::ensure!(
                constraint.count() <= constraint.len(),
                "{constraint} claims more mines than cells"
            );
            anyhow::ensure!(seen.insert(constraint), "duplicate constraint {constraint}");
            if let Some(cell) = constraint.cells().iter().find(|&&cell| {
                self.moves_made.contains(&cell)
                    || self.mines.contains(&cell)
                    || self.safes.contains(&cell)
            }) {
                anyhow::bail!("{constraint} still mentions known cell {cell}");
            }
        }
        Ok(())
    }

    /// Repeats propagation passes until one changes nothing.
    ///
    /// Terminates because facts only accumulate over a finite grid, constraints are
    /// only removed after a fact shrinks them, and a derived constraint is only added
    /// when no equal one is active.
    fn propagate(&mut self) -> Propagation {
        let mut total = Propagation::default();
        loop {
            let pass = self.propagation_pass();
            total.passes += 1;
            total.facts += pass.marked;
            total.removed += pass.removed;
            total.derived += pass.added;
            log::trace!("pass {}: {pass:?}", total.passes);
            if !pass.made_progress() {
                return total;
            }
        }
    }

    /// One pass over the knowledge base. Additions and removals are collected first
    /// and applied once iteration is over.
    fn propagation_pass(&mut self) -> PassSummary {
        let mut pass = PassSummary::default();

        // Settled constraints: every member is forced the same way.
        let mut forced_mines = BTreeSet::new();
        let mut forced_safes = BTreeSet::new();
        for constraint in self.knowledge.iter().filter(|c| c.is_settled()) {
            forced_mines.extend(constraint.known_mines());
            forced_safes.extend(constraint.known_safes());
        }
        pass.marked += self.apply_facts(&forced_mines, &forced_safes);
        pass.removed += self.purge();

        // Subset resolution over every unordered pair.
        let mut derived: Vec<Constraint> = Vec::new();
        forced_mines.clear();
        forced_safes.clear();
        for (a, b) in self.knowledge.iter().tuple_combinations() {
            let Some(implied) = a.resolve(b) else {
                continue;
            };
            if implied.is_settled() {
                forced_mines.extend(implied.known_mines());
                forced_safes.extend(implied.known_safes());
            } else if !self.knowledge.contains(&implied) && !derived.contains(&implied) {
                log::debug!("derived: {implied} from {a} and {b}");
                derived.push(implied);
            }
        }
        pass.added += derived.len();
        self.knowledge.extend(derived);

        pass.marked += self.apply_facts(&forced_mines, &forced_safes);
        pass.removed += self.purge();
        pass
    }

    fn apply_facts(&mut self, mines: &BTreeSet<Cell>, safes: &BTreeSet<Cell>) -> usize {
        let mut marked = 0;
        for &cell in mines {
            if self.mark_mine(cell) {
                marked += 1;
            }
        }
        for &cell in safes {
            if self.mark_safe(cell) {
                marked += 1;
            }
        }
        marked
    }

    /// Drops empty constraints and collapses duplicates, keeping the earliest copy.
    fn purge(&mut self) -> usize {
        let before = self.knowledge.len();
        let mut seen = HashSet::new();
        self.knowledge
            .retain(|constraint| !constraint.is_empty() && seen.insert(constraint.clone()));
        before - self.knowledge.len()
    }
}
