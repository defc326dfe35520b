use crate::cell::Cell;
use anyhow::Context;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// The result of probing a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The cell was safe; the value is the number of adjacent mines.
    Safe(u8),
    Mine,
}

/// The hidden minefield together with what the player has uncovered so far.
///
/// This is the oracle the agent plays against: it knows where every mine is and
/// answers probes with neighbour counts. The mine layout is part of the serialized
/// form, so bytes handed to an untrusted client reveal the whole minefield.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Board {
    height: usize,
    width: usize,
    mines: BTreeSet<Cell>,
    /// Probed cells and the count each one showed.
    revealed: BTreeMap<Cell, u8>,
    /// Cells the player has flagged as mines.
    flagged: BTreeSet<Cell>,
    /// Set when a probe lands on a mine.
    exploded: Option<Cell>,
    state: GameState,
}

impl Board {
    /// Places `mines` distinct mines uniformly at random.
    pub fn new<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let cells = area(height, width)?;
        anyhow::ensure!(
            mines < cells,
            "total mines ({mines}) must be less than the number of cells ({cells})"
        );

        let layout = rand::seq::index::sample(rng, cells, mines)
            .into_iter()
            .map(|offset| Cell::new(offset / width, offset % width));
        Self::with_mines(height, width, layout)
    }

    /// Builds a board with a fixed mine layout.
    pub fn with_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Cell>,
    ) -> anyhow::Result<Self> {
        area(height, width)?;
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        if let Some(cell) = mines.iter().find(|cell| !cell.in_bounds(height, width)) {
            anyhow::bail!("mine {cell} is outside the {height}x{width} board");
        }

        Ok(Board {
            height,
            width,
            mines,
            revealed: BTreeMap::new(),
            flagged: BTreeSet::new(),
            exploded: None,
            state: GameState::Playing,
        })
    }

    /// Deserializes a board from bytes, rejecting any state a real game could not reach.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        let board: Board = bcs::from_bytes(bts).context("malformed board bytes")?;
        board.check().context("inconsistent board bytes")?;
        Ok(board)
    }

    fn check(&self) -> anyhow::Result<()> {
        area(self.height, self.width)?;
        let outside = |cell: &Cell| !self.contains(*cell);
        if let Some(cell) = self.mines.iter().find(|c| outside(*c)) {
            anyhow::bail!("mine {cell} is outside the board");
        }
        if let Some(cell) = self.flagged.iter().find(|c| outside(*c)) {
            anyhow::bail!("flag {cell} is outside the board");
        }
        for (&cell, &count) in &self.revealed {
            anyhow::ensure!(self.contains(cell), "revealed {cell} is outside the board");
            anyhow::ensure!(!self.is_mine(cell), "revealed {cell} is a mine");
            anyhow::ensure!(
                count == self.nearby_mines(cell),
                "revealed {cell} shows {count} but has {} adjacent mines",
                self.nearby_mines(cell)
            );
            anyhow::ensure!(!self.flagged.contains(&cell), "revealed {cell} is flagged");
        }
        match (self.exploded, self.state) {
            (Some(cell), GameState::Lost) => {
                anyhow::ensure!(self.is_mine(cell), "exploded cell {cell} is not a mine")
            }
            (None, GameState::Lost) => anyhow::bail!("lost game without an exploded mine"),
            (Some(cell), state) => anyhow::bail!("exploded at {cell} but the game is {state:?}"),
            (None, GameState::Won) => anyhow::ensure!(
                self.all_safe_revealed() || self.all_mines_flagged(),
                "game marked won with cells left to clear"
            ),
            (None, GameState::Playing) => {}
        }
        Ok(())
    }

    /// Serializes the board to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        bcs::to_bytes(self).context("board serialization failed")
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.height, self.width)
    }

    pub fn neighbors_of(&self, cell: Cell) -> impl Iterator<Item = Cell> {
        cell.neighbors(self.height, self.width)
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines within one row and column of `cell`, not counting the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> u8 {
        self.neighbors_of(cell).filter(|n| self.is_mine(*n)).count() as u8
    }

    /// Probes `cell`. A mine ends the game; revealing the last safe cell wins it.
    /// Probing a cell that is already revealed just repeats its count.
    pub fn reveal(&mut self, cell: Cell) -> anyhow::Result<Probe> {
        anyhow::ensure!(
            self.contains(cell),
            "{cell} is outside the {}x{} board",
            self.height,
            self.width
        );
        if let Some(&count) = self.revealed.get(&cell) {
            return Ok(Probe::Safe(count));
        }
        if self.state != GameState::Playing {
            anyhow::bail!("game_ended");
        }

        if self.is_mine(cell) {
            self.exploded = Some(cell);
            self.state = GameState::Lost;
            return Ok(Probe::Mine);
        }

        let count = self.nearby_mines(cell);
        self.revealed.insert(cell, count);
        self.flagged.remove(&cell);
        if self.all_safe_revealed() {
            self.state = GameState::Won;
        }
        Ok(Probe::Safe(count))
    }

    /// Marks `cell` as a suspected mine. Returns whether the flag is new.
    /// Flagging exactly the set of mines wins a game in progress.
    pub fn flag(&mut self, cell: Cell) -> anyhow::Result<bool> {
        anyhow::ensure!(self.contains(cell), "cannot flag {cell} outside the board");
        anyhow::ensure!(
            !self.revealed.contains_key(&cell),
            "cannot flag revealed cell {cell}"
        );
        let added = self.flagged.insert(cell);
        if self.state == GameState::Playing && self.all_mines_flagged() {
            self.state = GameState::Won;
        }
        Ok(added)
    }

    pub fn is_flagged(&self, cell: Cell) -> bool {
        self.flagged.contains(&cell)
    }

    /// Revealed cells with their counts, in row-major order.
    pub fn revealed(&self) -> impl Iterator<Item = (Cell, u8)> + '_ {
        self.revealed.iter().map(|(&cell, &count)| (cell, count))
    }

    pub fn count_at(&self, cell: Cell) -> Option<u8> {
        self.revealed.get(&cell).copied()
    }

    pub fn exploded(&self) -> Option<Cell> {
        self.exploded
    }

    /// The player has won once every mine is flagged or every safe cell is revealed.
    pub fn won(&self) -> bool {
        self.state == GameState::Won
    }

    fn all_safe_revealed(&self) -> bool {
        self.revealed.len() + self.mines.len() == self.height * self.width
    }

    /// An empty flag set never counts, otherwise a mine-free board would start out won.
    fn all_mines_flagged(&self) -> bool {
        !self.mines.is_empty() && self.flagged == self.mines
    }
}

/// Number of cells on a `height` x `width` board, rejecting empty and overflowing sizes.
fn area(height: usize, width: usize) -> anyhow::Result<usize> {
    let cells = height
        .checked_mul(width)
        .with_context(|| format!("board size {height} x {width} overflows"))?;
    anyhow::ensure!(cells > 0, "board has zero cells ({height} x {width})");
    Ok(cells)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.width {
            write!(f, "{:^3}", col)?;
        }
        writeln!(f, "\n  +{}", "---".repeat(self.width))?;

        for row in 0..self.height {
            write!(f, "{:^2}|", row)?;
            for col in 0..self.width {
                let cell = Cell::new(row, col);
                match self.revealed.get(&cell) {
                    Some(count) => write!(f, " {} ", count)?,
                    None if self.exploded == Some(cell) => write!(f, " * ")?,
                    None if self.flagged.contains(&cell) => write!(f, " F ")?,
                    None => write!(f, " ■ ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_board_initialization() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::new(5, 6, 7, &mut rng).unwrap();
        assert_eq!(board.dimensions(), (5, 6));
        assert_eq!(board.mine_count(), 7);
        assert_eq!(board.state(), GameState::Playing);
        assert_eq!(board.revealed().count(), 0);
        assert!(Cell::grid(5, 6).filter(|c| board.is_mine(*c)).count() == 7);
    }

    #[test]
    fn test_board_rejects_bad_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Board::new(3, 3, 9, &mut rng).is_err());
        assert!(Board::new(0, 3, 0, &mut rng).is_err());
        assert!(Board::with_mines(2, 2, [Cell::new(2, 0)]).is_err());
    }

    #[test]
    fn test_dense_board_placement_terminates() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = Board::new(10, 10, 99, &mut rng).unwrap();
        assert_eq!(board.mine_count(), 99);
    }

    #[test]
    fn test_nearby_mines() {
        let board = Board::with_mines(3, 3, [Cell::new(0, 0), Cell::new(2, 2)]).unwrap();
        assert_eq!(board.nearby_mines(Cell::new(1, 1)), 2);
        assert_eq!(board.nearby_mines(Cell::new(0, 1)), 1);
        assert_eq!(board.nearby_mines(Cell::new(0, 2)), 0);
        // A mine does not count itself
        assert_eq!(board.nearby_mines(Cell::new(0, 0)), 0);
    }

    #[test]
    fn test_reveal_safe_and_mine() {
        let mut board = Board::with_mines(2, 2, [Cell::new(0, 0)]).unwrap();
        assert_eq!(board.reveal(Cell::new(1, 1)).unwrap(), Probe::Safe(1));
        // Repeating a probe is harmless
        assert_eq!(board.reveal(Cell::new(1, 1)).unwrap(), Probe::Safe(1));

        assert_eq!(board.reveal(Cell::new(0, 0)).unwrap(), Probe::Mine);
        assert_eq!(board.state(), GameState::Lost);
        assert_eq!(board.exploded(), Some(Cell::new(0, 0)));
        assert!(!board.won());
        assert!(board.reveal(Cell::new(0, 1)).is_err());
    }

    #[test]
    fn test_reveal_out_of_bounds() {
        let mut board = Board::with_mines(2, 2, []).unwrap();
        assert!(board.reveal(Cell::new(2, 2)).is_err());
    }

    #[test]
    fn test_win_by_revealing_all_safe_cells() {
        let mut board = Board::with_mines(1, 3, [Cell::new(0, 2)]).unwrap();
        board.reveal(Cell::new(0, 0)).unwrap();
        assert_eq!(board.state(), GameState::Playing);
        board.reveal(Cell::new(0, 1)).unwrap();
        assert_eq!(board.state(), GameState::Won);
        assert!(board.won());
    }

    #[test]
    fn test_win_by_flagging_every_mine() {
        let mut board = Board::with_mines(3, 3, [Cell::new(0, 0), Cell::new(1, 2)]).unwrap();
        assert!(board.flag(Cell::new(0, 0)).unwrap());
        assert!(!board.won());
        assert_eq!(board.state(), GameState::Playing);
        assert!(board.flag(Cell::new(1, 2)).unwrap());
        assert_eq!(board.state(), GameState::Won);
        assert!(!board.flag(Cell::new(1, 2)).unwrap());
        assert!(board.won());
        assert!(board.reveal(Cell::new(2, 2)).is_err());
    }

    #[test]
    fn test_wrong_flags_do_not_win() {
        let mut board = Board::with_mines(3, 3, [Cell::new(0, 0)]).unwrap();
        board.flag(Cell::new(2, 2)).unwrap();
        board.flag(Cell::new(0, 0)).unwrap();
        assert!(!board.won());
        assert_eq!(board.state(), GameState::Playing);
    }

    #[test]
    fn test_mine_free_board_is_not_won_before_playing() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut board = Board::new(2, 2, 0, &mut rng).unwrap();
        assert!(!board.won());
        assert_eq!(board.state(), GameState::Playing);

        for cell in Cell::grid(2, 2) {
            board.reveal(cell).unwrap();
        }
        assert!(board.won());
    }

    #[test]
    fn test_oversized_board_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Board::with_mines(usize::MAX, 2, []).is_err());
        assert!(Board::new(usize::MAX, usize::MAX, 1, &mut rng).is_err());
    }

    #[test]
    fn test_serialization_preserves_progress() {
        let mut board = Board::with_mines(3, 3, [Cell::new(1, 1)]).unwrap();
        board.reveal(Cell::new(0, 0)).unwrap();
        board.flag(Cell::new(1, 1)).unwrap();

        let restored = Board::deserialize(&board.serialize().unwrap()).unwrap();
        assert_eq!(restored.dimensions(), (3, 3));
        assert!(restored.is_mine(Cell::new(1, 1)));
        assert!(restored.is_flagged(Cell::new(1, 1)));
        assert_eq!(restored.count_at(Cell::new(0, 0)), Some(1));
        assert!(Board::deserialize(&[0xff]).is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_bounds_reveal() {
        let mut board = Board::with_mines(2, 2, [Cell::new(0, 0)]).unwrap();
        board.revealed.insert(Cell::new(5, 5), 0);
        let bytes = board.serialize().unwrap();
        assert!(Board::deserialize(&bytes).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_count() {
        let mut board = Board::with_mines(2, 2, [Cell::new(0, 0)]).unwrap();
        board.revealed.insert(Cell::new(1, 1), 3);
        let bytes = board.serialize().unwrap();
        assert!(Board::deserialize(&bytes).is_err());
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_state() {
        let mut revealed_mine = Board::with_mines(2, 2, [Cell::new(0, 0)]).unwrap();
        revealed_mine.revealed.insert(Cell::new(0, 0), 0);
        assert!(Board::deserialize(&revealed_mine.serialize().unwrap()).is_err());

        let mut lost = Board::with_mines(2, 2, [Cell::new(0, 0)]).unwrap();
        lost.state = GameState::Lost;
        assert!(Board::deserialize(&lost.serialize().unwrap()).is_err());

        let mut huge = Board::with_mines(2, 2, []).unwrap();
        huge.height = usize::MAX;
        assert!(Board::deserialize(&huge.serialize().unwrap()).is_err());
    }

    #[test]
    fn test_deserialized_board_replays_into_agent() {
        let mut board = Board::with_mines(3, 3, [Cell::new(0, 0)]).unwrap();
        board.reveal(Cell::new(2, 2)).unwrap();
        board.reveal(Cell::new(1, 1)).unwrap();
        let restored = Board::deserialize(&board.serialize().unwrap()).unwrap();

        let agent = crate::agent::InferenceAgent::replay(3, 3, restored.revealed());
        agent.check_consistency().unwrap();
        assert_eq!(agent.moves_made().len(), 2);
    }

    #[test]
    fn test_display() {
        let mut board = Board::with_mines(2, 2, [Cell::new(0, 0)]).unwrap();
        board.reveal(Cell::new(1, 1)).unwrap();
        board.flag(Cell::new(0, 0)).unwrap();
        let text = board.to_string();
        assert!(text.contains(" F "));
        assert!(text.contains(" 1 "));
        assert!(text.contains(" ■ "));
    }
}
