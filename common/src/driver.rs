use crate::agent::InferenceAgent;
use crate::board::{Board, GameState, Probe};
use crate::cell::Cell;
use crate::config::GameConfig;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Proven safe by the agent.
    Safe,
    /// A guess among cells not known to be mines.
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub cell: Cell,
    pub kind: MoveKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
    /// The move limit was reached or the agent had nothing left to probe.
    Stuck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReport {
    pub outcome: Outcome,
    pub moves: usize,
    pub safe_moves: usize,
    pub random_moves: usize,
    pub known_mines: usize,
}

/// Prefer a proven safe cell; otherwise guess.
pub fn choose_move<R: Rng + ?Sized>(agent: &InferenceAgent, rng: &mut R) -> Option<Move> {
    if let Some(cell) = agent.propose_safe_move() {
        return Some(Move {
            cell,
            kind: MoveKind::Safe,
        });
    }
    agent.propose_random_move(rng).map(|cell| Move {
        cell,
        kind: MoveKind::Random,
    })
}

/// Plays a single move: pick a cell, probe it, feed the result to the agent and flag
/// every mine the agent now knows about.
///
/// Returns `None` when the game is over or the agent has no move left.
pub fn step<R: Rng + ?Sized>(
    board: &mut Board,
    agent: &mut InferenceAgent,
    rng: &mut R,
) -> anyhow::Result<Option<(Move, Probe)>> {
    anyhow::ensure!(
        board.dimensions() == agent.dimensions(),
        "agent grid {:?} does not match board {:?}",
        agent.dimensions(),
        board.dimensions()
    );
    if board.state() != GameState::Playing {
        return Ok(None);
    }
    let Some(next) = choose_move(agent, rng) else {
        return Ok(None);
    };

    match next.kind {
        MoveKind::Safe => log::info!("probing safe cell {}", next.cell),
        MoveKind::Random => log::warn!("no safe move known, guessing {}", next.cell),
    }

    let probe = board.reveal(next.cell)?;
    if let Probe::Safe(count) = probe {
        let propagation = agent.record_observation(next.cell, count);
        log::debug!("{} reads {count}: {propagation:?}", next.cell);
        for &mine in agent.known_mines() {
            if board.flag(mine)? {
                log::info!("flagged {mine}");
            }
        }
    }
    Ok(Some((next, probe)))
}

/// Drives the agent against `board` until the game ends, the agent runs out of
/// moves, or the configured move limit is reached.
pub fn play<R: Rng + ?Sized>(
    board: &mut Board,
    agent: &mut InferenceAgent,
    rng: &mut R,
    config: &GameConfig,
) -> anyhow::Result<GameReport> {
    let mut report = GameReport {
        outcome: Outcome::Stuck,
        moves: 0,
        safe_moves: 0,
        random_moves: 0,
        known_mines: 0,
    };

    while report.moves < config.move_limit() {
        let Some((next, _)) = step(board, agent, rng)? else {
            break;
        };
        report.moves += 1;
        match next.kind {
            MoveKind::Safe => report.safe_moves += 1,
            MoveKind::Random => report.random_moves += 1,
        }
    }

    report.known_mines = agent.known_mines().len();
    report.outcome = match board.state() {
        GameState::Lost => Outcome::Lost,
        GameState::Won => Outcome::Won,
        GameState::Playing => Outcome::Stuck,
    };
    log::info!(
        "game over: {:?} after {} moves ({} safe, {} guessed)",
        report.outcome,
        report.moves,
        report.safe_moves,
        report.random_moves
    );
    Ok(report)
}
