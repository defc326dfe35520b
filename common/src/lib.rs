//! A knowledge-based minesweeper player.
//!
//! [`InferenceAgent`] keeps what it has learned as a set of [`Constraint`]s ("exactly
//! `n` of these cells are mines") and derives certain mines and safe cells from them by
//! propagation and subset resolution. [`Board`] is the minefield it plays against and
//! [`driver`] wires the two together.

pub mod agent;
pub mod board;
pub mod cell;
pub mod config;
pub mod constraint;
pub mod driver;

pub use agent::{InferenceAgent, Propagation};
pub use board::{Board, GameState, Probe};
pub use cell::Cell;
pub use config::GameConfig;
pub use constraint::Constraint;
pub use driver::{GameReport, Move, MoveKind, Outcome, choose_move, play, step};
