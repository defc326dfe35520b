use minesweeper_agent as ms;
use wasm_bindgen::prelude::*;

/// The returned bytes carry the full mine layout; the page holds them between calls
/// and must not expose them to the player.
#[wasm_bindgen]
pub fn create_game(height: u8, width: u8, mines: u8) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut rng = rand::rng();
    let board = ms::Board::new(height as usize, width as usize, mines as usize, &mut rng)
        .map_err(|e| e.to_string())?;
    board.serialize().map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn validate(bts: Vec<u8>) -> bool {
    console_error_panic_hook::set_once();

    ms::Board::deserialize(&bts)
        .map(|board| board.won())
        .unwrap_or(false)
}

#[wasm_bindgen]
pub fn choose_cell(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut board = ms::Board::deserialize(&bts).map_err(|e| e.to_string())?;
    let probe = board
        .reveal(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    let mut xs = board.serialize().map_err(|e| e.to_string())?;
    xs.push(match probe {
        ms::Probe::Safe(_) => 0,
        ms::Probe::Mine => 1,
    });
    Ok(xs)
}

#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let board = ms::Board::deserialize(&bts).map_err(|e| e.to_string())?;
    let (height, width) = board.dimensions();
    Ok(ms::Cell::grid(height, width)
        .map(|cell| match board.count_at(cell) {
            Some(n) => n as i8,
            None if board.exploded() == Some(cell) => -3,
            None if board.is_flagged(cell) => -2,
            None => -1,
        })
        .collect())
}

/// Replays the revealed cells into a fresh agent and asks it for the next probe.
/// Returns `[row, col, kind]` with `kind` 0 for a proven safe cell and 1 for a guess,
/// or an empty vector when there is nothing left to probe.
#[wasm_bindgen]
pub fn suggest_move(bts: Vec<u8>) -> Result<Vec<i32>, String> {
    console_error_panic_hook::set_once();

    let board = ms::Board::deserialize(&bts).map_err(|e| e.to_string())?;
    let (height, width) = board.dimensions();
    let agent = ms::InferenceAgent::replay(height, width, board.revealed());

    let mut rng = rand::rng();
    Ok(match ms::choose_move(&agent, &mut rng) {
        Some(next) => vec![
            next.cell.row as i32,
            next.cell.col as i32,
            match next.kind {
                ms::MoveKind::Safe => 0,
                ms::MoveKind::Random => 1,
            },
        ],
        None => Vec::new(),
    })
}
