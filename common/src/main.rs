use clap::Parser;
use minesweeper_agent::*;
use std::thread;
use std::time::Duration;

/// Autonomous minesweeper bot
#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Plays minesweeper by logical inference, guessing only when stuck", long_about = None)]
struct Args {
    /// Number of rows
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Number of columns
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines
    #[arg(short, long, default_value_t = 8)]
    mines: usize,

    /// Seed for mine placement and guesses
    #[arg(short, long)]
    seed: Option<u64>,

    /// Pause between moves, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        GameConfig {
            height: args.height,
            width: args.width,
            mines: args.mines,
            seed: args.seed,
            move_delay_ms: args.delay_ms,
            max_moves: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // --- 1. Initialization ---
    let config = GameConfig::from(&args);
    config.validate()?;
    let mut rng = config.rng();
    let mut board = Board::new(config.height, config.width, config.mines, &mut rng)?;
    let mut agent = InferenceAgent::new(config.height, config.width);

    println!("--- Autonomous Minesweeper Bot ---");
    println!("Strategy: Probe cells proven safe, guess randomly otherwise.");
    println!("Initial Board:");
    println!("{board}");

    // --- 2. Game Loop ---
    let mut move_count = 0;
    let mut guesses = 0;
    while move_count < config.move_limit() {
        let Some((next, probe)) = step(&mut board, &mut agent, &mut rng)? else {
            break;
        };
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        match next.kind {
            MoveKind::Safe => println!("Logic found a guaranteed safe cell."),
            MoveKind::Random => {
                guesses += 1;
                println!("No logically safe move found. Making a random guess...");
            }
        }
        match probe {
            Probe::Safe(count) => println!("Bot reveals {} and reads {}.", next.cell, count),
            Probe::Mine => println!("Bot reveals {} and hits a mine.", next.cell),
        }
        println!(
            "Known: {} mines, {} safe, {} open constraints.",
            agent.known_mines().len(),
            agent.known_safes().len(),
            agent.knowledge().len()
        );
        println!("{board}");

        if config.move_delay_ms > 0 {
            thread::sleep(Duration::from_millis(config.move_delay_ms));
        }
    }

    // --- 3. Final Result ---
    println!("\n--- Game Over ---");
    println!("{} moves, {} of them guesses.", move_count, guesses);

    match board.state() {
        GameState::Won => println!("Result: The bot won!"),
        GameState::Lost => println!("Result: The bot hit a mine and lost."),
        GameState::Playing => println!("Result: The game ended unexpectedly."),
    }
    Ok(())
}
