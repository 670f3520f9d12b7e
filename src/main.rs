//! hexgo command-line driver.
//!
//! ## Usage
//!
//! - `hexgo` / `hexgo demo` - Play one short random game and print it
//! - `hexgo selfplay` - Play random games with consistency checks after every move
//! - `hexgo bench` - Measure random playout throughput
//!
//! Logging goes through `tracing`; set `RUST_LOG=hexgo=debug` for more detail.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use hexgo::board::Board;
use hexgo::constants::DEFAULT_LEN;
use hexgo::history::BoardHistory;
use hexgo::player::Color;
use hexgo::playout::{random_playout, random_playout_with};
use hexgo::rules::Rules;

/// hexgo: Go-style captures on a hexagonal board
#[derive(Parser)]
#[command(name = "hexgo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a short random game and print the board and result
    Demo {
        #[arg(long, default_value_t = 7)]
        size: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Play random games, checking board invariants after every move
    Selfplay {
        #[arg(long, default_value_t = 10)]
        games: usize,
        #[arg(long, default_value_t = DEFAULT_LEN)]
        size: usize,
        /// Preset name, JSON object or legacy rules string
        #[arg(long, default_value = "tromp-taylor")]
        rules: String,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Count random moves per second
    Bench {
        #[arg(long, default_value_t = 100_000)]
        moves: usize,
        #[arg(long, default_value_t = DEFAULT_LEN)]
        size: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Demo { size, seed }) => run_demo(size, seed),
        Some(Commands::Selfplay { games, size, rules, seed }) => run_selfplay(games, size, &rules, seed),
        Some(Commands::Bench { moves, size }) => run_bench(moves, size),
        None => run_demo(7, 1),
    }
}

/// Move cap for one random game on a `size` x `size` board.
fn max_game_moves(size: usize) -> usize {
    size * size * 4
}

fn new_history(size: usize, rules: Rules) -> Result<BoardHistory> {
    let board = Board::new(size, size)?;
    Ok(BoardHistory::new(board, Color::Black, rules))
}

fn run_demo(size: usize, seed: u64) -> Result<()> {
    println!("hexgo: Go-style captures on a hexagonal board\n");

    let mut hist = new_history(size, Rules::default())?;
    let mut rng = fastrand::Rng::with_seed(seed);
    let result = random_playout(&mut hist, &mut rng, max_game_moves(size));

    let mut out = String::new();
    hist.print_basic_info(&mut out)?;
    println!("{out}");
    println!("Moves played: {}", result.moves);
    if result.truncated {
        println!("Move limit reached, scored as it stands");
    }
    match result.winner {
        Color::Empty => println!("Result: draw"),
        winner => println!("Result: {winner} wins ({:+})", result.white_minus_black),
    }
    Ok(())
}

fn run_selfplay(games: usize, size: usize, rules_str: &str, seed: u64) -> Result<()> {
    let rules = Rules::parse(rules_str).with_context(|| format!("bad --rules {rules_str:?}"))?;
    info!(rules = %rules, size, games, "starting selfplay");

    let mut black_wins = 0;
    let mut white_wins = 0;
    let mut draws = 0;
    let mut total_moves = 0;

    for game in 0..games {
        let mut hist = new_history(size, rules)?;
        let mut rng = fastrand::Rng::with_seed(seed.wrapping_add(game as u64));
        let result = random_playout_with(&mut hist, &mut rng, max_game_moves(size), |h| {
            h.board().check_consistency()
        })
        .with_context(|| format!("game {game} failed its consistency check"))?;

        debug!(game, moves = result.moves, winner = %result.winner, "selfplay game done");
        total_moves += result.moves;
        match result.winner {
            Color::Black => black_wins += 1,
            Color::White => white_wins += 1,
            _ => draws += 1,
        }
    }

    println!("Games: {games}  Rules: {}", rules.to_string_no_komi_maybe_nice());
    println!("Black wins: {black_wins}  White wins: {white_wins}  Draws: {draws}");
    if games > 0 {
        println!("Average length: {:.1} moves", total_moves as f64 / games as f64);
    }
    Ok(())
}

fn run_bench(moves: usize, size: usize) -> Result<()> {
    let rules = Rules::default();
    let mut rng = fastrand::Rng::with_seed(42);
    let start = Instant::now();
    let mut played = 0;
    let mut games = 0;
    while played < moves {
        let mut hist = new_history(size, rules)?;
        played += random_playout(&mut hist, &mut rng, max_game_moves(size)).moves;
        games += 1;
    }
    let secs = start.elapsed().as_secs_f64();
    println!("{played} moves in {games} games, {secs:.2}s");
    if secs > 0.0 {
        println!("{:.0} moves/s", played as f64 / secs);
    }
    Ok(())
}
