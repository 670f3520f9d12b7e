//! hexgo: a Go-style capture engine on a hexagonal grid.
//!
//! Stones are placed on a parallelogram of hexagonal points. Chains, liberties,
//! captures and ko follow Go, with six neighbours per point instead of four.
//! Besides area scoring, a player who captures [`constants::CAPTURES_TO_WIN`]
//! stones wins outright.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions and array sizes
//! - [`player`] - Colors, players and moves
//! - [`hash`] - 128-bit Zobrist hashing
//! - [`location`] - Padded-array locations and coordinate strings
//! - [`board`] - Chains, liberties, captures, simple ko and undo
//! - [`board_io`] - Text and JSON forms of a board
//! - [`rules`] - Ko, scoring, suicide, button and komi settings
//! - [`area`] - Area ownership for scoring
//! - [`history`] - Turn history, superko, passes and game end
//! - [`ko_table`] - Fast superko lookups over a fixed history prefix
//! - [`playout`] - Random game simulation
//! - [`error`] - Error type for construction and parsing
//!
//! ## Example
//!
//! ```
//! use hexgo::board::Board;
//! use hexgo::history::BoardHistory;
//! use hexgo::location;
//! use hexgo::player::Color;
//! use hexgo::rules::Rules;
//!
//! let board = Board::new(9, 9)?;
//! let mut hist = BoardHistory::new(board, Color::Black, Rules::chinese());
//!
//! let loc = hist.board().loc(4, 4);
//! assert!(hist.is_legal(loc, Color::Black));
//! hist.make_board_move_assume_legal(loc, Color::Black, None);
//!
//! println!("Black played {}", location::to_string(loc, 9, 9));
//! println!("{}", hist.board());
//! # Ok::<(), hexgo::Error>(())
//! ```

pub mod area;
pub mod board;
pub mod board_io;
pub mod constants;
pub mod error;
pub mod hash;
pub mod history;
pub mod ko_table;
pub mod location;
pub mod player;
pub mod playout;
pub mod rules;

pub use error::{Error, Result};
