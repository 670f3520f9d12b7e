//! Random playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves until the game ends, never
//! filling its own single-point eyes, then scores whatever is left. Used by
//! the `selfplay` and `bench` commands and by the randomized tests.

use std::convert::Infallible;

use crate::constants::PASS_LOC;
use crate::history::BoardHistory;
use crate::location::{Loc, iter_locs};
use crate::player::{Color, Player};

/// Summary of a finished playout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayoutResult {
    pub moves: usize,
    pub winner: Player,
    pub white_minus_black: f32,
    /// The game hit the move limit and was scored as it stood.
    pub truncated: bool,
}

/// Every neighbour is `pla` or off the board.
pub fn is_eye(hist: &BoardHistory, loc: Loc, pla: Player) -> bool {
    let board = hist.board();
    board.colors[loc] == Color::Empty
        && (0..6).all(|i| {
            let c = board.colors[board.adj(loc, i)];
            c == pla || c == Color::Wall
        })
}

/// Choose a random legal move that does not fill one of `pla`'s eyes.
///
/// Candidates are tried in shuffled order. Returns `PASS_LOC` when nothing qualifies.
pub fn choose_random_legal_move(hist: &BoardHistory, pla: Player, rng: &mut fastrand::Rng) -> Loc {
    let board = hist.board();
    let mut candidates: Vec<Loc> = iter_locs(board.x_size, board.y_size)
        .filter(|&loc| board.colors[loc] == Color::Empty && !is_eye(hist, loc, pla))
        .collect();

    let n = candidates.len();
    for i in 0..n {
        let j = rng.usize(i..n);
        candidates.swap(i, j);
        if hist.is_legal(candidates[i], pla) {
            return candidates[i];
        }
    }
    PASS_LOC
}

pub fn random_playout(hist: &mut BoardHistory, rng: &mut fastrand::Rng, max_moves: usize) -> PlayoutResult {
    let Ok(result) = random_playout_with::<Infallible, _>(hist, rng, max_moves, |_| Ok(()));
    result
}

/// Like [`random_playout`], calling `after_move` after every move.
/// An error from the callback stops the playout and is returned.
pub fn random_playout_with<E, F>(
    hist: &mut BoardHistory,
    rng: &mut fastrand::Rng,
    max_moves: usize,
    mut after_move: F,
) -> Result<PlayoutResult, E>
where
    F: FnMut(&BoardHistory) -> Result<(), E>,
{
    let mut pla = hist.presumed_next_move_pla;
    let mut moves = 0;
    while !hist.is_game_finished && moves < max_moves {
        let loc = choose_random_legal_move(hist, pla, rng);
        hist.make_board_move_assume_legal(loc, pla, None);
        after_move(hist)?;
        pla = pla.opp();
        moves += 1;
    }

    let truncated = !hist.is_game_finished;
    if truncated {
        hist.end_and_score_game_now();
    }
    Ok(PlayoutResult {
        moves,
        winner: hist.winner,
        white_minus_black: hist.final_white_minus_black_score,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::board_io::parse_board;
    use crate::error::Error;
    use crate::rules::Rules;

    fn new_history(size: usize) -> BoardHistory {
        BoardHistory::new(Board::new(size, size).unwrap(), Color::Black, Rules::default())
    }

    #[test]
    fn test_playout_finishes() {
        let mut hist = new_history(5);
        let mut rng = fastrand::Rng::with_seed(7);
        let result = random_playout(&mut hist, &mut rng, 500);
        assert!(hist.is_game_finished);
        assert_eq!(result.moves, hist.move_history.len());
        assert_eq!(result.winner, hist.winner);
        hist.board().check_consistency().unwrap();
    }

    #[test]
    fn test_playout_is_deterministic() {
        let run = |seed| {
            let mut hist = new_history(6);
            let mut rng = fastrand::Rng::with_seed(seed);
            random_playout(&mut hist, &mut rng, 300);
            hist.move_history.clone()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_move_limit_truncates() {
        let mut hist = new_history(7);
        let mut rng = fastrand::Rng::with_seed(1);
        let result = random_playout(&mut hist, &mut rng, 3);
        assert_eq!(result.moves, 3);
        assert!(result.truncated);
        assert!(hist.is_scored);
    }

    #[test]
    fn test_chosen_moves_are_legal() {
        let mut hist = new_history(5);
        let mut rng = fastrand::Rng::with_seed(99);
        let mut pla = Color::Black;
        for _ in 0..40 {
            let loc = choose_random_legal_move(&hist, pla, &mut rng);
            assert!(loc == PASS_LOC || hist.is_legal(loc, pla));
            hist.make_board_move_assume_legal(loc, pla, None);
            pla = pla.opp();
        }
    }

    #[test]
    fn test_eyes_are_not_filled() {
        // The only empty point is a black eye.
        let board = parse_board(3, 1, "X.X").unwrap();
        let hist = BoardHistory::new(board, Color::Black, Rules::default());
        let loc = hist.board().loc(1, 0);
        assert!(is_eye(&hist, loc, Color::Black));
        assert!(!is_eye(&hist, loc, Color::White));
        let mut rng = fastrand::Rng::with_seed(5);
        assert_eq!(choose_random_legal_move(&hist, Color::Black, &mut rng), PASS_LOC);
    }

    #[test]
    fn test_callback_error_stops_playout() {
        let mut hist = new_history(5);
        let mut rng = fastrand::Rng::with_seed(2);
        let result = random_playout_with(&mut hist, &mut rng, 100, |h| {
            if h.move_history.len() == 4 {
                Err(Error::Inconsistent("stop".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(hist.move_history.len(), 4);
    }
}
