//! Text and JSON forms of a [`Board`].
//!
//! The text grid has one character per point, row 0 first:
//! `.` (also `*`, `,`, backtick, space) for empty, `X` for Black and `O` for
//! White. [`parse_board`] also accepts the output of [`print_board`]: a
//! column-letter header, numeric row labels and points separated by spaces.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::NULL_LOC;
use crate::error::{Error, Result};
use crate::location::{self, Loc, get_loc};
use crate::player::{Color, Move};

const COLUMN_LETTERS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// One character per point, each row followed by `delimiter`.
pub fn to_string_simple(board: &Board, delimiter: char) -> String {
    let mut s = String::with_capacity((board.x_size + 1) * board.y_size);
    for y in 0..board.y_size {
        for x in 0..board.x_size {
            s.push(board.colors[get_loc(x, y, board.x_size)].to_char());
        }
        s.push(delimiter);
    }
    s
}

/// Pretty-print with hash, coordinates and an optional marker.
///
/// `mark_loc` is drawn as `@` if empty. When `hist` is given, the last three
/// moves are suffixed with 1, 2, 3.
pub fn print_board<W: fmt::Write>(
    out: &mut W,
    board: &Board,
    mark_loc: Loc,
    hist: Option<&[Move]>,
) -> fmt::Result {
    if let Some(hist) = hist {
        write!(out, "MoveNum: {} ", hist.len())?;
    }
    writeln!(out, "HASH: {}", board.pos_hash)?;

    let show_coords = board.x_size <= 50 && board.y_size <= 50;
    if show_coords {
        write!(out, "  ")?;
        for x in 0..board.x_size {
            if x <= 24 {
                write!(out, " {}", COLUMN_LETTERS[x] as char)?;
            } else {
                write!(out, " A{}", COLUMN_LETTERS[x - 25] as char)?;
            }
        }
        writeln!(out)?;
    }

    let recent: &[Move] = match hist {
        Some(h) => &h[h.len().saturating_sub(3)..],
        None => &[],
    };

    for y in 0..board.y_size {
        if show_coords {
            write!(out, "{:2} ", location::rank_of_row(y, board.y_size))?;
        }
        for x in 0..board.x_size {
            let loc = get_loc(x, y, board.x_size);
            let color = board.colors[loc];
            if color == Color::Empty && loc == mark_loc {
                write!(out, "@")?;
            } else {
                write!(out, "{}", color.to_char())?;
            }

            let hist_idx = recent.iter().position(|m| m.loc == loc);
            if let Some(i) = hist_idx {
                write!(out, "{}", i + 1)?;
            } else if x + 1 < board.x_size {
                write!(out, " ")?;
            }
        }
        writeln!(out)?;
    }
    writeln!(out)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_board(f, self, NULL_LOC, None)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("x_size", &self.x_size)
            .field("y_size", &self.y_size)
            .field("stones", &to_string_simple(self, '|'))
            .field("ko_loc", &self.ko_loc)
            .field("pos_hash", &self.pos_hash)
            .finish()
    }
}

pub fn parse_board(x_size: usize, y_size: usize, s: &str) -> Result<Board> {
    parse_board_with_delimiter(x_size, y_size, s, '\n')
}

/// Build a board from a text grid, placing stones with [`Board::set_stone`].
pub fn parse_board_with_delimiter(
    x_size: usize,
    y_size: usize,
    s: &str,
    delimiter: char,
) -> Result<Board> {
    let mut board = Board::new(x_size, y_size)?;
    // Rows may end with the delimiter, as `to_string_simple` writes them.
    let mut lines: Vec<&str> = s.trim().split_terminator(delimiter).collect();

    // Coordinate header
    if lines.len() == y_size + 1 && lines[0].trim_start().starts_with('A') {
        lines.remove(0);
    }
    if lines.len() != y_size {
        return Err(Error::BoardText(format!(
            "expected {y_size} rows, found {}",
            lines.len()
        )));
    }

    for (y, line) in lines.iter().enumerate() {
        // Row label
        let line = line.trim().trim_start_matches(|c: char| c.is_ascii_digit()).trim();
        let chars: Vec<char> = line.chars().collect();
        let spaced = if chars.len() == x_size {
            false
        } else if x_size > 0 && chars.len() == 2 * x_size - 1 {
            true
        } else {
            return Err(Error::BoardText(format!(
                "row {y} has length {} for width {x_size}: {line:?}",
                chars.len()
            )));
        };

        for x in 0..x_size {
            let c = if spaced { chars[2 * x] } else { chars[x] };
            let loc = get_loc(x, y, x_size);
            match c {
                '.' | ' ' | '*' | ',' | '`' => {}
                'x' | 'X' => {
                    board.set_stone(loc, Color::Black);
                }
                'o' | 'O' => {
                    board.set_stone(loc, Color::White);
                }
                other => {
                    return Err(Error::BoardText(format!(
                        "could not parse board character: {other:?}"
                    )));
                }
            }
        }
    }
    Ok(board)
}

// =============================================================================
// JSON
// =============================================================================

/// Wire form of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub x_size: usize,
    pub y_size: usize,
    /// Rows joined by `|`.
    pub stones: String,
    pub ko_loc: String,
    pub num_black_captures: u32,
    pub num_white_captures: u32,
    pub num_black_passes: u32,
    pub num_white_passes: u32,
}

impl BoardSnapshot {
    pub fn of_board(board: &Board) -> Self {
        Self {
            x_size: board.x_size,
            y_size: board.y_size,
            stones: to_string_simple(board, '|'),
            ko_loc: location::to_string(board.ko_loc, board.x_size, board.y_size),
            num_black_captures: board.num_black_captures(),
            num_white_captures: board.num_white_captures(),
            num_black_passes: board.num_black_passes(),
            num_white_passes: board.num_white_passes(),
        }
    }

    pub fn to_board(&self) -> Result<Board> {
        let mut board = parse_board_with_delimiter(self.x_size, self.y_size, &self.stones, '|')?;
        let ko_loc = location::of_string_allow_null(&self.ko_loc, self.x_size, self.y_size)?;
        board.set_simple_ko_loc(ko_loc);
        board.set_black_captures(self.num_black_captures);
        board.set_white_captures(self.num_white_captures);
        board.set_black_passes(self.num_black_passes);
        board.set_white_passes(self.num_white_passes);
        Ok(board)
    }
}

pub fn to_json(board: &Board) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(BoardSnapshot::of_board(board))?)
}

pub fn to_json_string(board: &Board) -> Result<String> {
    Ok(serde_json::to_string(&BoardSnapshot::of_board(board))?)
}

pub fn of_json(value: &serde_json::Value) -> Result<Board> {
    let snapshot = BoardSnapshot::deserialize(value)?;
    snapshot.to_board()
}

pub fn of_json_str(s: &str) -> Result<Board> {
    let snapshot: BoardSnapshot = serde_json::from_str(s)?;
    snapshot.to_board()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_LEN, PASS_LOC};

    #[test]
    fn test_parse_simple() {
        let board = parse_board(4, 3, "X...\n.O..\n...X").unwrap();
        assert_eq!(board.colors[board.loc(0, 0)], Color::Black);
        assert_eq!(board.colors[board.loc(1, 1)], Color::White);
        assert_eq!(board.colors[board.loc(3, 2)], Color::Black);
        assert_eq!(board.num_stones_on_board(), 3);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_parse_printed_board() {
        let mut board = Board::new(5, 5).unwrap();
        board.set_stone(board.loc(1, 1), Color::Black);
        board.set_stone(board.loc(2, 1), Color::Black);
        board.set_stone(board.loc(3, 3), Color::White);
        let printed = board.to_string();
        // Drop the HASH line
        let grid: String = printed.lines().skip(1).collect::<Vec<_>>().join("\n");
        let parsed = parse_board(5, 5, &grid).unwrap();
        assert_eq!(parsed.is_equal_for_testing(&board, true, true), Ok(true));
    }

    #[test]
    fn test_simple_roundtrip() {
        let board = parse_board(3, 3, "xo.\n.x.\no..").unwrap();
        assert_eq!(to_string_simple(&board, '\n'), "XO.\n.X.\nO..\n");
        let again = parse_board(3, 3, &to_string_simple(&board, '\n')).unwrap();
        assert_eq!(again.pos_hash, board.pos_hash);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_board(3, 3, "...\n..."), Err(Error::BoardText(_))));
        assert!(matches!(parse_board(3, 3, "...\n....\n..."), Err(Error::BoardText(_))));
        assert!(matches!(parse_board(3, 3, "...\n.Z.\n..."), Err(Error::BoardText(_))));
        assert!(matches!(
            parse_board(30, 3, "..."),
            Err(Error::InvalidBoardSize { .. })
        ));
    }

    #[test]
    fn test_print_marks_history() {
        let mut board = Board::new(3, 3).unwrap();
        let a = board.loc(0, 0);
        board.play_move_assume_legal(a, Color::Black);
        let hist = [Move::new(a, Color::Black), Move::new(PASS_LOC, Color::White)];
        let mut s = String::new();
        print_board(&mut s, &board, board.loc(2, 2), Some(&hist)).unwrap();
        assert!(s.starts_with("MoveNum: 2 HASH: "));
        assert!(s.contains(" 5 X1. .\n"));
        assert!(s.contains(" 3 . . .\n"));
        assert!(s.contains(" 1 . . @\n"));
    }

    #[test]
    fn test_print_rank_matches_location() {
        let board = Board::new(4, 7).unwrap();
        let printed = board.to_string();
        let rows: Vec<&str> = printed.lines().skip(2).filter(|l| !l.is_empty()).collect();
        assert_eq!(rows.len(), 7);
        for (y, row) in rows.iter().enumerate() {
            let label = row.split_whitespace().next().unwrap();
            let name = location::to_string(board.loc(0, y), 4, 7);
            let rank = name.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            assert_eq!(label, rank, "row {y}");
        }
    }

    #[test]
    fn test_print_wide_header() {
        let board = Board::new(MAX_LEN, 1).unwrap();
        let printed = board.to_string();
        let header = printed.lines().nth(1).unwrap();
        let last = board.x_size - 1;
        let label = if last <= 24 {
            format!(" {}", COLUMN_LETTERS[last] as char)
        } else {
            format!(" A{}", COLUMN_LETTERS[last - 25] as char)
        };
        assert!(header.ends_with(&label));
        assert_eq!(header.split_whitespace().count(), board.x_size);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut board = Board::new(1, 6).unwrap();
        for (y, c) in [(1, Color::Black), (2, Color::White), (4, Color::White), (3, Color::Black)] {
            board.play_move_assume_legal(board.loc(0, y), c);
        }
        board.play_move_assume_legal(PASS_LOC, Color::Black);
        board.set_simple_ko_loc(board.loc(0, 2));

        let value = to_json(&board).unwrap();
        assert_eq!(value["xSize"], 1);
        assert_eq!(value["stones"], ".|X|.|X|O|.|");
        assert_eq!(value["numBlackCaptures"], 1);
        assert_eq!(value["numBlackPasses"], 1);

        let restored = of_json(&value).unwrap();
        assert_eq!(restored.is_equal_for_testing(&board, true, true), Ok(true));
        let restored = of_json_str(&to_json_string(&board).unwrap()).unwrap();
        assert_eq!(restored.pos_hash, board.pos_hash);
    }

    #[test]
    fn test_json_loads_what_it_writes() {
        let empty = Board::new(3, 3).unwrap();

        let mut stones = Board::new(3, 3).unwrap();
        stones.set_stone(stones.loc(1, 1), Color::Black);
        stones.set_stone(stones.loc(2, 0), Color::White);

        let mut ko = Board::new(1, 6).unwrap();
        for (y, c) in [(1, Color::Black), (2, Color::White), (4, Color::White), (3, Color::Black)] {
            ko.play_move_assume_legal(ko.loc(0, y), c);
        }
        assert_eq!(ko.ko_loc, ko.loc(0, 2));

        for board in [empty, stones, ko] {
            let restored = of_json(&to_json(&board).unwrap()).unwrap();
            assert_eq!(restored.is_equal_for_testing(&board, true, true), Ok(true));
            assert_eq!(restored.ko_loc, board.ko_loc);
            assert_eq!(restored.pos_hash, board.pos_hash);
        }
    }

    #[test]
    fn test_parse_trailing_delimiter() {
        let board = parse_board_with_delimiter(3, 2, "X..|.O.|", '|').unwrap();
        assert_eq!(board.num_stones_on_board(), 2);
        let board = parse_board(3, 2, "X..\n.O.\n").unwrap();
        assert_eq!(board.num_stones_on_board(), 2);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(matches!(of_json_str("{\"xSize\": 3}"), Err(Error::Json(_))));
        let bad_ko = r#"{"xSize":3,"ySize":3,"stones":"...|...|...|","koLoc":"zz",
            "numBlackCaptures":0,"numWhiteCaptures":0,"numBlackPasses":0,"numWhitePasses":0}"#;
        assert!(matches!(of_json_str(bad_ko), Err(Error::Location(_))));
    }
}
