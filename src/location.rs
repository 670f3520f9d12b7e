//! Location arithmetic and coordinate strings.
//!
//! A location is an index into the padded board array:
//! `(x, y)` maps to `(x + 1) + (y + 1) * (x_size + 1)`. Index 0 and 1 are
//! walls on every board size, which is why they double as `NULL_LOC` and
//! `PASS_LOC`.
//!
//! Adjacency is hexagonal. With stride `W = x_size + 1` the six neighbors of
//! a point sit at offsets `-W, -1, +1, +W, W-1, -W+1`; the two remaining
//! diagonals `-W-1` and `W+1` are not neighbors.
//!
//! Human-readable strings use doubled hex coordinates: column
//! `2x + y + 1` (letters, skipping `I`) and rank `2 * y_size + 1 - (2y + 1)`.

use crate::board::Board;
use crate::constants::{NULL_LOC, PASS_LOC};
use crate::error::{Error, Result};

/// An index into the padded board array.
pub type Loc = usize;

const COLUMN_LETTERS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

#[inline]
pub fn get_loc(x: usize, y: usize, x_size: usize) -> Loc {
    (x + 1) + (y + 1) * (x_size + 1)
}

/// Column of a location. Negative or `>= x_size` for walls.
#[inline]
pub fn get_x(loc: Loc, x_size: usize) -> isize {
    (loc % (x_size + 1)) as isize - 1
}

/// Row of a location. Negative or `>= y_size` for walls.
#[inline]
pub fn get_y(loc: Loc, x_size: usize) -> isize {
    (loc / (x_size + 1)) as isize - 1
}

/// Every on-board location, row by row.
pub fn iter_locs(x_size: usize, y_size: usize) -> impl Iterator<Item = Loc> {
    (0..y_size).flat_map(move |y| (0..x_size).map(move |x| get_loc(x, y, x_size)))
}

/// Offset a location. The wall margin guarantees the result stays in the array
/// whenever `loc` is on the board.
#[inline]
pub fn offset(loc: Loc, delta: isize) -> Loc {
    (loc as isize + delta) as Loc
}

/// Neighbor offsets: the six hex neighbors followed by the two non-adjacent diagonals.
pub fn adjacent_offsets(x_size: usize) -> [isize; 8] {
    let w = (x_size + 1) as isize;
    [-w, -1, 1, w, w - 1, -w + 1, -w - 1, w + 1]
}

pub fn is_adjacent(loc0: Loc, loc1: Loc, x_size: usize) -> bool {
    let offsets = adjacent_offsets(x_size);
    offsets[..6].iter().any(|&d| offset(loc1, d) == loc0)
}

/// Point reflection through the board center.
pub fn mirror_loc(loc: Loc, x_size: usize, y_size: usize) -> Loc {
    if loc == NULL_LOC || loc == PASS_LOC {
        return loc;
    }
    let x = get_x(loc, x_size) as usize;
    let y = get_y(loc, x_size) as usize;
    get_loc(x_size - 1 - x, y_size - 1 - y, x_size)
}

/// The unique center point, or `NULL_LOC` if either dimension is even.
pub fn center_loc(x_size: usize, y_size: usize) -> Loc {
    if x_size % 2 == 0 || y_size % 2 == 0 {
        return NULL_LOC;
    }
    get_loc(x_size / 2, y_size / 2, x_size)
}

pub fn is_central(loc: Loc, x_size: usize, y_size: usize) -> bool {
    let (xs, ys) = (x_size as isize, y_size as isize);
    let x = get_x(loc, x_size);
    let y = get_y(loc, x_size);
    x >= (xs - 1) / 2 && x <= xs / 2 && y >= (ys - 1) / 2 && y <= ys / 2
}

pub fn is_near_central(loc: Loc, x_size: usize, y_size: usize) -> bool {
    let (xs, ys) = (x_size as isize, y_size as isize);
    let x = get_x(loc, x_size);
    let y = get_y(loc, x_size);
    x >= (xs - 1) / 2 - 1 && x <= xs / 2 + 1 && y >= (ys - 1) / 2 - 1 && y <= ys / 2 + 1
}

/// Sum of absolute column and row differences.
pub fn distance(loc0: Loc, loc1: Loc, x_size: usize) -> usize {
    let dx = get_x(loc1, x_size) - get_x(loc0, x_size);
    let dy = get_y(loc1, x_size) - get_y(loc0, x_size);
    dx.unsigned_abs() + dy.unsigned_abs()
}

pub fn euclidean_distance_squared(loc0: Loc, loc1: Loc, x_size: usize) -> usize {
    let dx = get_x(loc1, x_size) - get_x(loc0, x_size);
    let dy = get_y(loc1, x_size) - get_y(loc0, x_size);
    (dx * dx + dy * dy) as usize
}

// =============================================================================
// String Conversion
// =============================================================================

fn print_coords(loc: Loc, x_size: usize) -> (isize, isize) {
    let x = get_x(loc, x_size);
    let y = get_y(loc, x_size);
    (2 * x + y + 1, 2 * y + 1)
}

/// Machine form `(x_print,y_print)`, or `pass` / `null`.
pub fn to_string_mach(loc: Loc, x_size: usize) -> String {
    if loc == PASS_LOC {
        return "pass".to_string();
    }
    if loc == NULL_LOC {
        return "null".to_string();
    }
    let (xp, yp) = print_coords(loc, x_size);
    format!("({xp},{yp})")
}

/// Rank printed for row `y`, counting up from 1 at the bottom row in steps of 2.
pub fn rank_of_row(y: usize, y_size: usize) -> usize {
    2 * (y_size - y) - 1
}

/// Algebraic form such as `D16`, falling back to machine form off the board
/// or on boards too wide for two-letter columns.
pub fn to_string(loc: Loc, x_size: usize, y_size: usize) -> String {
    if x_size > 25 * 5 || y_size > 25 * 5 {
        return to_string_mach(loc, x_size);
    }
    if loc == PASS_LOC {
        return "pass".to_string();
    }
    if loc == NULL_LOC {
        return "null".to_string();
    }
    let x = get_x(loc, x_size);
    let y = get_y(loc, x_size);
    if x < 0 || y < 0 || x >= x_size as isize || y >= y_size as isize {
        return to_string_mach(loc, x_size);
    }

    let (xp, _) = print_coords(loc, x_size);
    let rank = rank_of_row(y as usize, y_size);
    let xp = xp as usize;
    if xp <= 24 {
        format!("{}{}", COLUMN_LETTERS[xp] as char, rank)
    } else {
        format!(
            "{}{}{}",
            COLUMN_LETTERS[xp / 25 - 1] as char,
            COLUMN_LETTERS[xp % 25] as char,
            rank
        )
    }
}

fn letter_index(c: char) -> Option<isize> {
    let c = c.to_ascii_uppercase();
    match c {
        'A'..='H' => Some(c as isize - 'A' as isize),
        'J'..='Z' => Some(c as isize - 'A' as isize - 1),
        _ => None,
    }
}

/// Convert doubled hex coordinates back to a location, rejecting parity
/// mismatches and off-board points.
fn from_print_coords(xp: isize, yp: isize, x_size: usize, y_size: usize) -> Option<Loc> {
    if yp.rem_euclid(2) != 1 {
        return None;
    }
    let y = (yp - 1) / 2;
    let diff = xp.checked_sub(y)?;
    if diff.rem_euclid(2) != 1 {
        return None;
    }
    let x = (diff - 1) / 2;
    if x < 0 || y < 0 || x >= x_size as isize || y >= y_size as isize {
        return None;
    }
    Some(get_loc(x as usize, y as usize, x_size))
}

pub fn try_of_string(s: &str, x_size: usize, y_size: usize) -> Option<Loc> {
    let s = s.trim();
    if s.len() < 2 {
        return None;
    }
    if s.eq_ignore_ascii_case("pass") || s.eq_ignore_ascii_case("pss") {
        return Some(PASS_LOC);
    }

    if let Some(inner) = s.strip_prefix('(') {
        let inner = inner.strip_suffix(')')?;
        let (xs, ys) = inner.split_once(',')?;
        let xp: isize = xs.trim().parse().ok()?;
        let yp: isize = ys.trim().parse().ok()?;
        return from_print_coords(xp, yp, x_size, y_size);
    }

    let mut chars = s.chars();
    let first = chars.next()?;
    let mut xp = letter_index(first)?;
    let rest = chars.as_str();
    let rest = match rest.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            xp = (xp + 1) * 25 + letter_index(c)?;
            &rest[1..]
        }
        _ => rest,
    };
    let rank: isize = rest.parse().ok()?;
    let yp = (2 * y_size as isize + 1).checked_sub(rank)?;
    from_print_coords(xp, yp, x_size, y_size)
}

/// Like [`try_of_string`], additionally accepting `null`.
pub fn try_of_string_allow_null(s: &str, x_size: usize, y_size: usize) -> Option<Loc> {
    if s.trim() == "null" {
        return Some(NULL_LOC);
    }
    try_of_string(s, x_size, y_size)
}

pub fn of_string(s: &str, x_size: usize, y_size: usize) -> Result<Loc> {
    try_of_string(s, x_size, y_size).ok_or_else(|| Error::Location(s.to_string()))
}

pub fn of_string_allow_null(s: &str, x_size: usize, y_size: usize) -> Result<Loc> {
    try_of_string_allow_null(s, x_size, y_size).ok_or_else(|| Error::Location(s.to_string()))
}

/// Parse a whitespace-separated list of locations for `board`.
pub fn parse_sequence(s: &str, board: &Board) -> Result<Vec<Loc>> {
    s.split_whitespace()
        .map(|piece| of_string(piece, board.x_size, board.y_size))
        .collect()
}
