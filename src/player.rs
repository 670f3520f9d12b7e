//! Point colors, players and moves.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Contents of a single board cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    #[default]
    Empty = 0,
    Black = 1,
    White = 2,
    Wall = 3,
}

/// A side to move. Only `Black` and `White` are meaningful players.
pub type Player = Color;

impl Color {
    /// Index into per-color hash tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Opponent of a player. Empty and Wall map to each other.
    #[inline]
    pub fn opp(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            Color::Empty => Color::Wall,
            Color::Wall => Color::Empty,
        }
    }

    #[inline]
    pub fn is_player(self) -> bool {
        matches!(self, Color::Black | Color::White)
    }

    /// Single-character board rendering.
    pub fn to_char(self) -> char {
        match self {
            Color::Black => 'X',
            Color::White => 'O',
            Color::Empty => '.',
            Color::Wall => '#',
        }
    }

    /// Short name: "B", "W", "E" or "" for walls.
    pub fn to_short_str(self) -> &'static str {
        match self {
            Color::Black => "B",
            Color::White => "W",
            Color::Empty => "E",
            Color::Wall => "",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Color::Black => "Black",
            Color::White => "White",
            Color::Empty => "Empty",
            Color::Wall => "Wall",
        };
        f.write_str(s)
    }
}

/// Parse "b", "black", "w" or "white" in any case.
pub fn try_parse_player(s: &str) -> Option<Player> {
    match s.trim().to_ascii_lowercase().as_str() {
        "b" | "black" => Some(Color::Black),
        "w" | "white" => Some(Color::White),
        _ => None,
    }
}

pub fn parse_player(s: &str) -> Result<Player> {
    try_parse_player(s).ok_or_else(|| Error::Player(s.to_string()))
}

/// A move: a location (possibly `PASS_LOC`) and who played it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub loc: usize,
    pub pla: Player,
}

impl Move {
    pub fn new(loc: usize, pla: Player) -> Self {
        Self { loc, pla }
    }
}
