//! Area ownership, used when a game is scored.
//!
//! Deciding which groups are unconditionally alive is outside this crate:
//! [`BoardHistory`](crate::history::BoardHistory) only needs something that
//! fills an ownership map. [`FloodFillScorer`] is the plain area-counting
//! version: stones count for their owner, and an empty region counts for a
//! color if every stone around it is that color.

use std::collections::VecDeque;
use std::fmt;

use crate::board::Board;
use crate::constants::MAX_ARR_SIZE;
use crate::location::{Loc, iter_locs};
use crate::player::Color;

/// Owner of every location. Off-board entries are `Empty`.
pub type AreaMap = [Color; MAX_ARR_SIZE];

pub fn empty_area() -> AreaMap {
    [Color::Empty; MAX_ARR_SIZE]
}

pub trait AreaScorer: Send + Sync + fmt::Debug {
    /// Area for final scoring.
    fn calculate_area(&self, board: &Board, area: &mut AreaMap, multi_stone_suicide_legal: bool);

    /// Area under independent-life scoring. Returns the number of white
    /// independently living regions minus the number of black ones.
    fn calculate_independent_life_area(
        &self,
        board: &Board,
        area: &mut AreaMap,
        multi_stone_suicide_legal: bool,
    ) -> i32;

    /// Points that are pass-alive for their owner. Everything else is `Empty`.
    fn calculate_pass_alive_area(
        &self,
        _board: &Board,
        area: &mut AreaMap,
        _multi_stone_suicide_legal: bool,
    ) {
        area.fill(Color::Empty);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FloodFillScorer;

/// An empty region and which colors touch it.
struct Region {
    locs: Vec<Loc>,
    touches_black: bool,
    touches_white: bool,
}

impl Region {
    fn owner(&self) -> Color {
        match (self.touches_black, self.touches_white) {
            (true, false) => Color::Black,
            (false, true) => Color::White,
            _ => Color::Empty,
        }
    }
}

/// Breadth-first fill of the empty region containing `start`.
fn region_and_borders(board: &Board, start: Loc, seen: &mut [bool; MAX_ARR_SIZE]) -> Region {
    let mut queue = VecDeque::from([start]);
    let mut region = Region {
        locs: vec![start],
        touches_black: false,
        touches_white: false,
    };
    seen[start] = true;

    while let Some(loc) = queue.pop_front() {
        for i in 0..6 {
            let adj = board.adj(loc, i);
            match board.colors[adj] {
                Color::Black => region.touches_black = true,
                Color::White => region.touches_white = true,
                Color::Empty => {
                    if !seen[adj] {
                        seen[adj] = true;
                        region.locs.push(adj);
                        queue.push_back(adj);
                    }
                }
                Color::Wall => {}
            }
        }
    }
    region
}

impl FloodFillScorer {
    /// Fill `area` and return the owned empty regions.
    fn fill(&self, board: &Board, area: &mut AreaMap) -> Vec<Region> {
        area.fill(Color::Empty);
        let mut seen = [false; MAX_ARR_SIZE];
        let mut owned = Vec::new();
        for loc in iter_locs(board.x_size, board.y_size) {
            let color = board.colors[loc];
            if color.is_player() {
                area[loc] = color;
            } else if !seen[loc] {
                let region = region_and_borders(board, loc, &mut seen);
                let owner = region.owner();
                if owner != Color::Empty {
                    for &r in &region.locs {
                        area[r] = owner;
                    }
                    owned.push(region);
                }
            }
        }
        owned
    }
}

impl AreaScorer for FloodFillScorer {
    fn calculate_area(&self, board: &Board, area: &mut AreaMap, _multi_stone_suicide_legal: bool) {
        self.fill(board, area);
    }

    fn calculate_independent_life_area(
        &self,
        board: &Board,
        area: &mut AreaMap,
        _multi_stone_suicide_legal: bool,
    ) -> i32 {
        let owned = self.fill(board, area);

        // A living region is a connected block of one color's area that
        // contains at least one owned empty region.
        let mut visited = [false; MAX_ARR_SIZE];
        let mut count = 0;
        for region in &owned {
            let owner = region.owner();
            let start = region.locs[0];
            if visited[start] {
                continue;
            }
            let mut stack = vec![start];
            visited[start] = true;
            while let Some(loc) = stack.pop() {
                for i in 0..6 {
                    let adj = board.adj(loc, i);
                    if area[adj] == owner && board.is_on_board(adj) && !visited[adj] {
                        visited[adj] = true;
                        stack.push(adj);
                    }
                }
            }
            count += if owner == Color::White { 1 } else { -1 };
        }
        count
    }
}

/// Area score from White's point of view, without komi.
pub fn white_minus_black(board: &Board, area: &AreaMap) -> i32 {
    iter_locs(board.x_size, board.y_size)
        .map(|loc| match area[loc] {
            Color::White => 1,
            Color::Black => -1,
            _ => 0,
        })
        .sum()
}
