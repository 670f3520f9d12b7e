//! The stone/chain/liberty engine.
//!
//! Every stone belongs to a chain. A chain is a circular singly linked list
//! threaded through `next_in_chain`, with every member's `chain_head`
//! pointing at one canonical member whose `chain_data` entry stores the
//! owner, stone count and exact liberty count.
//!
//! Placement, merging and capture touch only the neighborhood of the move
//! and the chains involved. Merges splice the smaller list into the larger
//! one. Nothing here allocates: a `Board` is a fixed-size value and `clone()`
//! is a plain deep copy, so search code can fork boards freely.

use tracing::warn;

use crate::constants::{
    CAPTURES_TO_WIN, DEFAULT_LEN, MAX_ARR_SIZE, MAX_LEN, MAX_PLAY_SIZE, NULL_LOC, PASS_LOC,
};
use crate::error::{Error, Result};
use crate::hash::{Hash128, zobrist};
use crate::location::{self, Loc, adjacent_offsets, get_loc, iter_locs, offset};
use crate::player::{Color, Player};

/// Per-chain bookkeeping, valid only at the chain's head.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainData {
    pub owner: Player,
    pub num_locs: i32,
    pub num_liberties: i32,
}

/// Undo information for one move made with [`Board::play_move_recorded`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub loc: Loc,
    pub pla: Player,
    /// Simple ko point before the move.
    pub ko_loc: Loc,
    /// Bit `i` set: the opponent chain in direction `i` was captured.
    /// Equal to [`SUICIDE_FLAG`]: the move removed its own chain.
    pub cap_dirs: u8,
}

pub const SUICIDE_FLAG: u8 = 0x40;

#[derive(Clone)]
pub struct Board {
    pub x_size: usize,
    pub y_size: usize,
    pub colors: [Color; MAX_ARR_SIZE],
    pub chain_data: [ChainData; MAX_ARR_SIZE],
    pub chain_head: [Loc; MAX_ARR_SIZE],
    pub next_in_chain: [Loc; MAX_ARR_SIZE],
    /// Point banned by simple ko, or `NULL_LOC`.
    pub ko_loc: Loc,
    pub pos_hash: Hash128,
    pub(crate) num_black_captures: u32,
    pub(crate) num_white_captures: u32,
    pub(crate) num_black_passes: u32,
    pub(crate) num_white_passes: u32,
    adj_offsets: [isize; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new_unchecked(DEFAULT_LEN, DEFAULT_LEN)
    }
}

impl Board {
    /// An empty board. Fails if either dimension is zero or above `MAX_LEN`.
    pub fn new(x_size: usize, y_size: usize) -> Result<Board> {
        if x_size == 0 || y_size == 0 || x_size > MAX_LEN || y_size > MAX_LEN {
            return Err(Error::InvalidBoardSize {
                x_size,
                y_size,
                max: MAX_LEN,
            });
        }
        Ok(Self::new_unchecked(x_size, y_size))
    }

    fn new_unchecked(x_size: usize, y_size: usize) -> Board {
        let z = zobrist();
        let mut board = Board {
            x_size,
            y_size,
            colors: [Color::Wall; MAX_ARR_SIZE],
            chain_data: [ChainData::default(); MAX_ARR_SIZE],
            chain_head: [NULL_LOC; MAX_ARR_SIZE],
            next_in_chain: [NULL_LOC; MAX_ARR_SIZE],
            ko_loc: NULL_LOC,
            pos_hash: z.size_x[x_size] ^ z.size_y[y_size],
            num_black_captures: 0,
            num_white_captures: 0,
            num_black_passes: 0,
            num_white_passes: 0,
            adj_offsets: adjacent_offsets(x_size),
        };
        for loc in iter_locs(x_size, y_size) {
            board.colors[loc] = Color::Empty;
        }
        board
    }

    #[inline]
    pub fn loc(&self, x: usize, y: usize) -> Loc {
        get_loc(x, y, self.x_size)
    }

    /// The `i`-th neighbor of `loc`. Indices 0..6 are the hex neighbors.
    #[inline]
    pub fn adj(&self, loc: Loc, i: usize) -> Loc {
        offset(loc, self.adj_offsets[i])
    }

    pub fn adj_offsets(&self) -> &[isize; 8] {
        &self.adj_offsets
    }

    pub fn num_black_captures(&self) -> u32 {
        self.num_black_captures
    }

    pub fn num_white_captures(&self) -> u32 {
        self.num_white_captures
    }

    pub fn num_black_passes(&self) -> u32 {
        self.num_black_passes
    }

    pub fn num_white_passes(&self) -> u32 {
        self.num_white_passes
    }

    /// Stones captured by `pla`.
    pub fn num_captures_by(&self, pla: Player) -> u32 {
        match pla {
            Color::Black => self.num_black_captures,
            Color::White => self.num_white_captures,
            _ => 0,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_on_board(&self, loc: Loc) -> bool {
        loc < MAX_ARR_SIZE && self.colors[loc] != Color::Wall
    }

    /// Stone count of the chain at `loc`. `loc` must hold a stone.
    #[inline]
    pub fn get_chain_size(&self, loc: Loc) -> usize {
        self.chain_data[self.chain_head[loc]].num_locs as usize
    }

    /// Liberty count of the chain at `loc`. `loc` must hold a stone.
    #[inline]
    pub fn get_num_liberties(&self, loc: Loc) -> usize {
        self.chain_data[self.chain_head[loc]].num_liberties as usize
    }

    pub fn get_num_immediate_liberties(&self, loc: Loc) -> usize {
        (0..6)
            .filter(|&i| self.colors[self.adj(loc, i)] == Color::Empty)
            .count()
    }

    /// Would a stone of `pla` at `loc` be removed as a suicide?
    pub fn is_suicide(&self, loc: Loc, pla: Player) -> bool {
        if loc == PASS_LOC {
            return false;
        }
        let opp = pla.opp();
        for i in 0..6 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                return false;
            } else if c == pla {
                if self.get_num_liberties(adj) > 1 {
                    return false;
                }
            } else if c == opp && self.get_num_liberties(adj) == 1 {
                return false;
            }
        }
        true
    }

    /// Like [`Board::is_suicide`], but when multi-stone suicide is legal only a
    /// lone stone killing itself counts.
    pub fn is_illegal_suicide(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        let opp = pla.opp();
        for i in 0..6 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                return false;
            } else if c == pla {
                if multi_stone_suicide_legal || self.get_num_liberties(adj) > 1 {
                    return false;
                }
            } else if c == opp && self.get_num_liberties(adj) == 1 {
                return false;
            }
        }
        true
    }

    /// Liberties the chain at `loc` would have after `pla` plays there,
    /// counting captures. Stops counting at `max`.
    pub fn get_num_liberties_after_play(&self, loc: Loc, pla: Player, max: usize) -> usize {
        let opp = pla.opp();
        let mut libs = [NULL_LOC; MAX_PLAY_SIZE];
        let mut num_libs = 0;
        let mut captured_heads = [NULL_LOC; 6];
        let mut num_captured = 0;

        for i in 0..6 {
            let adj = self.adj(loc, i);
            if self.colors[adj] == Color::Empty {
                libs[num_libs] = adj;
                num_libs += 1;
                if num_libs >= max {
                    return max;
                }
            } else if self.colors[adj] == opp && self.get_num_liberties(adj) == 1 {
                libs[num_libs] = adj;
                num_libs += 1;
                if num_libs >= max {
                    return max;
                }
                let head = self.chain_head[adj];
                if !captured_heads[..num_captured].contains(&head) {
                    captured_heads[num_captured] = head;
                    num_captured += 1;
                }
            }
        }

        let captured_heads = &captured_heads[..num_captured];
        let would_be_empty = |lc: Loc| {
            self.colors[lc] == Color::Empty
                || (self.colors[lc] == opp && captured_heads.contains(&self.chain_head[lc]))
        };

        let mut connecting_heads = [NULL_LOC; 6];
        let mut num_connecting = 0;
        for i in 0..6 {
            let adj = self.adj(loc, i);
            if self.colors[adj] != pla {
                continue;
            }
            let head = self.chain_head[adj];
            if connecting_heads[..num_connecting].contains(&head) {
                continue;
            }
            connecting_heads[num_connecting] = head;
            num_connecting += 1;

            let mut cur = adj;
            loop {
                for k in 0..6 {
                    let lib = self.adj(cur, k);
                    if lib != loc && would_be_empty(lib) && !libs[..num_libs].contains(&lib) {
                        libs[num_libs] = lib;
                        num_libs += 1;
                        if num_libs >= max {
                            return max;
                        }
                    }
                }
                cur = self.next_in_chain[cur];
                if cur == adj {
                    break;
                }
            }
        }
        num_libs
    }

    #[inline]
    pub fn is_ko_banned(&self, loc: Loc) -> bool {
        loc == self.ko_loc
    }

    /// Pass, or an empty point that is neither ko-banned nor an illegal suicide.
    pub fn is_legal(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        if !pla.is_player() {
            return false;
        }
        loc == PASS_LOC
            || (loc < MAX_ARR_SIZE
                && self.colors[loc] == Color::Empty
                && !self.is_ko_banned(loc)
                && !self.is_illegal_suicide(loc, pla, multi_stone_suicide_legal))
    }

    pub fn is_legal_ignoring_ko(&self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        if !pla.is_player() {
            return false;
        }
        loc == PASS_LOC
            || (loc < MAX_ARR_SIZE
                && self.colors[loc] == Color::Empty
                && !self.is_illegal_suicide(loc, pla, multi_stone_suicide_legal))
    }

    /// Would `pla` capture something by playing at `loc`?
    pub fn would_be_capture(&self, loc: Loc, pla: Player) -> bool {
        if self.colors[loc] != Color::Empty {
            return false;
        }
        let opp = pla.opp();
        (0..6).any(|i| {
            let adj = self.adj(loc, i);
            self.colors[adj] == opp && self.get_num_liberties(adj) == 1
        })
    }

    pub fn is_adjacent_to_pla(&self, loc: Loc, pla: Player) -> bool {
        (0..6).any(|i| self.colors[self.adj(loc, i)] == pla)
    }

    /// Is `loc` next to a stone of the chain containing `chain`?
    pub fn is_adjacent_to_chain(&self, loc: Loc, chain: Loc) -> bool {
        let color = self.colors[chain];
        if !color.is_player() {
            return false;
        }
        let head = self.chain_head[chain];
        (0..6).any(|i| {
            let adj = self.adj(loc, i);
            self.colors[adj] == color && self.chain_head[adj] == head
        })
    }

    pub fn is_empty(&self) -> bool {
        iter_locs(self.x_size, self.y_size).all(|loc| self.colors[loc] == Color::Empty)
    }

    pub fn num_stones_on_board(&self) -> usize {
        iter_locs(self.x_size, self.y_size)
            .filter(|&loc| self.colors[loc].is_player())
            .count()
    }

    pub fn num_pla_stones_on_board(&self, pla: Player) -> usize {
        iter_locs(self.x_size, self.y_size)
            .filter(|&loc| self.colors[loc] == pla)
            .count()
    }

    /// The player who has captured `CAPTURES_TO_WIN` stones, if any.
    pub fn check_winner(&self) -> Option<Player> {
        if self.num_black_captures >= CAPTURES_TO_WIN {
            Some(Color::Black)
        } else if self.num_white_captures >= CAPTURES_TO_WIN {
            Some(Color::White)
        } else {
            None
        }
    }

    /// Position hash with the simple ko point and side to move folded in.
    pub fn get_sit_hash_with_simple_ko(&self, pla: Player) -> Hash128 {
        let z = zobrist();
        let mut h = self.pos_hash;
        if self.ko_loc != NULL_LOC {
            h ^= z.ko_loc[self.ko_loc];
        }
        h ^ z.player[pla.index()]
    }

    pub fn set_simple_ko_loc(&mut self, loc: Loc) {
        self.ko_loc = loc;
    }

    pub fn clear_simple_ko_loc(&mut self) {
        self.ko_loc = NULL_LOC;
    }

    // =========================================================================
    // Counters
    // =========================================================================

    pub fn set_black_captures(&mut self, n: u32) {
        let z = zobrist();
        self.pos_hash ^= z.capture_b_lane(self.num_black_captures) ^ z.capture_b_lane(n);
        self.num_black_captures = n;
    }

    pub fn set_white_captures(&mut self, n: u32) {
        let z = zobrist();
        self.pos_hash ^= z.capture_w_lane(self.num_white_captures) ^ z.capture_w_lane(n);
        self.num_white_captures = n;
    }

    pub fn set_black_passes(&mut self, n: u32) {
        let z = zobrist();
        self.pos_hash ^= z.pass_b_lane(self.num_black_passes) ^ z.pass_b_lane(n);
        self.num_black_passes = n;
    }

    pub fn set_white_passes(&mut self, n: u32) {
        let z = zobrist();
        self.pos_hash ^= z.pass_w_lane(self.num_white_passes) ^ z.pass_w_lane(n);
        self.num_white_passes = n;
    }

    /// Credit `pla` with `n` more captured stones.
    fn add_captures(&mut self, pla: Player, n: u32) {
        match pla {
            Color::Black => self.set_black_captures(self.num_black_captures + n),
            Color::White => self.set_white_captures(self.num_white_captures + n),
            _ => {}
        }
    }

    fn sub_captures(&mut self, pla: Player, n: u32) {
        match pla {
            Color::Black => self.set_black_captures(self.num_black_captures - n),
            Color::White => self.set_white_captures(self.num_white_captures - n),
            _ => {}
        }
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Place or remove a stone directly, outside of move order. Clears ko.
    /// A stone that would have no liberties is not placed.
    pub fn set_stone(&mut self, loc: Loc, color: Color) -> bool {
        if loc >= MAX_ARR_SIZE || self.colors[loc] == Color::Wall || color == Color::Wall {
            return false;
        }
        let current = self.colors[loc];
        match (current, color) {
            _ if current == color => {}
            (Color::Empty, _) => self.play_move_assume_legal(loc, color),
            (_, Color::Empty) => self.remove_single_stone(loc),
            _ => {
                self.remove_single_stone(loc);
                if !self.is_suicide(loc, color) {
                    self.play_move_assume_legal(loc, color);
                }
            }
        }
        self.ko_loc = NULL_LOC;
        true
    }

    /// Play the move if it is legal. Returns whether it was played.
    pub fn play_move(&mut self, loc: Loc, pla: Player, multi_stone_suicide_legal: bool) -> bool {
        if self.is_legal(loc, pla, multi_stone_suicide_legal) {
            self.play_move_assume_legal(loc, pla);
            true
        } else {
            false
        }
    }

    /// Play a move that the caller knows is legal, returning what is needed to undo it.
    pub fn play_move_recorded(&mut self, loc: Loc, pla: Player) -> MoveRecord {
        let mut record = MoveRecord {
            loc,
            pla,
            ko_loc: self.ko_loc,
            cap_dirs: 0,
        };
        if loc != PASS_LOC {
            let opp = pla.opp();
            for i in 0..6 {
                let adj = self.adj(loc, i);
                if self.colors[adj] == opp && self.get_num_liberties(adj) == 1 {
                    record.cap_dirs |= 1 << i;
                }
            }
            if record.cap_dirs == 0 && self.is_suicide(loc, pla) {
                record.cap_dirs = SUICIDE_FLAG;
            }
        }
        self.play_move_assume_legal(loc, pla);
        record
    }

    /// Revert a move made by [`Board::play_move_recorded`]. Records must be
    /// undone in reverse order. Stones, counts and hash are restored exactly;
    /// chain heads and list order may differ from before the move.
    pub fn undo(&mut self, record: MoveRecord) {
        self.ko_loc = record.ko_loc;

        let loc = record.loc;
        let pla = record.pla;
        let opp = pla.opp();
        if loc == PASS_LOC {
            match pla {
                Color::Black => self.set_black_passes(self.num_black_passes - 1),
                Color::White => self.set_white_passes(self.num_white_passes - 1),
                _ => {}
            }
            return;
        }

        for i in 0..6 {
            let adj = self.adj(loc, i);
            if record.cap_dirs & (1 << i) != 0 && self.colors[adj] == Color::Empty {
                self.add_chain(adj, opp);
                let restored = self.get_chain_size(adj) as u32;
                self.sub_captures(pla, restored);
            }
        }
        if record.cap_dirs == SUICIDE_FLAG {
            self.add_chain(loc, pla);
            let restored = self.get_chain_size(loc) as u32;
            self.sub_captures(opp, restored);
        }

        self.pos_hash ^= zobrist().board[loc][pla.index()];
        self.colors[loc] = Color::Empty;
        self.change_surrounding_liberties(loc, opp, 1);

        let head = self.chain_head[loc];
        if self.chain_data[head].num_locs <= 1 {
            return;
        }

        let num_neighbors = (0..6)
            .filter(|&i| self.colors[self.adj(loc, i)] == pla)
            .count();

        if num_neighbors <= 1 {
            // The rest of the chain stays connected: patch it in place.
            let mut head = head;
            if head == loc {
                let new_head = self.next_in_chain[loc];
                let mut cur = loc;
                loop {
                    self.chain_head[cur] = new_head;
                    cur = self.next_in_chain[cur];
                    if cur == loc {
                        break;
                    }
                }
                self.chain_data[new_head] = self.chain_data[head];
                head = new_head;
            }

            let mut cur = head;
            while self.next_in_chain[cur] != loc {
                cur = self.next_in_chain[cur];
            }
            self.next_in_chain[cur] = self.next_in_chain[loc];

            let mut liberty_delta = 1;
            for i in 0..6 {
                let adj = self.adj(loc, i);
                if self.colors[adj] == Color::Empty && !self.is_liberty_of(adj, head) {
                    liberty_delta -= 1;
                }
            }
            self.chain_data[head].num_liberties += liberty_delta;
            self.chain_data[head].num_locs -= 1;
        } else {
            // Removing the stone may split the chain: rebuild every piece.
            let mut cur = loc;
            loop {
                self.chain_head[cur] = NULL_LOC;
                cur = self.next_in_chain[cur];
                if cur == loc {
                    break;
                }
            }
            for i in 0..6 {
                let adj = self.adj(loc, i);
                if self.colors[adj] == pla && self.chain_head[adj] == NULL_LOC {
                    self.rebuild_chain(adj, pla);
                }
            }
        }
    }

    /// The `pos_hash` this board would have after `pla` plays `loc`,
    /// including captures, suicide and the capture/pass counters.
    pub fn get_pos_hash_after_move(&self, loc: Loc, pla: Player) -> Hash128 {
        let z = zobrist();
        if loc == PASS_LOC {
            return match pla {
                Color::Black => {
                    let n = self.num_black_passes;
                    self.pos_hash ^ z.pass_b_lane(n) ^ z.pass_b_lane(n + 1)
                }
                Color::White => {
                    let n = self.num_white_passes;
                    self.pos_hash ^ z.pass_w_lane(n) ^ z.pass_w_lane(n + 1)
                }
                _ => self.pos_hash,
            };
        }

        let mut hash = self.pos_hash ^ z.board[loc][pla.index()];
        let opp = pla.opp();

        let mut would_be_suicide = true;
        let mut seen_heads = [NULL_LOC; 6];
        let mut num_seen = 0;
        let mut num_captured = 0u32;
        for i in 0..6 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == Color::Empty {
                would_be_suicide = false;
            } else if c == pla {
                if self.get_num_liberties(adj) > 1 {
                    would_be_suicide = false;
                }
            } else if c == opp && self.get_num_liberties(adj) == 1 {
                let head = self.chain_head[adj];
                if seen_heads[..num_seen].contains(&head) {
                    continue;
                }
                seen_heads[num_seen] = head;
                num_seen += 1;
                would_be_suicide = false;

                let mut cur = adj;
                loop {
                    hash ^= z.board[cur][opp.index()];
                    num_captured += 1;
                    cur = self.next_in_chain[cur];
                    if cur == adj {
                        break;
                    }
                }
            }
        }

        if num_captured > 0 {
            hash ^= capture_lane_delta(pla, self.num_captures_by(pla), num_captured);
        }

        if would_be_suicide {
            let mut num_suicided = 1u32;
            for i in 0..6 {
                let adj = self.adj(loc, i);
                if self.colors[adj] != pla {
                    continue;
                }
                let head = self.chain_head[adj];
                if seen_heads[..num_seen].contains(&head) {
                    continue;
                }
                seen_heads[num_seen] = head;
                num_seen += 1;

                let mut cur = adj;
                loop {
                    hash ^= z.board[cur][pla.index()];
                    num_suicided += 1;
                    cur = self.next_in_chain[cur];
                    if cur == adj {
                        break;
                    }
                }
            }
            hash ^= z.board[loc][pla.index()];
            hash ^= capture_lane_delta(opp, self.num_captures_by(opp), num_suicided);
        }

        hash
    }

    /// Play a move without checking legality.
    pub fn play_move_assume_legal(&mut self, loc: Loc, pla: Player) {
        if loc == PASS_LOC {
            self.ko_loc = NULL_LOC;
            match pla {
                Color::Black => self.set_black_passes(self.num_black_passes + 1),
                Color::White => self.set_white_passes(self.num_white_passes + 1),
                _ => {}
            }
            return;
        }

        let opp = pla.opp();

        self.colors[loc] = pla;
        self.pos_hash ^= zobrist().board[loc][pla.index()];
        self.chain_data[loc] = ChainData {
            owner: pla,
            num_locs: 1,
            num_liberties: self.get_num_immediate_liberties(loc) as i32,
        };
        self.chain_head[loc] = loc;
        self.next_in_chain[loc] = loc;

        let mut num_captured = 0u32;
        let mut possible_ko_loc = NULL_LOC;
        let mut opp_heads_seen = [NULL_LOC; 6];
        let mut num_opps_seen = 0;

        for i in 0..6 {
            let adj = self.adj(loc, i);
            let c = self.colors[adj];
            if c == pla {
                let adj_head = self.chain_head[adj];
                if adj_head == self.chain_head[loc] {
                    continue;
                }
                self.chain_data[adj_head].num_liberties -= 1;
                self.merge_chains(adj, loc);
            } else if c == opp {
                let opp_head = self.chain_head[adj];
                if opp_heads_seen[..num_opps_seen].contains(&opp_head) {
                    continue;
                }
                opp_heads_seen[num_opps_seen] = opp_head;
                num_opps_seen += 1;

                self.chain_data[opp_head].num_liberties -= 1;
                if self.chain_data[opp_head].num_liberties == 0 {
                    num_captured += self.remove_chain(adj);
                    possible_ko_loc = adj;
                }
            }
        }

        // Ko: exactly one stone captured by a lone stone left in atari.
        let head = self.chain_head[loc];
        self.ko_loc = if num_captured == 1
            && self.chain_data[head].num_locs == 1
            && self.chain_data[head].num_liberties == 1
        {
            possible_ko_loc
        } else {
            NULL_LOC
        };

        if num_captured > 0 {
            self.add_captures(pla, num_captured);
        }

        if self.chain_data[head].num_liberties == 0 {
            let num_suicided = self.chain_data[head].num_locs as u32;
            self.remove_chain(loc);
            self.add_captures(opp, num_suicided);
        }
    }

    // =========================================================================
    // Chain Maintenance
    // =========================================================================

    /// `loc` is empty and touches a stone of the chain headed by `head`.
    fn is_liberty_of(&self, loc: Loc, head: Loc) -> bool {
        let color = self.colors[head];
        (0..6).any(|i| {
            let adj = self.adj(loc, i);
            self.colors[adj] == color && self.chain_head[adj] == head
        })
    }

    /// Merge two distinct chains of the same owner, splicing the smaller list
    /// into the larger and counting only the liberties the smaller one adds.
    fn merge_chains(&mut self, loc1: Loc, loc2: Loc) {
        let mut head1 = self.chain_head[loc1];
        let mut head2 = self.chain_head[loc2];
        debug_assert_ne!(head1, head2);
        if self.chain_data[head1].num_locs < self.chain_data[head2].num_locs {
            std::mem::swap(&mut head1, &mut head2);
        }

        self.chain_data[head1].num_locs += self.chain_data[head2].num_locs;
        let mut new_liberties = 0;
        let mut cur = head2;
        loop {
            for i in 0..6 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty && !self.is_liberty_of(adj, head1) {
                    new_liberties += 1;
                }
            }
            self.chain_head[cur] = head1;
            if self.next_in_chain[cur] == head2 {
                break;
            }
            cur = self.next_in_chain[cur];
        }
        self.chain_data[head1].num_liberties += new_liberties;

        // head1 -> head2 -> ... -> last2 -> (old next of head1) -> ... -> head1
        self.next_in_chain[cur] = self.next_in_chain[head1];
        self.next_in_chain[head1] = head2;
    }

    /// Remove a whole chain, returning its size. Neighboring enemy chains gain liberties.
    fn remove_chain(&mut self, loc: Loc) -> u32 {
        let z = zobrist();
        let pla = self.colors[loc];
        let opp = pla.opp();
        let mut removed = 0;
        let mut cur = loc;
        loop {
            self.pos_hash ^= z.board[cur][pla.index()];
            self.colors[cur] = Color::Empty;
            removed += 1;
            self.change_surrounding_liberties(cur, opp, 1);
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        removed
    }

    /// Remove one stone, even from the middle of a chain.
    fn remove_single_stone(&mut self, loc: Loc) {
        let pla = self.colors[loc];
        let mut locs = [NULL_LOC; MAX_PLAY_SIZE];
        let mut n = 0;
        let mut cur = loc;
        loop {
            locs[n] = cur;
            n += 1;
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }

        self.remove_chain(loc);
        for &other in &locs[..n] {
            if other != loc {
                self.play_move_assume_legal(other, pla);
            }
        }
    }

    /// Fill the empty region containing `loc` with stones of `pla` as one chain headed at `loc`.
    /// The region must not border any existing chain of `pla`.
    fn add_chain(&mut self, loc: Loc, pla: Player) {
        let z = zobrist();
        let opp = pla.opp();
        let mut members = [NULL_LOC; MAX_PLAY_SIZE];
        let mut num_members = 0;
        let mut stack = [NULL_LOC; MAX_PLAY_SIZE];
        let mut stack_len = 1;
        stack[0] = loc;
        self.colors[loc] = pla;

        while stack_len > 0 {
            stack_len -= 1;
            let cur = stack[stack_len];
            self.pos_hash ^= z.board[cur][pla.index()];
            self.chain_head[cur] = loc;
            members[num_members] = cur;
            num_members += 1;
            self.change_surrounding_liberties(cur, opp, -1);

            for i in 0..6 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty {
                    self.colors[adj] = pla;
                    stack[stack_len] = adj;
                    stack_len += 1;
                }
            }
        }

        self.link_chain(loc, pla, &members[..num_members]);
    }

    /// Re-thread an existing chain of `pla` starting from `loc`, whose members
    /// must all have `chain_head` pointing somewhere other than `loc`.
    fn rebuild_chain(&mut self, loc: Loc, pla: Player) {
        let mut members = [NULL_LOC; MAX_PLAY_SIZE];
        let mut num_members = 0;
        let mut stack = [NULL_LOC; MAX_PLAY_SIZE];
        let mut stack_len = 1;
        stack[0] = loc;
        self.chain_head[loc] = loc;

        while stack_len > 0 {
            stack_len -= 1;
            let cur = stack[stack_len];
            members[num_members] = cur;
            num_members += 1;
            for i in 0..6 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == pla && self.chain_head[adj] != loc {
                    self.chain_head[adj] = loc;
                    stack[stack_len] = adj;
                    stack_len += 1;
                }
            }
        }

        self.link_chain(loc, pla, &members[..num_members]);
    }

    /// Thread `members` into a circular list headed by `head` and recount its liberties.
    fn link_chain(&mut self, head: Loc, pla: Player, members: &[Loc]) {
        let n = members.len();
        for k in 0..n {
            self.next_in_chain[members[k]] = members[(k + 1) % n];
        }
        self.chain_data[head] = ChainData {
            owner: pla,
            num_locs: n as i32,
            num_liberties: 0,
        };
        self.chain_data[head].num_liberties = self.count_liberties(head) as i32;
    }

    /// Exact liberty count by walking the chain.
    fn count_liberties(&self, loc: Loc) -> usize {
        let mut seen = [false; MAX_ARR_SIZE];
        let mut count = 0;
        let mut cur = loc;
        loop {
            for i in 0..6 {
                let adj = self.adj(cur, i);
                if self.colors[adj] == Color::Empty && !seen[adj] {
                    seen[adj] = true;
                    count += 1;
                }
            }
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        count
    }

    /// Add `delta` liberties to each distinct chain of `pla` next to `loc`.
    fn change_surrounding_liberties(&mut self, loc: Loc, pla: Player, delta: i32) {
        let mut seen = [NULL_LOC; 6];
        let mut num_seen = 0;
        for i in 0..6 {
            let adj = self.adj(loc, i);
            if self.colors[adj] != pla {
                continue;
            }
            let head = self.chain_head[adj];
            if seen[..num_seen].contains(&head) {
                continue;
            }
            seen[num_seen] = head;
            num_seen += 1;
            self.chain_data[head].num_liberties += delta;
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Collect the liberties of the chain at `loc` into `buf` (cleared first).
    pub fn find_liberties(&self, loc: Loc, buf: &mut Vec<Loc>) -> usize {
        buf.clear();
        let mut cur = loc;
        loop {
            for i in 0..6 {
                let lib = self.adj(cur, i);
                if self.colors[lib] == Color::Empty && !buf.contains(&lib) {
                    buf.push(lib);
                }
            }
            cur = self.next_in_chain[cur];
            if cur == loc {
                break;
            }
        }
        buf.len()
    }

    /// Recompute every chain and the hash from scratch and compare with the
    /// incrementally maintained state.
    pub fn check_consistency(&self) -> Result<()> {
        let mut chain_loc_checked = [false; MAX_ARR_SIZE];
        let mut buf = Vec::new();

        let mut check_chain = |loc: Loc, checked: &mut [bool; MAX_ARR_SIZE]| -> Result<()> {
            let pla = self.colors[loc];
            let head = self.chain_head[loc];
            let mut cur = loc;
            let mut stone_count = 0;
            let mut pseudo_libs = 0;
            let mut found_head = false;
            loop {
                checked[cur] = true;
                if self.colors[cur] != pla {
                    return Err(inconsistent("chain is not all the same color"));
                }
                if self.chain_head[cur] != head {
                    return Err(inconsistent("chain does not all have the same head"));
                }
                stone_count += 1;
                pseudo_libs += self.get_num_immediate_liberties(cur);
                if cur == head {
                    found_head = true;
                }
                if stone_count > MAX_PLAY_SIZE {
                    return Err(inconsistent("chain exceeds size of board, broken circular list?"));
                }
                cur = self.next_in_chain[cur];
                if cur >= MAX_ARR_SIZE {
                    return Err(inconsistent("chain location is outside of board bounds"));
                }
                if cur == loc {
                    break;
                }
            }

            if !found_head {
                return Err(inconsistent("chain loop does not contain head"));
            }
            let data = self.chain_data[head];
            if data.owner != pla {
                return Err(inconsistent("chain data owner does not match stones"));
            }
            if data.num_locs != stone_count as i32 {
                return Err(inconsistent("chain data num_locs does not match actual stone count"));
            }
            if data.num_liberties as usize > pseudo_libs {
                return Err(inconsistent("chain data liberties exceeds pseudoliberties"));
            }
            if data.num_liberties <= 0 {
                return Err(inconsistent("chain data liberties is nonpositive"));
            }
            if self.find_liberties(loc, &mut buf) != data.num_liberties as usize {
                return Err(inconsistent("find_liberties found a different number of libs"));
            }
            Ok(())
        };

        let z = zobrist();
        let mut expected_hash = z.size_x[self.x_size] ^ z.size_y[self.y_size];
        for loc in 0..MAX_ARR_SIZE {
            let x = location::get_x(loc, self.x_size);
            let y = location::get_y(loc, self.x_size);
            let on_board = x >= 0 && y >= 0 && (x as usize) < self.x_size && (y as usize) < self.y_size;
            let color = self.colors[loc];
            if !on_board {
                if color != Color::Wall {
                    return Err(inconsistent("non-wall value outside of board legal area"));
                }
            } else if color.is_player() {
                if !chain_loc_checked[loc] {
                    check_chain(loc, &mut chain_loc_checked)?;
                }
                expected_hash ^= z.board[loc][color.index()];
            } else if color != Color::Empty {
                return Err(inconsistent("wall inside board legal area"));
            }
        }
        expected_hash ^= z.capture_b_lane(self.num_black_captures);
        expected_hash ^= z.capture_w_lane(self.num_white_captures);
        expected_hash ^= z.pass_b_lane(self.num_black_passes);
        expected_hash ^= z.pass_w_lane(self.num_white_passes);
        if self.pos_hash != expected_hash {
            return Err(inconsistent("pos hash does not match expected"));
        }

        if self.ko_loc != NULL_LOC {
            if !self.is_on_board(self.ko_loc) {
                return Err(inconsistent("invalid simple ko loc"));
            }
            if self.get_num_immediate_liberties(self.ko_loc) != 0 {
                return Err(inconsistent("simple ko loc has immediate liberties"));
            }
        }

        if self.adj_offsets != adjacent_offsets(self.x_size) {
            return Err(inconsistent("corrupted adjacency offsets"));
        }
        Ok(())
    }

    /// Equal stones, counts and hash, after checking both boards for consistency.
    /// Chain heads and list order are allowed to differ.
    pub fn is_equal_for_testing(
        &self,
        other: &Board,
        check_num_captures: bool,
        check_simple_ko: bool,
    ) -> Result<bool> {
        self.check_consistency()?;
        other.check_consistency()?;
        if self.x_size != other.x_size || self.y_size != other.y_size {
            return Ok(false);
        }
        if check_simple_ko && self.ko_loc != other.ko_loc {
            return Ok(false);
        }
        if check_num_captures
            && (self.num_black_captures != other.num_black_captures
                || self.num_white_captures != other.num_white_captures)
        {
            return Ok(false);
        }
        if self.num_black_passes != other.num_black_passes
            || self.num_white_passes != other.num_white_passes
        {
            return Ok(false);
        }
        let hash_without_captures = |b: &Board| {
            let z = zobrist();
            b.pos_hash ^ z.capture_b_lane(b.num_black_captures) ^ z.capture_w_lane(b.num_white_captures)
        };
        if hash_without_captures(self) != hash_without_captures(other) {
            return Ok(false);
        }
        Ok(self.colors == other.colors)
    }
}

/// Hash change when `pla`'s capture count goes from `old` to `old + added`.
fn capture_lane_delta(pla: Player, old: u32, added: u32) -> Hash128 {
    let z = zobrist();
    match pla {
        Color::Black => z.capture_b_lane(old) ^ z.capture_b_lane(old + added),
        Color::White => z.capture_w_lane(old) ^ z.capture_w_lane(old + added),
        _ => Hash128::ZERO,
    }
}

fn inconsistent(msg: &str) -> Error {
    warn!(target: "hexgo::board", "consistency check failed: {msg}");
    Error::Inconsistent(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(board: &mut Board, stones: &[(usize, usize)], pla: Player) {
        for &(x, y) in stones {
            let loc = board.loc(x, y);
            assert!(board.play_move(loc, pla, true), "could not place at ({x},{y})");
        }
    }

    /// A 1x6 column where Black has just taken a ko at (0,2).
    fn ko_column() -> Board {
        let mut board = Board::new(1, 6).unwrap();
        place(&mut board, &[(0, 1)], Color::Black);
        place(&mut board, &[(0, 2), (0, 4)], Color::White);
        place(&mut board, &[(0, 3)], Color::Black);
        board
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_new_board() {
        let board = Board::new(9, 9).unwrap();
        assert!(board.is_empty());
        assert_eq!(board.num_stones_on_board(), 0);
        assert_eq!(board.ko_loc, NULL_LOC);
        assert_eq!(board.colors[NULL_LOC], Color::Wall);
        assert_eq!(board.colors[PASS_LOC], Color::Wall);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_invalid_size() {
        assert!(Board::new(MAX_LEN + 1, 5).is_err());
        assert!(Board::new(5, 0).is_err());
        assert!(Board::new(MAX_LEN, MAX_LEN).is_ok());
    }

    #[test]
    fn test_invalid_size_reports_bounds() {
        match Board::new(0, 0) {
            Err(Error::InvalidBoardSize { x_size: 0, y_size: 0, max }) => assert_eq!(max, MAX_LEN),
            other => panic!("unexpected {other:?}"),
        }
        let err = anyhow::Error::from(Board::new(MAX_LEN + 1, MAX_LEN + 1).unwrap_err());
        assert!(err.downcast_ref::<Error>().is_some());
    }

    #[test]
    fn test_size_changes_hash() {
        let a = Board::new(9, 9).unwrap();
        let b = Board::new(9, 7).unwrap();
        assert_ne!(a.pos_hash, b.pos_hash);
    }

    #[test]
    fn test_corner_has_two_liberties() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(0, 0)], Color::Black);
        assert_eq!(board.get_num_liberties(board.loc(0, 0)), 2);
        place(&mut board, &[(8, 8)], Color::White);
        assert_eq!(board.get_num_liberties(board.loc(8, 8)), 2);
        place(&mut board, &[(8, 0)], Color::White);
        assert_eq!(board.get_num_liberties(board.loc(8, 0)), 3);
        place(&mut board, &[(4, 4)], Color::White);
        assert_eq!(board.get_num_liberties(board.loc(4, 4)), 6);
    }

    // =========================================================================
    // Capture
    // =========================================================================

    #[test]
    fn test_corner_capture() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(1, 0)], Color::Black);
        place(&mut board, &[(0, 0)], Color::White);
        assert_eq!(board.get_num_liberties(board.loc(0, 0)), 1);
        place(&mut board, &[(0, 1)], Color::Black);

        let corner = board.loc(0, 0);
        assert_eq!(board.colors[corner], Color::Empty);
        assert_eq!(board.num_black_captures(), 1);
        assert_eq!(board.num_white_captures(), 0);
        assert_eq!(board.get_chain_size(board.loc(1, 0)), 2);
        assert_eq!(board.get_num_liberties(board.loc(1, 0)), 4);
        assert!(board.is_adjacent_to_chain(corner, board.loc(0, 1)));
        assert_eq!(board.ko_loc, NULL_LOC);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_double_capture() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(4, 0), (2, 1)], Color::White);
        place(
            &mut board,
            &[(5, 0), (4, 1), (3, 1), (2, 0), (1, 1), (2, 2), (1, 2)],
            Color::Black,
        );
        assert_eq!(board.get_num_liberties(board.loc(4, 0)), 1);
        assert_eq!(board.get_num_liberties(board.loc(2, 1)), 1);
        let play = board.loc(3, 0);
        assert!(board.would_be_capture(play, Color::Black));

        let before = board.num_stones_on_board();
        place(&mut board, &[(3, 0)], Color::Black);
        assert_eq!(board.colors[board.loc(4, 0)], Color::Empty);
        assert_eq!(board.colors[board.loc(2, 1)], Color::Empty);
        assert_eq!(board.num_black_captures(), 2);
        assert_eq!(board.num_stones_on_board(), before + 1 - 2);
        assert_eq!(board.ko_loc, NULL_LOC);

        let mut libs = Vec::new();
        let n = board.find_liberties(play, &mut libs);
        assert_eq!(board.get_num_liberties(play), n);
        assert!(libs.contains(&board.loc(4, 0)));
        assert!(libs.contains(&board.loc(2, 1)));
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_merge_counts_shared_liberties_once() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(3, 3), (5, 3)], Color::Black);
        assert_eq!(board.get_num_liberties(board.loc(3, 3)), 6);
        place(&mut board, &[(4, 3)], Color::Black);
        let head = board.loc(4, 3);
        assert_eq!(board.get_chain_size(head), 3);
        let mut libs = Vec::new();
        assert_eq!(board.get_num_liberties(head), board.find_liberties(head, &mut libs));
        assert_eq!(board.get_num_liberties(head), 10);
        board.check_consistency().unwrap();
    }

    // =========================================================================
    // Suicide
    // =========================================================================

    #[test]
    fn test_single_stone_suicide_is_illegal() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(1, 0), (0, 1)], Color::White);
        let corner = board.loc(0, 0);
        assert!(board.is_suicide(corner, Color::Black));
        assert!(board.is_illegal_suicide(corner, Color::Black, true));
        assert!(!board.is_legal(corner, Color::Black, true));
        assert!(board.is_legal(corner, Color::White, true));
    }

    #[test]
    fn test_multi_stone_suicide() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(1, 0)], Color::Black);
        place(&mut board, &[(2, 0), (1, 1), (0, 1)], Color::White);
        let corner = board.loc(0, 0);
        assert!(board.is_suicide(corner, Color::Black));
        assert!(board.is_illegal_suicide(corner, Color::Black, false));
        assert!(!board.is_illegal_suicide(corner, Color::Black, true));
        assert_eq!(board.get_num_liberties_after_play(corner, Color::Black, 6), 0);

        let expected = board.get_pos_hash_after_move(corner, Color::Black);
        assert!(board.play_move(corner, Color::Black, true));
        assert_eq!(board.colors[corner], Color::Empty);
        assert_eq!(board.colors[board.loc(1, 0)], Color::Empty);
        assert_eq!(board.num_white_captures(), 2);
        assert_eq!(board.num_black_captures(), 0);
        assert_eq!(board.pos_hash, expected);
        board.check_consistency().unwrap();
    }

    // =========================================================================
    // Ko
    // =========================================================================

    #[test]
    fn test_ko_on_single_column() {
        let mut board = ko_column();

        let ko = board.loc(0, 2);
        assert_eq!(board.ko_loc, ko);
        assert_eq!(board.colors[ko], Color::Empty);
        assert_eq!(board.num_black_captures(), 1);
        assert_eq!(board.get_num_liberties(board.loc(0, 3)), 1);
        assert!(!board.is_legal(ko, Color::White, true));
        assert!(board.is_legal_ignoring_ko(ko, Color::White, true));
        board.check_consistency().unwrap();

        board.play_move_assume_legal(PASS_LOC, Color::White);
        assert_eq!(board.ko_loc, NULL_LOC);
        assert!(board.is_legal(ko, Color::White, true));
    }

    #[test]
    fn test_ko_expires_after_move_elsewhere() {
        let mut board = ko_column();
        let ko = board.loc(0, 2);
        assert!(board.play_move(board.loc(0, 0), Color::Black, true));
        assert_eq!(board.ko_loc, NULL_LOC);
        assert!(board.is_legal(ko, Color::White, true));
        // Retaking now captures both black chains, which shared that liberty.
        assert!(board.play_move(ko, Color::White, true));
        assert_eq!(board.num_white_captures(), 3);
        assert_eq!(board.ko_loc, NULL_LOC);
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_sit_hash_includes_ko() {
        let mut board = ko_column();
        let with_ko = board.get_sit_hash_with_simple_ko(Color::White);
        board.clear_simple_ko_loc();
        assert_ne!(with_ko, board.get_sit_hash_with_simple_ko(Color::White));
        assert_ne!(
            board.get_sit_hash_with_simple_ko(Color::White),
            board.get_sit_hash_with_simple_ko(Color::Black)
        );
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    #[test]
    fn test_pass_changes_hash() {
        let mut board = Board::new(9, 9).unwrap();
        let before = board.pos_hash;
        let predicted = board.get_pos_hash_after_move(PASS_LOC, Color::Black);
        board.play_move_assume_legal(PASS_LOC, Color::Black);
        assert_eq!(board.num_black_passes(), 1);
        assert_ne!(board.pos_hash, before);
        assert_eq!(board.pos_hash, predicted);
    }

    #[test]
    fn test_capture_changes_hash() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(1, 0)], Color::Black);
        place(&mut board, &[(0, 0)], Color::White);
        let play = board.loc(0, 1);
        let predicted = board.get_pos_hash_after_move(play, Color::Black);
        place(&mut board, &[(0, 1)], Color::Black);
        assert_eq!(board.pos_hash, predicted);

        // Same stones without the capture count
        let mut other = Board::new(9, 9).unwrap();
        place(&mut other, &[(1, 0), (0, 1)], Color::Black);
        assert_eq!(board.is_equal_for_testing(&other, false, true), Ok(true));
        assert_eq!(board.is_equal_for_testing(&other, true, true), Ok(false));
        assert_ne!(board.pos_hash, other.pos_hash);
    }

    #[test]
    fn test_move_order_does_not_change_hash() {
        let mut a = Board::new(9, 9).unwrap();
        place(&mut a, &[(3, 3), (4, 3), (5, 3)], Color::Black);
        place(&mut a, &[(3, 4)], Color::White);
        let mut b = Board::new(9, 9).unwrap();
        place(&mut b, &[(3, 4)], Color::White);
        place(&mut b, &[(5, 3), (3, 3), (4, 3)], Color::Black);
        assert_eq!(a.pos_hash, b.pos_hash);
        assert_eq!(a.is_equal_for_testing(&b, true, true), Ok(true));
    }

    // =========================================================================
    // Undo
    // =========================================================================

    #[test]
    fn test_undo_capture() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(1, 0)], Color::Black);
        place(&mut board, &[(0, 0)], Color::White);
        let before = board.clone();
        let rec = board.play_move_recorded(board.loc(0, 1), Color::Black);
        assert_ne!(rec.cap_dirs, 0);
        assert_ne!(rec.cap_dirs, SUICIDE_FLAG);
        board.undo(rec);
        assert_eq!(board.is_equal_for_testing(&before, true, true), Ok(true));
    }

    #[test]
    fn test_undo_suicide() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(1, 0)], Color::Black);
        place(&mut board, &[(2, 0), (1, 1), (0, 1)], Color::White);
        let before = board.clone();
        let rec = board.play_move_recorded(board.loc(0, 0), Color::Black);
        assert_eq!(rec.cap_dirs, SUICIDE_FLAG);
        board.undo(rec);
        assert_eq!(board.is_equal_for_testing(&before, true, true), Ok(true));
    }

    #[test]
    fn test_undo_split_chain() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(2, 4), (4, 4)], Color::Black);
        let before = board.clone();
        let rec = board.play_move_recorded(board.loc(3, 4), Color::Black);
        assert_eq!(board.get_chain_size(board.loc(2, 4)), 3);
        board.undo(rec);
        assert_eq!(board.is_equal_for_testing(&before, true, true), Ok(true));
        assert_eq!(board.get_chain_size(board.loc(2, 4)), 1);
        assert_eq!(board.get_chain_size(board.loc(4, 4)), 1);
    }

    #[test]
    fn test_undo_pass_and_ko() {
        let mut board = ko_column();
        let before = board.clone();
        let rec = board.play_move_recorded(PASS_LOC, Color::White);
        assert_eq!(board.ko_loc, NULL_LOC);
        board.undo(rec);
        assert_eq!(board.ko_loc, before.ko_loc);
        assert_eq!(board.is_equal_for_testing(&before, true, true), Ok(true));
    }

    #[test]
    fn test_random_play_and_undo() {
        let mut rng = fastrand::Rng::with_seed(17);
        for _ in 0..20 {
            let mut board = Board::new(7, 7).unwrap();
            let mut snapshots = Vec::new();
            let mut records = Vec::new();
            let mut pla = Color::Black;
            for _ in 0..120 {
                let loc = if rng.u32(0..12) == 0 {
                    PASS_LOC
                } else {
                    board.loc(rng.usize(0..7), rng.usize(0..7))
                };
                if !board.is_legal(loc, pla, true) {
                    continue;
                }
                let predicted = board.get_pos_hash_after_move(loc, pla);
                snapshots.push(board.clone());
                records.push(board.play_move_recorded(loc, pla));
                assert_eq!(board.pos_hash, predicted);
                board.check_consistency().unwrap();
                pla = pla.opp();
            }
            while let Some(rec) = records.pop() {
                board.undo(rec);
                let expected = snapshots.pop().unwrap();
                assert_eq!(board.is_equal_for_testing(&expected, true, true), Ok(true));
            }
        }
    }

    // =========================================================================
    // Direct edits
    // =========================================================================

    #[test]
    fn test_set_stone() {
        let mut board = Board::new(9, 9).unwrap();
        let a = board.loc(3, 3);
        let b = board.loc(4, 3);
        let c = board.loc(5, 3);
        assert!(board.set_stone(a, Color::Black));
        assert!(board.set_stone(b, Color::Black));
        assert!(board.set_stone(c, Color::Black));
        assert_eq!(board.get_chain_size(a), 3);

        assert!(board.set_stone(b, Color::Empty));
        assert_eq!(board.get_chain_size(a), 1);
        assert_eq!(board.get_chain_size(c), 1);

        assert!(board.set_stone(a, Color::White));
        assert_eq!(board.colors[a], Color::White);
        assert!(!board.set_stone(NULL_LOC, Color::Black));
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_liberties_after_play() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(3, 3)], Color::Black);
        let loc = board.loc(4, 3);
        assert_eq!(board.get_num_liberties_after_play(loc, Color::Black, 100), 8);
        assert_eq!(board.get_num_liberties_after_play(loc, Color::Black, 3), 3);
    }

    #[test]
    fn test_check_winner() {
        let mut board = Board::new(9, 9).unwrap();
        assert_eq!(board.check_winner(), None);
        board.set_white_captures(CAPTURES_TO_WIN);
        assert_eq!(board.check_winner(), Some(Color::White));
        board.check_consistency().unwrap();
    }

    #[test]
    fn test_corrupted_board_is_detected() {
        let mut board = Board::new(9, 9).unwrap();
        place(&mut board, &[(3, 3)], Color::Black);
        board.chain_data[board.loc(3, 3)].num_liberties = 5;
        assert!(board.check_consistency().is_err());

        let mut board = Board::new(9, 9).unwrap();
        board.pos_hash ^= Hash128::new(1, 0);
        assert!(board.check_consistency().is_err());
    }
}
