//! Game history: turn order, superko, passes, the button and scoring.
//!
//! [`BoardHistory`] owns the current [`Board`]. Every move goes through
//! [`BoardHistory::make_board_move_assume_legal`], which plays it, appends
//! the new ko hash to the log, recomputes which points the next player is
//! banned from by superko and ends the game when both players pass in a row
//! or one player reaches [`CAPTURES_TO_WIN`].
//!
//! Moving after the game has ended is allowed: the result is cleared and
//! play continues, which is what analysis tools expect.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::area::{AreaMap, AreaScorer, FloodFillScorer, empty_area, white_minus_black};
use crate::board::Board;
use crate::board_io::print_board;
use crate::constants::{CAPTURES_TO_WIN, MAX_ARR_SIZE, NULL_LOC, NUM_RECENT_BOARDS, PASS_LOC};
use crate::hash::{Hash128, basic_lcong, murmur_mix, zobrist};
use crate::ko_table::KoHashTable;
use crate::location::{self, Loc, iter_locs};
use crate::player::{Color, Move, Player};
use crate::rules::{KoRule, Rules, TaxRule};

#[derive(Clone, Debug)]
pub struct BoardHistory {
    pub rules: Rules,
    pub move_history: Vec<Move>,
    ko_hash_history: Vec<Hash128>,
    /// Turn index of the first entry of `ko_hash_history`. Advances when the button is taken.
    first_turn_idx_with_ko_history: usize,

    pub initial_board: Board,
    pub initial_pla: Player,
    /// Informational only.
    pub initial_turn_number: usize,

    recent_boards: Vec<Board>,
    current_recent_board_idx: usize,
    pub presumed_next_move_pla: Player,

    was_ever_occupied_or_played: [bool; MAX_ARR_SIZE],
    super_ko_banned: [bool; MAX_ARR_SIZE],

    consecutive_ending_passes: u32,
    /// Half points White has gained or lost from the button.
    pub white_bonus_score: f32,
    /// The button is still available to take.
    pub has_button: bool,

    pub is_game_finished: bool,
    /// `Empty` for a draw, a no-result or an unfinished game.
    pub winner: Player,
    pub final_white_minus_black_score: f32,
    pub is_scored: bool,
    pub is_no_result: bool,
    pub is_resignation: bool,

    board: Board,
    scorer: Arc<dyn AreaScorer>,
}

impl BoardHistory {
    pub fn new(board: Board, pla: Player, rules: Rules) -> Self {
        Self::with_scorer(board, pla, rules, Arc::new(FloodFillScorer))
    }

    /// Use `scorer` instead of plain flood-fill area counting.
    pub fn with_scorer(board: Board, pla: Player, rules: Rules, scorer: Arc<dyn AreaScorer>) -> Self {
        let mut hist = BoardHistory {
            rules,
            move_history: Vec::new(),
            ko_hash_history: Vec::new(),
            first_turn_idx_with_ko_history: 0,
            initial_board: board.clone(),
            initial_pla: pla,
            initial_turn_number: 0,
            recent_boards: Vec::with_capacity(NUM_RECENT_BOARDS),
            current_recent_board_idx: 0,
            presumed_next_move_pla: pla,
            was_ever_occupied_or_played: [false; MAX_ARR_SIZE],
            super_ko_banned: [false; MAX_ARR_SIZE],
            consecutive_ending_passes: 0,
            white_bonus_score: 0.0,
            has_button: false,
            is_game_finished: false,
            winner: Color::Empty,
            final_white_minus_black_score: 0.0,
            is_scored: false,
            is_no_result: false,
            is_resignation: false,
            board: board.clone(),
            scorer,
        };
        hist.clear(board, pla, rules);
        hist
    }

    /// Start over from `board` with `pla` to move. Clears the move log,
    /// bonus points and any result.
    pub fn clear(&mut self, board: Board, pla: Player, rules: Rules) {
        self.rules = rules;
        self.move_history.clear();
        self.ko_hash_history.clear();
        self.first_turn_idx_with_ko_history = 0;

        self.initial_board = board.clone();
        self.initial_pla = pla;
        self.initial_turn_number = 0;

        // Lookback past the start of the game sees the starting board.
        self.recent_boards.clear();
        self.recent_boards.resize(NUM_RECENT_BOARDS, board.clone());
        self.current_recent_board_idx = 0;
        self.presumed_next_move_pla = pla;

        self.was_ever_occupied_or_played = [false; MAX_ARR_SIZE];
        for loc in iter_locs(board.x_size, board.y_size) {
            self.was_ever_occupied_or_played[loc] = board.colors[loc] != Color::Empty;
        }
        self.super_ko_banned = [false; MAX_ARR_SIZE];

        self.consecutive_ending_passes = 0;
        self.white_bonus_score = 0.0;
        self.has_button = rules.has_button;
        self.is_game_finished = false;
        self.winner = Color::Empty;
        self.final_white_minus_black_score = 0.0;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = false;

        let ko_hash = self.ko_hash(&board, pla);
        self.ko_hash_history.push(ko_hash);
        self.board = board;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn ko_hash_history(&self) -> &[Hash128] {
        &self.ko_hash_history
    }

    pub fn first_turn_idx_with_ko_history(&self) -> usize {
        self.first_turn_idx_with_ko_history
    }

    pub fn consecutive_ending_passes(&self) -> u32 {
        self.consecutive_ending_passes
    }

    pub fn is_super_ko_banned(&self, loc: Loc) -> bool {
        loc < MAX_ARR_SIZE && self.super_ko_banned[loc]
    }

    /// Change komi only. A finished, scored game is rescored.
    pub fn set_komi(&mut self, komi: f32) {
        let old_komi = self.rules.komi;
        self.rules.komi = komi;
        if self.is_game_finished && self.is_scored {
            self.set_final_score_and_winner(self.final_white_minus_black_score - old_komi + komi);
        }
    }

    pub fn set_initial_turn_number(&mut self, n: usize) {
        self.initial_turn_number = n;
    }

    /// A fresh history at the initial board, with the same rules, scorer and turn number.
    pub fn copy_to_initial(&self) -> BoardHistory {
        let mut hist = BoardHistory::with_scorer(
            self.initial_board.clone(),
            self.initial_pla,
            self.rules,
            Arc::clone(&self.scorer),
        );
        hist.set_initial_turn_number(self.initial_turn_number);
        hist
    }

    /// The board `num_moves_ago` moves back, 0 being the current one.
    /// Lookback is capped at `NUM_RECENT_BOARDS - 1`.
    pub fn get_recent_board(&self, num_moves_ago: usize) -> &Board {
        let back = num_moves_ago.min(NUM_RECENT_BOARDS - 1);
        let idx = (self.current_recent_board_idx + NUM_RECENT_BOARDS - back) % NUM_RECENT_BOARDS;
        &self.recent_boards[idx]
    }

    // =========================================================================
    // Komi
    // =========================================================================

    /// Komi shift that folds the value of a draw into the score, when draws are possible.
    pub fn white_komi_adjustment_for_draws(&self, draw_equivalent_wins_for_white: f64) -> f32 {
        if self.rules.game_result_will_be_integer() {
            (draw_equivalent_wins_for_white - 0.5) as f32
        } else {
            0.0
        }
    }

    /// Komi from `pla`'s point of view, including button bonus and draw adjustment.
    pub fn current_self_komi(&self, pla: Player, draw_equivalent_wins_for_white: f64) -> f32 {
        let white_komi = self.white_bonus_score
            + self.rules.komi
            + self.white_komi_adjustment_for_draws(draw_equivalent_wins_for_white);
        match pla {
            Color::White => white_komi,
            Color::Black => -white_komi,
            _ => 0.0,
        }
    }

    // =========================================================================
    // Legality
    // =========================================================================

    /// Legal on the board, not simple-ko banned and not superko banned.
    pub fn is_legal(&self, loc: Loc, pla: Player) -> bool {
        !self.board.is_ko_banned(loc)
            && self
                .board
                .is_legal_ignoring_ko(loc, pla, self.rules.multi_stone_suicide_legal)
            && !self.is_super_ko_banned(loc)
    }

    /// Like [`BoardHistory::is_legal`], but allows multi-stone suicide and
    /// ignores superko. For replaying games recorded under other rules.
    pub fn is_legal_tolerant(&self, loc: Loc, pla: Player) -> bool {
        !self.board.is_ko_banned(loc) && self.board.is_legal_ignoring_ko(loc, pla, true)
    }

    /// Play the move if [`BoardHistory::is_legal_tolerant`] accepts it.
    pub fn make_board_move_tolerant(&mut self, loc: Loc, pla: Player) -> bool {
        if !self.is_legal_tolerant(loc, pla) {
            return false;
        }
        self.make_board_move_assume_legal(loc, pla, None);
        true
    }

    pub fn pass_would_end_game(&self, _pla: Player) -> bool {
        self.consecutive_ending_passes + 1 >= 2
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Apply a move the caller has checked with [`BoardHistory::is_legal`].
    ///
    /// `root_ko_table`, if built from a prefix of this history, is used in
    /// place of scanning that prefix of the ko-hash log.
    pub fn make_board_move_assume_legal(
        &mut self,
        loc: Loc,
        pla: Player,
        root_ko_table: Option<&KoHashTable>,
    ) {
        self.is_game_finished = false;
        self.winner = Color::Empty;
        self.final_white_minus_black_score = 0.0;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = false;

        if loc != PASS_LOC {
            self.consecutive_ending_passes = 0;
        } else if self.has_button {
            self.has_button = false;
            self.white_bonus_score += if pla == Color::White { 0.5 } else { -0.5 };
            self.consecutive_ending_passes = 0;
            // Positions before the button was taken can never recur.
            self.ko_hash_history.clear();
            self.first_turn_idx_with_ko_history = self.move_history.len() + 1;
            debug!(target: "hexgo::history", player = %pla, "button taken");
        } else {
            self.consecutive_ending_passes += 1;
        }

        self.board.play_move_assume_legal(loc, pla);

        self.current_recent_board_idx = (self.current_recent_board_idx + 1) % NUM_RECENT_BOARDS;
        self.recent_boards[self.current_recent_board_idx] = self.board.clone();

        let next_pla = pla.opp();
        let ko_hash = self.ko_hash(&self.board, next_pla);
        self.ko_hash_history.push(ko_hash);
        self.move_history.push(Move::new(loc, pla));
        self.presumed_next_move_pla = next_pla;

        if loc != PASS_LOC {
            self.was_ever_occupied_or_played[loc] = true;
        }

        self.recompute_super_ko_bans(next_pla, root_ko_table);

        if self.consecutive_ending_passes >= 2 {
            self.end_and_score_game_now();
        } else if let Some(winner) = self.board.check_winner() {
            self.end_game_by_captures(winner);
        }
    }

    /// Mark every point where `next_pla` would recreate a logged position.
    fn recompute_super_ko_bans(&mut self, next_pla: Player, root_ko_table: Option<&KoHashTable>) {
        if self.rules.ko_rule == KoRule::Simple {
            self.super_ko_banned = [false; MAX_ARR_SIZE];
            return;
        }
        let multi = self.rules.multi_stone_suicide_legal;
        for loc in iter_locs(self.board.x_size, self.board.y_size) {
            let banned = if self.board.colors[loc] != Color::Empty
                || self.board.is_illegal_suicide(loc, next_pla, multi)
                || loc == self.board.ko_loc
            {
                false
            } else if !self.was_ever_occupied_or_played[loc] && !self.board.is_suicide(loc, next_pla) {
                // A stone where none has ever been is a new position.
                false
            } else {
                let pos_hash = self.board.get_pos_hash_after_move(loc, next_pla);
                let ko_hash = self.ko_hash_from_pos_hash(pos_hash, next_pla.opp());
                self.ko_hash_occurs_in_history(ko_hash, root_ko_table)
            };
            self.super_ko_banned[loc] = banned;
        }
    }

    fn ko_hash(&self, board: &Board, pla: Player) -> Hash128 {
        self.ko_hash_from_pos_hash(board.pos_hash, pla)
    }

    fn ko_hash_from_pos_hash(&self, pos_hash: Hash128, pla: Player) -> Hash128 {
        let h = pos_hash ^ self.rules.hash();
        if self.rules.ko_rule == KoRule::Situational {
            h ^ zobrist().player[pla.index()]
        } else {
            h
        }
    }

    /// Whether `ko_hash` is in the log, including the latest entry.
    pub fn ko_hash_occurs_in_history(&self, ko_hash: Hash128, root_ko_table: Option<&KoHashTable>) -> bool {
        let mut start = 0;
        if let Some(table) = root_ko_table
            && table.first_turn_idx_with_ko_history == self.first_turn_idx_with_ko_history
        {
            if table.contains_hash(ko_hash) {
                return true;
            }
            start = table.size().min(self.ko_hash_history.len());
        }
        self.ko_hash_history[start..].contains(&ko_hash)
    }

    pub fn number_of_ko_hash_occurrences_in_history(
        &self,
        ko_hash: Hash128,
        root_ko_table: Option<&KoHashTable>,
    ) -> usize {
        let mut count = 0;
        let mut start = 0;
        if let Some(table) = root_ko_table
            && table.first_turn_idx_with_ko_history == self.first_turn_idx_with_ko_history
        {
            count += table.number_of_occurrences_of_hash(ko_hash);
            start = table.size().min(self.ko_hash_history.len());
        }
        count + self.ko_hash_history[start..].iter().filter(|h| **h == ko_hash).count()
    }

    // =========================================================================
    // Scoring
    // =========================================================================

    fn count_area_score_white_minus_black(&self, area: &mut AreaMap) -> i32 {
        let multi = self.rules.multi_stone_suicide_legal;
        let mut score = 0;
        match self.rules.tax_rule {
            TaxRule::None => self.scorer.calculate_area(&self.board, area, multi),
            TaxRule::Seki | TaxRule::All => {
                let regions = self
                    .scorer
                    .calculate_independent_life_area(&self.board, area, multi);
                if self.rules.tax_rule == TaxRule::All {
                    score -= 2 * regions;
                }
            }
        }
        score + white_minus_black(&self.board, area)
    }

    /// Ownership map that scoring would use right now.
    pub fn get_area_now(&self, area: &mut AreaMap) {
        self.count_area_score_white_minus_black(area);
    }

    fn set_final_score_and_winner(&mut self, score: f32) {
        self.final_white_minus_black_score = score;
        self.winner = if score > 0.0 {
            Color::White
        } else if score < 0.0 {
            Color::Black
        } else {
            Color::Empty
        };
    }

    /// Award an untaken button to the player about to move.
    fn settle_button(&mut self) {
        if self.has_button {
            self.has_button = false;
            self.white_bonus_score += if self.presumed_next_move_pla == Color::White {
                0.5
            } else {
                -0.5
            };
        }
    }

    fn finish_scored(&mut self, board_score: i32) {
        self.settle_button();
        self.set_final_score_and_winner(board_score as f32 + self.white_bonus_score + self.rules.komi);
        self.is_scored = true;
        self.is_no_result = false;
        self.is_resignation = false;
        self.is_game_finished = true;
        info!(
            target: "hexgo::history",
            winner = %self.winner,
            score = self.final_white_minus_black_score,
            moves = self.move_history.len(),
            "game scored"
        );
    }

    /// Score the board as it stands and end the game, filling `area` with the ownership used.
    pub fn end_and_score_game_now_with_area(&mut self, area: &mut AreaMap) {
        let board_score = self.count_area_score_white_minus_black(area);
        self.finish_scored(board_score);
    }

    pub fn end_and_score_game_now(&mut self) {
        let mut area = empty_area();
        self.end_and_score_game_now_with_area(&mut area);
    }

    /// End and score the game if every point is pass-alive for someone.
    pub fn end_game_if_all_pass_alive(&mut self) {
        let mut area = empty_area();
        self.scorer
            .calculate_pass_alive_area(&self.board, &mut area, self.rules.multi_stone_suicide_legal);
        let mut board_score = 0;
        for loc in iter_locs(self.board.x_size, self.board.y_size) {
            match area[loc] {
                Color::White => board_score += 1,
                Color::Black => board_score -= 1,
                _ => return,
            }
        }
        // Group tax needs the full scoring pass
        if self.rules.tax_rule == TaxRule::All {
            self.end_and_score_game_now();
        } else {
            self.finish_scored(board_score);
        }
    }

    fn end_game_by_captures(&mut self, winner: Player) {
        self.is_game_finished = true;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = false;
        self.winner = winner;
        self.final_white_minus_black_score =
            self.board.num_white_captures() as f32 - self.board.num_black_captures() as f32;
        info!(
            target: "hexgo::history",
            winner = %winner,
            captures = CAPTURES_TO_WIN,
            moves = self.move_history.len(),
            "game won by captures"
        );
    }

    pub fn set_winner_by_resignation(&mut self, pla: Player) {
        self.is_game_finished = true;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = true;
        self.winner = pla;
        self.final_white_minus_black_score = 0.0;
        info!(target: "hexgo::history", winner = %pla, "game won by resignation");
    }

    /// End the game with `pla` as winner and no score.
    pub fn set_winner(&mut self, pla: Player) {
        self.is_game_finished = true;
        self.is_scored = false;
        self.is_no_result = false;
        self.is_resignation = false;
        self.winner = pla;
        self.final_white_minus_black_score = 0.0;
    }

    /// White moved first on an empty board, Black passed exactly once, or
    /// White played exactly one double move, with nothing else irregular.
    pub fn has_black_pass_or_white_first(&self) -> bool {
        if self.initial_board.is_empty()
            && self.move_history.first().is_some_and(|m| m.pla == Color::White)
        {
            return true;
        }
        let mut black_passes = 0;
        let mut white_passes = 0;
        let mut black_double_moves = 0;
        let mut white_double_moves = 0;
        for (i, m) in self.move_history.iter().enumerate() {
            if m.loc == PASS_LOC {
                match m.pla {
                    Color::Black => black_passes += 1,
                    Color::White => white_passes += 1,
                    _ => {}
                }
            }
            if i > 0 && self.move_history[i - 1].pla == m.pla {
                match m.pla {
                    Color::Black => black_double_moves += 1,
                    Color::White => white_double_moves += 1,
                    _ => {}
                }
            }
        }
        let clean = white_passes == 0 && black_double_moves == 0;
        (clean && black_passes == 1 && white_double_moves == 0)
            || (clean && black_passes == 0 && white_double_moves == 1)
    }

    /// Hash of everything that affects play from here: stones, counters,
    /// every banned point, player to move, komi and rules.
    pub fn get_situation_rules_and_ko_hash(
        &self,
        next_player: Player,
        draw_equivalent_wins_for_white: f64,
    ) -> Hash128 {
        let z = zobrist();
        let board = &self.board;
        let mut hash = board.pos_hash ^ z.player[next_player.index()];

        if board.ko_loc != NULL_LOC {
            hash ^= z.ko_loc[board.ko_loc];
        }
        for loc in iter_locs(board.x_size, board.y_size) {
            if self.super_ko_banned[loc] && loc != board.ko_loc {
                hash ^= z.ko_loc[loc];
            }
        }

        let self_komi = self.current_self_komi(next_player, draw_equivalent_wins_for_white);
        let komi_discretized = (self_komi * 256.0) as i64;
        let komi_hash = murmur_mix(komi_discretized as u64);
        hash.hash0 ^= komi_hash;
        hash.hash1 ^= basic_lcong(komi_hash);

        hash ^= z.ko_rule[self.rules.ko_rule.index()];
        hash ^= z.tax_rule[self.rules.tax_rule.index()];
        if self.rules.multi_stone_suicide_legal {
            hash ^= z.multi_stone_suicide;
        }
        if self.has_button {
            hash ^= z.button;
        }
        hash
    }

    // =========================================================================
    // Printing
    // =========================================================================

    pub fn print_basic_info<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        print_board(out, &self.board, NULL_LOC, Some(&self.move_history))?;
        writeln!(out, "Next player: {}", self.presumed_next_move_pla)?;
        writeln!(out, "Rules: {}", self.rules.to_json_string())?;
        writeln!(out, "Captures by Black: {}", self.board.num_black_captures())?;
        writeln!(out, "Captures by White: {}", self.board.num_white_captures())
    }

    pub fn print_debug_info<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "{}", self.board)?;
        writeln!(out, "Initial pla {}", self.initial_pla)?;
        writeln!(out, "Rules {}", self.rules)?;
        writeln!(out, "White bonus score {}", self.white_bonus_score)?;
        writeln!(out, "Has button {}", self.has_button)?;
        writeln!(out, "Presumed next pla {}", self.presumed_next_move_pla)?;
        writeln!(
            out,
            "Game result {} {} {} {} {} {}",
            self.is_game_finished,
            self.winner,
            self.final_white_minus_black_score,
            self.is_scored,
            self.is_no_result,
            self.is_resignation
        )?;
        write!(out, "Last moves ")?;
        for m in &self.move_history {
            write!(out, "{} ", location::to_string(m.loc, self.board.x_size, self.board.y_size))?;
        }
        writeln!(out)
    }
}
