//! 128-bit Zobrist hashing.
//!
//! All hash lanes live in one immutable [`ZobristTable`], built once on first
//! use and shared by every board for the rest of the process. Tables are drawn
//! from fixed seeds, so hashes are stable across runs and across the
//! `maxlen*` features for the lanes that do not depend on array size.

use std::fmt;
use std::ops::{BitXor, BitXorAssign};
use std::sync::OnceLock;

use crate::constants::{MAX_ARR_SIZE, MAX_LEN};

/// A 128-bit hash value, combined by XOR.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash128 {
    pub hash0: u64,
    pub hash1: u64,
}

impl Hash128 {
    pub const ZERO: Hash128 = Hash128 { hash0: 0, hash1: 0 };

    pub const fn new(hash0: u64, hash1: u64) -> Self {
        Self { hash0, hash1 }
    }
}

impl BitXor for Hash128 {
    type Output = Hash128;

    #[inline]
    fn bitxor(self, rhs: Hash128) -> Hash128 {
        Hash128::new(self.hash0 ^ rhs.hash0, self.hash1 ^ rhs.hash1)
    }
}

impl BitXorAssign for Hash128 {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Hash128) {
        self.hash0 ^= rhs.hash0;
        self.hash1 ^= rhs.hash1;
    }
}

impl fmt::Display for Hash128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}{:016X}", self.hash1, self.hash0)
    }
}

/// Final avalanche step of MurmurHash3.
#[inline]
pub fn murmur_mix(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

#[inline]
pub fn split_mix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// One step of a 64-bit linear congruential generator.
#[inline]
pub fn basic_lcong(x: u64) -> u64 {
    x.wrapping_mul(2_862_933_555_777_941_757)
        .wrapping_add(3_037_000_493)
}

// =============================================================================
// Zobrist Tables
// =============================================================================

const MAIN_SEED: u64 = 0x6865_7867_6f5f_6d61;
const SIZE_SEED: u64 = 0x6865_7867_6f5f_737a;
const RULES_SEED: u64 = 0x6865_7867_6f5f_726c;

/// Number of entries in each capture/pass count lane. Counts past the end wrap.
pub const COUNT_LANES: usize = 2 * MAX_ARR_SIZE;

/// Every hash lane used by boards, histories and rules.
pub struct ZobristTable {
    /// Per location, per color. Empty and Wall entries are zero.
    pub board: Vec<[Hash128; 4]>,
    pub size_x: [Hash128; MAX_LEN + 1],
    pub size_y: [Hash128; MAX_LEN + 1],
    pub player: [Hash128; 4],
    pub ko_loc: Vec<Hash128>,
    pub capture_b: Vec<Hash128>,
    pub capture_w: Vec<Hash128>,
    pub pass_b: Vec<Hash128>,
    pub pass_w: Vec<Hash128>,
    pub ko_rule: [Hash128; 3],
    pub tax_rule: [Hash128; 3],
    pub multi_stone_suicide: Hash128,
    pub button: Hash128,
}

fn next_hash(rng: &mut fastrand::Rng) -> Hash128 {
    Hash128::new(rng.u64(..), rng.u64(..))
}

fn count_lane(rng: &mut fastrand::Rng) -> Vec<Hash128> {
    let mut lane: Vec<Hash128> = (0..COUNT_LANES).map(|_| next_hash(rng)).collect();
    // A count of zero contributes nothing, so a fresh board hashes to its size lanes only.
    lane[0] = Hash128::ZERO;
    lane
}

impl ZobristTable {
    fn generate() -> Self {
        let mut rng = fastrand::Rng::with_seed(MAIN_SEED);

        let player: [Hash128; 4] = std::array::from_fn(|_| next_hash(&mut rng));
        let mut board = Vec::with_capacity(MAX_ARR_SIZE);
        let mut ko_loc = Vec::with_capacity(MAX_ARR_SIZE);
        for _ in 0..MAX_ARR_SIZE {
            let mut lanes = [Hash128::ZERO; 4];
            lanes[1] = next_hash(&mut rng);
            lanes[2] = next_hash(&mut rng);
            board.push(lanes);
            ko_loc.push(next_hash(&mut rng));
        }
        let capture_b = count_lane(&mut rng);
        let capture_w = count_lane(&mut rng);
        let pass_b = count_lane(&mut rng);
        let pass_w = count_lane(&mut rng);

        // Reseeded so size lanes do not depend on MAX_ARR_SIZE.
        let mut rng = fastrand::Rng::with_seed(SIZE_SEED);
        let mut size_x = [Hash128::ZERO; MAX_LEN + 1];
        let mut size_y = [Hash128::ZERO; MAX_LEN + 1];
        for i in 0..=MAX_LEN {
            size_x[i] = next_hash(&mut rng);
            size_y[i] = next_hash(&mut rng);
        }

        let mut rng = fastrand::Rng::with_seed(RULES_SEED);
        let ko_rule: [Hash128; 3] = std::array::from_fn(|_| next_hash(&mut rng));
        let tax_rule: [Hash128; 3] = std::array::from_fn(|_| next_hash(&mut rng));
        let multi_stone_suicide = next_hash(&mut rng);
        let button = next_hash(&mut rng);

        ZobristTable {
            board,
            size_x,
            size_y,
            player,
            ko_loc,
            capture_b,
            capture_w,
            pass_b,
            pass_w,
            ko_rule,
            tax_rule,
            multi_stone_suicide,
            button,
        }
    }

    #[inline]
    pub fn capture_b_lane(&self, n: u32) -> Hash128 {
        self.capture_b[n as usize % COUNT_LANES]
    }

    #[inline]
    pub fn capture_w_lane(&self, n: u32) -> Hash128 {
        self.capture_w[n as usize % COUNT_LANES]
    }

    #[inline]
    pub fn pass_b_lane(&self, n: u32) -> Hash128 {
        self.pass_b[n as usize % COUNT_LANES]
    }

    #[inline]
    pub fn pass_w_lane(&self, n: u32) -> Hash128 {
        self.pass_w[n as usize % COUNT_LANES]
    }
}

static ZOBRIST: OnceLock<ZobristTable> = OnceLock::new();

/// The process-wide Zobrist table, built on first call.
#[inline]
pub fn zobrist() -> &'static ZobristTable {
    ZOBRIST.get_or_init(ZobristTable::generate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_is_involution() {
        let a = Hash128::new(0x1234, 0xabcd);
        let b = Hash128::new(0xffff_0000, 0x0f0f);
        assert_eq!(a ^ b ^ b, a);
        let mut c = a;
        c ^= b;
        c ^= b;
        assert_eq!(c, a);
    }

    #[test]
    fn test_table_shape() {
        let z = zobrist();
        assert_eq!(z.board.len(), MAX_ARR_SIZE);
        assert_eq!(z.ko_loc.len(), MAX_ARR_SIZE);
        for lanes in &z.board {
            assert_eq!(lanes[0], Hash128::ZERO);
            assert_eq!(lanes[3], Hash128::ZERO);
            assert_ne!(lanes[1], lanes[2]);
        }
        assert_eq!(z.capture_b_lane(0), Hash128::ZERO);
        assert_eq!(z.pass_w_lane(0), Hash128::ZERO);
        assert_ne!(z.capture_b_lane(1), z.capture_w_lane(1));
    }

    #[test]
    fn test_table_is_shared() {
        assert!(std::ptr::eq(zobrist(), zobrist()));
    }

    #[test]
    fn test_mixers_are_deterministic() {
        assert_eq!(murmur_mix(0), 0);
        assert_ne!(murmur_mix(1), 1);
        assert_eq!(split_mix64(42), split_mix64(42));
        assert_eq!(basic_lcong(0), 3_037_000_493);
    }

    #[test]
    fn test_display() {
        let h = Hash128::new(1, 2);
        assert_eq!(h.to_string(), "00000000000000020000000000000001");
    }
}
