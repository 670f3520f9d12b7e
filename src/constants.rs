//! Board geometry and engine-wide constants.
//!
//! The board is stored as a 1D array with a one-cell wall margin so that
//! adjacency code can look at every neighbor without bounds checks.
//! A location `(x, y)` lives at index `(x + 1) + (y + 1) * (x_size + 1)`.
//!
//! # Board Size Configuration
//!
//! The largest supported edge length is fixed at compile time by Cargo features:
//! - `maxlen13` (default): boards up to 13x13
//! - `maxlen19`: boards up to 19x19
//!
//! ```sh
//! cargo build                                            # up to 13x13 (default)
//! cargo build --no-default-features --features maxlen19  # up to 19x19
//! ```

// =============================================================================
// Board Geometry
// =============================================================================

/// Maximum edge length of a board.
#[cfg(feature = "maxlen13")]
pub const MAX_LEN: usize = 13;

#[cfg(feature = "maxlen19")]
pub const MAX_LEN: usize = 19;

// Compile-time check: exactly one size feature must be enabled
#[cfg(all(feature = "maxlen13", feature = "maxlen19"))]
compile_error!("Cannot enable both 'maxlen13' and 'maxlen19' features at the same time");

#[cfg(not(any(feature = "maxlen13", feature = "maxlen19")))]
compile_error!("Must enable exactly one board size feature: 'maxlen13' or 'maxlen19'");

/// Edge length used by `Board::default()`.
pub const DEFAULT_LEN: usize = if MAX_LEN < 19 { MAX_LEN } else { 19 };

/// Maximum number of playable points.
pub const MAX_PLAY_SIZE: usize = MAX_LEN * MAX_LEN;

/// Length of every per-location array, walls included.
pub const MAX_ARR_SIZE: usize = (MAX_LEN + 1) * (MAX_LEN + 2) + 1;

// =============================================================================
// Special Locations
// =============================================================================

/// Marks "no location" (ko point unset, etc). Always a wall index.
pub const NULL_LOC: usize = 0;

/// The pass move. Always a wall index, so it never collides with a point.
pub const PASS_LOC: usize = 1;

// =============================================================================
// Game Parameters
// =============================================================================

/// Number of board snapshots kept in `BoardHistory`'s ring buffer.
pub const NUM_RECENT_BOARDS: usize = 6;

/// Captured stones needed to win outright.
pub const CAPTURES_TO_WIN: u32 = 5;

/// Bits of `hash0` used to bucket `KoHashTable` entries.
pub const KO_TABLE_BITS: u32 = 10;

/// Number of buckets in a `KoHashTable`.
pub const KO_TABLE_SIZE: usize = 1 << KO_TABLE_BITS;

/// Mask selecting the bucket bits of `hash0`.
pub const KO_TABLE_MASK: u64 = (KO_TABLE_SIZE as u64) - 1;

// =============================================================================
// Komi Limits
// =============================================================================

/// Smallest komi accepted from user-facing rule strings.
pub const MIN_USER_KOMI: f32 = -150.0;

/// Largest komi accepted from user-facing rule strings.
pub const MAX_USER_KOMI: f32 = 150.0;
