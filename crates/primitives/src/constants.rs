//! Bounds shared by the oracle records and the validators.

/// Number of inputs and outputs the oracle exposes inline for one transaction. Elements past
/// this prefix must be fetched individually.
pub const MAX_EXPOSED_TX_ELEMENTS: usize = 8;

/// Hop budget for the backward spend-graph walk.
pub const MAX_SWEEP_UTXO_WALKBACK: u32 = 10;

/// Minimum number of inputs of a sweep (prior custody UTXO plus one deposit).
pub const MIN_SWEEP_INPUTS: usize = 2;

/// Maximum number of inputs of a sweep.
pub const MAX_SWEEP_INPUTS: usize = MAX_EXPOSED_TX_ELEMENTS;

/// Output index at which a withdrawal transaction pays its change back into custody, and the
/// only index a withdrawal may be spent from while still carrying custody.
pub const WITHDRAWAL_CHANGE_VOUT: u32 = 1;

/// Number of leading payload bytes holding the big-endian withdrawal index.
pub const WITHDRAWAL_INDEX_LEN: usize = 4;
