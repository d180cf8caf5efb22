//! Deterministic seed derivation.
//!
//! Not cryptographic. It exists so that every trial of a batch gets its own
//! RNG stream that depends only on `(master seed, trial index)`, never on
//! thread scheduling.

/// Seed for trial `index` of a batch started from `master`.
#[must_use]
pub fn derive_trial_seed(master: u64, index: usize) -> u64 {
    splitmix64(master ^ index as u64)
}

/// SplitMix64 finalizer.
#[inline]
#[must_use]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
