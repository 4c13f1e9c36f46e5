//! Inline 64-bit FNV-1a hashing.
//!
//! The accumulator is a plain `u64` threaded through free functions so callers can
//! fold fields without allocating a hasher object. The constants and the byte order
//! used by [`add_u64`] are part of the signature contract: changing either changes
//! every signature the deduplicator produces.

/// FNV-1a 64-bit offset basis.
pub const OFFSET64: u64 = 14_695_981_039_346_656_037;

/// FNV-1a 64-bit prime.
pub const PRIME64: u64 = 1_099_511_628_211;

/// Field separator. `0xFF` never occurs in valid UTF-8, so it cannot be produced by
/// label text.
pub const SEPARATOR_BYTE: u8 = 255;

/// Returns a freshly initialized accumulator.
#[must_use]
#[inline]
pub const fn new() -> u64 {
    OFFSET64
}

/// Folds a single byte into the accumulator.
#[must_use]
#[inline]
pub const fn add_byte(h: u64, b: u8) -> u64 {
    (h ^ b as u64).wrapping_mul(PRIME64)
}

/// Folds every byte of `bytes`, in order.
#[must_use]
#[inline]
pub fn add(h: u64, bytes: impl AsRef<[u8]>) -> u64 {
    bytes.as_ref().iter().fold(h, |h, &b| add_byte(h, b))
}

/// Folds the eight bytes of `v`, least-significant byte first.
///
/// This is not the same as XOR-ing `v` into the state once and multiplying once.
#[must_use]
#[inline]
pub const fn add_u64(mut h: u64, v: u64) -> u64 {
    let bytes = v.to_le_bytes();
    let mut i = 0;
    while i < bytes.len() {
        h = add_byte(h, bytes[i]);
        i += 1;
    }
    h
}
