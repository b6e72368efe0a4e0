//! Name hash used by the RARC name index
//!
//! The loader looks names up by a 16-bit key before comparing strings, so the
//! value stored in every directory and node record must match this fold
//! exactly.

/// Compute the 16-bit name hash: `hash = hash * 3 + c`, wrapping at 2^16
pub fn name_hash(name: &str) -> u16 {
    name.chars()
        .fold(0u16, |hash, c| hash.wrapping_mul(3).wrapping_add(c as u16))
}
