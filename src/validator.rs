//! Recursive Wagner-tree validator (Component F).
//!
//! Mirrors the solver's own notion of a valid solution but works purely from
//! the claimed index list and a freshly recomputed midstate — it never trusts
//! anything the solver produced, which is what lets `validate` authenticate
//! solutions submitted by an external party.

use crate::error::PowError;
use crate::hash::Midstate;
use crate::params::Params;

/// Sort-copy duplicate/range check, shared by the validator and the
/// optimized solver's post-reconstruction candidate filter.
pub fn duped(params: &Params, indices: &[u32]) -> bool {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).any(|w| w[0] == w[1]) || sorted.iter().any(|&i| i >= params.max_index())
}

/// True if the leading `n_bits` bits of `bytes` (MSB-first) are all zero.
fn zero_prefix(bytes: &[u8], n_bits: usize) -> bool {
    let full_bytes = n_bits / 8;
    let rem_bits = n_bits % 8;
    if !bytes[..full_bytes].iter().all(|&b| b == 0) {
        return false;
    }
    if rem_bits > 0 {
        let mask = 0xFFu8 << (8 - rem_bits);
        if bytes[full_bytes] & mask != 0 {
            return false;
        }
    }
    true
}

/// Recursively verifies one subtree of `2^r` leaves, returning its `N/8`-byte
/// XOR hash on success. `k` is the overall tree depth: at `r == k` (the
/// root), the zero-prefix requirement covers the full `n_bits`, not just
/// `r * digit_bits` — the root carries one extra "spare" digit that every
/// internal level leaves unchecked.
fn verify_rec(
    midstate: &Midstate,
    indices: &[u32],
    digit_bits: u32,
    k: u32,
    n_bits: usize,
) -> Result<Vec<u8>, PowError> {
    if indices.len() == 1 {
        return Ok(midstate.hash_at(indices[0]));
    }
    let half = indices.len() / 2;
    if indices[0] >= indices[half] {
        return Err(PowError::OutOfOrder);
    }
    let left = verify_rec(midstate, &indices[0..half], digit_bits, k, n_bits)?;
    let right = verify_rec(midstate, &indices[half..], digit_bits, k, n_bits)?;
    let xor: Vec<u8> = left.iter().zip(right.iter()).map(|(a, b)| a ^ b).collect();

    let r = indices.len().trailing_zeros();
    let required_bits = if r == k { n_bits } else { (r * digit_bits) as usize };
    if !zero_prefix(&xor, required_bits) {
        return Err(PowError::NonzeroXor);
    }
    Ok(xor)
}

/// Validates a fully-decoded index list against `(header, nonce)`. Callers
/// are expected to have already run the solution through
/// [`crate::codec::indices_from_minimal`], which enforces the wire-level
/// byte length; this function re-derives everything else from scratch.
pub fn validate(params: Params, header: &[u8], nonce: i64, indices: &[u32]) -> Result<(), PowError> {
    if indices.len() != params.proof_size() {
        return Err(PowError::SolutionSizeMismatch);
    }
    if duped(&params, indices) {
        return Err(PowError::Duplicate);
    }
    let midstate = Midstate::new(params, header, nonce);
    verify_rec(&midstate, indices, params.digit_bits(), params.k, params.n as usize)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &[u8] =
        b"Equihash is an asymmetric PoW based on the Generalised Birthday problem.";
    const VALID_INDICES: [u32; 32] = [
        2261, 15185, 36112, 104243, 23779, 118390, 118332, 130041, 32642, 69878, 76925, 80080,
        45858, 116805, 92842, 111026, 15972, 115059, 85191, 90330, 68190, 122819, 81830, 91132,
        23460, 49807, 52426, 80391, 69567, 114474, 104973, 122568,
    ];

    fn params() -> Params {
        Params::resolve(96, 5).unwrap()
    }

    #[test]
    fn known_good_vector_validates() {
        assert!(validate(params(), HEADER, 1, &VALID_INDICES).is_ok());
    }

    #[test]
    fn one_index_perturbation_is_nonzero_xor() {
        let mut indices = VALID_INDICES;
        indices[0] = 2262;
        assert!(matches!(
            validate(params(), HEADER, 1, &indices),
            Err(PowError::NonzeroXor)
        ));
    }

    #[test]
    fn reversed_first_pair_is_out_of_order() {
        let mut indices = VALID_INDICES;
        indices.swap(0, 1);
        assert!(matches!(
            validate(params(), HEADER, 1, &indices),
            Err(PowError::OutOfOrder)
        ));
    }

    #[test]
    fn sorted_indices_are_out_of_order() {
        let mut indices = VALID_INDICES;
        indices.sort_unstable();
        assert!(matches!(
            validate(params(), HEADER, 1, &indices),
            Err(PowError::OutOfOrder)
        ));
    }

    #[test]
    fn duplicate_split_is_rejected() {
        let mut indices = VALID_INDICES;
        for i in 16..32 {
            indices[i] = indices[i - 16];
        }
        assert!(matches!(
            validate(params(), HEADER, 1, &indices),
            Err(PowError::Duplicate)
        ));
    }

    #[test]
    fn wrong_count_is_size_mismatch() {
        let indices = &VALID_INDICES[0..31];
        assert!(matches!(
            validate(params(), HEADER, 1, indices),
            Err(PowError::SolutionSizeMismatch)
        ));
    }
}
