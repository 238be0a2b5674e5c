//! Equihash parameter table.
//!
//! Resolves a runtime `(N, K)` pair to the fixed set of supported tuples and
//! their derived constants. There is no monomorphization over `(N, K)`: the
//! dispatcher looks up one `Params` value and every component below takes it
//! as a plain argument.

use crate::error::PowError;

/// Header+nonce byte budget; see the external interface contract.
pub const HEADERNONCELEN: usize = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub n: u32,
    pub k: u32,
}

impl Params {
    /// Resolves `(n, k)` against the supported set `{(48,5),(96,5),(144,5),(200,9)}`.
    pub fn resolve(n: u32, k: u32) -> Result<Self, PowError> {
        match (n, k) {
            (48, 5) | (96, 5) | (144, 5) | (200, 9) => Ok(Params { n, k }),
            _ => Err(PowError::UnknownParams { n, k }),
        }
    }

    /// Bits per digit: `N / (K+1)`.
    pub fn digit_bits(&self) -> u32 {
        self.n / (self.k + 1)
    }

    /// `ceil(DIGITBITS / 8)`.
    pub fn collision_byte_length(&self) -> usize {
        ((self.digit_bits() as usize) + 7) / 8
    }

    /// `(K+1) * COLLISION_BYTE_LENGTH`.
    pub fn hash_length(&self) -> usize {
        (self.k as usize + 1) * self.collision_byte_length()
    }

    /// `512 / N`.
    pub fn hashes_per_blake(&self) -> u32 {
        512 / self.n
    }

    /// `HASHES_PER_BLAKE * N / 8`.
    pub fn blake_out(&self) -> usize {
        (self.hashes_per_blake() * self.n / 8) as usize
    }

    /// `2^K`.
    pub fn proof_size(&self) -> usize {
        1usize << self.k
    }

    /// `PROOF_SIZE * (DIGITBITS+1) / 8`.
    pub fn solution_bytes(&self) -> usize {
        self.proof_size() * (self.digit_bits() as usize + 1) / 8
    }

    /// `2^(DIGITBITS+1)`, the reference solver's seed row count.
    pub fn init_size(&self) -> usize {
        1usize << (self.digit_bits() + 1)
    }

    /// `10` for `(200,9)`, else `4`.
    pub fn rest_bits(&self) -> u32 {
        if self.n == 200 && self.k == 9 {
            10
        } else {
            4
        }
    }

    pub fn bucket_bits(&self) -> u32 {
        self.digit_bits() - self.rest_bits()
    }

    pub fn slot_bits(&self) -> u32 {
        self.rest_bits() + 2
    }

    pub fn n_buckets(&self) -> usize {
        1usize << self.bucket_bits()
    }

    /// `floor(2^SLOTBITS * SAVEMEM)`, `SAVEMEM = 9/14` when `RESTBITS >= 8` else `1`.
    pub fn n_slots(&self) -> usize {
        let slot_range = 1u64 << self.slot_bits();
        if self.rest_bits() >= 8 {
            ((slot_range * 9) / 14) as usize
        } else {
            slot_range as usize
        }
    }

    pub fn uses_cantor(&self) -> bool {
        self.n == 200 && self.k == 9
    }

    /// Max index value a leaf/tag may legally carry, per invariant I1.
    pub fn max_index(&self) -> u32 {
        1u32 << (self.digit_bits() + 1)
    }
}
