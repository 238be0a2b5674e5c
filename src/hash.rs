//! Personalized BLAKE2b hash generator (Component A).
//!
//! The midstate captures the personalization block plus the absorbed header
//! and nonce; every per-`g` hash clones it rather than mutating shared state,
//! so a `Midstate` is cheap to share across solver rounds and safe to reuse
//! from the validator.

use crate::params::Params;

fn personalization(params: &Params) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..8].copy_from_slice(b"ZcashPoW");
    out[8..12].copy_from_slice(&params.n.to_le_bytes());
    out[12..16].copy_from_slice(&params.k.to_le_bytes());
    out
}

pub struct Midstate {
    params: Params,
    state: blake2b_simd::State,
}

impl Midstate {
    /// Builds the midstate for `header`, absorbing a 32-byte little-endian
    /// nonce block when `nonce >= 0`; `nonce < 0` means the header already
    /// carries everything that needs hashing.
    pub fn new(params: Params, header: &[u8], nonce: i64) -> Self {
        let personal = personalization(&params);
        let mut state = blake2b_simd::Params::new()
            .hash_length(params.blake_out())
            .personal(&personal)
            .fanout(1)
            .max_depth(1)
            .to_state();
        state.update(header);
        if nonce >= 0 {
            state.update(&(nonce as u32).to_le_bytes());
            state.update(&[0u8; 28]);
        }
        Midstate { params, state }
    }

    pub fn params(&self) -> Params {
        self.params
    }

    /// `genhash(g)`: clone the midstate, absorb `le32(g)`, finalize to
    /// `BLAKE_OUT` bytes.
    pub fn genhash(&self, g: u32) -> Vec<u8> {
        let mut digest = self.state.clone();
        digest.update(&g.to_le_bytes());
        digest.finalize().as_bytes().to_vec()
    }

    /// `hash_at(idx)`: the `N/8`-byte sub-hash addressed by a leaf index.
    pub fn hash_at(&self, idx: u32) -> Vec<u8> {
        let hashes_per_blake = self.params.hashes_per_blake();
        let g = idx / hashes_per_blake;
        let r = (idx % hashes_per_blake) as usize;
        let n_bytes = (self.params.n / 8) as usize;
        let full = self.genhash(g);
        full[r * n_bytes..(r + 1) * n_bytes].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genhash_is_deterministic() {
        let params = Params::resolve(96, 5).unwrap();
        let mid = Midstate::new(params, b"header", 1);
        assert_eq!(mid.genhash(0), mid.genhash(0));
        assert_ne!(mid.genhash(0), mid.genhash(1));
    }

    #[test]
    fn hash_at_matches_genhash_slice() {
        let params = Params::resolve(96, 5).unwrap();
        let mid = Midstate::new(params, b"header", 1);
        let hpb = params.hashes_per_blake();
        let n8 = (params.n / 8) as usize;
        let full0 = mid.genhash(0);
        assert_eq!(mid.hash_at(0), full0[0..n8]);
        assert_eq!(mid.hash_at(hpb - 1), full0[(hpb as usize - 1) * n8..hpb as usize * n8]);
        assert_eq!(mid.hash_at(hpb), mid.genhash(1)[0..n8]);
    }

    #[test]
    fn nonce_changes_output() {
        let params = Params::resolve(96, 5).unwrap();
        let a = Midstate::new(params, b"header", 1).genhash(0);
        let b = Midstate::new(params, b"header", 2).genhash(0);
        assert_ne!(a, b);
    }
}
