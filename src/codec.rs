//! Bit-packed codec: `expand_array` / `compress_array` and the minimal
//! solution encoding built on top of them.
//!
//! `expand_array` reads a stream of big-endian `bit_len`-bit groups packed
//! across byte boundaries and writes each group into its own byte-aligned,
//! `byte_pad`-left-padded slot. `compress_array` is the inverse. Both use a
//! big-endian bit accumulator, ported directly from the accumulator algorithm
//! this spec was distilled from.

use crate::error::PowError;
use crate::params::Params;

fn check_bit_len(bit_len: usize) {
    assert!(bit_len >= 8, "bit_len must be at least 8");
    assert!(8 * 4 >= 7 + bit_len, "bit_len too wide for a u32 accumulator");
}

pub fn expand_array(input: &[u8], bit_len: usize, byte_pad: usize) -> Vec<u8> {
    check_bit_len(bit_len);
    let out_width = (bit_len + 7) / 8 + byte_pad;
    let out_len = 8 * out_width * input.len() / bit_len;
    let mut out = vec![0u8; out_len];

    let bit_len_mask: u32 = (1u32 << bit_len) - 1;
    let mut acc_bits: usize = 0;
    let mut acc_value: u32 = 0;
    let mut j = 0usize;

    for &byte in input {
        acc_value = (acc_value << 8) | byte as u32;
        acc_bits += 8;

        if acc_bits >= bit_len {
            acc_bits -= bit_len;
            for x in byte_pad..out_width {
                let shift = acc_bits + 8 * (out_width - x - 1);
                out[j + x] = ((acc_value >> shift) & ((bit_len_mask >> (8 * (out_width - x - 1))) & 0xFF)) as u8;
            }
            j += out_width;
        }
    }
    out
}

pub fn compress_array(input: &[u8], bit_len: usize, byte_pad: usize) -> Vec<u8> {
    check_bit_len(bit_len);
    let in_width = (bit_len + 7) / 8 + byte_pad;
    let out_len = bit_len * input.len() / (8 * in_width);
    let mut out = vec![0u8; out_len];

    let bit_len_mask: u32 = (1u32 << bit_len) - 1;
    let mut acc_bits: usize = 0;
    let mut acc_value: u32 = 0;
    let mut j = 0usize;

    for slot in out.iter_mut() {
        if acc_bits < 8 {
            acc_value <<= bit_len;
            for x in byte_pad..in_width {
                let shift = 8 * (in_width - x - 1);
                acc_value |= ((input[j + x] as u32) & ((bit_len_mask >> shift) & 0xFF)) << shift;
            }
            j += in_width;
            acc_bits += bit_len;
        }
        acc_bits -= 8;
        *slot = ((acc_value >> acc_bits) & 0xFF) as u8;
    }
    out
}

pub fn index_to_be4(i: u32) -> [u8; 4] {
    i.to_be_bytes()
}

pub fn be4_to_index(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// `byte_pad` used when expanding/compressing the minimal solution encoding:
/// groups are `DIGITBITS+1` bits wide, padded up to a 4-byte big-endian index.
fn minimal_byte_pad(params: &Params) -> usize {
    let bit_len = params.digit_bits() as usize + 1;
    4 - (bit_len + 7) / 8
}

pub fn indices_from_minimal(params: &Params, soln: &[u8]) -> Result<Vec<u32>, PowError> {
    if soln.len() != params.solution_bytes() {
        return Err(PowError::SolutionSizeMismatch);
    }
    let bit_len = params.digit_bits() as usize + 1;
    let expanded = expand_array(soln, bit_len, minimal_byte_pad(params));
    if expanded.len() != params.proof_size() * 4 {
        return Err(PowError::SolutionSizeMismatch);
    }
    Ok(expanded.chunks_exact(4).map(be4_to_index).collect())
}

pub fn minimal_from_indices(params: &Params, indices: &[u32]) -> Result<Vec<u8>, PowError> {
    if indices.len() != params.proof_size() {
        return Err(PowError::SolutionSizeMismatch);
    }
    let mut expanded = Vec::with_capacity(indices.len() * 4);
    for &idx in indices {
        expanded.extend_from_slice(&index_to_be4(idx));
    }
    let bit_len = params.digit_bits() as usize + 1;
    Ok(compress_array(&expanded, bit_len, minimal_byte_pad(params)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_compress_round_trip() {
        // 20-bit groups, matching (200,9)'s DIGITBITS.
        let input: Vec<u8> = (0..15u8).collect();
        let expanded = expand_array(&input, 20, 0);
        let compressed = compress_array(&expanded, 20, 0);
        assert_eq!(compressed, input);
    }

    #[test]
    fn be4_round_trip() {
        let i = 0xDEAD_BEEFu32;
        assert_eq!(be4_to_index(&index_to_be4(i)), i);
    }

    #[test]
    fn minimal_round_trip_96_5() {
        let params = Params::resolve(96, 5).unwrap();
        let indices: Vec<u32> = (0..32u32).map(|i| i * 37 % params.max_index()).collect();
        let minimal = minimal_from_indices(&params, &indices).unwrap();
        assert_eq!(minimal.len(), params.solution_bytes());
        let back = indices_from_minimal(&params, &minimal).unwrap();
        assert_eq!(back, indices);
    }

    #[test]
    fn rejects_wrong_length_minimal() {
        let params = Params::resolve(96, 5).unwrap();
        let bad = vec![0u8; params.solution_bytes() - 1];
        assert!(matches!(indices_from_minimal(&params, &bad), Err(PowError::SolutionSizeMismatch)));
    }
}
