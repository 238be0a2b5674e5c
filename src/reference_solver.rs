//! Row-buffer Wagner solver (Component D).
//!
//! Builds `INIT_SIZE` leaf rows, one per generator index, then runs `K`
//! collision rounds: sort by the round's digit window, combine every pair
//! within a matching run, XOR their remaining digits, and concatenate their
//! index lists with the half whose first index is smaller placed first (this
//! ordering is what lets [`crate::validator`] recover the Wagner tree
//! recursively). Straightforward and memory-heavy compared to the bucketed
//! solver, but a useful cross-check of it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::codec::minimal_from_indices;
use crate::error::SolverOutcome;
use crate::hash::Midstate;
use crate::params::Params;

#[derive(Clone, Debug)]
struct Row {
    hash: Vec<u8>,
    indices: Vec<u32>,
}

fn combine(a: &Row, b: &Row) -> Option<Row> {
    if a.indices.iter().any(|x| b.indices.contains(x)) {
        return None;
    }
    let hash: Vec<u8> = a.hash.iter().zip(b.hash.iter()).map(|(x, y)| x ^ y).collect();
    let indices = if a.indices[0] < b.indices[0] {
        let mut v = a.indices.clone();
        v.extend_from_slice(&b.indices);
        v
    } else {
        let mut v = b.indices.clone();
        v.extend_from_slice(&a.indices);
        v
    };
    Some(Row { hash, indices })
}

/// One collision round: sort by digit `round_idx`'s byte window, then pair
/// up every two rows within each matching run.
fn round(mut rows: Vec<Row>, round_idx: usize, cbl: usize) -> Vec<Row> {
    let start = round_idx * cbl;
    let end = start + cbl;
    rows.sort_by(|a, b| a.hash[start..end].cmp(&b.hash[start..end]));

    let mut next = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        let mut j = i + 1;
        while j < rows.len() && rows[j].hash[start..end] == rows[i].hash[start..end] {
            j += 1;
        }
        for a in i..j {
            for b in (a + 1)..j {
                if let Some(combined) = combine(&rows[a], &rows[b]) {
                    next.push(combined);
                }
            }
        }
        i = j;
    }
    next
}

/// Runs the full `K`-round search and reports every accepted candidate to
/// `on_solution` as a minimally-encoded solution. Checked against `cancel`
/// once per round; a solver mid-round never observes a flip until the round
/// completes.
pub fn solve(
    params: Params,
    midstate: &Midstate,
    cancel: &AtomicBool,
    on_solution: &mut dyn FnMut(Option<&[u8]>) -> i32,
) -> SolverOutcome {
    let digit_bits = params.digit_bits() as usize;
    let cbl = params.collision_byte_length();

    let mut rows: Vec<Row> = (0..params.init_size() as u32)
        .map(|i| Row {
            hash: crate::codec::expand_array(&midstate.hash_at(i), digit_bits, 0),
            indices: vec![i],
        })
        .collect();

    for round_idx in 0..params.k as usize {
        if cancel.load(Ordering::Relaxed) {
            return SolverOutcome::Cancelled;
        }
        if on_solution(None) != 0 {
            return SolverOutcome::Stopped;
        }
        let started = Instant::now();
        rows = round(rows, round_idx, cbl);
        tracing::debug!(round = round_idx, candidates = rows.len(), elapsed = ?started.elapsed(), "collision round complete");
        if rows.is_empty() {
            return SolverOutcome::Exhausted;
        }
    }

    for row in &rows {
        if !row.hash.iter().all(|&b| b == 0) {
            continue;
        }
        let minimal = match minimal_from_indices(&params, &row.indices) {
            Ok(m) => m,
            Err(_) => continue,
        };
        match on_solution(Some(&minimal)) {
            0 => continue,
            1 => return SolverOutcome::Accepted,
            _ => return SolverOutcome::Stopped,
        }
    }
    SolverOutcome::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hash: Vec<u8>, indices: Vec<u32>) -> Row {
        Row { hash, indices }
    }

    #[test]
    fn combine_rejects_overlapping_indices() {
        let a = row(vec![1, 2], vec![0, 1]);
        let b = row(vec![1, 3], vec![1, 2]);
        assert!(combine(&a, &b).is_none());
    }

    #[test]
    fn combine_xors_and_orders_by_first_index() {
        let a = row(vec![0b1010, 0xFF], vec![5, 6]);
        let b = row(vec![0b0110, 0x0F], vec![2, 3]);
        let c = combine(&a, &b).unwrap();
        assert_eq!(c.hash, vec![0b1100, 0xF0]);
        assert_eq!(c.indices, vec![2, 3, 5, 6]);
    }

    #[test]
    fn round_pairs_every_combination_within_a_run() {
        // Three rows share the same first byte: C(3,2) = 3 combinations.
        let rows = vec![
            row(vec![0x00, 0x01], vec![0]),
            row(vec![0x00, 0x02], vec![1]),
            row(vec![0x00, 0x03], vec![2]),
            row(vec![0x01, 0x00], vec![3]),
        ];
        let next = round(rows, 0, 1);
        assert_eq!(next.len(), 3);
    }

    #[test]
    fn solve_toy_instance_finds_a_zero_xor_pair() {
        // A hand-built 2-leaf, k=1 toy instance bypassing real hashing: two
        // leaves whose digits are identical, so they collide on round 0 and
        // XOR to an all-zero remaining hash.
        let rows = vec![row(vec![0x05, 0x0A], vec![0]), row(vec![0x05, 0x0A], vec![1])];
        let next = round(rows, 0, 1);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].hash, vec![0x00, 0x00]);
        assert_eq!(next[0].indices, vec![0, 1]);
    }
}
