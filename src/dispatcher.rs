//! Public entry points (Component G): parameter resolution, header-length
//! enforcement, and routing to the requested solver variant or the
//! validator. Everything above this module is pure and reusable; this is
//! the only place that turns a `PowError` into the wire-level `ReturnCode`.

use std::sync::atomic::AtomicBool;

use crate::codec::{indices_from_minimal, minimal_from_indices};
use crate::error::{PowError, PowResult, ReturnCode, SolverOutcome};
use crate::hash::Midstate;
use crate::params::{Params, HEADERNONCELEN};
use crate::{optimized_solver, reference_solver, validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverVariant {
    Reference,
    Optimized,
}

fn check_header_len(header: &[u8], nonce: i64) -> PowResult<()> {
    let nonce_bytes = if nonce >= 0 { 32 } else { 0 };
    if header.len() + nonce_bytes > HEADERNONCELEN {
        return Err(PowError::InvalidHeaderLength);
    }
    Ok(())
}

/// Decodes a minimal solution into its `PROOF_SIZE` indices.
pub fn indices_from_solution(n: u32, k: u32, soln: &[u8]) -> PowResult<Vec<u32>> {
    let params = Params::resolve(n, k)?;
    indices_from_minimal(&params, soln)
}

/// Encodes `PROOF_SIZE` indices into their minimal solution bytes.
pub fn solution_from_indices(n: u32, k: u32, indices: &[u32]) -> PowResult<Vec<u8>> {
    let params = Params::resolve(n, k)?;
    minimal_from_indices(&params, indices)
}

/// Validates a minimal solution against `(header, nonce)`, returning the
/// wire-level code a C-style host would see.
pub fn validate(n: u32, k: u32, header: &[u8], nonce: i64, soln: &[u8]) -> ReturnCode {
    tracing::info!(n, k, nonce, "validate starting");
    let code = match validate_inner(n, k, header, nonce, soln) {
        Ok(()) => ReturnCode::Ok,
        Err(e) => e.return_code(),
    };
    tracing::info!(n, k, nonce, ?code, "validate finished");
    code
}

fn validate_inner(n: u32, k: u32, header: &[u8], nonce: i64, soln: &[u8]) -> PowResult<()> {
    let params = Params::resolve(n, k)?;
    check_header_len(header, nonce)?;
    let indices = indices_from_minimal(&params, soln)?;
    validator::validate(params, header, nonce, &indices)
}

/// Runs the requested solver variant to completion, reporting every
/// candidate (and periodic cancellation polls) to `on_solution`.
pub fn solve(
    n: u32,
    k: u32,
    header: &[u8],
    nonce: i64,
    variant: SolverVariant,
    cancel: &AtomicBool,
    on_solution: &mut dyn FnMut(Option<&[u8]>) -> i32,
) -> PowResult<SolverOutcome> {
    tracing::info!(n, k, nonce, ?variant, "solve starting");
    let params = Params::resolve(n, k)?;
    check_header_len(header, nonce)?;
    let midstate = Midstate::new(params, header, nonce);
    let outcome = match variant {
        SolverVariant::Reference => reference_solver::solve(params, &midstate, cancel, on_solution),
        SolverVariant::Optimized => optimized_solver::solve(params, &midstate, cancel, on_solution),
    };
    tracing::info!(n, k, nonce, ?variant, ?outcome, "solve finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_params_are_rejected() {
        assert_eq!(validate(32, 3, b"x", 0, &[]), ReturnCode::UnknownParams);
    }

    #[test]
    fn header_too_long_is_rejected() {
        let header = vec![0u8; HEADERNONCELEN];
        assert_eq!(validate(96, 5, &header, 1, &[]), ReturnCode::InvalidHeaderLength);
    }

    #[test]
    fn reference_solver_finds_and_validates_a_solution() {
        let cancel = AtomicBool::new(false);
        let mut found = None;
        let mut callback = |soln: Option<&[u8]>| {
            if let Some(bytes) = soln {
                found = Some(bytes.to_vec());
                return 1;
            }
            0
        };
        let outcome = solve(
            48,
            5,
            b"dispatcher smoke test header",
            7,
            SolverVariant::Reference,
            &cancel,
            &mut callback,
        )
        .unwrap();
        assert_eq!(outcome, SolverOutcome::Accepted);
        let soln = found.expect("callback received a solution");
        assert_eq!(
            validate(48, 5, b"dispatcher smoke test header", 7, &soln),
            ReturnCode::Ok
        );
    }

    #[test]
    fn optimized_solver_finds_and_validates_a_solution() {
        let cancel = AtomicBool::new(false);
        let mut found = None;
        let mut callback = |soln: Option<&[u8]>| {
            if let Some(bytes) = soln {
                found = Some(bytes.to_vec());
                return 1;
            }
            0
        };
        let outcome = solve(
            48,
            5,
            b"dispatcher smoke test header",
            7,
            SolverVariant::Optimized,
            &cancel,
            &mut callback,
        )
        .unwrap();
        assert_eq!(outcome, SolverOutcome::Accepted);
        let soln = found.expect("callback received a solution");
        assert_eq!(
            validate(48, 5, b"dispatcher smoke test header", 7, &soln),
            ReturnCode::Ok
        );
    }
}
