//! Return-code model for the Equihash core.
//!
//! Mirrors the `POW_*` integer contract exactly (see `ReturnCode`) so a host
//! that only understands the numeric codes can still drive this crate, while
//! internal Rust code works with the richer `PowError` via `Result`.

use std::fmt;

/// The exact wire-level return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ReturnCode {
    Ok = 0,
    InvalidHeaderLength = 1,
    Duplicate = 2,
    OutOfOrder = 3,
    NonzeroXor = 4,
    SolutionSizeMismatch = 5,
    UnknownParams = 6,
}

impl ReturnCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug)]
pub enum PowError {
    InvalidHeaderLength,
    Duplicate,
    OutOfOrder,
    NonzeroXor,
    SolutionSizeMismatch,
    UnknownParams { n: u32, k: u32 },
    InvalidHex(String),
    Io(String),
}

impl fmt::Display for PowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowError::InvalidHeaderLength => write!(f, "header+nonce exceeds HEADERNONCELEN"),
            PowError::Duplicate => write!(f, "solution contains a duplicate index"),
            PowError::OutOfOrder => write!(f, "solution violates Wagner ordering"),
            PowError::NonzeroXor => write!(f, "solution hashes do not XOR to zero"),
            PowError::SolutionSizeMismatch => write!(f, "minimal solution decodes to the wrong index count"),
            PowError::UnknownParams { n, k } => write!(f, "unsupported (N,K) = ({}, {})", n, k),
            PowError::InvalidHex(msg) => write!(f, "invalid hex input: {}", msg),
            PowError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for PowError {}

impl PowError {
    /// Losslessly maps every validator-facing error to its wire-level code.
    /// `Io`/`InvalidHex` have no wire equivalent (they're CLI-host-only) and
    /// map to `UnknownParams` rather than inventing an out-of-range code.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            PowError::InvalidHeaderLength => ReturnCode::InvalidHeaderLength,
            PowError::Duplicate => ReturnCode::Duplicate,
            PowError::OutOfOrder => ReturnCode::OutOfOrder,
            PowError::NonzeroXor => ReturnCode::NonzeroXor,
            PowError::SolutionSizeMismatch => ReturnCode::SolutionSizeMismatch,
            PowError::UnknownParams { .. } => ReturnCode::UnknownParams,
            PowError::Io(_) | PowError::InvalidHex(_) => ReturnCode::UnknownParams,
        }
    }
}

pub type PowResult<T> = Result<T, PowError>;

/// How a solver run ended. Every solver (reference, optimized) drives its
/// search loop to exactly one of these, regardless of internal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverOutcome {
    /// The host callback returned `1` for a candidate: accepted, search stopped.
    Accepted,
    /// The search space was exhausted with no accepted candidate.
    Exhausted,
    /// The host callback returned a nonzero code other than `1`: stop, don't accept.
    Stopped,
    /// The caller's cancellation flag was observed before a candidate was found.
    Cancelled,
}
