//! Equihash: an asymmetric proof-of-work scheme based on the Generalised
//! Birthday Problem.
//!
//! The crate is organized bottom-up: [`params`] resolves a runtime `(N, K)`
//! pair to its derived constants, [`hash`] generates the personalized
//! BLAKE2b digests the rest of the crate hashes against, [`codec`] packs and
//! unpacks the minimal solution encoding, [`reference_solver`] and
//! [`optimized_solver`] are the two search strategies, [`validator`]
//! authenticates a claimed solution from scratch, and [`dispatcher`] ties
//! all of it together behind a small, host-agnostic API.

pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod hash;
pub mod optimized_solver;
pub mod params;
pub mod reference_solver;
pub mod validator;

pub use dispatcher::{indices_from_solution, solution_from_indices, solve, validate, SolverVariant};
pub use error::{PowError, PowResult, ReturnCode, SolverOutcome};
pub use params::Params;
