//! Sparse direct linear-solver engines used to factor and solve the
//! perturbed KKT system inside each interior-point iteration.

pub mod cholesky;
pub mod lu;
pub mod solver;
pub(crate) mod vector_ops;

pub use solver::{LinearEngine, LinearJob};
