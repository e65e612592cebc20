//! Compressed-sparse-row matrix engine: sparsity-pattern learning, gap-tolerant
//! incremental construction, compression/pruning, and clipped mat-vec.

pub mod csr;
pub mod learner;

pub use csr::CsrMatrix;
pub use learner::{SparsityLearner, SparsityPattern};
