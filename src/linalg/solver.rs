//! The `LinearEngine` interface: factor-and-solve for a CSR matrix and a
//! dense right-hand side. Any concrete direct solver — MUMPS, PARDISO, or an
//! in-tree supernodal LDLT — satisfies this contract; the interior-point
//! loop is written against the trait alone.

use problemo::Problem;

use crate::E;
use crate::error::LinearStatus;
use crate::sparse::CsrMatrix;

/// Job submitted to a [`LinearEngine::call`]. Forms a small state machine:
/// analysis must precede factorization, which must precede solve, for a
/// given structural pattern.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LinearJob {
    Analyze,
    Factorize,
    AnalyzeFactorize,
    Solve,
    FactorizeSolve,
    End,
}

/// Factor-and-solve engine for a perturbed KKT system. The caller owns the
/// [`CsrMatrix`] storage and the right-hand-side buffer; the engine owns the
/// numerical factorization between calls and may cache it keyed on the
/// matrix's structural identity.
pub trait LinearEngine {
    fn new() -> Self
    where
        Self: Sized;

    /// Borrows the matrix for the duration of `Analyze`/`Factorize`. Does
    /// not copy values eagerly — `call` re-reads them as needed.
    fn set_matrix(&mut self, matrix: &CsrMatrix) -> Result<(), Problem>;

    /// Registers the buffer that `Solve`/`FactorizeSolve` overwrite in place
    /// with the solution.
    fn set_rhs(&mut self, rhs: &mut [E]) -> Result<(), Problem>;

    /// Executes `job`. A non-`Ok` status signals a linear-solve failure that
    /// the caller must surface without corrupting its own state.
    fn call(&mut self, job: LinearJob) -> Result<LinearStatus, Problem>;

    /// True when this engine only reads one triangle of the matrix and
    /// mirrors it (a genuinely symmetric factorization). The AUGMENTED and
    /// STANDARD KKT blocks are assembled with an antisymmetric constraint
    /// coupling (`-Aᵀ` atop `A`); callers must run
    /// `ipsolver::kkt::make_positive_definite` over the assembled matrix
    /// before handing it to such an engine. An engine that factors the full
    /// unsymmetric matrix (e.g. LU) returns `false`.
    fn requires_symmetric_kkt(&self) -> bool;
}
