//! Error taxonomy shared by the sparse engine and the interior-point solver.

use derive_more::{Display, Error};

/// Status code reported by a [`crate::linalg::LinearEngine`] call.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum LinearStatus {
    #[display("ok")]
    Ok,
    #[display("singular or indefinite pivot encountered")]
    SingularPivot,
    #[display("symbolic analysis failed")]
    AnalysisFailed,
}

/// Errors surfaced by [`crate::sparse::CsrMatrix`] and [`crate::ipsolver::IpSolver`].
#[derive(Debug, Display, Error, Clone, Copy)]
pub enum SolverError {
    #[display("index ({row}, {col}) out of bounds for a {rows}x{cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[display("allocation failed while growing sparse storage")]
    Alloc,
    #[display("linear engine reported failure: {_0}")]
    LinearEngine(#[error(not(source))] LinearStatus),
    #[display("iteration limit reached without meeting convergence tolerances")]
    NonConvergence,
    #[display("feasibility repair failed to produce a bounded starting point")]
    InfeasibleStart,
    #[display("requested KKT layout is not implemented")]
    Unsupported,
}
