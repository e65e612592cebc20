//! The `SystemDescriptor` interface: the multibody side of the contact
//! problem. `IpSolver` borrows a descriptor read-only for the duration of a
//! single `solve` call and never stores one between calls.

use crate::E;
use crate::sparse::{CsrMatrix, SparsityLearner};

/// Selects which part of `convertToMatrixForm`'s output a caller wants
/// filled. The interior-point loop uses both: "pattern + full matrix" on the
/// first call of a shape, "vectors only" on every refresh.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest {
    pub matrix: bool,
    pub rhs: bool,
    pub compliance: bool,
    pub only_bilateral: bool,
    pub skip_contacts_uv: bool,
}

/// Produces `n, m`, assembles the problem blocks into caller-supplied
/// storage, fills `c, b`, and converts an interior-point solution back into
/// descriptor-native variables.
pub trait SystemDescriptor {
    /// Number of active primal variables `n`.
    fn count_active_variables(&self) -> usize;

    /// Number of active constraint rows `m`. `include_bilateral` folds in
    /// equality-style rows; `skip_contacts_uv` strips friction-tangent rows
    /// (they are re-expanded by `from_vector_to_unknowns`).
    fn count_active_constraints(&self, include_bilateral: bool, skip_contacts_uv: bool) -> usize;

    /// Records the `G` (Hessian) sparsity pattern into `learner`, in
    /// `(row, col)` terms, without touching values. Called once per shape,
    /// before the first `convert_to_matrix_form`.
    fn learn_hessian_sparsity(&self, learner: &mut SparsityLearner, request: AssemblyRequest);

    /// Records the `A` (constraint Jacobian) sparsity pattern into `learner`.
    fn learn_jacobian_sparsity(&self, learner: &mut SparsityLearner, request: AssemblyRequest);

    /// Assembles `G` into `hessian` (if `request.matrix`) and `A` into
    /// `jacobian` (if `request.matrix`), and fills `c, b` (if `request.rhs`).
    /// Only the requested outputs are touched; a solver that already has a
    /// locked sparsity pattern passes `request.matrix = false` on warm-start
    /// refresh calls.
    #[allow(clippy::too_many_arguments)]
    fn convert_to_matrix_form(
        &self,
        hessian: Option<&mut CsrMatrix>,
        jacobian: Option<&mut CsrMatrix>,
        compliance: Option<&mut CsrMatrix>,
        c: Option<&mut [E]>,
        b: Option<&mut [E]>,
        request: AssemblyRequest,
    );

    /// Writes the primal solution `x` and the Lagrangian block back into
    /// descriptor state. When `skip_contacts_uv` was set during assembly,
    /// the Lagrangian is expected as interleaved triplets `[-lam_i, 0, 0]`.
    fn from_vector_to_unknowns(&mut self, x: &[E], lagrangian: &[E], skip_contacts_uv: bool);
}
