//! End-to-end solves against hand-built descriptors, covering spec section 8
//! scenarios 1-4 (scenarios 5-6, sparsity-pattern reuse and pruning, live as
//! unit tests in `src/sparse/csr.rs`). Every scenario solves through both
//! shipped `LinearEngine`s so the Cholesky path's symmetrized AUGMENTED KKT
//! matrix (see `ipsolver::kkt::make_positive_definite`) is checked against
//! the LU path's unsymmetrized one on the same problem.

use contact_ipqp::callback::NoOpCallback;
use contact_ipqp::descriptor::{AssemblyRequest, SystemDescriptor};
use contact_ipqp::linalg::cholesky::SparseCholeskyEngine;
use contact_ipqp::linalg::lu::SparseLuEngine;
use contact_ipqp::linalg::LinearEngine;
use contact_ipqp::sparse::{CsrMatrix, SparsityLearner};
use contact_ipqp::terminators::NoOpTerminator;
use contact_ipqp::{E, Options, SolveStatus, SolverHooks};

use macros::value_parameterized_test;
use rstest::rstest;
use rstest_reuse::{apply, template};

/// A fixed-shape QP, entered in Nocedal's convention (`min 1/2 x^T G x + c^T
/// x s.t. A x >= b`) and flipped to the descriptor's inverted sign
/// convention on the way in, mirroring `IpSolver::assemble`.
struct FixedQp {
    n: usize,
    m: usize,
    g: Vec<(usize, usize, E)>,
    a: Vec<(usize, usize, E)>,
    c: Vec<E>,
    b: Vec<E>,
    x_out: Vec<E>,
    lagrangian_out: Vec<E>,
}

impl FixedQp {
    fn new(n: usize, m: usize, g: Vec<(usize, usize, E)>, a: Vec<(usize, usize, E)>, c: Vec<E>, b: Vec<E>) -> Self {
        // descriptor's c/b are the negation of Nocedal's; IpSolver::assemble
        // negates again on the way in.
        Self {
            n,
            m,
            g,
            a,
            c: c.iter().map(|v| -v).collect(),
            b: b.iter().map(|v| -v).collect(),
            x_out: Vec::new(),
            lagrangian_out: Vec::new(),
        }
    }
}

impl SystemDescriptor for FixedQp {
    fn count_active_variables(&self) -> usize {
        self.n
    }

    fn count_active_constraints(&self, _include_bilateral: bool, _skip_contacts_uv: bool) -> usize {
        self.m
    }

    fn learn_hessian_sparsity(&self, learner: &mut SparsityLearner, _request: AssemblyRequest) {
        for (r, c, _) in &self.g {
            learner.set_element(*r, *c);
        }
    }

    fn learn_jacobian_sparsity(&self, learner: &mut SparsityLearner, _request: AssemblyRequest) {
        for (r, c, _) in &self.a {
            learner.set_element(*r, *c);
        }
    }

    fn convert_to_matrix_form(
        &self,
        hessian: Option<&mut CsrMatrix>,
        jacobian: Option<&mut CsrMatrix>,
        _compliance: Option<&mut CsrMatrix>,
        c: Option<&mut [E]>,
        b: Option<&mut [E]>,
        _request: AssemblyRequest,
    ) {
        if let Some(h) = hessian {
            for (r, col, v) in &self.g {
                h.set_element(*r, *col, *v, true).expect("in bounds");
            }
        }
        if let Some(j) = jacobian {
            for (r, col, v) in &self.a {
                j.set_element(*r, *col, *v, true).expect("in bounds");
            }
        }
        if let Some(c) = c {
            c.copy_from_slice(&self.c);
        }
        if let Some(b) = b {
            b.copy_from_slice(&self.b);
        }
    }

    fn from_vector_to_unknowns(&mut self, x: &[E], lagrangian: &[E], _skip_contacts_uv: bool) {
        self.x_out = x.to_vec();
        self.lagrangian_out = lagrangian.to_vec();
    }
}

fn close(a: E, b: E, tol: E) -> bool {
    (a - b).abs() < tol
}

#[derive(Clone, Copy)]
enum EngineKind {
    Cholesky,
    Lu,
}

fn make_engine(kind: EngineKind) -> Box<dyn LinearEngine> {
    match kind {
        EngineKind::Cholesky => Box::new(SparseCholeskyEngine::new()),
        EngineKind::Lu => Box::new(SparseLuEngine::new()),
    }
}

fn run(qp: &mut FixedQp, kind: EngineKind) -> contact_ipqp::SolveReport {
    let mut solver = contact_ipqp::ipsolver::IpSolver::new(make_engine(kind), &Options::new());
    let mut hooks = SolverHooks::new(Box::new(NoOpCallback::new()), Box::new(NoOpTerminator {}));
    solver.solve(qp, &mut hooks).expect("solve should not error")
}

#[template]
#[rstest]
fn both_engines(#[values(EngineKind::Cholesky, EngineKind::Lu)] engine: EngineKind) {
    let expects_symmetric = matches!(engine, EngineKind::Cholesky);
    assert_eq!(make_engine(engine).requires_symmetric_kkt(), expects_symmetric);
}

/// Scenario 1: 2x2 identity QP. `G = I2, c = (-1,-1), A = I2, b = 0`.
/// Expected `x ~= (1,1)`, `lam ~= 0`.
#[apply(both_engines)]
fn identity_qp_converges(engine: EngineKind) {
    let mut qp = FixedQp::new(
        2,
        2,
        vec![(0, 0, 1.0), (1, 1, 1.0)],
        vec![(0, 0, 1.0), (1, 1, 1.0)],
        vec![-1.0, -1.0],
        vec![0.0, 0.0],
    );
    let report = run(&mut qp, engine);

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(report.iterations <= 10, "took {} iterations", report.iterations);
    assert!(close(qp.x_out[0], 1.0, 1e-5));
    assert!(close(qp.x_out[1], 1.0, 1e-5));
    assert!(close(qp.lagrangian_out[0], 0.0, 1e-4));
    assert!(close(qp.lagrangian_out[1], 0.0, 1e-4));
}

/// Scenario 2: active box. `G = diag(1,1), c = (1,1), A = I2, b = (0.5,0.5)`.
/// Expected `x = (0.5,0.5), lam = (1.5,1.5), y = 0`.
#[apply(both_engines)]
fn active_box_constraint_binds(engine: EngineKind) {
    let mut qp = FixedQp::new(
        2,
        2,
        vec![(0, 0, 1.0), (1, 1, 1.0)],
        vec![(0, 0, 1.0), (1, 1, 1.0)],
        vec![1.0, 1.0],
        vec![0.5, 0.5],
    );
    let report = run(&mut qp, engine);

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(close(qp.x_out[0], 0.5, 1e-5));
    assert!(close(qp.x_out[1], 0.5, 1e-5));
    // `from_vector_to_unknowns` receives `-lam`.
    assert!(close(qp.lagrangian_out[0], -1.5, 1e-4));
    assert!(close(qp.lagrangian_out[1], -1.5, 1e-4));
}

/// Scenario 3: unconstrained (`m = 0`), exercising `IpSolver::solve_degenerate`.
/// `G = diag(2,3), c = (4,6)`. Expected `x = (-2,-2)`.
#[apply(both_engines)]
fn unconstrained_takes_direct_fast_path(engine: EngineKind) {
    let mut qp = FixedQp::new(2, 0, vec![(0, 0, 2.0), (1, 1, 3.0)], Vec::new(), vec![4.0, 6.0], Vec::new());
    let report = run(&mut qp, engine);

    assert_eq!(report.status, SolveStatus::Optimal);
    assert_eq!(report.iterations, 0);
    assert!(close(qp.x_out[0], -2.0, 1e-8));
    assert!(close(qp.x_out[1], -2.0, 1e-8));
}

/// Scenario 4: infeasible-start repair. `G = I2, A = I2, b = (10,10)`; the
/// predictor-corrector loop's fixed `x = 1` starting point puts the initial
/// slack `y = Ax - b = -9` deep in infeasible territory, requiring
/// `clamp_abs_at_least_one` to repair it before the first Newton solve.
/// Expected `x = (10,10), lam = (10,10), y = 0`.
#[apply(both_engines)]
fn infeasible_start_is_repaired(engine: EngineKind) {
    let mut qp = FixedQp::new(
        2,
        2,
        vec![(0, 0, 1.0), (1, 1, 1.0)],
        vec![(0, 0, 1.0), (1, 1, 1.0)],
        vec![0.0, 0.0],
        vec![10.0, 10.0],
    );
    let report = run(&mut qp, engine);

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(close(qp.x_out[0], 10.0, 1e-4));
    assert!(close(qp.x_out[1], 10.0, 1e-4));
    assert!(close(qp.lagrangian_out[0], -10.0, 1e-3));
    assert!(close(qp.lagrangian_out[1], -10.0, 1e-3));
}

/// Direct, solver-loop-independent check of `make_positive_definite`:
/// builds an `n x dim` asymmetric coupling block by hand for several `n` and
/// confirms only the `row < n, col >= n` quadrant flips sign.
#[value_parameterized_test(values = [1, 2, 4])]
fn make_positive_definite_flips_only_the_coupling_block(n: usize) {
    let dim = 2 * n;
    let mut mat = CsrMatrix::new(dim, dim, true);
    for i in 0..n {
        mat.set_element(i, i, 2.0, true).unwrap(); // G block, untouched
        mat.set_element(i, n + i, -5.0, true).unwrap(); // -A^T block, flips
        mat.set_element(n + i, i, 5.0, true).unwrap(); // A block, untouched
        mat.set_element(n + i, n + i, 3.0, true).unwrap(); // diagonal, untouched
    }

    contact_ipqp::ipsolver::kkt::make_positive_definite(&mut mat, n);

    for i in 0..n {
        assert_eq!(mat.get_element(i, i).unwrap(), 2.0);
        assert_eq!(mat.get_element(i, n + i).unwrap(), 5.0);
        assert_eq!(mat.get_element(n + i, i).unwrap(), 5.0);
        assert_eq!(mat.get_element(n + i, n + i).unwrap(), 3.0);
    }
}
