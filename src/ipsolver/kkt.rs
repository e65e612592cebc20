//! Assembly and per-iteration refresh of the perturbed KKT matrix, abstracted
//! over the three layouts of spec section 4.4.1. `IpSolver` holds a single
//! `KktLayout` for the lifetime of a `Solve` call; the layout never changes
//! mid-run.

use enum_dispatch::enum_dispatch;

use crate::E;
use crate::error::SolverError;
use crate::sparse::{CsrMatrix, SparsityLearner};

/// Shared interface each KKT layout implements: build the sparsity pattern
/// and initial values from the assembled `G`/`A` blocks, refresh the
/// iteration-dependent diagonal, fill the perturbed right-hand side, and
/// unpack a solved step back into `(Dx, Dlam)`.
#[enum_dispatch]
pub trait KktAssembly {
    /// `symmetrize` is [`crate::linalg::LinearEngine::requires_symmetric_kkt`]
    /// for the engine this matrix will be handed to; when set, the
    /// antisymmetric constraint coupling is run through
    /// [`make_positive_definite`] before the matrix is returned.
    fn build(
        &mut self,
        n: usize,
        m: usize,
        g: &CsrMatrix,
        a: &CsrMatrix,
        compliance: Option<&CsrMatrix>,
        symmetrize: bool,
    ) -> Result<(), SolverError>;

    /// Dimension of the assembled matrix (and of `rhs`/the solved vector).
    fn dim(&self) -> usize;

    fn matrix(&self) -> &CsrMatrix;
    fn matrix_mut(&mut self) -> &mut CsrMatrix;

    /// Refreshes the iteration-dependent diagonal stripe from the current
    /// `y, lam`. Called once per predictor solve and once per corrector solve.
    fn refresh_diagonal(&mut self, y: &[E], lam: &[E]) -> Result<(), SolverError>;

    /// Writes `rhs` (sized `dim()`) for the current residuals and centering
    /// perturbation `rpd` (`y ∘ lam`, already corrected by the caller).
    fn fill_rhs(&self, rd: &[E], rp: &[E], rpd: &[E], rhs: &mut [E]);

    /// Splits a solved vector (sized `dim()`) into `(Dx, Dlam)`.
    fn extract_step(&self, sol: &[E]) -> (Vec<E>, Vec<E>);
}

#[enum_dispatch(KktAssembly)]
pub enum KktLayout {
    Standard(StandardKkt),
    Augmented(AugmentedKkt),
    Normal(NormalKkt),
}

impl KktLayout {
    pub fn new_standard() -> Self {
        KktLayout::Standard(StandardKkt::default())
    }

    pub fn new_augmented() -> Self {
        KktLayout::Augmented(AugmentedKkt::default())
    }

    pub fn new_normal() -> Self {
        KktLayout::Normal(NormalKkt)
    }
}

/// Copies every stored entry of `g` into `dst` unchanged, and every stored
/// entry `(r, c, v)` of `a` into `dst` at `(n + r, c)` and, negated, at
/// `(c, n + r)` (the `A` and `-A^T` blocks shared by STANDARD and AUGMENTED).
fn place_g_and_a(dst: &mut CsrMatrix, g: &CsrMatrix, a: &CsrMatrix, n: usize) {
    let mut g_scratch = g.clone();
    g_scratch.for_each_existent_value(|r, c, v| {
        dst.set_element(r, c, *v, true).expect("pattern includes G");
    });
    let mut a_scratch = a.clone();
    a_scratch.for_each_existent_value(|r, c, v| {
        dst.set_element(n + r, c, *v, true).expect("pattern includes A");
        dst.set_element(c, n + r, -*v, true).expect("pattern includes A^T");
    });
}

fn learn_g_and_a(learner: &mut SparsityLearner, g: &CsrMatrix, a: &CsrMatrix, n: usize) {
    let mut g_scratch = g.clone();
    g_scratch.for_each_existent_value(|r, c, _| learner.set_element(r, c));
    let mut a_scratch = a.clone();
    a_scratch.for_each_existent_value(|r, c, _| {
        learner.set_element(n + r, c);
        learner.set_element(c, n + r);
    });
}

/// Flips the sign of every stored entry in the `-A^T` coupling block (rows
/// `[0, n)`, columns `[n, dim)`), turning it into `+A^T`. Required before a
/// symmetric-only factorization (see [`crate::linalg::cholesky`]); the
/// caller must recover the true step from the solved vector per the
/// compensation documented on each layout's `extract_step`/`refresh_diagonal`.
pub fn make_positive_definite(mat: &mut CsrMatrix, n: usize) {
    mat.for_each_existent_value_that_meets_requirement(
        |r, c, _| r < n && c >= n,
        |_, _, v| *v = -*v,
    );
}

/// `(n + 2m) x (n + 2m)` layout:
///
/// ```text
/// [ G    0    -A^T ]
/// [ A   -I      0  ]
/// [ 0    Λ      Y  ]
/// ```
#[derive(Default)]
pub struct StandardKkt {
    mat: CsrMatrix,
    n: usize,
    m: usize,
}

impl KktAssembly for StandardKkt {
    fn build(
        &mut self,
        n: usize,
        m: usize,
        g: &CsrMatrix,
        a: &CsrMatrix,
        _compliance: Option<&CsrMatrix>,
        symmetrize: bool,
    ) -> Result<(), SolverError> {
        self.n = n;
        self.m = m;
        let dim = n + 2 * m;

        let mut learner = SparsityLearner::new(dim);
        learn_g_and_a(&mut learner, g, a, n);
        for i in 0..m {
            learner.set_element(n + i, n + i); // -I block
            learner.set_element(n + m + i, n + i); // Lambda
            learner.set_element(n + m + i, n + m + i); // Y
        }

        let mut mat = CsrMatrix::new(dim, dim, true);
        mat.load_sparsity_pattern(&learner.sparsity_pattern());
        place_g_and_a(&mut mat, g, a, n);
        if symmetrize {
            make_positive_definite(&mut mat, n);
        }
        // the x/y-slack block is `+A^T`/`A` when symmetrized, so the slack
        // diagonal flips to `+I` to keep that 2x2 sub-block's equations
        // consistent (the unused solved `Dy` is never read by `extract_step`).
        let slack_diag = if symmetrize { 1.0 } else { -1.0 };
        for i in 0..m {
            mat.set_element(n + i, n + i, slack_diag, true).expect("-I slot exists");
        }

        self.mat = mat;
        Ok(())
    }

    fn dim(&self) -> usize {
        self.n + 2 * self.m
    }

    fn matrix(&self) -> &CsrMatrix {
        &self.mat
    }

    fn matrix_mut(&mut self) -> &mut CsrMatrix {
        &mut self.mat
    }

    fn refresh_diagonal(&mut self, y: &[E], lam: &[E]) -> Result<(), SolverError> {
        let n = self.n;
        for i in 0..self.m {
            *self.mat.element(n + self.m + i, n + i)? = lam[i];
            *self.mat.element(n + self.m + i, n + self.m + i)? = y[i];
        }
        Ok(())
    }

    fn fill_rhs(&self, rd: &[E], rp: &[E], rpd: &[E], rhs: &mut [E]) {
        let n = self.n;
        let m = self.m;
        for i in 0..n {
            rhs[i] = -rd[i];
        }
        for i in 0..m {
            rhs[n + i] = -rp[i];
        }
        for i in 0..m {
            rhs[n + m + i] = -rpd[i];
        }
    }

    fn extract_step(&self, sol: &[E]) -> (Vec<E>, Vec<E>) {
        let n = self.n;
        let m = self.m;
        (sol[0..n].to_vec(), sol[n + m..n + 2 * m].to_vec())
    }
}

/// `(n + m) x (n + m)` layout, the default:
///
/// ```text
/// [ G          -A^T         ]
/// [ A    diag(y/lam) + E    ]
/// ```
#[derive(Default)]
pub struct AugmentedKkt {
    mat: CsrMatrix,
    n: usize,
    m: usize,
    compliance: Vec<E>,
    symmetrized: bool,
}

impl KktAssembly for AugmentedKkt {
    fn build(
        &mut self,
        n: usize,
        m: usize,
        g: &CsrMatrix,
        a: &CsrMatrix,
        compliance: Option<&CsrMatrix>,
        symmetrize: bool,
    ) -> Result<(), SolverError> {
        self.n = n;
        self.m = m;
        self.symmetrized = symmetrize;
        let dim = n + m;

        let mut learner = SparsityLearner::new(dim);
        learn_g_and_a(&mut learner, g, a, n);
        for i in 0..m {
            learner.set_element(n + i, n + i);
        }

        let mut mat = CsrMatrix::new(dim, dim, true);
        mat.load_sparsity_pattern(&learner.sparsity_pattern());
        place_g_and_a(&mut mat, g, a, n);
        if symmetrize {
            make_positive_definite(&mut mat, n);
        }

        self.compliance = vec![0.0; m];
        if let Some(compliance) = compliance {
            let mut scratch = compliance.clone();
            scratch.for_each_existent_value(|r, _c, v| {
                self.compliance[r] += *v;
            });
        }
        let diag_sign = if symmetrize { -1.0 } else { 1.0 };
        for i in 0..m {
            mat.set_element(n + i, n + i, diag_sign * self.compliance[i], true)
                .expect("diag slot exists");
        }

        self.mat = mat;
        Ok(())
    }

    fn dim(&self) -> usize {
        self.n + self.m
    }

    fn matrix(&self) -> &CsrMatrix {
        &self.mat
    }

    fn matrix_mut(&mut self) -> &mut CsrMatrix {
        &mut self.mat
    }

    fn refresh_diagonal(&mut self, y: &[E], lam: &[E]) -> Result<(), SolverError> {
        let n = self.n;
        let sign = if self.symmetrized { -1.0 } else { 1.0 };
        for i in 0..self.m {
            *self.mat.element(n + i, n + i)? = sign * (y[i] / lam[i] + self.compliance[i]);
        }
        Ok(())
    }

    fn fill_rhs(&self, rd: &[E], rp: &[E], rpd: &[E], rhs: &mut [E]) {
        let n = self.n;
        let m = self.m;
        for i in 0..n {
            rhs[i] = -rd[i];
        }
        for i in 0..m {
            // `rpd` here already carries `IpSolver`'s `-rpd/lam` fold-in of
            // the complementarity perturbation for this layout. Unaffected
            // by `symmetrized`: only the matrix blocks change, not the RHS.
            rhs[n + i] = -rp[i] + rpd[i];
        }
    }

    fn extract_step(&self, sol: &[E]) -> (Vec<E>, Vec<E>) {
        let n = self.n;
        let m = self.m;
        let dx = sol[0..n].to_vec();
        let dlam = if self.symmetrized {
            sol[n..n + m].iter().map(|v| -v).collect()
        } else {
            sol[n..n + m].to_vec()
        };
        (dx, dlam)
    }
}

/// `n x n` normal-equations layout: `G + sum_i (lam_i/y_i) a_i a_i^T`.
/// Listed in the spec for completeness; eliminating the constraint block
/// requires forming `A^T diag(lam/y) A`, which this crate does not build.
#[derive(Default)]
pub struct NormalKkt;

impl KktAssembly for NormalKkt {
    fn build(
        &mut self,
        _n: usize,
        _m: usize,
        _g: &CsrMatrix,
        _a: &CsrMatrix,
        _compliance: Option<&CsrMatrix>,
        _symmetrize: bool,
    ) -> Result<(), SolverError> {
        Err(SolverError::Unsupported)
    }

    fn dim(&self) -> usize {
        0
    }

    fn matrix(&self) -> &CsrMatrix {
        panic!("NormalKkt::build always fails before matrix() can be called")
    }

    fn matrix_mut(&mut self) -> &mut CsrMatrix {
        panic!("NormalKkt::build always fails before matrix_mut() can be called")
    }

    fn refresh_diagonal(&mut self, _y: &[E], _lam: &[E]) -> Result<(), SolverError> {
        Err(SolverError::Unsupported)
    }

    fn fill_rhs(&self, _rd: &[E], _rp: &[E], _rpd: &[E], _rhs: &mut [E]) {}

    fn extract_step(&self, _sol: &[E]) -> (Vec<E>, Vec<E>) {
        (Vec::new(), Vec::new())
    }
}
