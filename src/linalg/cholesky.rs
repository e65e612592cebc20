//! Sparse symmetric-indefinite LDLT factorization bridging [`CsrMatrix`]
//! into `faer`'s simplicial Cholesky path.
//!
//! `get_mat_upper` below reads only the stored upper triangle and mirrors it,
//! so this engine requires a genuinely symmetric matrix. The AUGMENTED KKT
//! layout is assembled with an antisymmetric constraint coupling (`-A^T`
//! atop `A`); `ipsolver::kkt::make_positive_definite`, run from
//! `IpSolver::assemble` whenever [`LinearEngine::requires_symmetric_kkt`]
//! returns `true`, flips that `-A^T` block to `+A^T` and the bottom-right
//! diagonal to its negative so the assembled matrix is symmetric and the
//! recovered step still satisfies the original (unsymmetrized) Newton
//! system. The STANDARD layout's `Λ`/`Y` sub-block is stored in one
//! triangle only and is not symmetrized by this path; it is unvalidated
//! against this engine; prefer AUGMENTED (the default) here.

use faer::dyn_stack::{MemBuffer, MemStack, StackReq};
use faer::linalg::cholesky::ldlt::factor::LdltRegularization;
use faer::perm::{Perm, PermRef};
use faer::prelude::{Reborrow, ReborrowMut};
use faer::sparse::linalg::amd;
use faer::sparse::linalg::cholesky::simplicial::{self, SimplicialLdltRef, SymbolicSimplicialCholesky};
use faer::sparse::{SparseColMat, SparseColMatRef, SymbolicSparseColMat, Triplet};
use faer::{Mat, MatMut};
use problemo::{Problem, ProblemResult};

use crate::E;
use crate::error::LinearStatus;
use crate::linalg::solver::{LinearEngine, LinearJob};
use crate::sparse::CsrMatrix;

use derive_more::{Display, Error};

#[derive(Debug, Display, Error, PartialEq)]
pub enum CholeskyError {
    #[display("symbolic factorization error")]
    SymbolicFactorization,
    #[display("numeric factorization error")]
    NumericFactorization,
    #[display("solve requested before analyze/factorize")]
    Uninitialized,
    #[display("memory reservation failed")]
    MemoryReservation,
    #[display("memory allocation failed")]
    MemoryAllocation,
}

#[allow(non_snake_case)]
pub struct SparseCholeskyEngine {
    dim: usize,
    symbolic: Option<SymbolicSimplicialCholesky<usize>>,
    L_values: Vec<E>,
    perm: Option<Perm<usize>>,
    ldlt: Option<SimplicialLdltRef<'static, usize, E>>,
    mat: Option<SparseColMat<usize, E>>,
    rhs_dim: usize,
    pending_rhs: Option<*mut E>,
}

impl LinearEngine for SparseCholeskyEngine {
    fn new() -> Self {
        Self {
            dim: 0,
            symbolic: None,
            L_values: Vec::new(),
            perm: None,
            ldlt: None,
            mat: None,
            rhs_dim: 0,
            pending_rhs: None,
        }
    }

    fn set_matrix(&mut self, matrix: &CsrMatrix) -> Result<(), Problem> {
        assert_eq!(matrix.rows(), matrix.cols(), "KKT matrix must be square");
        self.dim = matrix.rows();

        let mut triplets = Vec::with_capacity(matrix.values().len());
        let mut scratch = matrix.clone();
        scratch.for_each_existent_value(|r, c, v| {
            triplets.push(Triplet::new(r, c, *v));
        });

        let mat = SparseColMat::try_new_from_triplets(self.dim, self.dim, &triplets)
            .via(CholeskyError::MemoryAllocation)?;
        self.mat = Some(mat);
        Ok(())
    }

    fn set_rhs(&mut self, rhs: &mut [E]) -> Result<(), Problem> {
        self.rhs_dim = rhs.len();
        self.pending_rhs = Some(rhs.as_mut_ptr());
        Ok(())
    }

    fn call(&mut self, job: LinearJob) -> Result<LinearStatus, Problem> {
        match job {
            LinearJob::Analyze => self.do_analyze(),
            LinearJob::Factorize => self.do_factorize(),
            LinearJob::AnalyzeFactorize => {
                self.do_analyze()?;
                self.do_factorize()
            }
            LinearJob::FactorizeSolve => {
                self.do_factorize()?;
                self.do_solve()
            }
            LinearJob::Solve => self.do_solve(),
            LinearJob::End => {
                self.symbolic = None;
                self.ldlt = None;
                self.perm = None;
                self.mat = None;
                Ok(LinearStatus::Ok)
            }
        }
    }

    fn requires_symmetric_kkt(&self) -> bool {
        true
    }
}

impl SparseCholeskyEngine {
    fn mat_ref(&self) -> SparseColMatRef<usize, E> {
        self.mat.as_ref().expect("set_matrix must be called before analyze/factorize").as_ref()
    }

    fn do_analyze(&mut self) -> Result<LinearStatus, Problem> {
        let mat = self.mat_ref();
        let nnz = mat.compute_nnz();
        let dim = mat.ncols();

        let (perm_fwd, perm_inv) = {
            let mut perm = vec![0usize; dim];
            let mut perm_inv = vec![0usize; dim];
            let mut mem = MemBuffer::try_new(amd::order_scratch::<usize>(dim, nnz))
                .via(CholeskyError::MemoryAllocation)?;
            amd::order(
                &mut perm,
                &mut perm_inv,
                mat.symbolic(),
                amd::Control::default(),
                MemStack::new(&mut mem),
            )
            .via(CholeskyError::SymbolicFactorization)?;
            (perm, perm_inv)
        };

        self.perm = Some(unsafe {
            Perm::new_unchecked(perm_fwd.into_boxed_slice(), perm_inv.into_boxed_slice())
        });

        let mat_upper = get_mat_upper(mat, self.perm.rb().unwrap().as_ref())?;

        self.symbolic = Some({
            let mut mem = MemBuffer::try_new(StackReq::any_of(&[
                simplicial::prefactorize_symbolic_cholesky_scratch::<usize>(dim, nnz),
                simplicial::factorize_simplicial_symbolic_cholesky_scratch::<usize>(dim),
            ]))
            .via(CholeskyError::MemoryAllocation)?;
            let stack = MemStack::new(&mut mem);

            let mut etree = vec![0isize; dim];
            let mut col_counts = vec![0usize; dim];

            simplicial::prefactorize_symbolic_cholesky(
                &mut etree,
                &mut col_counts,
                mat_upper.symbolic(),
                stack,
            );
            simplicial::factorize_simplicial_symbolic_cholesky(
                mat_upper.symbolic(),
                unsafe { simplicial::EliminationTreeRef::from_inner(&etree) },
                &col_counts,
                stack,
            )
            .via(CholeskyError::SymbolicFactorization)?
        });

        Ok(LinearStatus::Ok)
    }

    fn do_factorize(&mut self) -> Result<LinearStatus, Problem> {
        let mat = self.mat_ref();
        let symbolic = self
            .symbolic
            .as_ref()
            .ok_or(CholeskyError::Uninitialized)?;
        let dim = mat.ncols();

        self.L_values = vec![0.0; symbolic.len_val()];
        let mat_upper = get_mat_upper(mat, self.perm.rb().unwrap().as_ref())?;

        let mut mem = MemBuffer::try_new(StackReq::all_of(&[
            simplicial::factorize_simplicial_numeric_ldlt_scratch::<usize, E>(dim),
        ]))
        .via(CholeskyError::MemoryAllocation)?;
        let stack = MemStack::new(&mut mem);

        let result = simplicial::factorize_simplicial_numeric_ldlt::<usize, E>(
            &mut self.L_values,
            mat_upper.rb(),
            LdltRegularization::default(),
            symbolic,
            stack,
        );
        if result.is_err() {
            return Ok(LinearStatus::SingularPivot);
        }

        // SAFETY: `symbolic` and `L_values` are owned by `self` and outlive
        // the reference for as long as `self` is not mutated again.
        self.ldlt = Some(unsafe {
            std::mem::transmute::<SimplicialLdltRef<'_, usize, E>, SimplicialLdltRef<'static, usize, E>>(
                SimplicialLdltRef::<'_, usize, E>::new(symbolic, &self.L_values),
            )
        });

        Ok(LinearStatus::Ok)
    }

    fn do_solve(&mut self) -> Result<LinearStatus, Problem> {
        let symbolic = self
            .symbolic
            .as_ref()
            .ok_or(CholeskyError::Uninitialized)?;
        let perm = self.perm.as_ref().ok_or(CholeskyError::Uninitialized)?;
        let ldlt = self.ldlt.as_ref().ok_or(CholeskyError::Uninitialized)?;
        let ptr = self.pending_rhs.ok_or(CholeskyError::Uninitialized)?;

        let dim = symbolic.ncols();
        assert_eq!(dim, self.rhs_dim, "rhs length must match KKT dimension");

        let mut sol = Mat::<E>::from_fn(dim, 1, |i, _| unsafe { *ptr.add(i) });

        let mut mem = MemBuffer::try_new(StackReq::all_of(&[
            faer::perm::permute_rows_in_place_scratch::<usize, E>(dim, 1),
            symbolic.solve_in_place_scratch::<E>(dim),
        ]))
        .via(CholeskyError::MemoryAllocation)?;
        let stack = MemStack::new(&mut mem);

        let mut sol_mut: MatMut<E> = sol.as_mut();
        faer::perm::permute_rows_in_place(sol_mut.rb_mut(), perm.as_ref(), stack);
        ldlt.solve_in_place_with_conj(faer::Conj::No, sol_mut.rb_mut(), faer::Par::Seq, stack);
        faer::perm::permute_rows_in_place(sol_mut.rb_mut(), perm.as_ref().inverse(), stack);

        for i in 0..dim {
            unsafe {
                *ptr.add(i) = sol[(i, 0)];
            }
        }

        Ok(LinearStatus::Ok)
    }
}

fn get_mat_upper(
    mat: SparseColMatRef<usize, E>,
    perm: PermRef<usize>,
) -> Result<SparseColMat<usize, E>, Problem> {
    let dim = mat.ncols();
    let nnz = mat.compute_nnz();

    let mut mat_col_ptrs = vec![0usize; dim + 1];
    let mut mat_row_indices = vec![0usize; nnz];
    let mut mat_values = vec![0.0f64; nnz];

    let mut mem = MemBuffer::try_new(faer::sparse::utils::permute_self_adjoint_scratch::<usize>(dim))
        .via(CholeskyError::MemoryAllocation)?;
    faer::sparse::utils::permute_self_adjoint_to_unsorted(
        &mut mat_values,
        &mut mat_col_ptrs,
        &mut mat_row_indices,
        mat.rb(),
        perm.rb(),
        faer::Side::Upper,
        faer::Side::Upper,
        MemStack::new(&mut mem),
    );

    Ok(SparseColMat::<usize, E>::new(
        unsafe { SymbolicSparseColMat::new_unchecked(dim, dim, mat_col_ptrs, None, mat_row_indices) },
        mat_values,
    ))
}
