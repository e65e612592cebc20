//! Sparse LU factorization bridging [`CsrMatrix`] into `faer`'s simplicial LU
//! path. Useful when a caller needs a genuinely indefinite direct solve
//! rather than the LDLT path in [`crate::linalg::cholesky`].

use faer::dyn_stack::{MemBuffer, MemStack};
use faer::perm::Perm;
use faer::prelude::{Reborrow, ReborrowMut};
use faer::sparse::linalg::colamd;
use faer::sparse::linalg::lu::simplicial::{self, SimplicialLu};
use faer::sparse::{SparseColMat, SparseColMatRef, Triplet};
use faer::{Mat, MatMut};
use problemo::{Problem, ProblemResult};

use derive_more::{Display, Error};

use crate::E;
use crate::error::LinearStatus;
use crate::linalg::solver::{LinearEngine, LinearJob};
use crate::sparse::CsrMatrix;

#[derive(Debug, Display, Error, PartialEq)]
pub enum LuError {
    #[display("symbolic factorization error")]
    SymbolicFactorization,
    #[display("LU factorization error")]
    LuFactorization,
    #[display("solve requested before analyze/factorize")]
    Uninitialized,
    #[display("memory reservation failed")]
    MemoryReservation,
    #[display("memory allocation failed")]
    MemoryAllocation,
}

#[allow(non_snake_case)]
pub struct SparseLuEngine {
    mat: Option<SparseColMat<usize, E>>,
    lu: Option<SimplicialLu<usize, E>>,
    row_perm: Option<Perm<usize>>,
    col_perm: Option<Perm<usize>>,
    dim: usize,
    pending_rhs: Option<*mut E>,
    rhs_dim: usize,
}

impl LinearEngine for SparseLuEngine {
    fn new() -> Self {
        Self {
            mat: None,
            lu: None,
            row_perm: None,
            col_perm: None,
            dim: 0,
            pending_rhs: None,
            rhs_dim: 0,
        }
    }

    fn set_matrix(&mut self, matrix: &CsrMatrix) -> Result<(), Problem> {
        assert_eq!(matrix.rows(), matrix.cols(), "KKT matrix must be square");
        self.dim = matrix.rows();

        let mut triplets = Vec::with_capacity(matrix.values().len());
        let mut scratch = matrix.clone();
        scratch.for_each_existent_value(|r, c, v| triplets.push(Triplet::new(r, c, *v)));

        self.mat = Some(
            SparseColMat::try_new_from_triplets(self.dim, self.dim, &triplets)
                .via(LuError::MemoryAllocation)?,
        );
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
                self.lu = None;
                self.row_perm = None;
                self.col_perm = None;
                self.mat = None;
                Ok(LinearStatus::Ok)
            }
        }
    }

    fn requires_symmetric_kkt(&self) -> bool {
        false
    }
}

impl SparseLuEngine {
    fn mat_ref(&self) -> SparseColMatRef<usize, E> {
        self.mat.as_ref().expect("set_matrix must precede analyze/factorize").as_ref()
    }

    fn do_analyze(&mut self) -> Result<LinearStatus, Problem> {
        let mat = self.mat_ref();
        let nrows = mat.nrows();
        let ncols = mat.ncols();
        let nnz = mat.compute_nnz();

        let (col_perm_fwd, col_perm_inv) = {
            let mut perm = vec![0usize; ncols];
            let mut perm_inv = vec![0usize; ncols];
            let mut mem = MemBuffer::try_new(colamd::order_scratch::<usize>(nrows, ncols, nnz))
                .via(LuError::MemoryAllocation)?;

            colamd::order(
                &mut perm,
                &mut perm_inv,
                mat.symbolic(),
                colamd::Control::default(),
                MemStack::new(&mut mem),
            )
            .via(LuError::SymbolicFactorization)?;
            (perm, perm_inv)
        };

        self.col_perm = Some(unsafe {
            Perm::new_unchecked(col_perm_fwd.into_boxed_slice(), col_perm_inv.into_boxed_slice())
        });
        Ok(LinearStatus::Ok)
    }

    fn do_factorize(&mut self) -> Result<LinearStatus, Problem> {
        let mat = self.mat_ref();
        let col_perm = self.col_perm.as_ref().ok_or(LuError::Uninitialized)?;

        let nrows = mat.nrows();
        let ncols = mat.ncols();

        let mut row_perm = vec![0usize; nrows];
        let mut row_perm_inv = vec![0usize; nrows];
        let mut lu = SimplicialLu::new();

        let mut mem = MemBuffer::try_new(
            simplicial::factorize_simplicial_numeric_lu_scratch::<usize, E>(nrows, ncols),
        )
        .via(LuError::MemoryAllocation)?;
        let mut stack = MemStack::new(&mut mem);

        let result = simplicial::factorize_simplicial_numeric_lu::<usize, E>(
            &mut row_perm,
            &mut row_perm_inv,
            &mut lu,
            mat.rb(),
            col_perm.as_ref(),
            &mut stack,
        );
        if result.is_err() {
            return Ok(LinearStatus::SingularPivot);
        }

        self.row_perm = Some(unsafe {
            Perm::new_unchecked(row_perm.into_boxed_slice(), row_perm_inv.into_boxed_slice())
        });
        self.lu = Some(lu);
        Ok(LinearStatus::Ok)
    }

    fn do_solve(&mut self) -> Result<LinearStatus, Problem> {
        let lu = self.lu.as_ref().ok_or(LuError::Uninitialized)?;
        let row_perm = self.row_perm.as_ref().ok_or(LuError::Uninitialized)?;
        let col_perm = self.col_perm.as_ref().ok_or(LuError::Uninitialized)?;
        let ptr = self.pending_rhs.ok_or(LuError::Uninitialized)?;

        let nrows = lu.nrows();
        assert_eq!(nrows, self.rhs_dim, "rhs length must match matrix dimension");

        let mut sol = Mat::<E>::from_fn(nrows, 1, |i, _| unsafe { *ptr.add(i) });
        let mut work = Mat::zeros(nrows, 1);

        let sol_mut: MatMut<E> = sol.as_mut();
        lu.solve_in_place_with_conj(
            row_perm.as_ref(),
            col_perm.as_ref(),
            faer::Conj::No,
            sol_mut,
            faer::Par::Seq,
            work.as_mut(),
        );

        for i in 0..nrows {
            unsafe {
                *ptr.add(i) = sol[(i, 0)];
            }
        }
        Ok(LinearStatus::Ok)
    }
}
