//! # Primal-Dual Interior-Point QP Solver
//!
//! This crate solves the convex quadratic program
//!
//! ```text
//! minimize   1/2 x^T G x + c^T x
//! subject to A x >= b
//! ```
//!
//! arising from multibody contact problems, using a Mehrotra-style
//! predictor-corrector interior-point method. Two subsystems make up the
//! bulk of the crate:
//!
//! - [`sparse`]: a compressed-sparse-row matrix engine with gap-tolerant
//!   incremental construction and sparsity-pattern reuse.
//! - [`ipsolver`]: the interior-point loop itself, parameterized over the
//!   KKT layout used to assemble and solve the perturbed KKT system each
//!   iteration.
//!
//! The concrete sparse factorization is abstracted behind [`linalg::LinearEngine`]
//! so that the interior-point loop never depends on a specific direct solver.

use std::any::Any;

use dyn_clone::DynClone;
use macros::build_options;

pub type E = f64;
pub type I = usize;

pub mod callback;
pub mod descriptor;
pub mod error;
pub mod ipsolver;
pub mod linalg;
pub mod sparse;
pub mod terminators;

/// Marker trait for values that may be stored as a solver option.
pub trait OptionTrait: Any + Sync + Send + DynClone {}
impl OptionTrait for &'static str {}
impl OptionTrait for String {}
impl OptionTrait for bool {}
impl OptionTrait for usize {}
impl OptionTrait for u8 {}
impl OptionTrait for u16 {}
impl OptionTrait for u32 {}
impl OptionTrait for u64 {}
impl OptionTrait for i8 {}
impl OptionTrait for i16 {}
impl OptionTrait for i32 {}
impl OptionTrait for i64 {}
impl OptionTrait for f32 {}
impl OptionTrait for f64 {}

impl Clone for Box<dyn OptionTrait> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

/// Bundles the per-iteration observer and the cooperative stop condition that
/// an `IpSolver::solve` call consults, mirroring the teacher's `SolverHooks`.
pub struct SolverHooks {
    pub callback: Box<dyn crate::callback::Callback>,
    pub terminator: Box<dyn crate::terminators::Terminator>,
}

impl SolverHooks {
    pub fn new(
        callback: Box<dyn crate::callback::Callback>,
        terminator: Box<dyn crate::terminators::Terminator>,
    ) -> Self {
        Self {
            callback,
            terminator,
        }
    }
}

/// Outcome of a `Solve` call that did not error.
///
/// `NonConvergent` is not an error: the current best iterate is still
/// written back to the descriptor so a multibody integrator can proceed
/// with a degraded step.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum SolveStatus {
    #[default]
    Optimal,
    NonConvergent,
}

/// Summary of a completed `Solve` call.
#[derive(Debug, Clone, Copy)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub iterations: usize,
    pub objective: E,
    pub mu: E,
}

build_options!(registry_name = OPTION_REGISTRY);
