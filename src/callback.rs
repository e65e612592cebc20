//! Per-iteration observability hooks for [`crate::ipsolver::IpSolver`].
//!
//! This crate has no tracing/log dependency; the callback *is* its logging
//! idiom, printed directly to stdout the way the teacher's own
//! `ConvergenceOutput` does.

use macros::build_option_enum;

use crate::ipsolver::IterationState;

/// Hook invoked once per solver iteration for logging, monitoring, or early stopping.
pub trait Callback {
    /// Creates a new callback instance.
    fn new() -> Self
    where
        Self: Sized;

    /// Called once before the first iteration.
    fn init(&mut self) {}

    /// Called at the end of each iteration with the current solver state.
    fn call(&mut self, state: &IterationState);

    /// Called once after the loop exits, successfully or not.
    fn finalize(&mut self) {}
}

/// A callback that does nothing. Use when no per-iteration output is needed.
pub struct NoOpCallback {}

impl Callback for NoOpCallback {
    fn new() -> Self {
        Self {}
    }

    fn call(&mut self, _state: &IterationState) {}
}

/// Prints a fixed-width convergence table to stdout each iteration.
pub struct ConvergenceOutput {
    printed_header: bool,
}

impl Callback for ConvergenceOutput {
    fn new() -> Self {
        Self {
            printed_header: false,
        }
    }

    fn init(&mut self) {
        println!(
            "| {:>4} | {:<10} | {:<10} | {:<10} | {:<8} | {:<8} |",
            "iter", "mu", "||rp||", "||rd||", "alpha_p", "alpha_d"
        );
        self.printed_header = true;
    }

    fn call(&mut self, state: &IterationState) {
        if !self.printed_header {
            self.init();
        }
        println!(
            "| {:>4} | {:<10.2e} | {:<10.2e} | {:<10.2e} | {:<8.2e} | {:<8.2e} |",
            state.iteration,
            state.mu,
            state.rp_norm,
            state.rd_norm,
            state.alpha_primal,
            state.alpha_dual,
        );
    }
}

build_option_enum!(
    trait_ = Callback,
    name = "Callbacks",
    variants = (NoOpCallback, ConvergenceOutput),
    new_arguments = (),
    doc_header = "Registry of per-iteration callbacks available to `IpSolver`."
);
