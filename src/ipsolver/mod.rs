//! The primal-dual predictor-corrector interior-point loop, parameterized
//! over the KKT layout used to assemble and factor the perturbed system each
//! iteration (see [`kkt`]).

pub mod kkt;

use std::str::FromStr;

use faer::Col;
use macros::{explicit_options, use_option};
use problemo::Problem;

use crate::descriptor::{AssemblyRequest, SystemDescriptor};
use crate::error::SolverError;
use crate::ipsolver::kkt::{KktAssembly, KktLayout};
use crate::linalg::vector_ops::{
    clamp_abs_at_least_one, cwise_multiply, cwise_quotient, is_col_positive, max_step_to_boundary,
};
use crate::linalg::{LinearEngine, LinearJob};
use crate::sparse::{CsrMatrix, SparsityLearner};
use crate::{E, I, SolveReport, SolveStatus, SolverHooks};

fn to_col(v: &[E]) -> Col<E> {
    Col::from_fn(v.len(), |i| v[i])
}

fn from_col(c: &Col<E>) -> Vec<E> {
    (0..c.nrows()).map(|i| c[i]).collect()
}

fn dot(a: &[E], b: &[E]) -> E {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm_l2(v: &[E]) -> E {
    dot(v, v).sqrt()
}

/// Selects one of the three KKT layouts of spec section 4.4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KktMethod {
    Standard,
    Augmented,
    Normal,
}

impl crate::OptionTrait for KktMethod {}

impl FromStr for KktMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Standard" => Ok(KktMethod::Standard),
            "Augmented" => Ok(KktMethod::Augmented),
            "Normal" => Ok(KktMethod::Normal),
            other => Err(format!("unknown KKT method '{other}'")),
        }
    }
}

/// Per-iteration snapshot handed to a [`crate::callback::Callback`].
#[derive(Debug, Clone, Copy)]
pub struct IterationState {
    pub iteration: usize,
    pub mu: E,
    pub rp_norm: E,
    pub rd_norm: E,
    pub alpha_primal: E,
    pub alpha_dual: E,
}

#[explicit_options(name = IpSolverOptions)]
#[use_option(name = "kkt_method", type_ = KktMethod, default = "Augmented", description = "KKT layout used to assemble the perturbed system")]
#[use_option(name = "iter_max", type_ = I, default = "50", description = "Hard cap on outer iterations")]
#[use_option(name = "rp_tol", type_ = E, default = "1e-8", description = "Primal residual tolerance")]
#[use_option(name = "rd_tol", type_ = E, default = "1e-8", description = "Dual residual tolerance")]
#[use_option(name = "mu_tol", type_ = E, default = "1e-8", description = "Complementarity gap tolerance")]
#[use_option(name = "equal_step_length", type_ = bool, default = "false", description = "Force alpha_p = alpha_d = min(alpha_p, alpha_d)")]
#[use_option(name = "adaptive_eta", type_ = bool, default = "false", description = "Use an iteration-dependent eta instead of a fixed 0.95")]
#[use_option(name = "only_predict", type_ = bool, default = "false", description = "Skip the corrector solve, for benchmarking")]
#[use_option(name = "warm_start", type_ = bool, default = "false", description = "Reuse the prior (x, y, lam) when (n, m) are unchanged")]
#[use_option(name = "add_compliance", type_ = bool, default = "false", description = "Include the compliance block in the augmented/standard diagonal")]
#[use_option(name = "skip_contacts_uv", type_ = bool, default = "false", description = "Strip friction-tangent rows during assembly, re-pad on emit")]
pub struct IpSolver {
    engine: Box<dyn LinearEngine>,
    kkt: KktLayout,

    n: usize,
    m: usize,

    g: CsrMatrix,
    a: CsrMatrix,
    compliance: Option<CsrMatrix>,

    c: Vec<E>,
    b: Vec<E>,

    x: Vec<E>,
    y: Vec<E>,
    lam: Vec<E>,
    rp: Vec<E>,
    rd: Vec<E>,

    rhs_buf: Vec<E>,
}

impl IpSolver {
    pub fn new(engine: Box<dyn LinearEngine>, options: &crate::Options) -> Self {
        let internal: IpSolverInternalOptions = options.into();
        let kkt = match internal.kkt_method {
            KktMethod::Standard => KktLayout::new_standard(),
            KktMethod::Augmented => KktLayout::new_augmented(),
            KktMethod::Normal => KktLayout::new_normal(),
        };
        Self {
            engine,
            kkt,
            n: 0,
            m: 0,
            g: CsrMatrix::default(),
            a: CsrMatrix::default(),
            compliance: None,
            c: Vec::new(),
            b: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            lam: Vec::new(),
            rp: Vec::new(),
            rd: Vec::new(),
            rhs_buf: Vec::new(),
            options: internal,
        }
    }

    /// Runs a full `Solve` call per spec section 4.4, writing the result
    /// back into `descriptor` and returning a summary report.
    pub fn solve(
        &mut self,
        descriptor: &mut dyn SystemDescriptor,
        hooks: &mut SolverHooks,
    ) -> Result<SolveReport, Problem> {
        let n = descriptor.count_active_variables();
        let m = descriptor.count_active_constraints(true, self.options.skip_contacts_uv);
        let resized = n != self.n || m != self.m;
        self.n = n;
        self.m = m;

        self.assemble(descriptor, resized)?;

        if m == 0 {
            return self.solve_degenerate(descriptor);
        }

        if resized || !self.options.warm_start {
            self.initialize_starting_point()?;
        }

        hooks.callback.init();

        let mut status = SolveStatus::NonConvergent;
        let mut last_iter = 0usize;
        let mut mu = 0.0;

        for iter in 0..self.options.iter_max {
            last_iter = iter + 1;
            let (iter_mu, alpha_p, alpha_d) = self.iterate()?;
            mu = iter_mu;

            let rp_norm = norm_l2(&self.rp) / (self.m as E);
            let rd_norm = norm_l2(&self.rd) / (self.n as E);

            hooks.callback.call(&IterationState {
                iteration: last_iter,
                mu,
                rp_norm,
                rd_norm,
                alpha_primal: alpha_p,
                alpha_dual: alpha_d,
            });

            if mu < self.options.mu_tol
                && rp_norm < self.options.rp_tol
                && rd_norm < self.options.rd_tol
            {
                status = SolveStatus::Optimal;
                break;
            }

            if hooks.terminator.terminate().is_some() {
                break;
            }
        }

        hooks.callback.finalize();
        self.emit_solution(descriptor);

        let objective = self.objective();
        Ok(SolveReport {
            status,
            iterations: last_iter,
            objective,
            mu,
        })
    }

    fn assemble(
        &mut self,
        descriptor: &dyn SystemDescriptor,
        resized: bool,
    ) -> Result<(), Problem> {
        let n = self.n;
        let m = self.m;
        let request = AssemblyRequest {
            matrix: resized,
            rhs: true,
            compliance: self.options.add_compliance,
            only_bilateral: false,
            skip_contacts_uv: self.options.skip_contacts_uv,
        };

        if resized {
            let mut g_learner = SparsityLearner::new(n);
            descriptor.learn_hessian_sparsity(&mut g_learner, request);
            let mut g = CsrMatrix::new(n, n, true);
            g.load_sparsity_pattern(&g_learner.sparsity_pattern());

            let mut a_learner = SparsityLearner::new(m);
            descriptor.learn_jacobian_sparsity(&mut a_learner, request);
            let mut a = CsrMatrix::new(m, n, true);
            a.load_sparsity_pattern(&a_learner.sparsity_pattern());

            self.g = g;
            self.a = a;
            self.compliance = if self.options.add_compliance {
                let mut cm = CsrMatrix::new(m, m, true);
                for i in 0..m {
                    cm.set_element(i, i, 0.0, true)?;
                }
                Some(cm)
            } else {
                None
            };
        }

        let mut c = vec![0.0; n];
        let mut b = vec![0.0; m];
        descriptor.convert_to_matrix_form(
            Some(&mut self.g),
            Some(&mut self.a),
            self.compliance.as_mut(),
            Some(&mut c),
            Some(&mut b),
            request,
        );
        // descriptor's sign convention is inverted from Nocedal's.
        self.c = c.iter().map(|v| -v).collect();
        self.b = b.iter().map(|v| -v).collect();

        if resized {
            self.kkt.build(
                n,
                m,
                &self.g,
                &self.a,
                self.compliance.as_ref(),
                self.engine.requires_symmetric_kkt(),
            )?;
            self.rhs_buf = vec![0.0; self.kkt.dim()];
        }

        Ok(())
    }

    fn solve_degenerate(
        &mut self,
        descriptor: &mut dyn SystemDescriptor,
    ) -> Result<SolveReport, Problem> {
        let n = self.n;
        let mut rhs = vec![0.0; n];
        for i in 0..n {
            rhs[i] = -self.c[i];
        }
        self.engine.set_matrix(&self.g)?;
        self.engine.set_rhs(&mut rhs)?;
        self.engine.call(LinearJob::AnalyzeFactorize)?;
        self.engine.call(LinearJob::Solve)?;

        self.x = rhs.clone();
        descriptor.from_vector_to_unknowns(&rhs, &[], self.options.skip_contacts_uv);

        Ok(SolveReport {
            status: SolveStatus::Optimal,
            iterations: 0,
            objective: self.objective(),
            mu: 0.0,
        })
    }

    fn initialize_starting_point(&mut self) -> Result<(), Problem> {
        let n = self.n;
        let m = self.m;

        self.x = vec![1.0; n];
        self.lam = vec![1.0; m];
        let mut ax = vec![0.0; m];
        self.a.mat_multiply(&self.x, &mut ax);
        self.y = (0..m).map(|i| ax[i] - self.b[i]).collect();

        self.update_residuals();

        let rpd_col = cwise_multiply(to_col(&self.y).as_ref(), to_col(&self.lam).as_ref());
        let rpd = from_col(&rpd_col);
        let (dx, dlam) = self.newton_solve(&rpd, None)?;
        let dy = self.derive_dy(&dx, &dlam);

        for i in 0..m {
            self.y[i] += dy[i];
            self.lam[i] += dlam[i];
        }
        let mut y_col = to_col(&self.y);
        clamp_abs_at_least_one(&mut y_col);
        self.y = from_col(&y_col);
        let mut lam_col = to_col(&self.lam);
        clamp_abs_at_least_one(&mut lam_col);
        self.lam = from_col(&lam_col);

        self.update_residuals();
        Ok(())
    }

    /// `sigma_correction == None` is the affine (predictor) solve;
    /// `Some(correction)` folds it into the complementarity perturbation for
    /// a centered solve.
    fn newton_solve(
        &mut self,
        rpd: &[E],
        sigma_correction: Option<&[E]>,
    ) -> Result<(Vec<E>, Vec<E>), Problem> {
        self.kkt.refresh_diagonal(&self.y, &self.lam)?;
        self.engine.set_matrix(self.kkt.matrix())?;

        let mut rpd_rhs: Vec<E> = rpd.to_vec();
        if let Some(correction) = sigma_correction {
            for i in 0..rpd_rhs.len() {
                rpd_rhs[i] += correction[i];
            }
        }

        let fold = if matches!(self.kkt, KktLayout::Augmented(_)) {
            // AUGMENTED eliminates Dy via Dy = A Dx + rp, which divides the
            // bottom-stripe equation through by lam: `-rpd/lam` replaces the
            // STANDARD layout's own `-rpd` term. See `kkt::AugmentedKkt`.
            let quotient = cwise_quotient(to_col(&rpd_rhs).as_ref(), to_col(&self.lam).as_ref());
            (0..self.m).map(|i| -quotient[i]).collect()
        } else {
            rpd_rhs
        };

        self.kkt.fill_rhs(&self.rd, &self.rp, &fold, &mut self.rhs_buf);
        self.engine.set_rhs(&mut self.rhs_buf)?;
        self.engine.call(LinearJob::AnalyzeFactorize)?;
        let status = self.engine.call(LinearJob::Solve)?;
        if status != crate::error::LinearStatus::Ok {
            return Err(SolverError::LinearEngine(status).into());
        }

        Ok(self.kkt.extract_step(&self.rhs_buf))
    }

    fn derive_dy(&self, dx: &[E], dlam: &[E]) -> Vec<E> {
        let mut a_dx = vec![0.0; self.m];
        self.a.mat_multiply(dx, &mut a_dx);
        let mut dy: Vec<E> = (0..self.m).map(|i| a_dx[i] + self.rp[i]).collect();
        if let Some(compliance) = &self.compliance {
            let mut e_dlam = vec![0.0; self.m];
            compliance.mat_multiply(dlam, &mut e_dlam);
            for i in 0..self.m {
                dy[i] += e_dlam[i];
            }
        }
        dy
    }

    /// Runs one predictor-corrector iteration; returns `(mu, alpha_p, alpha_d)`
    /// from the final (accepted) step.
    fn iterate(&mut self) -> Result<(E, E, E), Problem> {
        let rpd_col = cwise_multiply(to_col(&self.y).as_ref(), to_col(&self.lam).as_ref());
        let rpd = from_col(&rpd_col);

        let (dx_aff, dlam_aff) = self.newton_solve(&rpd, None)?;
        let dy_aff = self.derive_dy(&dx_aff, &dlam_aff);

        let alpha_p_aff = max_step_to_boundary(to_col(&self.y).as_ref(), to_col(&dy_aff).as_ref(), 1.0);
        let alpha_d_aff =
            max_step_to_boundary(to_col(&self.lam).as_ref(), to_col(&dlam_aff).as_ref(), 1.0);

        let y_pred: Vec<E> = (0..self.m).map(|i| self.y[i] + alpha_p_aff * dy_aff[i]).collect();
        let lam_pred: Vec<E> =
            (0..self.m).map(|i| self.lam[i] + alpha_d_aff * dlam_aff[i]).collect();
        let mu = dot(&self.y, &self.lam) / (self.m as E);
        let mu_pred = dot(&y_pred, &lam_pred) / (self.m as E);

        let (dx, dlam, dy) = if self.options.only_predict {
            (dx_aff, dlam_aff, dy_aff)
        } else {
            let sigma = (mu_pred / mu).powi(3);
            let correction: Vec<E> = (0..self.m)
                .map(|i| dy_aff[i] * dlam_aff[i] - sigma * mu)
                .collect();
            let (dx, dlam) = self.newton_solve(&rpd, Some(&correction))?;
            let dy = self.derive_dy(&dx, &dlam);
            (dx, dlam, dy)
        };

        let eta = if self.options.adaptive_eta {
            E::exp(-mu * self.m as E) * 0.1 + 0.9
        } else {
            0.95
        };

        let mut alpha_p = max_step_to_boundary(to_col(&self.y).as_ref(), to_col(&dy).as_ref(), eta);
        let mut alpha_d =
            max_step_to_boundary(to_col(&self.lam).as_ref(), to_col(&dlam).as_ref(), eta);
        if self.options.equal_step_length {
            let alpha = alpha_p.min(alpha_d);
            alpha_p = alpha;
            alpha_d = alpha;
        }

        for i in 0..self.n {
            self.x[i] += alpha_p * dx[i];
        }
        for i in 0..self.m {
            self.y[i] += alpha_p * dy[i];
            self.lam[i] += alpha_d * dlam[i];
        }

        for v in self.rp.iter_mut() {
            *v *= 1.0 - alpha_p;
        }
        let mut g_dx = vec![0.0; self.n];
        self.g.mat_multiply(&dx, &mut g_dx);
        for i in 0..self.n {
            self.rd[i] = (1.0 - alpha_d) * self.rd[i] + (alpha_p - alpha_d) * g_dx[i];
        }
        let final_mu = dot(&self.y, &self.lam) / (self.m as E);

        if !is_col_positive(to_col(&self.y).as_ref()) || !is_col_positive(to_col(&self.lam).as_ref()) {
            return Err(SolverError::InfeasibleStart.into());
        }

        Ok((final_mu, alpha_p, alpha_d))
    }

    fn update_residuals(&mut self) {
        let n = self.n;
        let m = self.m;

        let mut g_x = vec![0.0; n];
        self.g.mat_multiply(&self.x, &mut g_x);

        let mut at_lam = vec![0.0; n];
        let mut scratch = self.a.clone();
        scratch.for_each_existent_value(|r, c, v| {
            at_lam[c] += *v * self.lam[r];
        });
        self.rd = (0..n).map(|i| g_x[i] - at_lam[i] + self.c[i]).collect();

        let mut a_x = vec![0.0; m];
        self.a.mat_multiply(&self.x, &mut a_x);
        self.rp = (0..m).map(|i| a_x[i] - self.y[i] - self.b[i]).collect();
    }

    fn objective(&self) -> E {
        let mut g_x = vec![0.0; self.n];
        self.g.mat_multiply(&self.x, &mut g_x);
        0.5 * dot(&self.x, &g_x) + dot(&self.x, &self.c)
    }

    fn emit_solution(&self, descriptor: &mut dyn SystemDescriptor) {
        let lagrangian: Vec<E> = (0..self.m).map(|i| -self.lam[i]).collect();
        descriptor.from_vector_to_unknowns(
            &self.x,
            &lagrangian,
            self.options.skip_contacts_uv,
        );
    }
}
