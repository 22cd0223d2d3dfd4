use super::tp_flash::{FlashIterate, MAX_ITER_TP, TOL_TP};
use super::{FlashOptions, PhaseEquilibrium};
use crate::cubic::CubicEos;
use crate::errors::{EosError, EosResult};
use crate::solver::{broyden, newton};
use crate::state::{MixtureState, Phase};
use ndarray::{s, Array1, Array2, Zip};
use std::sync::Arc;

/// Compositions for given $\ln K_i$ and vapor fraction (appended as last
/// entry of `unknowns`) before normalization.
struct FlashVariables {
    k: Array1<f64>,
    beta: f64,
    denominator: Array1<f64>,
    x: Array1<f64>,
    y: Array1<f64>,
}

impl FlashVariables {
    fn new(feed: &Array1<f64>, unknowns: &Array1<f64>) -> Self {
        let n = feed.len();
        let k = unknowns.slice(s![..n]).mapv(f64::exp);
        let beta = unknowns[n];
        let denominator = k.mapv(|k| 1.0 + beta * (k - 1.0));
        let x = feed / &denominator;
        let y = &x * &k;
        Self {
            k,
            beta,
            denominator,
            x,
            y,
        }
    }
}

/// # Flash calculations
impl PhaseEquilibrium {
    /// Perform a Tp-flash calculation with a Newton solver for the
    /// logarithmic equilibrium ratios and the vapor fraction.
    pub fn tp_flash_newton(
        eos: &Arc<CubicEos>,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
    ) -> EosResult<Self> {
        let feed = feed / feed.sum();
        MixtureState::new_tp(eos, temperature, pressure, &feed)?
            .tp_flash_newton(initial_compositions, options)
    }

    /// Perform a Tp-flash calculation with Broyden's method starting from the
    /// analytic Jacobian.
    pub fn tp_flash_broyden(
        eos: &Arc<CubicEos>,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
    ) -> EosResult<Self> {
        let feed = feed / feed.sum();
        MixtureState::new_tp(eos, temperature, pressure, &feed)?
            .tp_flash_broyden(initial_compositions, options)
    }
}

/// # Flash calculations
impl MixtureState {
    /// Perform a Tp-flash calculation with a Newton solver using the
    /// [MixtureState] as feed.
    ///
    /// A few steps of successive substitution precede the Newton iteration.
    pub fn tp_flash_newton(
        &self,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
    ) -> EosResult<PhaseEquilibrium> {
        self.tp_flash_coupled(initial_compositions, options, false)
    }

    /// Perform a Tp-flash calculation with Broyden's method using the
    /// [MixtureState] as feed.
    pub fn tp_flash_broyden(
        &self,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
    ) -> EosResult<PhaseEquilibrium> {
        self.tp_flash_coupled(initial_compositions, options, true)
    }

    fn tp_flash_coupled(
        &self,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
        quasi_newton: bool,
    ) -> EosResult<PhaseEquilibrium> {
        let verbosity = options.solver.verbosity;
        let name = if quasi_newton {
            "TP flash (Broyden)"
        } else {
            "TP flash (Newton)"
        };

        let mut iterate = self.initial_iterate(initial_compositions)?;
        let mut iter = 0;
        if let Some(vle) = self.successive_substitution(
            &mut iterate,
            options.warmup_steps,
            &mut iter,
            TOL_TP,
            options.trivial_tol,
            verbosity,
        )? {
            log_result!(
                verbosity,
                "{}: converged in {} step(s) of successive substitution\n",
                name,
                iter
            );
            return Ok(vle);
        }

        // a vapor fraction at its bound has no two-phase root to converge to
        if iterate.beta == 0.0 || iterate.beta == 1.0 {
            return self.finish_successive_substitution(iterate, iter, options, name);
        }

        let n = self.eos.components();
        let mut x0 = Array1::zeros(n + 1);
        x0.slice_mut(s![..n]).assign(&Zip::from(&iterate.y).and(&iterate.x).map_collect(
            |&y, &x| {
                if x > 0.0 && y > 0.0 {
                    (y / x).ln()
                } else {
                    0.0
                }
            },
        ));
        x0[n] = iterate.beta;

        let warmup = FlashIterate {
            beta: iterate.beta,
            x: iterate.x.clone(),
            y: iterate.y.clone(),
        };
        let (solution, newton_iter) = if quasi_newton {
            let (_, jacobian) = self.flash_residual(&x0, true)?;
            let jacobian =
                jacobian.ok_or_else(|| EosError::IterationFailed(name.to_owned()))?;
            broyden(
                |u| Ok(self.flash_residual(u, false)?.0),
                x0,
                jacobian,
                options.solver,
                name,
            )?
        } else {
            newton(
                |u| {
                    let (res, jacobian) = self.flash_residual(u, true)?;
                    let jacobian =
                        jacobian.ok_or_else(|| EosError::IterationFailed(name.to_owned()))?;
                    Ok((res, jacobian))
                },
                x0,
                options.solver,
                name,
            )?
        };

        let vars = FlashVariables::new(&self.molefracs, &solution);
        if !(0.0..=1.0).contains(&vars.beta) {
            log_result!(verbosity, "{}: vapor fraction {} outside of [0, 1]\n", name, vars.beta);
            return self.finish_successive_substitution(warmup, iter, options, name);
        }
        let x = &vars.x / vars.x.sum();
        let y = &vars.y / vars.y.sum();
        if PhaseEquilibrium::is_trivial_solution(&x, &y, options.trivial_tol) {
            return Err(EosError::TrivialSolution);
        }
        let liquid = self.to_zs_tp(&x, self.temperature, self.pressure)?;
        let vapor = self.to_zs_tp(&y, self.temperature, self.pressure)?;
        let (_, liquid_phase) = liquid.ln_phi_branch(Phase::Liquid)?;
        let (_, vapor_phase) = vapor.ln_phi_branch(Phase::Vapor)?;
        log_result!(verbosity, "{}: converged in {} step(s)\n", name, iter + newton_iter);
        Ok(PhaseEquilibrium::new(
            vars.beta,
            (liquid, liquid_phase),
            (vapor, vapor_phase),
            iter + newton_iter,
        ))
    }

    /// Continue with successive substitution, which also resolves single
    /// phase feeds.
    fn finish_successive_substitution(
        &self,
        mut iterate: FlashIterate,
        mut iter: usize,
        options: FlashOptions,
        name: &str,
    ) -> EosResult<PhaseEquilibrium> {
        let verbosity = options.solver.verbosity;
        match self.successive_substitution(
            &mut iterate,
            MAX_ITER_TP,
            &mut iter,
            TOL_TP,
            options.trivial_tol,
            verbosity,
        )? {
            Some(vle) => {
                log_result!(verbosity, "{}: converged in {} step(s)\n", name, iter);
                Ok(vle)
            }
            None => Err(EosError::NotConverged(name.to_owned())),
        }
    }

    /// Residual of the coupled equilibrium conditions
    ///
    /// $$\ln K_i+\ln\varphi_i^V(y)-\ln\varphi_i^L(x)=0,\qquad\sum_i\left(y_i-x_i\right)=0$$
    ///
    /// and optionally its Jacobian with respect to $\ln K_i$ and $\beta$.
    fn flash_residual(
        &self,
        unknowns: &Array1<f64>,
        with_jacobian: bool,
    ) -> EosResult<(Array1<f64>, Option<Array2<f64>>)> {
        let n = self.eos.components();
        let z = &self.molefracs;
        let vars = FlashVariables::new(z, unknowns);
        let (sx, sy) = (vars.x.sum(), vars.y.sum());
        let invalid = vars
            .x
            .iter()
            .chain(vars.y.iter())
            .any(|v| v.is_nan() || *v < 0.0);
        if invalid || sx <= 0.0 || sy <= 0.0 {
            return Err(EosError::IterationFailed("TP flash".to_owned()));
        }
        let liquid = self.to_zs_tp(&(&vars.x / sx), self.temperature, self.pressure)?;
        let vapor = self.to_zs_tp(&(&vars.y / sy), self.temperature, self.pressure)?;

        let mut res = Array1::zeros(n + 1);
        if !with_jacobian {
            let (ln_phi_l, _) = liquid.ln_phi_branch(Phase::Liquid)?;
            let (ln_phi_v, _) = vapor.ln_phi_branch(Phase::Vapor)?;
            res.slice_mut(s![..n])
                .assign(&(&unknowns.slice(s![..n]) + &ln_phi_v - &ln_phi_l));
            res[n] = (&vars.y - &vars.x).sum();
            return Ok((res, None));
        }

        let (ln_phi_l, dln_phi_l, _) = liquid.ln_phi_dnj_branch(Phase::Liquid)?;
        let (ln_phi_v, dln_phi_v, _) = vapor.ln_phi_dnj_branch(Phase::Vapor)?;
        res.slice_mut(s![..n])
            .assign(&(&unknowns.slice(s![..n]) + &ln_phi_v - &ln_phi_l));
        res[n] = (&vars.y - &vars.x).sum();

        // derivatives of the unnormalized compositions
        let beta = vars.beta;
        let d2 = &vars.denominator * &vars.denominator;
        let dx_dlnk = Zip::from(z)
            .and(&vars.k)
            .and(&d2)
            .map_collect(|&z, &k, &d2| -z * beta * k / d2);
        let dy_dlnk = Zip::from(z)
            .and(&vars.k)
            .and(&d2)
            .map_collect(|&z, &k, &d2| z * k * (1.0 - beta) / d2);
        let dx_dbeta = Zip::from(z)
            .and(&vars.k)
            .and(&d2)
            .map_collect(|&z, &k, &d2| -z * (k - 1.0) / d2);
        let dy_dbeta = &dx_dbeta * &vars.k;
        // ln(phi) is homogeneous of degree zero in the mole numbers
        let dln_phi_l = dln_phi_l / sx;
        let dln_phi_v = dln_phi_v / sy;

        let mut jacobian = Array2::zeros([n + 1, n + 1]);
        for i in 0..n {
            for k in 0..n {
                jacobian[[i, k]] =
                    dln_phi_v[[i, k]] * dy_dlnk[k] - dln_phi_l[[i, k]] * dx_dlnk[k];
            }
            jacobian[[i, i]] += 1.0;
            jacobian[[i, n]] = dln_phi_v.row(i).dot(&dy_dbeta) - dln_phi_l.row(i).dot(&dx_dbeta);
            jacobian[[n, i]] = dy_dlnk[i] - dx_dlnk[i];
        }
        jacobian[[n, n]] = (&dy_dbeta - &dx_dbeta).sum();
        Ok((res, Some(jacobian)))
    }
}
