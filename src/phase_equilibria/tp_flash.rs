use super::{phase_compositions, rachford_rice, FlashOptions, PhaseEquilibrium};
use crate::cubic::CubicEos;
use crate::errors::{EosError, EosResult};
use crate::state::{MixtureState, Phase};
use crate::Verbosity;
use ndarray::{Array1, Zip};
use std::sync::Arc;

pub(super) const MAX_ITER_TP: usize = 1000;
pub(super) const TOL_TP: f64 = 1e-13;

/// Intermediate result of the successive substitution.
pub(super) struct FlashIterate {
    pub beta: f64,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

/// # Flash calculations
impl PhaseEquilibrium {
    /// Perform a Tp-flash calculation with successive substitution.
    ///
    /// If no initial compositions `(x, y)` are given, the iteration starts from
    /// Wilson's equilibrium ratios.
    pub fn tp_flash(
        eos: &Arc<CubicEos>,
        temperature: f64,
        pressure: f64,
        feed: &Array1<f64>,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
    ) -> EosResult<Self> {
        let feed = feed / feed.sum();
        MixtureState::new_tp(eos, temperature, pressure, &feed)?
            .tp_flash(initial_compositions, options)
    }
}

/// # Flash calculations
impl MixtureState {
    /// Perform a Tp-flash calculation with successive substitution using the
    /// [MixtureState] as feed.
    pub fn tp_flash(
        &self,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
        options: FlashOptions,
    ) -> EosResult<PhaseEquilibrium> {
        let (max_iter, tol, verbosity) = options.solver.unwrap_or(MAX_ITER_TP, TOL_TP);
        let mut iterate = self.initial_iterate(initial_compositions)?;

        log_iter!(
            verbosity,
            " iter |    residual    |   beta   |  liquid mole fractions  |  vapor mole fractions  "
        );
        log_iter!(verbosity, "{:-<88}", "");

        let mut iter = 0;
        if let Some(vle) = self.successive_substitution(
            &mut iterate,
            max_iter,
            &mut iter,
            tol,
            options.trivial_tol,
            verbosity,
        )? {
            log_result!(verbosity, "Tp flash: calculation converged in {} step(s)\n", iter);
            return Ok(vle);
        }
        log_result!(verbosity, "Tp flash: did not converge within {} step(s)\n", iter);
        Err(EosError::NotConverged("TP flash".to_owned()))
    }

    pub(super) fn initial_iterate(
        &self,
        initial_compositions: Option<(&Array1<f64>, &Array1<f64>)>,
    ) -> EosResult<FlashIterate> {
        let z = &self.molefracs;
        Ok(match initial_compositions {
            Some((x, y)) => {
                let k = Zip::from(y).and(x).map_collect(|&y, &x| {
                    if x > 0.0 && y > 0.0 {
                        y / x
                    } else {
                        1.0
                    }
                });
                let beta = rachford_rice(z, &k, None)?;
                FlashIterate {
                    beta,
                    x: x / x.sum(),
                    y: y / y.sum(),
                }
            }
            None => {
                let k = self.eos.wilson_k_values(self.temperature, self.pressure);
                let beta = rachford_rice(z, &k, None)?;
                let (x, y) = phase_compositions(z, &k, beta);
                FlashIterate { beta, x, y }
            }
        })
    }

    /// Perform up to `iterations` steps of successive substitution. Returns the
    /// phase equilibrium if the iteration converged.
    ///
    /// If the vapor fraction stays at 0 or 1 while the equilibrium ratios stop
    /// changing, the feed is single phase and returned with exactly that vapor
    /// fraction. The other phase is the incipient phase at zero amount.
    pub(super) fn successive_substitution(
        &self,
        iterate: &mut FlashIterate,
        iterations: usize,
        iter: &mut usize,
        tol: f64,
        trivial_tol: f64,
        verbosity: Verbosity,
    ) -> EosResult<Option<PhaseEquilibrium>> {
        let (t, p) = (self.temperature, self.pressure);
        let z = &self.molefracs;
        let mut ln_k_old: Option<Array1<f64>> = None;
        for _ in 0..iterations {
            *iter += 1;
            let liquid = self.to_zs_tp(&iterate.x, t, p)?;
            let vapor = self.to_zs_tp(&iterate.y, t, p)?;
            let (ln_phi_l, liquid_phase) = liquid.ln_phi_branch(Phase::Liquid)?;
            let (ln_phi_v, vapor_phase) = vapor.ln_phi_branch(Phase::Vapor)?;
            let ln_k = &ln_phi_l - &ln_phi_v;
            let k = ln_k.mapv(f64::exp);

            // check for convergence, absent components do not contribute
            let mut res = 0.0;
            Zip::from(z)
                .and(&k)
                .and(&iterate.x)
                .and(&iterate.y)
                .for_each(|&z, &k, &x, &y| {
                    if z > 0.0 {
                        res += (k * x / y - 1.0).powi(2);
                    }
                });
            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:.6} | {:.8} | {:.8}",
                iter,
                res,
                iterate.beta,
                iterate.x,
                iterate.y,
            );
            if PhaseEquilibrium::is_trivial_solution(&iterate.x, &iterate.y, trivial_tol) {
                log_result!(verbosity, "Tp flash: trivial solution after {} step(s)\n", iter);
                return Err(EosError::TrivialSolution);
            }
            if !res.is_finite() {
                return Err(EosError::IterationFailed("TP flash".to_owned()));
            }
            if res < tol {
                return Ok(Some(PhaseEquilibrium::new(
                    iterate.beta,
                    (liquid, liquid_phase),
                    (vapor, vapor_phase),
                    *iter,
                )));
            }

            let beta = rachford_rice(z, &k, Some(iterate.beta))?;
            let single_phase = (beta == 0.0 || beta == 1.0) && beta == iterate.beta;
            let stalled = ln_k_old.as_ref().is_some_and(|ln_k_old| {
                (&ln_k - ln_k_old)
                    .iter()
                    .all(|d| d.abs() < tol.sqrt())
            });
            if single_phase && stalled {
                log_result!(
                    verbosity,
                    "Tp flash: single phase feed (vapor fraction {}) after {} step(s)\n",
                    beta,
                    iter
                );
                return Ok(Some(PhaseEquilibrium::new(
                    beta,
                    (liquid, liquid_phase),
                    (vapor, vapor_phase),
                    *iter,
                )));
            }
            ln_k_old = Some(ln_k);

            iterate.beta = beta;
            let (x, y) = phase_compositions(z, &k, iterate.beta);
            iterate.x = x;
            iterate.y = y;
        }
        Ok(None)
    }

    /// Tangent plane distance
    ///
    /// $$\mathrm{tpd}=\sum_iw_i\left(\ln w_i+\ln\varphi_i(w)-\ln z_i-\ln\varphi_i(z)\right)$$
    ///
    /// of a trial phase with composition $w$ with respect to this state.
    pub fn tangent_plane_distance(
        &self,
        phase: Phase,
        trial_state: &MixtureState,
        trial_phase: Phase,
    ) -> EosResult<f64> {
        let ln_phi_z = self.ln_phi(phase)?;
        let ln_phi_w = trial_state.ln_phi(trial_phase)?;
        let z = &self.molefracs;
        let w = &trial_state.molefracs;
        let ln = |x: f64| if x > 0.0 { x.ln() } else { 0.0 };
        Ok((w * &(w.mapv(ln) + ln_phi_w - z.mapv(ln) - ln_phi_z)).sum())
    }
}
