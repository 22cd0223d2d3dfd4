use super::StabilityOptions;
use crate::errors::{EosError, EosResult};
use crate::state::{MixtureState, Phase};
use ndarray::{Array1, Zip};
use std::fmt;

const MAX_ITER_STABILITY: usize = 20;
const TOL_STABILITY: f64 = 1e-12;

/// Result of a single trial phase of the stability analysis.
#[derive(Clone, Debug)]
pub struct TrialOutcome {
    /// Root requested for the trial phase
    pub phase: Phase,
    /// $K_i=Y_i/z_i$ for a vapor-like and $K_i=z_i/Y_i$ for a liquid-like trial phase
    pub k_values: Array1<f64>,
    /// Sum of the unnormalized trial mole numbers $\sum_iY_i$
    pub sum: f64,
    /// $\sum_i\ln^2K_i$ below the trivial criterion
    pub trivial: bool,
    /// The requested root did not exist for the trial composition in the last iteration.
    pub phase_failure: bool,
    pub converged: bool,
    pub iterations: usize,
}

impl TrialOutcome {
    /// Whether the trial phase leaves the reference phase stable.
    pub fn is_stable(&self, stable_criterion: f64) -> bool {
        if self.trivial {
            return true;
        }
        if self.phase_failure && self.sum > 1.0 {
            return false;
        }
        self.sum - 1.0 < stable_criterion
    }
}

/// Result of the two-sided stability analysis.
#[derive(Clone, Debug)]
pub struct StabilityResult {
    pub stable: bool,
    /// Estimate of the equilibrium ratios if the state is unstable
    pub k_values: Option<Array1<f64>>,
    pub vapor_trial: TrialOutcome,
    pub liquid_trial: TrialOutcome,
}

impl fmt::Display for StabilityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stable {
            write!(f, "stable")?;
        } else {
            write!(f, "unstable")?;
        }
        if let Some(k) = &self.k_values {
            write!(f, ", K = {:.6}", k)?;
        }
        Ok(())
    }
}

/// # Stability analysis
impl MixtureState {
    /// Determine if the given root of the state is stable, i.e. if a phase
    /// split should occur or not.
    pub fn is_stable(&self, phase: Phase, options: StabilityOptions) -> EosResult<bool> {
        Ok(self.stability_analysis(phase, options)?.stable)
    }

    /// Michelsen's stability analysis with a vapor-like and a liquid-like
    /// trial phase, both initialized from Wilson's equilibrium ratios.
    ///
    /// The state is stable if both trial phases either collapse onto the
    /// feed or do not lower the Gibbs energy. Otherwise the product of the
    /// equilibrium ratios of both trials is returned as initial estimate
    /// for a flash calculation.
    pub fn stability_analysis(
        &self,
        phase: Phase,
        options: StabilityOptions,
    ) -> EosResult<StabilityResult> {
        let vapor_trial = self.stability_trial(phase, Phase::Vapor, options)?;
        let liquid_trial = self.stability_trial(phase, Phase::Liquid, options)?;
        let stable = vapor_trial.is_stable(options.stable_criterion)
            && liquid_trial.is_stable(options.stable_criterion);
        let k_values = (!stable).then(|| &vapor_trial.k_values * &liquid_trial.k_values);
        log_result!(
            options.solver.verbosity,
            "Stability analysis: {} (vapor trial: sum = {:.8}, liquid trial: sum = {:.8})\n",
            if stable { "stable" } else { "unstable" },
            vapor_trial.sum,
            liquid_trial.sum
        );
        Ok(StabilityResult {
            stable,
            k_values,
            vapor_trial,
            liquid_trial,
        })
    }

    fn stability_trial(
        &self,
        phase: Phase,
        trial: Phase,
        options: StabilityOptions,
    ) -> EosResult<TrialOutcome> {
        let (max_iter, tol, verbosity) =
            options.solver.unwrap_or(MAX_ITER_STABILITY, TOL_STABILITY);
        let z = &self.molefracs;
        let (t, p) = (self.temperature, self.pressure);
        let (ln_phi_z, _) = self.ln_phi_branch(phase)?;
        let di = Zip::from(z)
            .and(&ln_phi_z)
            .map_collect(|&z, &ln_phi| {
                if z > 0.0 {
                    z.ln() + ln_phi
                } else {
                    f64::NEG_INFINITY
                }
            });

        let k_wilson = self.eos.wilson_k_values(t, p);
        let mut y = match trial {
            Phase::Vapor => z * &k_wilson,
            _ => z / &k_wilson,
        };

        log_iter!(verbosity, " iter |    residual    |      sum      | {:?} trial", trial);
        log_iter!(verbosity, "{:-<50}", "");

        let mut matched = false;
        let mut phase_failure = false;
        let mut converged = false;
        let mut iterations = max_iter;
        for i in 1..=max_iter {
            let trial_state = self.to_zs_tp(&(&y / y.sum()), t, p)?;
            let (ln_phi_y, used) = trial_state.ln_phi_branch(trial)?;
            phase_failure = trial != Phase::Stable && used != trial;
            matched |= !phase_failure;

            let y_new = (&di - &ln_phi_y).mapv(f64::exp);
            let err = Zip::from(&y_new).and(&y).fold(0.0, |acc, &yn, &y| {
                if y > 0.0 {
                    acc + (yn / y - 1.0).powi(2)
                } else {
                    acc
                }
            });
            y = y_new;
            log_iter!(verbosity, " {:4} | {:14.8e} | {:13.10} |", i, err, y.sum());
            if !err.is_finite() {
                return Err(EosError::IterationFailed("Stability analysis".into()));
            }
            if err < tol {
                converged = true;
                iterations = i;
                break;
            }
        }
        if !converged && !matched {
            return Err(EosError::NotConverged("Stability analysis".into()));
        }

        let k_values = Zip::from(&y).and(z).map_collect(|&y, &z| {
            if z > 0.0 {
                match trial {
                    Phase::Vapor => y / z,
                    _ => z / y,
                }
            } else {
                1.0
            }
        });
        let trivial = k_values.mapv(|k| k.ln().powi(2)).sum() < options.trivial_criterion;
        Ok(TrialOutcome {
            phase: trial,
            k_values,
            sum: y.sum(),
            trivial,
            phase_failure,
            converged,
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubic::CubicEos;
    use crate::parameter::CubicParameters;
    use crate::phase_equilibria::{phase_compositions, rachford_rice, FlashOptions};
    use approx::assert_relative_eq;
    use ndarray::arr1;
    use std::sync::Arc;

    fn methane_propane() -> Arc<CubicEos> {
        let p = CubicParameters::new_simple(&[190.6, 369.8], &[46.04e5, 42.48e5], &[0.011, 0.152])
            .unwrap();
        Arc::new(CubicEos::peng_robinson(Arc::new(p), None, None).unwrap())
    }

    #[test]
    fn supercritical_pure_component_is_stable() -> EosResult<()> {
        let p = Arc::new(CubicParameters::new_simple(&[190.6], &[46.04e5], &[0.011])?);
        let eos = Arc::new(CubicEos::peng_robinson(p, None, None)?);
        for (t, p) in [(250.0, 1e6), (300.0, 1e7), (200.0, 5e6)] {
            let s = MixtureState::new_tp(&eos, t, p, &arr1(&[1.0]))?;
            let res = s.stability_analysis(Phase::Stable, StabilityOptions::default())?;
            assert!(res.stable);
            assert!(res.k_values.is_none());
        }
        Ok(())
    }

    #[test]
    fn dilute_gas_is_stable() -> EosResult<()> {
        let eos = methane_propane();
        let s = MixtureState::new_tp(&eos, 300.0, 1e5, &arr1(&[0.5, 0.5]))?;
        assert!(s.is_stable(Phase::Stable, StabilityOptions::default())?);
        Ok(())
    }

    #[test]
    fn two_phase_feed_is_unstable() -> EosResult<()> {
        let eos = methane_propane();
        let z = arr1(&[0.5, 0.5]);
        let s = MixtureState::new_tp(&eos, 250.0, 3e6, &z)?;
        let res = s.stability_analysis(Phase::Stable, StabilityOptions::default())?;
        assert!(!res.stable);

        // the combined K values initialize a flash
        let k = res.k_values.unwrap();
        assert!(k[0] > 1.0 && k[1] < 1.0);
        let beta = rachford_rice(&z, &k, None)?;
        let (x, y) = phase_compositions(&z, &k, beta);
        let vle = s.tp_flash(Some((&x, &y)), FlashOptions::default())?;
        let reference = s.tp_flash(None, FlashOptions::default())?;
        assert_relative_eq!(
            vle.vapor_fraction(),
            reference.vapor_fraction(),
            max_relative = 1e-6
        );
        Ok(())
    }
}
