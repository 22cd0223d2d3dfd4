//! Two-phase flash calculations and stability analysis.
use crate::state::{MixtureState, Phase};
use crate::SolverOptions;
use ndarray::Array1;
use std::fmt;

mod rachford_rice;
mod stability_analysis;
mod tp_flash;
mod tp_flash_newton;
pub use rachford_rice::{phase_compositions, rachford_rice, wilson_k_values};
pub use stability_analysis::{StabilityResult, TrialOutcome};

const TRIVIAL_TOL: f64 = 1e-5;
const NEWTON_WARMUP: usize = 5;

/// Options for the flash algorithms.
///
/// Tolerance and maximum number of iterations in `solver` default to
/// solver specific values if they are [None].
#[derive(Copy, Clone, Debug)]
pub struct FlashOptions {
    pub solver: SolverOptions,
    /// Phases with $\sum_i|x_i-y_i|$ below this value are considered identical.
    pub trivial_tol: f64,
    /// Successive substitution steps before a Newton or Broyden flash.
    pub warmup_steps: usize,
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            solver: SolverOptions::default(),
            trivial_tol: TRIVIAL_TOL,
            warmup_steps: NEWTON_WARMUP,
        }
    }
}

impl From<SolverOptions> for FlashOptions {
    fn from(solver: SolverOptions) -> Self {
        Self {
            solver,
            ..Self::default()
        }
    }
}

impl FlashOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    pub fn trivial_tol(mut self, trivial_tol: f64) -> Self {
        self.trivial_tol = trivial_tol;
        self
    }

    pub fn warmup_steps(mut self, warmup_steps: usize) -> Self {
        self.warmup_steps = warmup_steps;
        self
    }
}

/// Options for the stability analysis.
#[derive(Copy, Clone, Debug)]
pub struct StabilityOptions {
    pub solver: SolverOptions,
    /// Trial phases with $\sum_i\ln^2K_i$ below this value are trivial.
    pub trivial_criterion: f64,
    /// Trial phases whose mole numbers sum to less than `1 + stable_criterion`
    /// do not lower the Gibbs energy.
    pub stable_criterion: f64,
}

impl Default for StabilityOptions {
    fn default() -> Self {
        Self {
            solver: SolverOptions::default(),
            trivial_criterion: 1e-4,
            stable_criterion: 1e-7,
        }
    }
}

impl StabilityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solver(mut self, solver: SolverOptions) -> Self {
        self.solver = solver;
        self
    }

    pub fn trivial_criterion(mut self, trivial_criterion: f64) -> Self {
        self.trivial_criterion = trivial_criterion;
        self
    }

    pub fn stable_criterion(mut self, stable_criterion: f64) -> Self {
        self.stable_criterion = stable_criterion;
        self
    }
}

/// A converged vapor-liquid (or liquid-liquid) equilibrium.
///
/// Both phases are full [MixtureState]s at the temperature and pressure of
/// the feed, so that every property of the coexisting phases can be
/// evaluated from them.
#[derive(Clone, Debug)]
pub struct PhaseEquilibrium {
    vapor_fraction: f64,
    liquid: MixtureState,
    vapor: MixtureState,
    liquid_phase: Phase,
    vapor_phase: Phase,
    iterations: usize,
}

impl fmt::Display for PhaseEquilibrium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "vapor fraction: {:.8}", self.vapor_fraction)?;
        writeln!(f, "liquid: {} ({:?} root)", self.liquid, self.liquid_phase)?;
        write!(f, "vapor: {} ({:?} root)", self.vapor, self.vapor_phase)
    }
}

impl PhaseEquilibrium {
    pub(crate) fn new(
        vapor_fraction: f64,
        liquid: (MixtureState, Phase),
        vapor: (MixtureState, Phase),
        iterations: usize,
    ) -> Self {
        Self {
            vapor_fraction,
            liquid: liquid.0,
            vapor: vapor.0,
            liquid_phase: liquid.1,
            vapor_phase: vapor.1,
            iterations,
        }
    }

    /// Molar vapor phase fraction $\beta$.
    pub fn vapor_fraction(&self) -> f64 {
        self.vapor_fraction
    }

    pub fn liquid(&self) -> &MixtureState {
        &self.liquid
    }

    pub fn vapor(&self) -> &MixtureState {
        &self.vapor
    }

    /// Root of the liquid state that describes the liquid phase.
    ///
    /// This is [Phase::Vapor] only if the liquid composition has no
    /// liquid-like root.
    pub fn liquid_phase(&self) -> Phase {
        self.liquid_phase
    }

    /// Root of the vapor state that describes the vapor phase.
    pub fn vapor_phase(&self) -> Phase {
        self.vapor_phase
    }

    /// Number of iterations of the algorithm that produced the equilibrium.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Equilibrium ratios $K_i=\frac{y_i}{x_i}$.
    pub fn k_values(&self) -> Array1<f64> {
        &self.vapor.molefracs / &self.liquid.molefracs
    }

    pub(crate) fn is_trivial_solution(x: &Array1<f64>, y: &Array1<f64>, tol: f64) -> bool {
        (x - y).mapv(f64::abs).sum() < tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn trivial_solution() {
        let x = arr1(&[0.5, 0.5]);
        assert!(PhaseEquilibrium::is_trivial_solution(
            &x,
            &arr1(&[0.500001, 0.499999]),
            TRIVIAL_TOL
        ));
        assert!(!PhaseEquilibrium::is_trivial_solution(
            &x,
            &arr1(&[0.6, 0.4]),
            TRIVIAL_TOL
        ));
    }
}
