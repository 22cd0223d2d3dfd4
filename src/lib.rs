//! Cubic equations of state for multicomponent mixtures.
//!
//! The crate covers the composition dependent part of a cubic equation of state
//! of the general form
//!
//! $$p=\frac{RT}{v-b}-\frac{a\alpha}{v^2+\delta v+\varepsilon}$$
//!
//! i.e. the mixing rules together with their temperature and composition
//! derivatives, the fugacity coefficients built on top of them, and the
//! phase equilibrium algorithms (flash, stability analysis, critical point)
//! that consume fugacities.
#![warn(clippy::all)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

/// Print messages with level `Verbosity::Iter` or higher.
#[macro_export]
macro_rules! log_iter {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Iter {
            println!($($arg)*);
        }
    }
}

/// Print messages with level `Verbosity::Result` or higher.
#[macro_export]
macro_rules! log_result {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::Verbosity::Result {
            println!($($arg)*);
        }
    }
}

pub mod cubic;
mod errors;
pub mod mixing_rules;
pub mod parameter;
mod phase_equilibria;
pub mod solver;
mod state;

pub use cubic::{Alpha, CubicEos, CubicFamily, CubicOptions};
pub use errors::{EosError, EosResult};
pub use mixing_rules::{MixingOptions, MixingRule};
pub use phase_equilibria::{
    phase_compositions, rachford_rice, wilson_k_values, FlashOptions, PhaseEquilibrium,
    StabilityOptions, StabilityResult, TrialOutcome,
};
pub use solver::VolumeRoots;
pub use state::{MixtureState, Phase};

/// Molar gas constant in J/(mol K).
pub const RGAS: f64 = 8.314462618;

/// Level of detail in the iteration output.
#[derive(Copy, Clone, PartialOrd, PartialEq, Eq, Debug, Default)]
pub enum Verbosity {
    /// Do not print output.
    #[default]
    None,
    /// Print information about the success or failure of the iteration.
    Result,
    /// Print a detailed output for every iteration.
    Iter,
}

/// Options for the various phase equilibria solvers.
///
/// If the values are [None], solver specific default
/// values are used.
#[derive(Copy, Clone, Default, Debug)]
pub struct SolverOptions {
    /// Maximum number of iterations.
    pub max_iter: Option<usize>,
    /// Tolerance.
    pub tol: Option<f64>,
    /// Iteration output indicated by the [Verbosity] enum.
    pub verbosity: Verbosity,
}

impl From<(Option<usize>, Option<f64>, Option<Verbosity>)> for SolverOptions {
    fn from(options: (Option<usize>, Option<f64>, Option<Verbosity>)) -> Self {
        Self {
            max_iter: options.0,
            tol: options.1,
            verbosity: options.2.unwrap_or(Verbosity::None),
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn unwrap_or(self, max_iter: usize, tol: f64) -> (usize, f64, Verbosity) {
        (
            self.max_iter.unwrap_or(max_iter),
            self.tol.unwrap_or(tol),
            self.verbosity,
        )
    }
}
