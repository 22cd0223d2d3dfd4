use super::integral::RootTerms;
use crate::mixing_rules::CompositionDerivatives;
use ndarray::{Array1, Array2, Array3};
use std::sync::OnceLock;

/// Lazily evaluated quantities of a [MixtureState](super::MixtureState).
///
/// Per-root entries are indexed with 0 for the liquid and 1 for the vapor root.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cache {
    pub a_alpha: OnceLock<CompositionDerivatives>,
    pub da_alpha_dt: OnceLock<CompositionDerivatives>,
    pub b: OnceLock<CompositionDerivatives>,
    pub delta: OnceLock<CompositionDerivatives>,
    pub epsilon: OnceLock<CompositionDerivatives>,
    pub d3a_alpha_dns: OnceLock<Array3<f64>>,
    pub d3b_dns: OnceLock<Array3<f64>>,
    pub d3delta_dns: OnceLock<Array3<f64>>,
    pub d3epsilon_dns: OnceLock<Array3<f64>>,
    pub root_terms: [OnceLock<RootTerms>; 2],
    pub ln_phi: [OnceLock<Array1<f64>>; 2],
    pub dln_phi_dnj: [OnceLock<Array2<f64>>; 2],
}
