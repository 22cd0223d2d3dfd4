//! Mixing rules for the attraction parameter and the geometric parameters
//! $b$, $\delta$ and $\varepsilon$.
use crate::parameter::CubicParameters;
use enum_dispatch::enum_dispatch;
use ndarray::{Array1, Array2, Zip};

mod forms;
mod geometry;
pub use forms::{CompositionDerivatives, CompositionPolynomial, LinearForm, QuadraticForm};
pub(crate) use forms::{scaled_d2ns, scaled_d3ns, scaled_dns};
pub use geometry::{GeometryForm, GeometryParameters, MixtureGeometry};

/// Tunable constants of the mixing rules.
#[derive(Debug, Clone, Copy)]
pub struct MixingOptions {
    /// Replacement for $1/\sqrt{a\alpha_i}$ of components with a vanishing
    /// attraction term.
    pub zero_sentinel: f64,
}

impl Default for MixingOptions {
    fn default() -> Self {
        Self {
            zero_sentinel: 1e100,
        }
    }
}

impl MixingOptions {
    pub fn zero_sentinel(mut self, zero_sentinel: f64) -> Self {
        self.zero_sentinel = zero_sentinel;
        self
    }
}

/// $a_i\alpha_i$ of all pure components and its first two temperature derivatives.
#[derive(Debug, Clone)]
pub struct PureAlphaTerms {
    pub temperature: f64,
    pub a_alpha: Array1<f64>,
    pub da_alpha_dt: Array1<f64>,
    pub d2a_alpha_dt2: Array1<f64>,
}

/// Pairwise attraction parameters $(a\alpha)_{ij}$ and their temperature derivatives.
///
/// The matrices only depend on temperature. States with different compositions at
/// the same temperature share one instance.
#[derive(Debug, Clone)]
pub struct AttractionMatrix {
    pub temperature: f64,
    pub a_alpha_ijs: Array2<f64>,
    pub da_alpha_dt_ijs: Array2<f64>,
    pub d2a_alpha_dt2_ijs: Array2<f64>,
}

impl AttractionMatrix {
    /// Whether the matrices were evaluated at `temperature`.
    pub fn is_valid_for(&self, temperature: f64) -> bool {
        self.temperature == temperature
    }

    pub fn a_alpha(&self) -> QuadraticForm<'_> {
        QuadraticForm(self.a_alpha_ijs.view())
    }

    pub fn da_alpha_dt(&self) -> QuadraticForm<'_> {
        QuadraticForm(self.da_alpha_dt_ijs.view())
    }

    pub fn d2a_alpha_dt2(&self) -> QuadraticForm<'_> {
        QuadraticForm(self.d2a_alpha_dt2_ijs.view())
    }

    /// $a\alpha$ and its temperature derivatives for the given composition.
    pub fn mix(&self, molefracs: &Array1<f64>) -> MixtureAttraction {
        let a_alpha_j_rows = self.a_alpha().j_rows(molefracs);
        let da_alpha_dt_j_rows = self.da_alpha_dt().j_rows(molefracs);
        let d2a_alpha_dt2_j_rows = self.d2a_alpha_dt2().j_rows(molefracs);
        MixtureAttraction {
            a_alpha: molefracs.dot(&a_alpha_j_rows),
            da_alpha_dt: molefracs.dot(&da_alpha_dt_j_rows),
            d2a_alpha_dt2: molefracs.dot(&d2a_alpha_dt2_j_rows),
            a_alpha_j_rows,
            da_alpha_dt_j_rows,
            d2a_alpha_dt2_j_rows,
        }
    }
}

/// Attraction parameter of a mixture.
#[derive(Debug, Clone)]
pub struct MixtureAttraction {
    pub a_alpha: f64,
    pub da_alpha_dt: f64,
    pub d2a_alpha_dt2: f64,
    /// $\sum_jz_j(a\alpha)_{ij}$
    pub a_alpha_j_rows: Array1<f64>,
    pub da_alpha_dt_j_rows: Array1<f64>,
    pub d2a_alpha_dt2_j_rows: Array1<f64>,
}

#[enum_dispatch]
pub trait MixingRuleFunction {
    /// Combine the pure component attraction terms to the pairwise matrices.
    fn attraction_matrix(
        &self,
        parameters: &CubicParameters,
        pure: &PureAlphaTerms,
        options: &MixingOptions,
    ) -> AttractionMatrix;
}

/// Geometric mean combining rule with a binary interaction parameter
///
/// $(a\alpha)_{ij}=(1-k_{ij})\sqrt{a\alpha_i\,a\alpha_j}$
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl MixingRuleFunction for Quadratic {
    fn attraction_matrix(
        &self,
        parameters: &CubicParameters,
        pure: &PureAlphaTerms,
        options: &MixingOptions,
    ) -> AttractionMatrix {
        let n = pure.a_alpha.len();
        let mut sqrt = Array1::zeros(n);
        let mut dsqrt = Array1::zeros(n);
        let mut d2sqrt = Array1::zeros(n);
        Zip::from(&mut sqrt)
            .and(&mut dsqrt)
            .and(&mut d2sqrt)
            .and(&pure.a_alpha)
            .and(&pure.da_alpha_dt)
            .and(&pure.d2a_alpha_dt2)
            .for_each(|x, dx, d2x, &a, &da, &d2a| {
                *x = a.sqrt();
                let inv = if *x == 0.0 {
                    options.zero_sentinel
                } else {
                    x.recip()
                };
                *dx = 0.5 * da * inv;
                *d2x = 0.5 * d2a * inv - 0.25 * da * da * inv * inv * inv;
            });

        let k_ij = &parameters.k_ij;
        let a_alpha_ijs =
            Array2::from_shape_fn([n, n], |(i, j)| (1.0 - k_ij[[i, j]]) * (sqrt[i] * sqrt[j]));
        let da_alpha_dt_ijs = Array2::from_shape_fn([n, n], |(i, j)| {
            (1.0 - k_ij[[i, j]]) * (dsqrt[i] * sqrt[j] + sqrt[i] * dsqrt[j])
        });
        let d2a_alpha_dt2_ijs = Array2::from_shape_fn([n, n], |(i, j)| {
            (1.0 - k_ij[[i, j]])
                * ((d2sqrt[i] * sqrt[j] + sqrt[i] * d2sqrt[j]) + 2.0 * (dsqrt[i] * dsqrt[j]))
        });
        AttractionMatrix {
            temperature: pure.temperature,
            a_alpha_ijs,
            da_alpha_dt_ijs,
            d2a_alpha_dt2_ijs,
        }
    }
}

/// Closed set of mixing rules for the attraction parameter.
#[enum_dispatch(MixingRuleFunction)]
#[derive(Debug, Clone)]
pub enum MixingRule {
    Quadratic,
}

impl Default for MixingRule {
    fn default() -> Self {
        Quadratic.into()
    }
}
