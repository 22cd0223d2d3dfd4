use super::AlphaFunction;
use crate::errors::EosResult;
use num_dual::DualNum;
use serde::{Deserialize, Serialize};

#[inline]
fn soave_alpha<D: DualNum<f64> + Copy>(m: f64, reduced_temperature: D) -> D {
    ((-reduced_temperature.sqrt() + 1.0) * m + 1.0).powi(2)
}

/// Temperature independent α, as in the van der Waals equation of state.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Constant;

impl AlphaFunction for Constant {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(&self, _: usize, _: f64, _: D) -> D {
        D::one()
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        Self
    }
}

/// Original Redlich-Kwong temperature dependence $\alpha=T_r^{-1/2}$.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RedlichKwong;

impl AlphaFunction for RedlichKwong {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(&self, _: usize, _: f64, reduced_temperature: D) -> D {
        reduced_temperature.sqrt().recip()
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        Self
    }
}

/// Generic version of Soave's function using a polynomial in the acentric factor.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Soave {
    /// coefficients for m-polynomial
    mi: Vec<f64>,
}

impl Soave {
    pub fn new(mi: Vec<f64>) -> Self {
        Soave { mi }
    }
}

impl AlphaFunction for Soave {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(
        &self,
        _: usize,
        acentric_factor: f64,
        reduced_temperature: D,
    ) -> D {
        let m = self
            .mi
            .iter()
            .rev()
            .fold(0.0, |acc, &mi| acc * acentric_factor + mi);
        soave_alpha(m, reduced_temperature)
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        self.clone()
    }
}

/// Soave (1972) parametrization for the Redlich-Kwong equation of state.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SoaveRedlichKwong1972;

impl AlphaFunction for SoaveRedlichKwong1972 {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(
        &self,
        _: usize,
        acentric_factor: f64,
        reduced_temperature: D,
    ) -> D {
        let w = acentric_factor;
        soave_alpha(0.480 + w * (1.574 - w * 0.176), reduced_temperature)
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        Self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PengRobinson1976;

impl AlphaFunction for PengRobinson1976 {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(
        &self,
        _: usize,
        acentric_factor: f64,
        reduced_temperature: D,
    ) -> D {
        let w = acentric_factor;
        soave_alpha(0.37464 + w * (1.54226 - w * 0.26992), reduced_temperature)
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        Self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PengRobinson1978;

impl AlphaFunction for PengRobinson1978 {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(
        &self,
        _: usize,
        acentric_factor: f64,
        reduced_temperature: D,
    ) -> D {
        let w = acentric_factor;
        let m = if w <= 0.491 {
            0.37464 + w * (1.54226 - w * 0.26992)
        } else {
            // use higher-order polynomial if w > w(n-decane)
            0.379642 + w * (1.48503 + w * (-0.164423 + w * 0.016666))
        };
        soave_alpha(m, reduced_temperature)
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn generic_soave_reproduces_peng_robinson() {
        let generic = Soave::new(vec![0.37464, 1.54226, -0.26992]);
        for (w, tr) in [(0.011, 0.6), (0.153, 1.2), (0.5, 0.9)] {
            assert_relative_eq!(
                generic.alpha(0, w, tr),
                PengRobinson1976.alpha(0, w, tr),
                max_relative = 1e-14
            );
        }
    }

    #[test]
    fn peng_robinson_1978_differs_for_heavy_components() {
        assert_eq!(
            PengRobinson1978.alpha(0, 0.3, 0.7),
            PengRobinson1976.alpha(0, 0.3, 0.7)
        );
        assert!(PengRobinson1978.alpha(0, 0.6, 0.7) != PengRobinson1976.alpha(0, 0.6, 0.7));
    }
}
