use super::AlphaFunction;
use crate::errors::{EosError, EosResult};
use itertools::izip;
use num_dual::DualNum;
use serde::{Deserialize, Serialize};

/// Generalized version of the Twu alpha function (1995).
///
/// Different parameters are used for sub- and supercritical conditions.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GeneralizedTwu([[[f64; 3]; 2]; 2]);

impl GeneralizedTwu {
    pub fn redlich_kwong() -> Self {
        GeneralizedTwu([
            [
                [2.496441 * (0.919422 - 1.0), 0.141599, 2.496441 * 0.919422],
                [3.291790 * (0.799457 - 1.0), 0.500315, 3.291790 * 0.799457],
            ],
            [
                [-0.2 * (6.500018 - 1.0), 0.441411, -0.2 * 6.500018],
                [-8.0 * (1.289098 - 1.0), 0.032580, -8.0 * 1.289098],
            ],
        ])
    }

    pub fn peng_robinson() -> Self {
        GeneralizedTwu([
            [
                [1.948150 * (0.911807 - 1.0), 0.125283, 1.948150 * 0.911807],
                [2.812520 * (0.784054 - 1.0), 0.511614, 2.812520 * 0.784054],
            ],
            [
                [-0.2 * (4.963070 - 1.0), 0.401219, -0.2 * 4.963070],
                [-0.8 * (1.248089 - 1.0), 0.024955, -0.8 * 1.248089],
            ],
        ])
    }
}

#[inline]
fn twu_alpha<D: DualNum<f64> + Copy>([nm_m1, l, nm]: [f64; 3], tr: D) -> D {
    tr.powf(nm_m1) * ((-tr.powf(nm) + 1.0) * l).exp()
}

impl AlphaFunction for GeneralizedTwu {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(
        &self,
        _: usize,
        acentric_factor: f64,
        reduced_temperature: D,
    ) -> D {
        let [c0, c1] = if reduced_temperature.re() <= 1.0 {
            self.0[0]
        } else {
            self.0[1]
        };
        let a0 = twu_alpha(c0, reduced_temperature);
        let a1 = twu_alpha(c1, reduced_temperature);
        a0 + (a1 - a0) * acentric_factor
    }

    fn validate(&self, _: usize) -> EosResult<()> {
        Ok(())
    }

    fn subset(&self, _: &[usize]) -> Self {
        self.clone()
    }
}

/// Twu alpha function (1991) with component specific parameters L, M and N.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Twu(Vec<[f64; 3]>);

impl Twu {
    pub fn new(l: Vec<f64>, m: Vec<f64>, n: Option<Vec<f64>>) -> Self {
        let n = n.unwrap_or(vec![2.0; l.len()]);
        let input = izip!(l, m, n)
            .map(|(l, m, n)| [n * (m - 1.0), l, n * m])
            .collect();
        Self(input)
    }
}

impl AlphaFunction for Twu {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(&self, component: usize, _: f64, reduced_temperature: D) -> D {
        twu_alpha(self.0[component], reduced_temperature)
    }

    fn validate(&self, components: usize) -> EosResult<()> {
        if self.0.len() == components {
            Ok(())
        } else {
            Err(EosError::IncompatibleParameters(format!(
                "Twu alpha function was initialized for {} components, but the equation of state contains {}.",
                self.0.len(),
                components
            )))
        }
    }

    fn subset(&self, component_list: &[usize]) -> Self {
        Self(component_list.iter().map(|&i| self.0[i]).collect())
    }
}
