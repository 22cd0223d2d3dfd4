use super::AlphaFunction;
use crate::errors::{EosError, EosResult};
use num_dual::DualNum;
use serde::{Deserialize, Serialize};

/// Mathias-Copeman alpha function with three parameters per component.
///
/// Above the critical temperature only the first parameter is used.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MathiasCopeman(pub Vec<[f64; 3]>);

impl AlphaFunction for MathiasCopeman {
    #[inline]
    fn alpha<D: DualNum<f64> + Copy>(&self, component: usize, _: f64, reduced_temperature: D) -> D {
        let [c1, c2, c3] = self.0[component];
        let x = -reduced_temperature.sqrt() + 1.0;
        let a = if reduced_temperature.re() < 1.0 {
            x * (x * (x * c3 + c2) + c1) + 1.0
        } else {
            x * c1 + 1.0
        };
        a.powi(2)
    }

    fn validate(&self, components: usize) -> EosResult<()> {
        if self.0.len() == components {
            Ok(())
        } else {
            Err(EosError::IncompatibleParameters(format!(
                "Mathias Copeman alpha function was initialized for {} components, but the equation of state contains {}.",
                self.0.len(),
                components
            )))
        }
    }

    fn subset(&self, component_list: &[usize]) -> Self {
        Self(component_list.iter().map(|&i| self.0[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubic::alpha::PengRobinson1976;
    use approx::assert_relative_eq;

    #[test]
    fn reduces_to_soave_with_single_parameter() {
        let w: f64 = 0.153;
        let m = 0.37464 + w * (1.54226 - w * 0.26992);
        let mc = MathiasCopeman(vec![[m, 0.0, 0.0]]);
        for tr in [0.5, 0.9, 1.3] {
            assert_relative_eq!(
                mc.alpha(0, w, tr),
                PengRobinson1976.alpha(0, w, tr),
                max_relative = 1e-14
            );
        }
    }
}
