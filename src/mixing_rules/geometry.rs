//! Covolume and the denominator parameters $\delta$ and $\varepsilon$ of the
//! attractive term, including a constant volume translation.
use super::{CompositionDerivatives, CompositionPolynomial, LinearForm, QuadraticForm};
use ndarray::{Array1, Array2, Array3};

/// Composition dependence of one geometric parameter.
#[derive(Debug, Clone)]
pub enum GeometryForm {
    /// The parameter vanishes for every composition.
    Zero,
    /// $\sum_iz_il_i$
    Linear(Array1<f64>),
    /// $\sum_i\sum_jz_iz_jm_{ij}$
    Quadratic(Array2<f64>),
}

impl CompositionPolynomial for GeometryForm {
    fn value(&self, molefracs: &Array1<f64>) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::Linear(l) => LinearForm(l.view()).value(molefracs),
            Self::Quadratic(m) => QuadraticForm(m.view()).value(molefracs),
        }
    }

    fn dzs(&self, molefracs: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Zero => Array1::zeros(molefracs.len()),
            Self::Linear(l) => LinearForm(l.view()).dzs(molefracs),
            Self::Quadratic(m) => QuadraticForm(m.view()).dzs(molefracs),
        }
    }

    fn d2zs(&self, molefracs: &Array1<f64>) -> Array2<f64> {
        match self {
            Self::Zero => Array2::zeros([molefracs.len(); 2]),
            Self::Linear(l) => LinearForm(l.view()).d2zs(molefracs),
            Self::Quadratic(m) => QuadraticForm(m.view()).d2zs(molefracs),
        }
    }

    fn dns(&self, molefracs: &Array1<f64>) -> Array1<f64> {
        match self {
            Self::Zero => Array1::zeros(molefracs.len()),
            Self::Linear(l) => LinearForm(l.view()).dns(molefracs),
            Self::Quadratic(m) => QuadraticForm(m.view()).dns(molefracs),
        }
    }

    fn d2ns(&self, molefracs: &Array1<f64>) -> Array2<f64> {
        match self {
            Self::Zero => Array2::zeros([molefracs.len(); 2]),
            Self::Linear(l) => LinearForm(l.view()).d2ns(molefracs),
            Self::Quadratic(m) => QuadraticForm(m.view()).d2ns(molefracs),
        }
    }

    fn d3ns(&self, molefracs: &Array1<f64>) -> Array3<f64> {
        match self {
            Self::Zero => Array3::zeros([molefracs.len(); 3]),
            Self::Linear(l) => LinearForm(l.view()).d3ns(molefracs),
            Self::Quadratic(m) => QuadraticForm(m.view()).d3ns(molefracs),
        }
    }
}

/// Geometric parameters of all components for the denominator
/// $v^2+\delta v+\varepsilon$ with $\delta = (\delta_1+\delta_2)b$ and
/// $\varepsilon = \delta_1\delta_2b^2$ before translation.
///
/// A volume shift $c$ replaces $v$ by $v+c$, so that
///
/// $$b=b^0-c,\quad\delta=(\delta_1+\delta_2)b^0+2c,\quad\varepsilon=\delta_1\delta_2\left(b^0\right)^2+(\delta_1+\delta_2)b^0c+c^2$$
#[derive(Debug, Clone)]
pub struct GeometryParameters {
    /// Covolume of the translated equation of state
    pub b: Array1<f64>,
    pub delta: GeometryForm,
    pub epsilon: GeometryForm,
}

impl GeometryParameters {
    pub fn new(d1: f64, d2: f64, b0: &Array1<f64>, c: &Array1<f64>) -> Self {
        let s = d1 + d2;
        let p = d1 * d2;
        let translated = c.iter().any(|&c| c != 0.0);
        let delta = if s == 0.0 && !translated {
            GeometryForm::Zero
        } else {
            GeometryForm::Linear(s * b0 + 2.0 * c)
        };
        let epsilon = if p == 0.0 && !translated {
            GeometryForm::Zero
        } else {
            let n = b0.len();
            GeometryForm::Quadratic(Array2::from_shape_fn([n, n], |(i, j)| {
                p * b0[i] * b0[j] + 0.5 * s * (b0[i] * c[j] + b0[j] * c[i]) + c[i] * c[j]
            }))
        };
        Self {
            b: b0 - c,
            delta,
            epsilon,
        }
    }

    pub fn b(&self) -> LinearForm<'_> {
        LinearForm(self.b.view())
    }

    pub fn subset(&self, component_list: &[usize]) -> Self {
        let sub = |form: &GeometryForm| match form {
            GeometryForm::Zero => GeometryForm::Zero,
            GeometryForm::Linear(l) => {
                GeometryForm::Linear(component_list.iter().map(|&i| l[i]).collect())
            }
            GeometryForm::Quadratic(m) => {
                let n = component_list.len();
                GeometryForm::Quadratic(Array2::from_shape_fn([n, n], |(i, j)| {
                    m[[component_list[i], component_list[j]]]
                }))
            }
        };
        Self {
            b: component_list.iter().map(|&i| self.b[i]).collect(),
            delta: sub(&self.delta),
            epsilon: sub(&self.epsilon),
        }
    }

    /// $b$, $\delta$ and $\varepsilon$ of a mixture.
    pub fn mix(&self, molefracs: &Array1<f64>) -> MixtureGeometry {
        MixtureGeometry {
            b: self.b().value(molefracs),
            delta: self.delta.value(molefracs),
            epsilon: self.epsilon.value(molefracs),
        }
    }

    pub fn b_derivatives(&self, molefracs: &Array1<f64>) -> CompositionDerivatives {
        self.b().derivatives(molefracs)
    }
}

/// Geometric parameters of a mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureGeometry {
    pub b: f64,
    pub delta: f64,
    pub epsilon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;
    use std::f64::consts::SQRT_2;

    #[test]
    fn untranslated_peng_robinson() {
        let b0 = arr1(&[2.5e-5, 4.0e-5]);
        let g = GeometryParameters::new(1.0 + SQRT_2, 1.0 - SQRT_2, &b0, &Array1::zeros(2));
        let z = arr1(&[0.4, 0.6]);
        let m = g.mix(&z);
        let b = b0.dot(&z);
        assert_relative_eq!(m.b, b, max_relative = 1e-14);
        assert_relative_eq!(m.delta, 2.0 * b, max_relative = 1e-14);
        assert_relative_eq!(m.epsilon, -b * b, max_relative = 1e-12);
    }

    #[test]
    fn srk_and_vdw_forms() {
        let b0 = arr1(&[2.5e-5, 4.0e-5]);
        let c = Array1::zeros(2);
        let srk = GeometryParameters::new(1.0, 0.0, &b0, &c);
        assert!(matches!(srk.delta, GeometryForm::Linear(_)));
        assert!(matches!(srk.epsilon, GeometryForm::Zero));
        let vdw = GeometryParameters::new(0.0, 0.0, &b0, &c);
        assert!(matches!(vdw.delta, GeometryForm::Zero));
        assert!(matches!(vdw.epsilon, GeometryForm::Zero));
    }

    #[test]
    fn volume_translation_shifts_the_pole() {
        // the denominator of the translated equation at v equals the
        // untranslated denominator at v + c
        let (d1, d2) = (1.0 + SQRT_2, 1.0 - SQRT_2);
        let b0 = arr1(&[2.5e-5, 4.0e-5]);
        let c = arr1(&[3.0e-6, -1.0e-6]);
        let z = arr1(&[0.3, 0.7]);
        let m = GeometryParameters::new(d1, d2, &b0, &c).mix(&z);
        let (b0m, cm) = (b0.dot(&z), c.dot(&z));
        let v = 1e-4;
        let lhs = v * v + m.delta * v + m.epsilon;
        let w = v + cm;
        let rhs = (w + d1 * b0m) * (w + d2 * b0m);
        assert_relative_eq!(lhs, rhs, max_relative = 1e-12);
        assert_relative_eq!(m.b, b0m - cm, max_relative = 1e-14);
    }
}
