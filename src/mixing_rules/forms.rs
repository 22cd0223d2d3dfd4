//! Mole fraction and mole number derivatives of mixture quantities that are
//! linear or quadratic in composition.
//!
//! Mole fraction derivatives treat all $z_i$ as independent variables. Mole
//! number derivatives are taken for the intensive quantity
//! $q(\mathbf{n}/n)$ and evaluated at $n=\sum_in_i=1$.
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};

/// Value, gradient and Hessian of a mixture quantity with respect to
/// mole fractions and mole numbers.
#[derive(Debug, Clone)]
pub struct CompositionDerivatives {
    pub value: f64,
    pub dzs: Array1<f64>,
    pub d2zs: Array2<f64>,
    pub dns: Array1<f64>,
    pub d2ns: Array2<f64>,
}

/// Mixture quantities that are polynomials in the composition.
pub trait CompositionPolynomial {
    fn value(&self, molefracs: &Array1<f64>) -> f64;

    fn dzs(&self, molefracs: &Array1<f64>) -> Array1<f64>;

    fn d2zs(&self, molefracs: &Array1<f64>) -> Array2<f64>;

    fn dns(&self, molefracs: &Array1<f64>) -> Array1<f64>;

    fn d2ns(&self, molefracs: &Array1<f64>) -> Array2<f64>;

    fn d3ns(&self, molefracs: &Array1<f64>) -> Array3<f64>;

    fn derivatives(&self, molefracs: &Array1<f64>) -> CompositionDerivatives {
        CompositionDerivatives {
            value: self.value(molefracs),
            dzs: self.dzs(molefracs),
            d2zs: self.d2zs(molefracs),
            dns: self.dns(molefracs),
            d2ns: self.d2ns(molefracs),
        }
    }
}

/// $q=\sum_iz_il_i$
#[derive(Debug, Clone, Copy)]
pub struct LinearForm<'a>(pub ArrayView1<'a, f64>);

impl CompositionPolynomial for LinearForm<'_> {
    fn value(&self, molefracs: &Array1<f64>) -> f64 {
        self.0.dot(molefracs)
    }

    fn dzs(&self, _: &Array1<f64>) -> Array1<f64> {
        self.0.to_owned()
    }

    fn d2zs(&self, molefracs: &Array1<f64>) -> Array2<f64> {
        Array2::zeros([molefracs.len(); 2])
    }

    fn dns(&self, molefracs: &Array1<f64>) -> Array1<f64> {
        let q = self.value(molefracs);
        self.0.mapv(|l| l - q)
    }

    fn d2ns(&self, molefracs: &Array1<f64>) -> Array2<f64> {
        let q = self.value(molefracs);
        let l = &self.0;
        Array2::from_shape_fn([l.len(); 2], |(i, j)| 2.0 * q - l[i] - l[j])
    }

    fn d3ns(&self, molefracs: &Array1<f64>) -> Array3<f64> {
        let q = self.value(molefracs);
        let l = &self.0;
        Array3::from_shape_fn([l.len(); 3], |(i, j, k)| {
            2.0 * (l[i] + l[j] + l[k]) - 6.0 * q
        })
    }
}

/// $q=\sum_i\sum_jz_iz_jm_{ij}$ with a symmetric matrix $m_{ij}$.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticForm<'a>(pub ArrayView2<'a, f64>);

impl QuadraticForm<'_> {
    /// The row sums $\sum_jz_jm_{ij}$.
    pub fn j_rows(&self, molefracs: &Array1<f64>) -> Array1<f64> {
        self.0.dot(molefracs)
    }
}

impl CompositionPolynomial for QuadraticForm<'_> {
    fn value(&self, molefracs: &Array1<f64>) -> f64 {
        molefracs.dot(&self.j_rows(molefracs))
    }

    fn dzs(&self, molefracs: &Array1<f64>) -> Array1<f64> {
        self.j_rows(molefracs) * 2.0
    }

    fn d2zs(&self, _: &Array1<f64>) -> Array2<f64> {
        &self.0 * 2.0
    }

    fn dns(&self, molefracs: &Array1<f64>) -> Array1<f64> {
        let rows = self.j_rows(molefracs);
        let q = molefracs.dot(&rows);
        rows.mapv(|r| 2.0 * (r - q))
    }

    fn d2ns(&self, molefracs: &Array1<f64>) -> Array2<f64> {
        let rows = self.j_rows(molefracs);
        let q = molefracs.dot(&rows);
        let m = &self.0;
        Array2::from_shape_fn([rows.len(); 2], |(i, j)| {
            2.0 * (m[[i, j]] - 2.0 * (rows[i] + rows[j]) + 3.0 * q)
        })
    }

    fn d3ns(&self, molefracs: &Array1<f64>) -> Array3<f64> {
        let rows = self.j_rows(molefracs);
        let q = molefracs.dot(&rows);
        let m = &self.0;
        Array3::from_shape_fn([rows.len(); 3], |(i, j, k)| {
            -4.0 * (m[[i, j]] + m[[i, k]] + m[[j, k]]) + 12.0 * (rows[i] + rows[j] + rows[k])
                - 24.0 * q
        })
    }
}

/// Derivatives of $n^pq$ with respect to mole numbers at $n=1$, expressed through
/// the derivatives of the intensive quantity $q$.
///
/// `power = 1` is used for $nb$ and $n\delta$, `power = 2` for $n^2\varepsilon$
/// and $n^2a\alpha$.
pub(crate) fn scaled_dns(d: &CompositionDerivatives, power: u8) -> Array1<f64> {
    &d.dns + f64::from(power) * d.value
}

pub(crate) fn scaled_d2ns(d: &CompositionDerivatives, power: u8) -> Array2<f64> {
    let n = d.dns.len();
    Array2::from_shape_fn([n, n], |(i, j)| match power {
        1 => d.dns[i] + d.dns[j] + d.d2ns[[i, j]],
        _ => 2.0 * d.value + 2.0 * (d.dns[i] + d.dns[j]) + d.d2ns[[i, j]],
    })
}

pub(crate) fn scaled_d3ns(d: &CompositionDerivatives, d3ns: &Array3<f64>, power: u8) -> Array3<f64> {
    let n = d.dns.len();
    let h = &d.d2ns;
    Array3::from_shape_fn([n; 3], |(i, j, k)| {
        let second = h[[i, j]] + h[[i, k]] + h[[j, k]];
        match power {
            1 => second + d3ns[[i, j, k]],
            _ => 2.0 * (d.dns[i] + d.dns[j] + d.dns[k]) + 2.0 * second + d3ns[[i, j, k]],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    fn intensive<P: CompositionPolynomial>(p: &P, moles: &Array1<f64>) -> f64 {
        p.value(&(moles / moles.sum()))
    }

    fn check_mole_number_derivatives<P: CompositionPolynomial>(p: &P, z: &Array1<f64>) {
        let h = 1e-5;
        let n = z.len();
        let dns = p.dns(z);
        let d2ns = p.d2ns(z);
        for i in 0..n {
            let mut np = z.clone();
            let mut nm = z.clone();
            np[i] += h;
            nm[i] -= h;
            let fd = (intensive(p, &np) - intensive(p, &nm)) / (2.0 * h);
            assert_relative_eq!(dns[i], fd, epsilon = 1e-8);
            let fd2 = (p.dns(&(&np / np.sum())) / np.sum() - p.dns(&(&nm / nm.sum())) / nm.sum())
                / (2.0 * h);
            for j in 0..n {
                assert_relative_eq!(d2ns[[i, j]], fd2[j], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn linear_form_mole_number_derivatives() {
        let l = arr1(&[2.0, 3.0, 5.0]);
        let z = arr1(&[0.2, 0.3, 0.5]);
        let form = LinearForm(l.view());
        check_mole_number_derivatives(&form, &z);
        let d3 = form.d3ns(&z);
        assert_relative_eq!(d3[[0, 1, 2]], 2.0 * (2.0 + 3.0 + 5.0) - 6.0 * form.value(&z));
    }

    #[test]
    fn quadratic_form_mole_number_derivatives() {
        let m = arr2(&[[1.0, 0.5, 0.2], [0.5, 2.0, 0.7], [0.2, 0.7, 3.0]]);
        let z = arr1(&[0.2, 0.3, 0.5]);
        let form = QuadraticForm(m.view());
        check_mole_number_derivatives(&form, &z);
        let d2 = form.d2ns(&z);
        assert_relative_eq!(d2, d2.t().to_owned(), max_relative = 1e-14);
    }

    #[test]
    fn extensive_third_derivatives_vanish_for_quadratic_forms() {
        // n^2 q is a quadratic polynomial in the mole numbers
        let m = arr2(&[[1.0, 0.5, 0.2], [0.5, 2.0, 0.7], [0.2, 0.7, 3.0]]);
        let z = arr1(&[0.1, 0.6, 0.3]);
        let form = QuadraticForm(m.view());
        let d = form.derivatives(&z);
        let d3 = scaled_d3ns(&d, &form.d3ns(&z), 2);
        assert!(d3.iter().all(|x| x.abs() < 1e-12));
        let d2 = scaled_d2ns(&d, 2);
        assert_relative_eq!(d2, &m * 2.0, max_relative = 1e-12);

        let l = arr1(&[1.0, 2.0, 4.0]);
        let linear = LinearForm(l.view());
        let d = linear.derivatives(&z);
        assert_relative_eq!(scaled_dns(&d, 1), l, max_relative = 1e-14);
        assert!(scaled_d2ns(&d, 1).iter().all(|x| x.abs() < 1e-14));
        assert!(scaled_d3ns(&d, &linear.d3ns(&z), 1)
            .iter()
            .all(|x| x.abs() < 1e-12));
    }
}
