use super::MixtureState;
use crate::cubic::CubicEos;
use crate::errors::{EosError, EosResult};
use crate::{SolverOptions, RGAS};
use ndarray::{arr1, arr2, Array1, Array2};
use num_dual::linalg::{norm, LU};
use std::sync::Arc;

const MAX_ITER_CRIT_POINT: usize = 50;
const TOL_CRIT_POINT: f64 = 1e-10;

/// Coefficients of the volume cubic in the compressibility factor
/// $Z^3+c_2Z^2+c_1Z+c_0=0$ and their derivatives with respect to
/// temperature and pressure.
struct CubicCoefficients {
    c: [f64; 3],
    dc_dt: [f64; 3],
    dc_dp: [f64; 3],
}

impl CubicCoefficients {
    fn new(eos: &CubicEos, molefracs: &Array1<f64>, temperature: f64, pressure: f64) -> Self {
        let geometry = eos.geometry.mix(molefracs);
        let mix = eos.attraction_matrix(temperature).mix(molefracs);
        let (t, p) = (temperature, pressure);
        let rt = RGAS * t;
        let b = geometry.b * p / rt;
        let d = geometry.delta * p / rt;
        let e = geometry.epsilon * (p / rt).powi(2);
        let a = mix.a_alpha * p / (rt * rt);

        // (value, d/dT, d/dP) of the reduced parameters
        let b = [b, -b / t, b / p];
        let d = [d, -d / t, d / p];
        let e = [e, -2.0 * e / t, 2.0 * e / p];
        let a = [
            a,
            mix.da_alpha_dt * p / (rt * rt) - 2.0 * a / t,
            a / p,
        ];

        let coefficients = |k: usize| {
            if k == 0 {
                [
                    -(b[0] * e[0] + e[0] + a[0] * b[0]),
                    e[0] - b[0] * d[0] - d[0] + a[0],
                    d[0] - b[0] - 1.0,
                ]
            } else {
                [
                    -(b[k] * e[0] + b[0] * e[k] + e[k] + a[k] * b[0] + a[0] * b[k]),
                    e[k] - b[k] * d[0] - b[0] * d[k] - d[k] + a[k],
                    d[k] - b[k],
                ]
            }
        };
        Self {
            c: coefficients(0),
            dc_dt: coefficients(1),
            dc_dp: coefficients(2),
        }
    }

    /// Conditions for a triple root: both coefficients of the depressed
    /// cubic $t^3+ft+g$ vanish.
    fn residual(&self) -> Array1<f64> {
        let [c0, c1, c2] = self.c;
        arr1(&[
            c1 - c2 * c2 / 3.0,
            2.0 * c2.powi(3) / 27.0 - c2 * c1 / 3.0 + c0,
        ])
    }

    fn jacobian(&self) -> Array2<f64> {
        let [_, c1, c2] = self.c;
        let df = |dc: &[f64; 3]| dc[1] - 2.0 * c2 * dc[2] / 3.0;
        let dg = |dc: &[f64; 3]| {
            2.0 * c2 * c2 * dc[2] / 9.0 - (dc[2] * c1 + c2 * dc[1]) / 3.0 + dc[0]
        };
        arr2(&[
            [df(&self.dc_dt), df(&self.dc_dp)],
            [dg(&self.dc_dt), dg(&self.dc_dp)],
        ])
    }

    /// The triple root $Z_c=-c_2/3$.
    fn compressibility(&self) -> f64 {
        -self.c[2] / 3.0
    }
}

/// # Critical points
impl MixtureState {
    /// Calculate the pure component critical point of all components.
    pub fn critical_point_pure(
        eos: &Arc<CubicEos>,
        options: SolverOptions,
    ) -> EosResult<Vec<Self>> {
        (0..eos.components())
            .map(|i| {
                Self::critical_point(&Arc::new(eos.subset(&[i])), &arr1(&[1.0]), options)
            })
            .collect()
    }

    /// Calculate the mechanical critical point of a mixture, where the first and
    /// second volume derivatives of the pressure vanish simultaneously.
    ///
    /// The iteration starts from the mole fraction weighted critical
    /// temperatures and pressures.
    pub fn critical_point(
        eos: &Arc<CubicEos>,
        molefracs: &Array1<f64>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        if molefracs.len() != eos.components() {
            return Err(EosError::IncompatibleComponents(
                eos.components(),
                molefracs.len(),
            ));
        }
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_CRIT_POINT, TOL_CRIT_POINT);
        let t0 = eos.parameters.tc.dot(molefracs);
        let p0 = eos.parameters.pc.dot(molefracs);
        let (mut t, mut p) = (t0, p0);

        log_iter!(
            verbosity,
            " iter |    residual    |   temperature   |     pressure     "
        );
        log_iter!(verbosity, "{:-<60}", "");
        log_iter!(verbosity, " {:4} |                | {:13.8} | {:14.8e}", 0, t, p);

        for i in 1..=max_iter {
            let coefficients = CubicCoefficients::new(eos, molefracs, t, p);
            let res = coefficients.residual();
            let mut jacobian = coefficients.jacobian();
            // Newton step in reduced variables T/T0 and p/p0
            jacobian.column_mut(0).mapv_inplace(|x| x * t0);
            jacobian.column_mut(1).mapv_inplace(|x| x * p0);
            let mut delta = LU::new(jacobian)?.solve(&res);
            if !delta.iter().all(|d| d.is_finite()) {
                return Err(EosError::IterationFailed(String::from("Critical point")));
            }

            // reduce step if necessary
            if delta[0].abs() > 0.25 * t / t0 {
                delta *= 0.25 * t / t0 / delta[0].abs()
            }
            if delta[1].abs() > 0.5 * p / p0 {
                delta *= 0.5 * p / p0 / delta[1].abs()
            }

            t -= delta[0] * t0;
            p -= delta[1] * p0;

            log_iter!(
                verbosity,
                " {:4} | {:14.8e} | {:13.8} | {:14.8e}",
                i,
                norm(&res),
                t,
                p
            );

            // check convergence
            if norm(&delta) < tol {
                log_result!(
                    verbosity,
                    "Critical point calculation converged in {} step(s)\n",
                    i
                );
                let z_c = CubicCoefficients::new(eos, molefracs, t, p).compressibility();
                return Self::new_tv(eos, t, z_c * RGAS * t / p, molefracs);
            }
        }
        Err(EosError::NotConverged(String::from("Critical point")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::CubicParameters;
    use crate::state::Phase;
    use approx::assert_relative_eq;

    #[test]
    fn pure_component_critical_point() -> EosResult<()> {
        let p = Arc::new(CubicParameters::new_simple(
            &[190.6, 305.3],
            &[46.04e5, 48.72e5],
            &[0.011, 0.099],
        )?);
        for eos in [
            CubicEos::peng_robinson(p.clone(), None, None)?,
            CubicEos::soave_redlich_kwong(p.clone(), None, None)?,
            CubicEos::van_der_waals(p.clone(), None)?,
        ] {
            let z_c = eos.critical_parameters.constants.z_c;
            let cp = MixtureState::critical_point_pure(&Arc::new(eos), SolverOptions::default())?;
            for (i, s) in cp.iter().enumerate() {
                assert_relative_eq!(s.temperature, p.tc[i], max_relative = 1e-8);
                assert_relative_eq!(s.pressure, p.pc[i], max_relative = 1e-8);
                assert_relative_eq!(s.compressibility(Phase::Stable)?, z_c, max_relative = 1e-8);
            }
        }
        Ok(())
    }

    #[test]
    fn mixture_critical_point_is_inflection() -> EosResult<()> {
        let p = Arc::new(CubicParameters::new_simple(
            &[190.6, 305.3],
            &[46.04e5, 48.72e5],
            &[0.011, 0.099],
        )?);
        let eos = Arc::new(CubicEos::peng_robinson(p, None, None)?);
        let z = arr1(&[0.5, 0.5]);
        let cp = MixtureState::critical_point(&eos, &z, SolverOptions::default())?;
        assert!(cp.temperature > 190.6 && cp.temperature < 305.3);
        let v = cp.volume(Phase::Stable)?;
        let scale = cp.pressure / v;
        assert!(cp.dp_dv(Phase::Stable)?.abs() / scale < 1e-6);
        assert!(cp.d2p_dv2(Phase::Stable)?.abs() * v / scale < 1e-5);
        Ok(())
    }
}
