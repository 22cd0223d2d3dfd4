use super::{MixtureState, Phase, Root};
use crate::cubic::ClosedForm;
use crate::errors::EosResult;
use crate::mixing_rules::{scaled_d2ns, scaled_dns};
use crate::RGAS;
use ndarray::{Array1, Array2, Zip};
use std::f64::consts::SQRT_2;

/// Logarithm that evaluates to zero outside of its domain.
pub(crate) fn safe_ln(x: f64) -> f64 {
    if x > 0.0 {
        x.ln()
    } else {
        0.0
    }
}

/// First mole number derivatives of the extensive parameters
/// $n^2a\alpha$, $nb$, $n\delta$ and $n^2\varepsilon$.
pub(crate) struct ExtensiveGradients {
    pub q: Array1<f64>,
    pub b: Array1<f64>,
    pub d: Array1<f64>,
    pub e: Array1<f64>,
}

/// Second mole number derivatives of the extensive parameters.
pub(crate) struct ExtensiveHessians {
    pub q: Array2<f64>,
    pub b: Array2<f64>,
    pub d: Array2<f64>,
    pub e: Array2<f64>,
}

/// # Fugacities
impl MixtureState {
    pub(crate) fn extensive_gradients(&self) -> ExtensiveGradients {
        ExtensiveGradients {
            q: scaled_dns(self.a_alpha_derivatives(), 2),
            b: scaled_dns(self.b_derivatives(), 1),
            d: scaled_dns(self.delta_derivatives(), 1),
            e: scaled_dns(self.epsilon_derivatives(), 2),
        }
    }

    pub(crate) fn extensive_hessians(&self) -> ExtensiveHessians {
        ExtensiveHessians {
            q: scaled_d2ns(self.a_alpha_derivatives(), 2),
            b: scaled_d2ns(self.b_derivatives(), 1),
            d: scaled_d2ns(self.delta_derivatives(), 1),
            e: scaled_d2ns(self.epsilon_derivatives(), 2),
        }
    }

    /// Logarithm of the fugacity coefficients $\ln\varphi_i$ of the given root.
    ///
    /// Closed form expressions are used for untranslated van der Waals,
    /// Redlich-Kwong and Peng-Robinson models, the general expression otherwise.
    pub fn ln_phi(&self, phase: Phase) -> EosResult<Array1<f64>> {
        let root = self.root(phase)?;
        Ok(self.ln_phi_root(root).clone())
    }

    /// Logarithm of the fugacity coefficients from the expression that is valid
    /// for every cubic equation of state.
    pub fn ln_phi_generic(&self, phase: Phase) -> EosResult<Array1<f64>> {
        let root = self.root(phase)?;
        Ok(self.ln_phi_generic_root(root))
    }

    /// Fugacity coefficients $\varphi_i$.
    pub fn phi(&self, phase: Phase) -> EosResult<Array1<f64>> {
        Ok(self.ln_phi(phase)?.mapv(f64::exp))
    }

    /// Fugacities $f_i=x_i\varphi_ip$ in Pascal.
    pub fn fugacities(&self, phase: Phase) -> EosResult<Array1<f64>> {
        Ok(&self.molefracs * &self.phi(phase)? * self.pressure)
    }

    /// $\ln\varphi_i$ of the requested root or, if it does not exist, of the
    /// other root, together with the root that was used.
    pub(crate) fn ln_phi_branch(&self, phase: Phase) -> EosResult<(Array1<f64>, Phase)> {
        let root = self.root_or_fallback(phase)?;
        Ok((self.ln_phi_root(root).clone(), root.phase()))
    }

    /// Like [MixtureState::ln_phi_branch] with the mole number derivatives.
    pub(crate) fn ln_phi_dnj_branch(
        &self,
        phase: Phase,
    ) -> EosResult<(Array1<f64>, Array2<f64>, Phase)> {
        let root = self.root_or_fallback(phase)?;
        Ok((
            self.ln_phi_root(root).clone(),
            self.dln_phi_dnj_root(root).clone(),
            root.phase(),
        ))
    }

    pub(crate) fn ln_phi_root(&self, root: Root) -> &Array1<f64> {
        self.cache.ln_phi[root.index].get_or_init(|| match self.eos.closed_form() {
            Some(form) => self.ln_phi_closed_form(root, form),
            None => self.ln_phi_generic_root(root),
        })
    }

    fn ln_phi_generic_root(&self, root: Root) -> Array1<f64> {
        let rt = RGAS * self.temperature;
        let v = root.volume;
        let b = self.geometry.b;
        let a_alpha = self.mixture.a_alpha;
        let terms = self.root_terms(root);
        let g = terms.integral;
        let ln_zb = safe_ln(self.pressure * (v - b) / rt);
        let grad = self.extensive_gradients();
        Zip::from(&grad.q)
            .and(&grad.b)
            .and(&grad.d)
            .and(&grad.e)
            .map_collect(|&q, &bi, &d, &e| {
                -ln_zb + bi / (v - b) - (q * g.g + a_alpha * (g.g_d * d + g.g_e * e)) / rt
            })
    }

    fn ln_phi_closed_form(&self, root: Root, form: ClosedForm) -> Array1<f64> {
        let rt = RGAS * self.temperature;
        let v = root.volume;
        let b = self.geometry.b;
        let z = self.root_terms(root).compressibility;
        let big_a = self.mixture.a_alpha * self.pressure / (rt * rt);
        let big_b = b * self.pressure / rt;
        let ln_zb = safe_ln(z - big_b);
        let bs = &self.eos.geometry.b;
        let rows = &self.mixture.a_alpha_j_rows;
        let scale = self.pressure / (rt * rt);
        match form {
            ClosedForm::VanDerWaals => Zip::from(bs)
                .and(rows)
                .map_collect(|&bi, &r| bi / (v - b) - ln_zb - 2.0 * r / (rt * v)),
            ClosedForm::RedlichKwong => {
                let l = safe_ln(1.0 + big_b / z) / big_b;
                Zip::from(bs).and(rows).map_collect(|&bi, &r| {
                    bi / b * (z - 1.0) - ln_zb - l * (2.0 * r * scale - big_a * bi / b)
                })
            }
            ClosedForm::PengRobinson => {
                let l = safe_ln((z + (1.0 + SQRT_2) * big_b) / (z + (1.0 - SQRT_2) * big_b))
                    / (2.0 * SQRT_2 * big_b);
                Zip::from(bs).and(rows).map_collect(|&bi, &r| {
                    bi / b * (z - 1.0) - ln_zb - l * (2.0 * r * scale - big_a * bi / b)
                })
            }
        }
    }

    /// Derivatives of $\frac{A^\mathrm{res}}{RT}$ per mole number
    /// (i.e. $\ln\varphi_i+\ln Z$) with respect to temperature at constant volume
    /// and with respect to volume at constant temperature.
    fn dres_dt_dv(&self, root: Root) -> (Array1<f64>, Array1<f64>) {
        let t = self.temperature;
        let rt = RGAS * t;
        let v = root.volume;
        let b = self.geometry.b;
        let vb = v - b;
        let a_alpha = self.mixture.a_alpha;
        let da_alpha_dt = self.mixture.da_alpha_dt;
        let g = self.root_terms(root).integral;
        let grad = self.extensive_gradients();
        let dq_dt = scaled_dns(self.da_alpha_dt_derivatives(), 2);

        let mut df_dt = Array1::zeros(grad.q.len());
        let mut df_dv = Array1::zeros(grad.q.len());
        for i in 0..grad.q.len() {
            let (q, bi, d, e) = (grad.q[i], grad.b[i], grad.d[i], grad.e[i]);
            let w = q * g.g + a_alpha * (g.g_d * d + g.g_e * e);
            let dw_dt = dq_dt[i] * g.g + da_alpha_dt * (g.g_d * d + g.g_e * e);
            let dw_dv = q * g.g_v + a_alpha * (g.g_dv * d + g.g_ev * e);
            df_dt[i] = -dw_dt / rt + w / (rt * t);
            df_dv[i] = -b / (v * vb) - bi / (vb * vb) - dw_dv / rt;
        }
        (df_dt, df_dv)
    }

    /// Temperature derivative of $\ln\varphi_i$ at constant pressure in 1/K.
    pub fn dln_phi_dt(&self, phase: Phase) -> EosResult<Array1<f64>> {
        let root = self.root(phase)?;
        let terms = self.root_terms(root);
        let v = root.volume;
        let dv_dt = -terms.dp_dt / terms.dp_dv;
        let (df_dt, df_dv) = self.dres_dt_dv(root);
        Ok(df_dt + df_dv * dv_dt - (dv_dt / v - 1.0 / self.temperature))
    }

    /// Pressure derivative of $\ln\varphi_i$ at constant temperature in 1/Pa.
    pub fn dln_phi_dp(&self, phase: Phase) -> EosResult<Array1<f64>> {
        let root = self.root(phase)?;
        let terms = self.root_terms(root);
        let dv_dp = 1.0 / terms.dp_dv;
        let (_, df_dv) = self.dres_dt_dv(root);
        Ok(df_dv * dv_dp - (1.0 / self.pressure + dv_dp / root.volume))
    }

    /// Mole number derivatives $\left(\frac{\partial\ln\varphi_i}{\partial n_j}\right)_{T,p}$
    /// for one mole of mixture.
    ///
    /// The matrix is symmetric and satisfies the Gibbs-Duhem equation
    /// $\sum_ix_i\frac{\partial\ln\varphi_i}{\partial n_j}=0$.
    pub fn dln_phi_dnj(&self, phase: Phase) -> EosResult<Array2<f64>> {
        let root = self.root(phase)?;
        Ok(self.dln_phi_dnj_root(root).clone())
    }

    pub(crate) fn dln_phi_dnj_root(&self, root: Root) -> &Array2<f64> {
        self.cache.dln_phi_dnj[root.index].get_or_init(|| {
            let rt = RGAS * self.temperature;
            let v = root.volume;
            let vb = v - self.geometry.b;
            let a_alpha = self.mixture.a_alpha;
            let g = self.root_terms(root).integral;
            let grad = self.extensive_gradients();
            let hess = self.extensive_hessians();
            let (_, df_dv) = self.dres_dt_dv(root);
            let v_bar = self.partial_molar_volume_root(root);
            // contribution of species i through δ and ε
            let p = &grad.d * g.g_d + &grad.e * g.g_e;
            let n = grad.q.len();
            Array2::from_shape_fn([n, n], |(i, j)| {
                let repulsive = (grad.b[i] + grad.b[j] + hess.b[[i, j]]) / vb
                    + grad.b[i] * grad.b[j] / (vb * vb);
                let attractive = hess.q[[i, j]] * g.g
                    + grad.q[i] * p[j]
                    + grad.q[j] * p[i]
                    + a_alpha
                        * (g.g_dd * grad.d[i] * grad.d[j]
                            + g.g_de * (grad.d[i] * grad.e[j] + grad.d[j] * grad.e[i])
                            + g.g_ee * grad.e[i] * grad.e[j]
                            + g.g_d * hess.d[[i, j]]
                            + g.g_e * hess.e[[i, j]]);
                repulsive - attractive / rt + df_dv[i] * v_bar[j] - (v_bar[j] / v - 1.0)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubic::alpha::GeneralizedTwu;
    use crate::cubic::CubicEos;
    use crate::parameter::{CubicParameters, CubicRecord, Identifier, PureRecord};
    use crate::state::Phase;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use std::sync::Arc;

    fn parameters() -> Arc<CubicParameters> {
        Arc::new(
            CubicParameters::new_with_kij(
                &[126.1, 190.6, 305.3],
                &[33.94e5, 46.04e5, 48.72e5],
                &[0.04, 0.011, 0.099],
                arr2(&[[0.0, 0.03, 0.06], [0.03, 0.0, -0.003], [0.06, -0.003, 0.0]]),
            )
            .unwrap(),
        )
    }

    fn models() -> Vec<Arc<CubicEos>> {
        let p = parameters();
        vec![
            Arc::new(CubicEos::peng_robinson(p.clone(), None, None).unwrap()),
            Arc::new(CubicEos::soave_redlich_kwong(p.clone(), None, None).unwrap()),
            Arc::new(CubicEos::redlich_kwong(p.clone(), None).unwrap()),
            Arc::new(CubicEos::van_der_waals(p, None).unwrap()),
        ]
    }

    fn translated() -> Arc<CubicEos> {
        let records = [
            (126.1, 33.94e5, 0.04, 3.0e-6),
            (190.6, 46.04e5, 0.011, -1.0e-6),
            (305.3, 48.72e5, 0.099, 4.0e-6),
        ]
        .iter()
        .map(|&(tc, pc, w, c)| {
            PureRecord::new(
                Identifier::default(),
                CubicRecord::new(tc, pc, w).with_volume_shift(c),
            )
        })
        .collect();
        let p = CubicParameters::from_records(records, None).unwrap();
        let alpha = GeneralizedTwu::peng_robinson().into();
        Arc::new(CubicEos::peng_robinson(Arc::new(p), Some(alpha), None).unwrap())
    }

    const Z: [f64; 3] = [0.2, 0.5, 0.3];

    #[test]
    fn closed_forms_agree_with_general_expression() -> EosResult<()> {
        for eos in models() {
            let s = MixtureState::new_tp(&eos, 160.0, 2e6, &arr1(&Z))?;
            for phase in [Phase::Liquid, Phase::Vapor] {
                if let (Ok(closed), Ok(generic)) = (s.ln_phi(phase), s.ln_phi_generic(phase)) {
                    assert_relative_eq!(closed, generic, epsilon = 1e-9, max_relative = 1e-9);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn pure_fugacity_coefficient_from_residual_gibbs_energy() -> EosResult<()> {
        let p = Arc::new(CubicParameters::new_simple(&[305.3], &[48.72e5], &[0.099])?);
        let eos = Arc::new(CubicEos::peng_robinson(p, None, None)?);
        let s = MixtureState::new_tp(&eos, 250.0, 1e6, &arr1(&[1.0]))?;
        for phase in [Phase::Liquid, Phase::Vapor] {
            let g_dep = s.gibbs_departure(phase)?;
            assert_relative_eq!(
                s.ln_phi(phase)?[0],
                g_dep / (RGAS * 250.0),
                max_relative = 1e-10
            );
        }
        Ok(())
    }

    fn mole_number_fd(s: &MixtureState, phase: Phase, j: usize) -> EosResult<Array1<f64>> {
        let h = 1e-6;
        let mut np = s.molefracs.clone();
        let mut nm = s.molefracs.clone();
        np[j] += h;
        nm[j] -= h;
        let sp = s.to_zs_tp(&(&np / np.sum()), s.temperature, s.pressure)?;
        let sm = s.to_zs_tp(&(&nm / nm.sum()), s.temperature, s.pressure)?;
        Ok((sp.ln_phi_generic(phase)? - sm.ln_phi_generic(phase)?) / (2.0 * h))
    }

    fn check_derivatives(eos: &Arc<CubicEos>, t: f64, p: f64) -> EosResult<()> {
        let s = MixtureState::new_tp(eos, t, p, &arr1(&Z))?;
        for phase in [Phase::Liquid, Phase::Vapor] {
            let Ok(ln_phi) = s.ln_phi_generic(phase) else {
                continue;
            };
            let ht = 1e-4;
            let dt = (s.to_tp(t + ht, p)?.ln_phi_generic(phase)?
                - s.to_tp(t - ht, p)?.ln_phi_generic(phase)?)
                / (2.0 * ht);
            assert_relative_eq!(s.dln_phi_dt(phase)?, dt, epsilon = 1e-9, max_relative = 1e-5);

            let hp = p * 1e-6;
            let dp = (s.to_tp(t, p + hp)?.ln_phi_generic(phase)?
                - s.to_tp(t, p - hp)?.ln_phi_generic(phase)?)
                / (2.0 * hp);
            assert_relative_eq!(s.dln_phi_dp(phase)?, dp, epsilon = 1e-13, max_relative = 1e-5);

            let dn = s.dln_phi_dnj(phase)?;
            for j in 0..3 {
                let fd = mole_number_fd(&s, phase, j)?;
                for i in 0..3 {
                    assert_relative_eq!(dn[[i, j]], fd[i], epsilon = 1e-7, max_relative = 1e-5);
                }
            }
            assert!(ln_phi.iter().all(|x| x.is_finite()));
        }
        Ok(())
    }

    #[test]
    fn derivatives_match_finite_differences() -> EosResult<()> {
        for eos in models() {
            check_derivatives(&eos, 160.0, 2e6)?;
        }
        check_derivatives(&translated(), 160.0, 2e6)
    }

    #[test]
    fn gibbs_duhem_and_symmetry() -> EosResult<()> {
        let eos = translated();
        let s = MixtureState::new_tp(&eos, 140.0, 3e6, &arr1(&Z))?;
        let dn = s.dln_phi_dnj(Phase::Stable)?;
        let gd = s.molefracs.dot(&dn);
        assert!(gd.iter().all(|x| x.abs() < 1e-10));
        assert_relative_eq!(dn, dn.t().to_owned(), epsilon = 1e-10, max_relative = 1e-8);
        Ok(())
    }

    #[test]
    fn pressure_derivative_and_partial_molar_volume() -> EosResult<()> {
        for eos in models() {
            let s = MixtureState::new_tp(&eos, 160.0, 2e6, &arr1(&Z))?;
            let phase = Phase::Stable;
            let v_bar = s.partial_molar_volume(phase)?;
            let expected = v_bar / (RGAS * 160.0) - 1.0 / 2e6;
            assert_relative_eq!(s.dln_phi_dp(phase)?, expected, max_relative = 1e-8);
        }
        Ok(())
    }

    #[test]
    fn fugacities_of_ideal_gas_limit() -> EosResult<()> {
        let eos = &models()[0];
        let s = MixtureState::new_tp(eos, 600.0, 1.0, &arr1(&Z))?;
        let f = s.fugacities(Phase::Vapor)?;
        assert_relative_eq!(f, arr1(&Z) * 1.0, max_relative = 1e-6);
        Ok(())
    }

    #[test]
    fn root_below_covolume() -> EosResult<()> {
        assert_eq!(safe_ln(0.0), 0.0);
        assert_eq!(safe_ln(-2.0), 0.0);
        assert_relative_eq!(safe_ln(std::f64::consts::E), 1.0, max_relative = 1e-15);

        let eos = &models()[0];
        let s = MixtureState::new_tp(eos, 160.0, 2e6, &arr1(&Z))?;
        let b = s.geometry.b;
        let ln_phi = s.ln_phi_generic_root(Root {
            index: 0,
            volume: 0.5 * b,
        });
        assert!(ln_phi.iter().all(|x| x.is_finite()));
        Ok(())
    }
}
