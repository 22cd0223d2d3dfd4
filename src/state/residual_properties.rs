use super::fugacity::safe_ln;
use super::{MixtureState, Phase, Root};
use crate::errors::EosResult;
use crate::RGAS;
use ndarray::Array1;

/// # Departure properties
///
/// Molar properties of the fluid minus those of an ideal gas at the same
/// temperature, pressure and composition.
impl MixtureState {
    pub(crate) fn gibbs_departure_root(&self, root: Root) -> f64 {
        let rt = RGAS * self.temperature;
        let v = root.volume;
        let g = self.root_terms(root).integral.g;
        -rt * safe_ln(self.pressure * (v - self.geometry.b) / rt) - self.mixture.a_alpha * g
            + self.pressure * v
            - rt
    }

    /// Residual Gibbs energy in J/mol.
    pub fn gibbs_departure(&self, phase: Phase) -> EosResult<f64> {
        Ok(self.gibbs_departure_root(self.root(phase)?))
    }

    /// Residual enthalpy in J/mol.
    pub fn enthalpy_departure(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        let g = self.root_terms(root).integral.g;
        let t = self.temperature;
        Ok(self.pressure * root.volume - RGAS * t
            + (t * self.mixture.da_alpha_dt - self.mixture.a_alpha) * g)
    }

    /// Residual entropy in J/(mol K).
    pub fn entropy_departure(&self, phase: Phase) -> EosResult<f64> {
        Ok((self.enthalpy_departure(phase)? - self.gibbs_departure(phase)?) / self.temperature)
    }

    /// Residual Helmholtz energy in J/mol.
    pub fn helmholtz_departure(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        Ok(self.gibbs_departure_root(root) - self.pressure * root.volume
            + RGAS * self.temperature)
    }

    /// Residual internal energy in J/mol.
    pub fn internal_energy_departure(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        let g = self.root_terms(root).integral.g;
        Ok((self.temperature * self.mixture.da_alpha_dt - self.mixture.a_alpha) * g)
    }

    /// Residual isochoric heat capacity in J/(mol K).
    pub fn cv_departure(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        let g = self.root_terms(root).integral.g;
        Ok(self.temperature * self.mixture.d2a_alpha_dt2 * g)
    }

    /// Residual isobaric heat capacity in J/(mol K).
    pub fn cp_departure(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        let terms = self.root_terms(root);
        Ok(self.cv_departure(phase)?
            - self.temperature * terms.dp_dt * terms.dp_dt / terms.dp_dv
            - RGAS)
    }

    /// Pressure derivative of the residual enthalpy at constant temperature in m³/mol.
    pub fn denthalpy_departure_dp(&self, phase: Phase) -> EosResult<f64> {
        Ok(self.volume(phase)? - self.temperature * self.dv_dt(phase)?)
    }

    /// Pressure derivative of the residual entropy at constant temperature in m³/(mol K).
    pub fn dentropy_departure_dp(&self, phase: Phase) -> EosResult<f64> {
        Ok(RGAS / self.pressure - self.dv_dt(phase)?)
    }

    /// Pressure derivative of the residual Gibbs energy at constant temperature in m³/mol.
    pub fn dgibbs_departure_dp(&self, phase: Phase) -> EosResult<f64> {
        Ok(self.volume(phase)? - RGAS * self.temperature / self.pressure)
    }
}

/// # Volumetric derivatives
impl MixtureState {
    /// $\left(\frac{\partial p}{\partial T}\right)_{v,n}$ in Pa/K.
    pub fn dp_dt(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        Ok(self.root_terms(root).dp_dt)
    }

    /// $\left(\frac{\partial p}{\partial v}\right)_{T,n}$ in Pa mol/m³.
    pub fn dp_dv(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        Ok(self.root_terms(root).dp_dv)
    }

    /// $\left(\frac{\partial^2p}{\partial v^2}\right)_{T,n}$
    pub fn d2p_dv2(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        let terms = self.root_terms(root);
        let v = root.volume;
        let vb = v - self.geometry.b;
        let f = terms.denominator;
        let df = 2.0 * v + self.geometry.delta;
        Ok(2.0 * RGAS * self.temperature / (vb * vb * vb)
            + self.mixture.a_alpha * (2.0 / (f * f) - 2.0 * df * df / (f * f * f)))
    }

    /// $\left(\frac{\partial v}{\partial T}\right)_{p,n}$ in m³/(mol K).
    pub fn dv_dt(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        let terms = self.root_terms(root);
        Ok(-terms.dp_dt / terms.dp_dv)
    }

    /// $\left(\frac{\partial v}{\partial p}\right)_{T,n}$ in m³/(mol Pa).
    pub fn dv_dp(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        Ok(1.0 / self.root_terms(root).dp_dv)
    }

    /// $\left(\frac{\partial p}{\partial n_i}\right)_{T,V,n_j}$ for one mole of mixture in Pa/mol.
    pub fn dp_dni(&self, phase: Phase) -> EosResult<Array1<f64>> {
        Ok(self.dp_dni_root(self.root(phase)?))
    }

    /// Partial molar volumes $\bar v_i$ in m³/mol.
    pub fn partial_molar_volume(&self, phase: Phase) -> EosResult<Array1<f64>> {
        Ok(self.partial_molar_volume_root(self.root(phase)?))
    }

    fn dp_dni_root(&self, root: Root) -> Array1<f64> {
        let rt = RGAS * self.temperature;
        let v = root.volume;
        let vb = v - self.geometry.b;
        let f = self.root_terms(root).denominator;
        let a_alpha = self.mixture.a_alpha;
        let grad = self.extensive_gradients();
        let mut dp = Array1::zeros(grad.q.len());
        for i in 0..dp.len() {
            dp[i] = rt / vb + rt * grad.b[i] / (vb * vb) - grad.q[i] / f
                + a_alpha * (grad.d[i] * v + grad.e[i]) / (f * f);
        }
        dp
    }

    pub(crate) fn partial_molar_volume_root(&self, root: Root) -> Array1<f64> {
        let dp_dv = self.root_terms(root).dp_dv;
        -self.dp_dni_root(root) / dp_dv
    }
}
