//! Generic two parameter cubic equation of state.
use crate::errors::{EosError, EosResult};
use crate::mixing_rules::{
    AttractionMatrix, GeometryParameters, MixingOptions, MixingRule, MixingRuleFunction,
    PureAlphaTerms,
};
use crate::parameter::CubicParameters;
use crate::phase_equilibria::wilson_k_values;
use crate::RGAS;
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

pub mod alpha;
mod family;

pub use alpha::{Alpha, AlphaFunction};
pub use family::{ClosedForm, CriticalConstants, CubicFamily, Delta};

/// Parameters processed using model constants and substance critical data.
#[derive(Debug, Clone)]
pub struct CriticalParameters {
    /// $a_i=\Omega_aR^2T_{c,i}^2/p_{c,i}$
    pub ac: Array1<f64>,
    /// $b_i=\Omega_bRT_{c,i}/p_{c,i}$
    pub bc: Array1<f64>,
    pub constants: CriticalConstants,
}

impl CriticalParameters {
    fn new(p: &CubicParameters, delta: &Delta) -> Self {
        let constants = delta.critical_constants();
        let ac = constants.omega_a * &p.tc.mapv(|tc| (RGAS * tc).powi(2)) / &p.pc;
        let bc = constants.omega_b * RGAS * &p.tc / &p.pc;
        Self { ac, bc, constants }
    }

    fn subset(&self, component_list: &[usize]) -> Self {
        Self {
            ac: component_list.iter().map(|&i| self.ac[i]).collect(),
            bc: component_list.iter().map(|&i| self.bc[i]).collect(),
            constants: self.constants,
        }
    }
}

/// Model options of a cubic equation of state.
#[derive(Debug, Clone)]
pub struct CubicOptions {
    pub family: CubicFamily,
    pub alpha: Alpha,
    pub mixing: MixingRule,
    pub mixing_options: MixingOptions,
}

impl From<CubicFamily> for CubicOptions {
    fn from(family: CubicFamily) -> Self {
        Self {
            family,
            alpha: family.default_alpha(),
            mixing: MixingRule::default(),
            mixing_options: MixingOptions::default(),
        }
    }
}

impl CubicOptions {
    pub fn new(family: CubicFamily) -> Self {
        family.into()
    }

    pub fn alpha(mut self, alpha: Alpha) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn mixing(mut self, mixing: MixingRule) -> Self {
        self.mixing = mixing;
        self
    }

    pub fn mixing_options(mut self, mixing_options: MixingOptions) -> Self {
        self.mixing_options = mixing_options;
        self
    }

    fn subset(&self, component_list: &[usize]) -> Self {
        Self {
            family: self.family,
            alpha: self.alpha.subset(component_list),
            mixing: self.mixing.clone(),
            mixing_options: self.mixing_options,
        }
    }
}

/// A generic cubic equation of state
///
/// $$p=\frac{RT}{v-b}-\frac{a\alpha(T)}{v^2+\delta v+\varepsilon}$$
///
/// with quadratic mixing of the attraction parameter and linear mixing of the covolume.
#[derive(Debug, Clone)]
pub struct CubicEos {
    pub parameters: Arc<CubicParameters>,
    pub options: CubicOptions,
    /// processed parameters using model and substance critical data
    pub critical_parameters: CriticalParameters,
    pub geometry: GeometryParameters,
}

impl CubicEos {
    /// Generic cubic equation of state with adjustable universal constants.
    pub fn new(parameters: Arc<CubicParameters>, options: CubicOptions) -> EosResult<Self> {
        options.alpha.validate(parameters.components())?;
        let sentinel = options.mixing_options.zero_sentinel;
        if sentinel.is_nan() || sentinel <= 0.0 {
            return Err(EosError::IncompatibleParameters(format!(
                "zero_sentinel has to be positive, got {}.",
                options.mixing_options.zero_sentinel
            )));
        }
        let delta = options.family.delta();
        let critical_parameters = CriticalParameters::new(&parameters, &delta);
        let geometry = GeometryParameters::new(
            delta.d1,
            delta.d2,
            &critical_parameters.bc,
            &parameters.volume_shift,
        );
        Ok(Self {
            parameters,
            options,
            critical_parameters,
            geometry,
        })
    }

    fn with_family(
        parameters: Arc<CubicParameters>,
        family: CubicFamily,
        alpha: Option<Alpha>,
        mixing: Option<MixingRule>,
    ) -> EosResult<Self> {
        let mut options = CubicOptions::new(family);
        if let Some(alpha) = alpha {
            options.alpha = alpha;
        }
        if let Some(mixing) = mixing {
            options.mixing = mixing;
        }
        Self::new(parameters, options)
    }

    /// Peng Robinson equation of state.
    ///
    /// Universal constants:
    /// - $\delta_1 = 1 + \sqrt{2}$
    /// - $\delta_2 = 1 - \sqrt{2}$
    ///
    /// If no options are supplied, the following is used:
    /// - alpha function: Peng Robinson (1976)
    /// - mixing rules: quadratic mixing
    pub fn peng_robinson(
        parameters: Arc<CubicParameters>,
        alpha: Option<Alpha>,
        mixing: Option<MixingRule>,
    ) -> EosResult<Self> {
        Self::with_family(parameters, CubicFamily::PengRobinson, alpha, mixing)
    }

    /// Soave Redlich Kwong equation of state.
    ///
    /// Universal constants:
    /// - $\delta_1 = 1$
    /// - $\delta_2 = 0$
    ///
    /// If no options are supplied, the following is used:
    /// - alpha function: Soave (1972)
    /// - mixing rules: quadratic mixing
    pub fn soave_redlich_kwong(
        parameters: Arc<CubicParameters>,
        alpha: Option<Alpha>,
        mixing: Option<MixingRule>,
    ) -> EosResult<Self> {
        Self::with_family(parameters, CubicFamily::SoaveRedlichKwong, alpha, mixing)
    }

    /// Redlich Kwong equation of state with $\alpha=T_r^{-1/2}$.
    pub fn redlich_kwong(
        parameters: Arc<CubicParameters>,
        mixing: Option<MixingRule>,
    ) -> EosResult<Self> {
        Self::with_family(parameters, CubicFamily::RedlichKwong, None, mixing)
    }

    /// Van der Waals equation of state with a temperature independent attraction.
    pub fn van_der_waals(
        parameters: Arc<CubicParameters>,
        mixing: Option<MixingRule>,
    ) -> EosResult<Self> {
        Self::with_family(parameters, CubicFamily::VanDerWaals, None, mixing)
    }

    pub fn components(&self) -> usize {
        self.parameters.components()
    }

    pub fn subset(&self, component_list: &[usize]) -> Self {
        Self {
            parameters: Arc::new(self.parameters.subset(component_list)),
            options: self.options.subset(component_list),
            critical_parameters: self.critical_parameters.subset(component_list),
            geometry: self.geometry.subset(component_list),
        }
    }

    /// $a_i\alpha_i(T)$ of all components and its temperature derivatives.
    pub fn pure_alpha_terms(&self, temperature: f64) -> PureAlphaTerms {
        let p = &self.parameters;
        let ac = &self.critical_parameters.ac;
        let [alpha, dalpha_dt, d2alpha_dt2] =
            self.options
                .alpha
                .alpha_and_derivatives(&p.tc, &p.acentric_factor, temperature);
        PureAlphaTerms {
            temperature,
            a_alpha: alpha * ac,
            da_alpha_dt: dalpha_dt * ac,
            d2a_alpha_dt2: d2alpha_dt2 * ac,
        }
    }

    /// Pairwise attraction parameters at the given temperature.
    pub fn attraction_matrix(&self, temperature: f64) -> AttractionMatrix {
        self.options.mixing.attraction_matrix(
            &self.parameters,
            &self.pure_alpha_terms(temperature),
            &self.options.mixing_options,
        )
    }

    /// The closed form fugacity expression that applies to this model, if any.
    pub fn closed_form(&self) -> Option<ClosedForm> {
        if self.parameters.volume_shift.iter().any(|&c| c != 0.0) {
            return None;
        }
        self.options.family.closed_form()
    }

    /// Molar volume at the pseudo critical point $v_c=Z_cb^0/\Omega_b-c$,
    /// used to label a single volume root as liquid-like or vapor-like.
    pub fn pseudo_critical_volume(&self, molefracs: &Array1<f64>) -> f64 {
        let c = &self.critical_parameters.constants;
        let b0 = self.critical_parameters.bc.dot(molefracs);
        c.z_c / c.omega_b * b0 - self.parameters.volume_shift.dot(molefracs)
    }

    /// Wilson estimate of the equilibrium ratios.
    pub fn wilson_k_values(&self, temperature: f64, pressure: f64) -> Array1<f64> {
        let p = &self.parameters;
        wilson_k_values(&p.tc, &p.pc, &p.acentric_factor, temperature, pressure)
    }
}

impl fmt::Display for CubicEos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} equation of state with {} component(s)",
            self.options.family,
            self.components()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{CubicRecord, Identifier, PureRecord};
    use approx::assert_relative_eq;

    fn propane() -> Arc<CubicParameters> {
        let record = PureRecord::new(
            Identifier::new(Some("74-98-6"), Some("propane"), Some("C3H8")),
            CubicRecord::new(369.83, 4.248e6, 0.152),
        );
        Arc::new(CubicParameters::new_pure(record).unwrap())
    }

    #[test]
    fn critical_parameters_peng_robinson() {
        let eos = CubicEos::peng_robinson(propane(), None, None).unwrap();
        let (tc, pc) = (369.83, 4.248e6);
        assert_relative_eq!(
            eos.critical_parameters.ac[0],
            0.45723552892138214 * (RGAS * tc).powi(2) / pc,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            eos.critical_parameters.bc[0],
            0.07779607390388846 * RGAS * tc / pc,
            max_relative = 1e-12
        );
        let pure = eos.pure_alpha_terms(tc);
        assert_relative_eq!(pure.a_alpha[0], eos.critical_parameters.ac[0], max_relative = 1e-12);
        assert_eq!(eos.closed_form(), Some(ClosedForm::PengRobinson));
    }

    #[test]
    fn translated_model_has_no_closed_form() {
        let record = PureRecord::new(
            Identifier::default(),
            CubicRecord::new(369.83, 4.248e6, 0.152).with_volume_shift(5e-6),
        );
        let p = Arc::new(CubicParameters::new_pure(record).unwrap());
        let eos = CubicEos::peng_robinson(p, None, None).unwrap();
        assert_eq!(eos.closed_form(), None);
        assert_relative_eq!(eos.geometry.b[0], eos.critical_parameters.bc[0] - 5e-6);
    }

    #[test]
    fn invalid_sentinel() {
        let options = CubicOptions::new(CubicFamily::PengRobinson)
            .mixing_options(MixingOptions::default().zero_sentinel(-1.0));
        assert!(CubicEos::new(propane(), options).is_err());
    }

    #[test]
    fn wilson_at_critical_point() {
        let eos = CubicEos::soave_redlich_kwong(propane(), None, None).unwrap();
        let k = eos.wilson_k_values(369.83, 4.248e6);
        assert_relative_eq!(k[0], 1.0, max_relative = 1e-14);
    }
}
