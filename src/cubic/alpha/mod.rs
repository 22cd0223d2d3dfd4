//! Temperature dependence of the attraction parameter of pure components.
use crate::errors::{EosError, EosResult};
use enum_dispatch::enum_dispatch;
use ndarray::Array1;
use num_dual::{second_derivative, Dual2_64, DualNum};
use std::str::FromStr;

mod mathias_copeman;
mod soave;
mod twu;
pub use mathias_copeman::MathiasCopeman;
pub use soave::{
    Constant, PengRobinson1976, PengRobinson1978, RedlichKwong, Soave, SoaveRedlichKwong1972,
};
pub use twu::{GeneralizedTwu, Twu};

/// The α-function of a pure component.
///
/// Implementations only provide α as a function of the reduced temperature
/// for a single component; the temperature derivatives follow from a dual number
/// evaluation in [AlphaFunction::alpha_and_derivatives].
#[enum_dispatch]
pub trait AlphaFunction {
    fn alpha<D: DualNum<f64> + Copy>(
        &self,
        component: usize,
        acentric_factor: f64,
        reduced_temperature: D,
    ) -> D;

    /// Check for validity of alpha function against the number of components.
    fn validate(&self, components: usize) -> EosResult<()>;

    /// Generate the alpha function for a subset of components.
    fn subset(&self, component_list: &[usize]) -> Self;

    /// α, dα/dT and d²α/dT² of all components at the given temperature.
    fn alpha_and_derivatives(
        &self,
        tc: &Array1<f64>,
        acentric_factor: &Array1<f64>,
        temperature: f64,
    ) -> [Array1<f64>; 3] {
        let n = tc.len();
        let mut alpha = Array1::zeros(n);
        let mut dalpha_dt = Array1::zeros(n);
        let mut d2alpha_dt2 = Array1::zeros(n);
        for i in 0..n {
            let (a, da, d2a) = second_derivative(
                |t: Dual2_64| self.alpha(i, acentric_factor[i], t / tc[i]),
                temperature,
            );
            alpha[i] = a;
            dalpha_dt[i] = da;
            d2alpha_dt2[i] = d2a;
        }
        [alpha, dalpha_dt, d2alpha_dt2]
    }
}

/// Closed set of α-functions.
#[enum_dispatch(AlphaFunction)]
#[derive(Debug, Clone)]
pub enum Alpha {
    Constant,
    RedlichKwong,
    Soave,
    SoaveRedlichKwong1972,
    PengRobinson1976,
    PengRobinson1978,
    MathiasCopeman,
    GeneralizedTwu,
    Twu,
}

/// Names of the α-functions that need no component specific parameters.
const ALPHA_TABLE: [(&str, fn() -> Alpha); 7] = [
    ("constant", || Constant.into()),
    ("redlich_kwong", || RedlichKwong.into()),
    ("soave_redlich_kwong_1972", || SoaveRedlichKwong1972.into()),
    ("peng_robinson_1976", || PengRobinson1976.into()),
    ("peng_robinson_1978", || PengRobinson1978.into()),
    ("generalized_twu_pr", || GeneralizedTwu::peng_robinson().into()),
    ("generalized_twu_srk", || GeneralizedTwu::redlich_kwong().into()),
];

impl FromStr for Alpha {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_lowercase().replace(['-', ' '], "_");
        ALPHA_TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, alpha)| alpha())
            .ok_or_else(|| EosError::InvalidMethod(s.to_string()))
    }
}
