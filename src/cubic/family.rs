use super::alpha::{Alpha, Constant, PengRobinson1976, RedlichKwong, SoaveRedlichKwong1972};
use crate::errors::{EosError, EosResult};
use std::f64::consts::SQRT_2;
use std::fmt;
use std::str::FromStr;

/// Roots $-\delta_1$ and $-\delta_2$ of the denominator $(v+\delta_1b)(v+\delta_2b)$
/// of the attractive term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delta {
    pub d1: f64,
    pub d2: f64,
}

impl From<(f64, f64)> for Delta {
    fn from(value: (f64, f64)) -> Self {
        Delta {
            d1: value.0,
            d2: value.1,
        }
    }
}

/// Universal constants that follow from the criticality conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalConstants {
    pub omega_a: f64,
    pub omega_b: f64,
    /// Critical compressibility factor
    pub z_c: f64,
}

impl Delta {
    // Calculate universal critical constants from universal cubic parameters.
    //
    // See https://doi.org/10.1016/j.fluid.2012.05.008
    pub fn critical_constants(&self) -> CriticalConstants {
        let (r1, r2) = (-self.d1, -self.d2);
        let eta_c = 1.0
            / (((1.0 - r1) * (1.0 - r2).powi(2)).cbrt()
                + ((1.0 - r2) * (1.0 - r1).powi(2)).cbrt()
                + 1.0);
        let omega_a = (1.0 - eta_c * r1) * (1.0 - eta_c * r2) / (1.0 - eta_c)
            * (2.0 - eta_c * (r1 + r2))
            / (3.0 - eta_c * (1.0 + r1 + r2)).powi(2);
        let omega_b = eta_c / (3.0 - eta_c * (1.0 + r1 + r2));
        CriticalConstants {
            omega_a,
            omega_b,
            z_c: omega_b / eta_c,
        }
    }
}

/// Closed form fugacity expressions that exist for untranslated equations of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedForm {
    VanDerWaals,
    RedlichKwong,
    PengRobinson,
}

/// Families of two parameter cubic equations of state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CubicFamily {
    VanDerWaals,
    RedlichKwong,
    SoaveRedlichKwong,
    PengRobinson,
    /// Arbitrary $\delta_1$ and $\delta_2$
    Generic(Delta),
}

const FAMILY_TABLE: [(&str, CubicFamily); 8] = [
    ("vdw", CubicFamily::VanDerWaals),
    ("van_der_waals", CubicFamily::VanDerWaals),
    ("rk", CubicFamily::RedlichKwong),
    ("redlich_kwong", CubicFamily::RedlichKwong),
    ("srk", CubicFamily::SoaveRedlichKwong),
    ("soave_redlich_kwong", CubicFamily::SoaveRedlichKwong),
    ("pr", CubicFamily::PengRobinson),
    ("peng_robinson", CubicFamily::PengRobinson),
];

impl CubicFamily {
    pub fn delta(&self) -> Delta {
        match self {
            Self::VanDerWaals => (0.0, 0.0).into(),
            Self::RedlichKwong | Self::SoaveRedlichKwong => (1.0, 0.0).into(),
            Self::PengRobinson => (1.0 + SQRT_2, 1.0 - SQRT_2).into(),
            Self::Generic(delta) => *delta,
        }
    }

    /// The α-function the family is usually combined with.
    pub fn default_alpha(&self) -> Alpha {
        match self {
            Self::VanDerWaals => Constant.into(),
            Self::RedlichKwong => RedlichKwong.into(),
            Self::SoaveRedlichKwong => SoaveRedlichKwong1972.into(),
            Self::PengRobinson | Self::Generic(_) => PengRobinson1976.into(),
        }
    }

    pub(crate) fn closed_form(&self) -> Option<ClosedForm> {
        match self {
            Self::VanDerWaals => Some(ClosedForm::VanDerWaals),
            Self::RedlichKwong | Self::SoaveRedlichKwong => Some(ClosedForm::RedlichKwong),
            Self::PengRobinson => Some(ClosedForm::PengRobinson),
            Self::Generic(_) => None,
        }
    }
}

impl fmt::Display for CubicFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VanDerWaals => write!(f, "van der Waals"),
            Self::RedlichKwong => write!(f, "Redlich-Kwong"),
            Self::SoaveRedlichKwong => write!(f, "Soave-Redlich-Kwong"),
            Self::PengRobinson => write!(f, "Peng-Robinson"),
            Self::Generic(Delta { d1, d2 }) => write!(f, "cubic(d1={d1}, d2={d2})"),
        }
    }
}

impl FromStr for CubicFamily {
    type Err = EosError;

    fn from_str(s: &str) -> EosResult<Self> {
        let key = s.to_lowercase().replace(['-', ' '], "_");
        FAMILY_TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .map(|&(_, family)| family)
            .ok_or_else(|| EosError::InvalidMethod(s.to_string()))
    }
}
