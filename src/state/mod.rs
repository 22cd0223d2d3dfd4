//! Description of a solved thermodynamic state.
//!
//! A state of a cubic equation of state is defined by
//! * a composition
//! * two of temperature, pressure and molar volume
//!
//! The volume cubic is solved on construction. Properties of the liquid-like
//! and the vapor-like root are evaluated lazily and cached in the state.
use crate::cubic::CubicEos;
use crate::errors::{EosError, EosResult};
use crate::mixing_rules::{
    scaled_d3ns, AttractionMatrix, CompositionDerivatives, CompositionPolynomial,
    MixtureAttraction, MixtureGeometry,
};
use crate::solver::VolumeRoots;
use crate::{SolverOptions, RGAS};
use cache::Cache;
use integral::RootTerms;
use ndarray::{Array1, Array2, Array3};
use std::fmt;
use std::sync::Arc;

mod cache;
mod critical_point;
mod fugacity;
mod integral;
mod residual_properties;

const MAX_ITER_TEMPERATURE: usize = 50;
const TOL_TEMPERATURE: f64 = 1e-12;

/// Root of the volume cubic a property is evaluated at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The smallest physical root.
    Liquid,
    /// The largest physical root.
    Vapor,
    /// The root with the lower Gibbs energy.
    Stable,
}

/// A resolved volume root: index 0 is the liquid, 1 the vapor root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Root {
    pub index: usize,
    pub volume: f64,
}

impl Root {
    pub fn phase(&self) -> Phase {
        if self.index == 0 {
            Phase::Liquid
        } else {
            Phase::Vapor
        }
    }
}

/// Thermodynamic state of a mixture described by a cubic equation of state.
///
/// The state is immutable apart from its cache. Changing temperature, pressure,
/// volume or composition creates a new state, see [MixtureState::to_tp] and
/// [MixtureState::to_zs_tp].
#[derive(Clone, Debug)]
pub struct MixtureState {
    /// Equation of state
    pub eos: Arc<CubicEos>,
    /// Temperature in Kelvin
    pub temperature: f64,
    /// Pressure in Pascal
    pub pressure: f64,
    /// Mole fractions
    pub molefracs: Array1<f64>,
    /// Physical molar volumes in m³/mol
    pub roots: VolumeRoots,
    attraction: Arc<AttractionMatrix>,
    mixture: MixtureAttraction,
    geometry: MixtureGeometry,
    cache: Cache,
}

impl fmt::Display for MixtureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T = {:.5} K, p = {:.5} Pa", self.temperature, self.pressure)?;
        if let Some(v) = self.roots.liquid {
            write!(f, ", v_l = {:.5e} m³/mol", v)?;
        }
        if let Some(v) = self.roots.vapor {
            write!(f, ", v_v = {:.5e} m³/mol", v)?;
        }
        if self.eos.components() > 1 {
            write!(f, ", x = {:.5}", self.molefracs)?;
        }
        Ok(())
    }
}

fn validate(eos: &CubicEos, molefracs: &Array1<f64>, specs: &[(&str, f64)]) -> EosResult<()> {
    if molefracs.len() != eos.components() {
        return Err(EosError::IncompatibleComponents(
            eos.components(),
            molefracs.len(),
        ));
    }
    for &(name, value) in specs {
        if !value.is_finite() || value <= 0.0 {
            return Err(EosError::InvalidState(
                "MixtureState".into(),
                name.into(),
                value,
            ));
        }
    }
    if let Some(&x) = molefracs.iter().find(|x| !x.is_finite() || **x < 0.0) {
        return Err(EosError::InvalidState(
            "MixtureState".into(),
            "molefracs".into(),
            x,
        ));
    }
    Ok(())
}

/// # State constructors
impl MixtureState {
    /// Solve the volume cubic at given temperature and pressure.
    pub fn new_tp(
        eos: &Arc<CubicEos>,
        temperature: f64,
        pressure: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        validate(
            eos,
            molefracs,
            &[("temperature", temperature), ("pressure", pressure)],
        )?;
        let attraction = Arc::new(eos.attraction_matrix(temperature));
        Ok(Self::from_attraction(eos, attraction, pressure, molefracs, None))
    }

    /// Evaluate the pressure at given temperature and molar volume.
    pub fn new_tv(
        eos: &Arc<CubicEos>,
        temperature: f64,
        volume: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        validate(
            eos,
            molefracs,
            &[("temperature", temperature), ("volume", volume)],
        )?;
        let attraction = Arc::new(eos.attraction_matrix(temperature));
        Self::from_attraction_tv(eos, attraction, volume, molefracs)
    }

    /// Iterate the temperature that results in the given pressure at the given molar volume.
    pub fn new_pv(
        eos: &Arc<CubicEos>,
        pressure: f64,
        volume: f64,
        molefracs: &Array1<f64>,
        options: SolverOptions,
    ) -> EosResult<Self> {
        validate(eos, molefracs, &[("pressure", pressure), ("volume", volume)])?;
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_TEMPERATURE, TOL_TEMPERATURE);
        let geometry = eos.geometry.mix(molefracs);
        let vb = volume - geometry.b;
        if vb <= 0.0 {
            return Err(EosError::InvalidState(
                "MixtureState".into(),
                "volume".into(),
                volume,
            ));
        }
        let f = volume * (volume + geometry.delta) + geometry.epsilon;

        // initial value from the attraction at the pseudo critical temperature
        let tc = eos.parameters.tc.dot(molefracs);
        let a_alpha_c = eos.attraction_matrix(tc).mix(molefracs).a_alpha;
        let mut t = ((pressure + a_alpha_c / f) * vb / RGAS).max(1e-3 * tc);

        log_iter!(verbosity, " iter |    residual    |  temperature   ");
        log_iter!(verbosity, "{:-<37}", "");
        for i in 1..=max_iter {
            let attraction = Arc::new(eos.attraction_matrix(t));
            let mix = attraction.mix(molefracs);
            let p = RGAS * t / vb - mix.a_alpha / f;
            let dp_dt = RGAS / vb - mix.da_alpha_dt / f;
            let res = (p - pressure) / pressure;
            log_iter!(verbosity, " {:4} | {:14.8e} | {:14.8}", i, res, t);
            if res.abs() < tol {
                log_result!(verbosity, "Temperature iteration converged in {} step(s)\n", i);
                return Self::from_attraction_tv(eos, attraction, volume, molefracs);
            }
            let dt = (p - pressure) / dp_dt;
            if !dt.is_finite() {
                return Err(EosError::IterationFailed("Temperature iteration".into()));
            }
            t = if t - dt > 0.0 { t - dt } else { 0.5 * t };
        }
        Err(EosError::NotConverged("Temperature iteration".into()))
    }

    fn from_attraction_tv(
        eos: &Arc<CubicEos>,
        attraction: Arc<AttractionMatrix>,
        volume: f64,
        molefracs: &Array1<f64>,
    ) -> EosResult<Self> {
        let geometry = eos.geometry.mix(molefracs);
        if volume <= geometry.b {
            return Err(EosError::InvalidState(
                "MixtureState".into(),
                "volume".into(),
                volume,
            ));
        }
        let mix = attraction.mix(molefracs);
        let MixtureGeometry { b, delta, epsilon } = geometry;
        let pressure = RGAS * attraction.temperature / (volume - b)
            - mix.a_alpha / (volume * (volume + delta) + epsilon);
        if pressure.is_nan() || pressure <= 0.0 {
            return Err(EosError::InvalidState(
                "MixtureState".into(),
                "pressure".into(),
                pressure,
            ));
        }
        Ok(Self::from_attraction(
            eos,
            attraction,
            pressure,
            molefracs,
            Some(volume),
        ))
    }

    /// Build a state from an attraction matrix; the temperature of the state is
    /// the temperature of the matrix.
    fn from_attraction(
        eos: &Arc<CubicEos>,
        attraction: Arc<AttractionMatrix>,
        pressure: f64,
        molefracs: &Array1<f64>,
        volume: Option<f64>,
    ) -> Self {
        let temperature = attraction.temperature;
        let mixture = attraction.mix(molefracs);
        let geometry = eos.geometry.mix(molefracs);
        let v_pc = eos.pseudo_critical_volume(molefracs);
        let roots = match volume {
            Some(v) => VolumeRoots::from_volume(v, v_pc),
            None => VolumeRoots::new(
                temperature,
                pressure,
                mixture.a_alpha,
                geometry.b,
                geometry.delta,
                geometry.epsilon,
                v_pc,
            ),
        };
        Self {
            eos: eos.clone(),
            temperature,
            pressure,
            molefracs: molefracs.clone(),
            roots,
            attraction,
            mixture,
            geometry,
            cache: Cache::default(),
        }
    }

    /// The attraction matrix at `temperature`, shared with this state if the
    /// temperature is unchanged.
    fn attraction_at(&self, temperature: f64) -> Arc<AttractionMatrix> {
        if self.attraction.is_valid_for(temperature) {
            self.attraction.clone()
        } else {
            Arc::new(self.eos.attraction_matrix(temperature))
        }
    }

    /// A new state with the same composition at a different temperature and pressure.
    pub fn to_tp(&self, temperature: f64, pressure: f64) -> EosResult<Self> {
        self.to_zs_tp(&self.molefracs, temperature, pressure)
    }

    /// A new state with the same composition at a different temperature and volume.
    pub fn to_tv(&self, temperature: f64, volume: f64) -> EosResult<Self> {
        validate(
            &self.eos,
            &self.molefracs,
            &[("temperature", temperature), ("volume", volume)],
        )?;
        Self::from_attraction_tv(
            &self.eos,
            self.attraction_at(temperature),
            volume,
            &self.molefracs,
        )
    }

    /// A new state with the same composition at a different pressure and volume.
    pub fn to_pv(&self, pressure: f64, volume: f64, options: SolverOptions) -> EosResult<Self> {
        Self::new_pv(&self.eos, pressure, volume, &self.molefracs, options)
    }

    /// A new state with a different composition, temperature and pressure.
    ///
    /// The pure component attraction terms and the pairwise attraction matrix
    /// are reused if the temperature is unchanged.
    pub fn to_zs_tp(
        &self,
        molefracs: &Array1<f64>,
        temperature: f64,
        pressure: f64,
    ) -> EosResult<Self> {
        validate(
            &self.eos,
            molefracs,
            &[("temperature", temperature), ("pressure", pressure)],
        )?;
        Ok(Self::from_attraction(
            &self.eos,
            self.attraction_at(temperature),
            pressure,
            molefracs,
            None,
        ))
    }

    /// Discard all lazily evaluated properties.
    pub fn invalidate(&mut self) {
        self.cache = Cache::default();
    }
}

/// # Mixture parameters
impl MixtureState {
    /// Shared pairwise attraction matrix at the temperature of the state.
    pub fn attraction(&self) -> &Arc<AttractionMatrix> {
        &self.attraction
    }

    pub fn a_alpha_ijs(&self) -> &Array2<f64> {
        &self.attraction.a_alpha_ijs
    }

    pub fn a_alpha(&self) -> f64 {
        self.mixture.a_alpha
    }

    pub fn da_alpha_dt(&self) -> f64 {
        self.mixture.da_alpha_dt
    }

    pub fn d2a_alpha_dt2(&self) -> f64 {
        self.mixture.d2a_alpha_dt2
    }

    /// $\sum_jz_j(a\alpha)_{ij}$
    pub fn a_alpha_j_rows(&self) -> &Array1<f64> {
        &self.mixture.a_alpha_j_rows
    }

    pub fn da_alpha_dt_j_rows(&self) -> &Array1<f64> {
        &self.mixture.da_alpha_dt_j_rows
    }

    pub fn b(&self) -> f64 {
        self.geometry.b
    }

    pub fn delta(&self) -> f64 {
        self.geometry.delta
    }

    pub fn epsilon(&self) -> f64 {
        self.geometry.epsilon
    }

    /// Composition derivatives of $a\alpha$.
    pub fn a_alpha_derivatives(&self) -> &CompositionDerivatives {
        self.cache
            .a_alpha
            .get_or_init(|| self.attraction.a_alpha().derivatives(&self.molefracs))
    }

    /// Composition derivatives of $\frac{\mathrm{d}a\alpha}{\mathrm{d}T}$.
    pub fn da_alpha_dt_derivatives(&self) -> &CompositionDerivatives {
        self.cache
            .da_alpha_dt
            .get_or_init(|| self.attraction.da_alpha_dt().derivatives(&self.molefracs))
    }

    pub fn b_derivatives(&self) -> &CompositionDerivatives {
        self.cache
            .b
            .get_or_init(|| self.eos.geometry.b_derivatives(&self.molefracs))
    }

    pub fn delta_derivatives(&self) -> &CompositionDerivatives {
        self.cache
            .delta
            .get_or_init(|| self.eos.geometry.delta.derivatives(&self.molefracs))
    }

    pub fn epsilon_derivatives(&self) -> &CompositionDerivatives {
        self.cache
            .epsilon
            .get_or_init(|| self.eos.geometry.epsilon.derivatives(&self.molefracs))
    }

    /// Third mole number derivatives of $a\alpha$.
    pub fn d3a_alpha_dninjnks(&self) -> &Array3<f64> {
        self.cache
            .d3a_alpha_dns
            .get_or_init(|| self.attraction.a_alpha().d3ns(&self.molefracs))
    }

    pub fn d3b_dninjnks(&self) -> &Array3<f64> {
        self.cache
            .d3b_dns
            .get_or_init(|| self.eos.geometry.b().d3ns(&self.molefracs))
    }

    pub fn d3delta_dninjnks(&self) -> &Array3<f64> {
        self.cache
            .d3delta_dns
            .get_or_init(|| self.eos.geometry.delta.d3ns(&self.molefracs))
    }

    pub fn d3epsilon_dninjnks(&self) -> &Array3<f64> {
        self.cache
            .d3epsilon_dns
            .get_or_init(|| self.eos.geometry.epsilon.d3ns(&self.molefracs))
    }

    /// Third mole number derivatives of the extensive parameters
    /// $n^2a\alpha$, $nb$, $n\delta$ and $n^2\varepsilon$.
    ///
    /// All of them vanish for mixing rules that are at most quadratic in the mole numbers.
    pub fn d3_extensive_dninjnks(&self) -> [Array3<f64>; 4] {
        [
            scaled_d3ns(self.a_alpha_derivatives(), self.d3a_alpha_dninjnks(), 2),
            scaled_d3ns(self.b_derivatives(), self.d3b_dninjnks(), 1),
            scaled_d3ns(self.delta_derivatives(), self.d3delta_dninjnks(), 1),
            scaled_d3ns(self.epsilon_derivatives(), self.d3epsilon_dninjnks(), 2),
        ]
    }
}

/// # Volume roots
impl MixtureState {
    pub(crate) fn root(&self, phase: Phase) -> EosResult<Root> {
        let liquid = self.roots.liquid.map(|volume| Root { index: 0, volume });
        let vapor = self.roots.vapor.map(|volume| Root { index: 1, volume });
        match (phase, liquid, vapor) {
            (Phase::Liquid, Some(r), _) | (Phase::Vapor, _, Some(r)) => Ok(r),
            (Phase::Liquid, None, _) => Err(EosError::NoPhysicalRoot("liquid".into())),
            (Phase::Vapor, _, None) => Err(EosError::NoPhysicalRoot("vapor".into())),
            (Phase::Stable, Some(l), Some(v)) => Ok(
                if self.gibbs_departure_root(l) <= self.gibbs_departure_root(v) {
                    l
                } else {
                    v
                },
            ),
            (Phase::Stable, Some(r), None) | (Phase::Stable, None, Some(r)) => Ok(r),
            (Phase::Stable, None, None) => Err(EosError::NoPhysicalRoot("stable".into())),
        }
    }

    /// The requested root, or the other root if the requested one does not exist.
    pub(crate) fn root_or_fallback(&self, phase: Phase) -> EosResult<Root> {
        self.root(phase).or_else(|_| match phase {
            Phase::Liquid => self.root(Phase::Vapor),
            Phase::Vapor => self.root(Phase::Liquid),
            Phase::Stable => self.root(Phase::Stable),
        })
    }

    pub(crate) fn root_terms(&self, root: Root) -> &RootTerms {
        self.cache.root_terms[root.index].get_or_init(|| {
            RootTerms::new(
                self.temperature,
                self.pressure,
                root.volume,
                &self.geometry,
                self.mixture.a_alpha,
                self.mixture.da_alpha_dt,
            )
        })
    }

    /// Molar volume of the given root in m³/mol.
    pub fn volume(&self, phase: Phase) -> EosResult<f64> {
        Ok(self.root(phase)?.volume)
    }

    /// Compressibility factor $Z=\frac{pv}{RT}$ of the given root.
    pub fn compressibility(&self, phase: Phase) -> EosResult<f64> {
        let root = self.root(phase)?;
        Ok(self.root_terms(root).compressibility)
    }

    /// Whether the liquid-like and the vapor-like roots both exist.
    pub fn has_two_roots(&self) -> bool {
        self.roots.liquid.is_some() && self.roots.vapor.is_some()
    }
}
