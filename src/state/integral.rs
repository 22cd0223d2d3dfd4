//! The attractive integral $\int_v^\infty\frac{\mathrm{d}v'}{v'^2+\delta v'+\varepsilon}$
//! and its partial derivatives.
use crate::mixing_rules::MixtureGeometry;
use crate::RGAS;
use num_dual::{second_derivative, Dual2_64, DualNum};

const SERIES_THRESHOLD: f64 = 1e-3;

/// $\frac{\operatorname{artanh}\sqrt{y}}{\sqrt{y}}$, continued analytically to $y<0$.
fn artanh_ratio<D: DualNum<f64> + Copy>(y: D) -> D {
    if y.re().abs() < SERIES_THRESHOLD {
        // 1 + y/3 + y²/5 + ...
        let mut sum = D::zero();
        for k in (0..6).rev() {
            sum = sum * y + 1.0 / (2 * k + 1) as f64;
        }
        sum
    } else if y.re() > 0.0 {
        let s = y.sqrt();
        ((s + 1.0) / (-s + 1.0)).ln() * 0.5 / s
    } else {
        let s = (-y).sqrt();
        s.atan() / s
    }
}

/// $G(v,\delta,\varepsilon)=\frac{2}{2v+\delta}\,h\!\left(\frac{\delta^2-4\varepsilon}{(2v+\delta)^2}\right)$
pub(crate) fn attraction_integral<D: DualNum<f64> + Copy>(volume: f64, delta: D, epsilon: D) -> D {
    let u = delta + 2.0 * volume;
    let y = (delta * delta - epsilon * 4.0) / (u * u);
    artanh_ratio(y) * 2.0 / u
}

/// The attraction integral and its derivatives at one volume.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AttractionIntegral {
    pub g: f64,
    pub g_d: f64,
    pub g_e: f64,
    pub g_dd: f64,
    pub g_de: f64,
    pub g_ee: f64,
    pub g_v: f64,
    pub g_dv: f64,
    pub g_ev: f64,
}

impl AttractionIntegral {
    pub fn new(volume: f64, delta: f64, epsilon: f64) -> Self {
        let (g, g_d, g_dd) = second_derivative(
            |d: Dual2_64| attraction_integral(volume, d, Dual2_64::from(epsilon)),
            delta,
        );
        let (_, g_e, g_ee) = second_derivative(
            |e: Dual2_64| attraction_integral(volume, Dual2_64::from(delta), e),
            epsilon,
        );
        // mixed derivative from the second derivative along (1, s)
        let s = volume;
        let (_, _, g_ss) = second_derivative(
            |t: Dual2_64| attraction_integral(volume, t + delta, t * s + epsilon),
            0.0,
        );
        let g_de = (g_ss - g_dd - s * s * g_ee) / (2.0 * s);

        let f = volume * (volume + delta) + epsilon;
        let res = Self {
            g,
            g_d,
            g_e,
            g_dd,
            g_de,
            g_ee,
            g_v: -1.0 / f,
            g_dv: volume / (f * f),
            g_ev: 1.0 / (f * f),
        };
        if [g, g_d, g_e, g_dd, g_de, g_ee].iter().all(|x| x.is_finite()) {
            res
        } else {
            Self::default()
        }
    }
}

/// Quantities of a single volume root that are shared by all properties.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RootTerms {
    pub compressibility: f64,
    /// $v^2+\delta v+\varepsilon$
    pub denominator: f64,
    pub integral: AttractionIntegral,
    pub dp_dt: f64,
    pub dp_dv: f64,
}

impl RootTerms {
    pub fn new(
        temperature: f64,
        pressure: f64,
        volume: f64,
        geometry: &MixtureGeometry,
        a_alpha: f64,
        da_alpha_dt: f64,
    ) -> Self {
        let MixtureGeometry { b, delta, epsilon } = *geometry;
        let f = volume * (volume + delta) + epsilon;
        let vb = volume - b;
        Self {
            compressibility: pressure * volume / (RGAS * temperature),
            denominator: f,
            integral: AttractionIntegral::new(volume, delta, epsilon),
            dp_dt: RGAS / vb - da_alpha_dt / f,
            dp_dv: -RGAS * temperature / (vb * vb) + a_alpha * (2.0 * volume + delta) / (f * f),
        }
    }
}
