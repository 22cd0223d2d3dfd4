use crate::RGAS;
use std::f64::consts::PI;

const MAX_ITER_POLISH: usize = 8;

/// Real roots of $x^3+c_2x^2+c_1x+c_0$ in ascending order.
///
/// The roots are obtained analytically from the depressed cubic and polished
/// with a few Newton steps on the original polynomial.
pub fn real_cubic_roots(c2: f64, c1: f64, c0: f64) -> Vec<f64> {
    let p = c1 - c2 * c2 / 3.0;
    let q = 2.0 * c2.powi(3) / 27.0 - c2 * c1 / 3.0 + c0;
    let h = 0.25 * q * q + p.powi(3) / 27.0;
    let shift = c2 / 3.0;

    let mut roots = if h > 0.0 {
        let s = h.sqrt();
        vec![(-0.5 * q + s).cbrt() + (-0.5 * q - s).cbrt() - shift]
    } else if p == 0.0 {
        vec![-shift]
    } else {
        let r = 2.0 * (-p / 3.0).sqrt();
        let arg = (1.5 * q / p * (-3.0 / p).sqrt()).clamp(-1.0, 1.0);
        let theta = arg.acos() / 3.0;
        (0..3)
            .map(|k| r * (theta - 2.0 * PI * k as f64 / 3.0).cos() - shift)
            .collect()
    };

    for x in roots.iter_mut() {
        for _ in 0..MAX_ITER_POLISH {
            let f = ((*x + c2) * *x + c1) * *x + c0;
            let df = (3.0 * *x + 2.0 * c2) * *x + c1;
            if df == 0.0 {
                break;
            }
            let dx = f / df;
            if !dx.is_finite() {
                break;
            }
            *x -= dx;
            if dx.abs() <= 1e-15 * x.abs() {
                break;
            }
        }
    }
    roots.sort_by(|a, b| a.total_cmp(b));
    roots
}

/// Physically meaningful molar volumes of a state.
///
/// `liquid` is the smallest and `vapor` the largest mechanically stable root
/// above the covolume. If only one root exists, it is assigned by comparison
/// with the pseudo critical volume of the mixture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeRoots {
    pub liquid: Option<f64>,
    pub vapor: Option<f64>,
}

impl VolumeRoots {
    /// Roots of the cubic at fixed temperature and pressure.
    pub fn new(
        temperature: f64,
        pressure: f64,
        a_alpha: f64,
        b: f64,
        delta: f64,
        epsilon: f64,
        pseudo_critical_volume: f64,
    ) -> Self {
        let rt = RGAS * temperature;
        let scale = rt / pressure;
        let bp = b / scale;
        let dp = delta / scale;
        let ep = epsilon / (scale * scale);
        let ap = a_alpha * pressure / (rt * rt);
        let c2 = dp - bp - 1.0;
        let c1 = ep - bp * dp - dp + ap;
        let c0 = -(bp * ep + ep + ap * bp);

        let roots = real_cubic_roots(c2, c1, c0);
        // the middle one of three real roots is mechanically unstable
        let candidates: Vec<f64> = match roots.len() {
            3 => vec![roots[0], roots[2]],
            _ => roots,
        };
        let volumes: Vec<f64> = candidates
            .into_iter()
            .map(|z| z * scale)
            .filter(|&v| v.is_finite() && v > b)
            .collect();

        match volumes.as_slice() {
            [] => Self::default(),
            [v] if *v < pseudo_critical_volume => Self {
                liquid: Some(*v),
                vapor: None,
            },
            [v] => Self {
                liquid: None,
                vapor: Some(*v),
            },
            [l, .., v] => Self {
                liquid: Some(*l),
                vapor: Some(*v),
            },
        }
    }

    /// A state specified by temperature and volume has exactly that volume as root.
    pub fn from_volume(volume: f64, pseudo_critical_volume: f64) -> Self {
        if volume < pseudo_critical_volume {
            Self {
                liquid: Some(volume),
                vapor: None,
            }
        } else {
            Self {
                liquid: None,
                vapor: Some(volume),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.liquid.is_none() && self.vapor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn three_real_roots() {
        // (x - 1)(x - 2)(x - 3)
        let roots = real_cubic_roots(-6.0, 11.0, -6.0);
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], 1.0, max_relative = 1e-14);
        assert_relative_eq!(roots[1], 2.0, max_relative = 1e-14);
        assert_relative_eq!(roots[2], 3.0, max_relative = 1e-14);
    }

    #[test]
    fn one_real_root() {
        // (x - 2)(x² + 1)
        let roots = real_cubic_roots(-2.0, 1.0, -2.0);
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2.0, max_relative = 1e-14);
    }

    #[test]
    fn triple_root() {
        let roots = real_cubic_roots(-3.0, 3.0, -1.0);
        assert!(roots.iter().all(|r| (r - 1.0).abs() < 1e-5));
    }

    #[test]
    fn ideal_gas_limit() {
        // without attraction the only physical root is v = RT/p + b
        let b = 3e-5;
        let roots = VolumeRoots::new(300.0, 1e5, 0.0, b, 0.0, 0.0, 1e-4);
        assert_eq!(roots.liquid, None);
        assert_relative_eq!(roots.vapor.unwrap(), RGAS * 300.0 / 1e5 + b, max_relative = 1e-12);
    }

    #[test]
    fn from_volume_labels() {
        let r = VolumeRoots::from_volume(5e-5, 1e-4);
        assert_eq!(r.liquid, Some(5e-5));
        assert!(VolumeRoots::from_volume(5e-3, 1e-4).vapor.is_some());
        assert!(VolumeRoots::default().is_empty());
    }
}
