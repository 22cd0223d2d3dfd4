use crate::errors::{EosError, EosResult};
use ndarray::{Array1, Zip};

const MAX_ITER_RR: usize = 100;
const ABS_TOL_RR: f64 = 1e-14;

/// Wilson's estimate of the equilibrium ratios
///
/// $$K_i=\frac{p_{c,i}}{p}\exp\left(5.373(1+\omega_i)\left(1-\frac{T_{c,i}}{T}\right)\right)$$
pub fn wilson_k_values(
    tc: &Array1<f64>,
    pc: &Array1<f64>,
    acentric_factor: &Array1<f64>,
    temperature: f64,
    pressure: f64,
) -> Array1<f64> {
    Zip::from(tc)
        .and(pc)
        .and(acentric_factor)
        .map_collect(|&tc, &pc, &w| {
            pc / pressure * (5.373 * (1.0 + w) * (1.0 - tc / temperature)).exp()
        })
}

/// Solve the Rachford-Rice equation
///
/// $$\sum_i\frac{z_i(K_i-1)}{1+\beta(K_i-1)}=0$$
///
/// for the vapor fraction $\beta$. If no root exists in $(0,1)$ the feed is
/// either subcooled ($\beta=0$) or superheated ($\beta=1$).
pub fn rachford_rice(feed: &Array1<f64>, k: &Array1<f64>, beta_in: Option<f64>) -> EosResult<f64> {
    if !k.iter().all(|k| k.is_finite() && *k >= 0.0) {
        return Err(EosError::IterationFailed(String::from("rachford_rice")));
    }

    // check if solution exists
    if (feed * k).sum() <= 1.0 {
        return Ok(0.0);
    }
    if (feed / k).iter().filter(|x| !x.is_nan()).sum::<f64>() <= 1.0 {
        return Ok(1.0);
    }
    let (mut beta_min, mut beta_max) = (0.0, 1.0);

    // look for tighter bounds
    for (&k, &f) in k.iter().zip(feed.iter()) {
        if k > 1.0 {
            let b = (k * f - 1.0) / (k - 1.0);
            if b > beta_min {
                beta_min = b;
            }
        }
        if k < 1.0 {
            let b = (1.0 - f) / (1.0 - k);
            if b < beta_max {
                beta_max = b;
            }
        }
    }

    // initialize
    let mut beta = 0.5 * (beta_min + beta_max);
    if let Some(b) = beta_in {
        if b > beta_min && b < beta_max {
            beta = b;
        }
    }

    // iterate
    for _ in 0..MAX_ITER_RR {
        let frac = (k - 1.0) / (1.0 - beta + beta * k);
        let g = (feed * &frac).sum();
        let dg = -(feed * &frac * &frac).sum();
        if g > 0.0 {
            beta_min = beta;
        } else {
            beta_max = beta;
        }

        let dbeta = g / dg;
        beta -= dbeta;

        if beta < beta_min || beta > beta_max {
            beta = 0.5 * (beta_min + beta_max);
        }
        if dbeta.abs() < ABS_TOL_RR || beta_max - beta_min < ABS_TOL_RR {
            return Ok(beta);
        }
    }

    Ok(beta)
}

/// Liquid and vapor compositions for given vapor fraction and equilibrium ratios.
///
/// Negative mole fractions are replaced by their absolute values before the
/// compositions are normalized.
pub fn phase_compositions(
    feed: &Array1<f64>,
    k: &Array1<f64>,
    beta: f64,
) -> (Array1<f64>, Array1<f64>) {
    let x = Zip::from(feed)
        .and(k)
        .map_collect(|&z, &k| z / (1.0 + beta * (k - 1.0)));
    let y = &x * k;
    let normalize = |x: Array1<f64>| {
        let x = x.mapv(f64::abs);
        let sum = x.sum();
        x / sum
    };
    (normalize(x), normalize(y))
}
