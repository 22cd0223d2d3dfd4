//! Numerical primitives: multivariate Newton and Broyden iterations and the
//! roots of the volume cubic.
use crate::errors::{EosError, EosResult};
use crate::SolverOptions;
use ndarray::{Array1, Array2};
use num_dual::linalg::{norm, LU};

mod cubic_roots;
pub use cubic_roots::{real_cubic_roots, VolumeRoots};

const MAX_ITER_NEWTON: usize = 50;
const TOL_NEWTON: f64 = 1e-10;

/// Solve a system of nonlinear equations with Newton's method.
///
/// `residual_and_jacobian` returns the residual vector and its Jacobian at `x`.
/// The iteration stops when the norm of the residual or the norm of the
/// step (relative to `1 + |x|`) drops below the tolerance. Returns the solution
/// and the number of iterations.
pub fn newton<F>(
    mut residual_and_jacobian: F,
    x0: Array1<f64>,
    options: SolverOptions,
    name: &str,
) -> EosResult<(Array1<f64>, usize)>
where
    F: FnMut(&Array1<f64>) -> EosResult<(Array1<f64>, Array2<f64>)>,
{
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_NEWTON, TOL_NEWTON);
    let mut x = x0;

    log_iter!(verbosity, " iter |    residual    |      step      ");
    log_iter!(verbosity, "{:-<37}", "");

    for i in 1..=max_iter {
        let (res, jacobian) = residual_and_jacobian(&x)?;
        let error = norm(&res);
        if !error.is_finite() {
            return Err(EosError::IterationFailed(name.into()));
        }
        if error < tol {
            log_result!(verbosity, "{} converged in {} step(s)\n", name, i - 1);
            return Ok((x, i - 1));
        }

        let dx = LU::new(jacobian)?.solve(&res);
        let step = norm(&dx);
        if !step.is_finite() {
            return Err(EosError::IterationFailed(name.into()));
        }
        x -= &dx;
        log_iter!(verbosity, " {:4} | {:14.8e} | {:14.8e}", i, error, step);

        if step < tol * (1.0 + norm(&x)) {
            log_result!(verbosity, "{} converged in {} step(s)\n", name, i);
            return Ok((x, i));
        }
    }
    log_result!(verbosity, "{} did not converge within {} steps\n", name, max_iter);
    Err(EosError::NotConverged(name.into()))
}

/// Solve a system of nonlinear equations with Broyden's (good) method.
///
/// The iteration starts from the supplied Jacobian and replaces it with rank one
/// updates, so `residual` is the only function evaluated along the way.
pub fn broyden<F>(
    mut residual: F,
    x0: Array1<f64>,
    jacobian0: Array2<f64>,
    options: SolverOptions,
    name: &str,
) -> EosResult<(Array1<f64>, usize)>
where
    F: FnMut(&Array1<f64>) -> EosResult<Array1<f64>>,
{
    let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_NEWTON, TOL_NEWTON);
    let mut x = x0;
    let mut jacobian = jacobian0;
    let mut res = residual(&x)?;

    log_iter!(verbosity, " iter |    residual    |      step      ");
    log_iter!(verbosity, "{:-<37}", "");

    for i in 1..=max_iter {
        let error = norm(&res);
        if !error.is_finite() {
            return Err(EosError::IterationFailed(name.into()));
        }
        if error < tol {
            log_result!(verbosity, "{} converged in {} step(s)\n", name, i - 1);
            return Ok((x, i - 1));
        }

        let dx = -LU::new(jacobian.clone())?.solve(&res);
        let step = norm(&dx);
        if !step.is_finite() {
            return Err(EosError::IterationFailed(name.into()));
        }
        x += &dx;
        let res_new = residual(&x)?;
        log_iter!(verbosity, " {:4} | {:14.8e} | {:14.8e}", i, error, step);

        if step < tol * (1.0 + norm(&x)) {
            log_result!(verbosity, "{} converged in {} step(s)\n", name, i);
            return Ok((x, i));
        }

        // J += (Δf - J Δx) Δxᵀ / (Δxᵀ Δx)
        let df = &res_new - &res;
        let u = (&df - &jacobian.dot(&dx)) / dx.dot(&dx);
        let n = x.len();
        for k in 0..n {
            for l in 0..n {
                jacobian[[k, l]] += u[k] * dx[l];
            }
        }
        res = res_new;
    }
    log_result!(verbosity, "{} did not converge within {} steps\n", name, max_iter);
    Err(EosError::NotConverged(name.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    fn rosenbrock_gradient(x: &Array1<f64>) -> (Array1<f64>, Array2<f64>) {
        let (a, b) = (x[0], x[1]);
        let res = arr1(&[
            -2.0 * (1.0 - a) - 400.0 * a * (b - a * a),
            200.0 * (b - a * a),
        ]);
        let jac = arr2(&[
            [2.0 - 400.0 * b + 1200.0 * a * a, -400.0 * a],
            [-400.0 * a, 200.0],
        ]);
        (res, jac)
    }

    #[test]
    fn newton_converges() -> EosResult<()> {
        let (x, iter) = newton(
            |x| Ok(rosenbrock_gradient(x)),
            arr1(&[0.8, 0.6]),
            SolverOptions::default(),
            "Rosenbrock",
        )?;
        assert_relative_eq!(x, arr1(&[1.0, 1.0]), max_relative = 1e-8);
        assert!(iter < 20);
        Ok(())
    }

    #[test]
    fn newton_not_converged() {
        let res = newton(
            |x| Ok(rosenbrock_gradient(x)),
            arr1(&[-1.2, 1.0]),
            SolverOptions::default().max_iter(1),
            "Rosenbrock",
        );
        assert!(matches!(res, Err(EosError::NotConverged(_))));
    }

    #[test]
    fn broyden_converges() -> EosResult<()> {
        // x² + y² = 4, x·y = 1
        let f = |x: &Array1<f64>| arr1(&[x[0] * x[0] + x[1] * x[1] - 4.0, x[0] * x[1] - 1.0]);
        let x0 = arr1(&[2.0, 0.5]);
        let jac0 = arr2(&[[2.0 * x0[0], 2.0 * x0[1]], [x0[1], x0[0]]]);
        let (x, _) = broyden(
            |x| Ok(f(x)),
            x0,
            jac0,
            SolverOptions::default().tol(1e-12),
            "circle",
        )?;
        assert_relative_eq!(f(&x), arr1(&[0.0, 0.0]), epsilon = 1e-10);
        Ok(())
    }
}
