use approx::assert_relative_eq;
use cubic_mix::parameter::{CubicParameters, IdentifierOption};
use cubic_mix::{
    CubicEos, EosError, FlashOptions, MixtureState, PhaseEquilibrium, SolverOptions,
    StabilityOptions,
};
use ndarray::arr1;
use std::error::Error;
use std::sync::Arc;

fn read_params(components: Vec<&str>) -> Result<Arc<CubicParameters>, EosError> {
    Ok(Arc::new(CubicParameters::from_json(
        components,
        "tests/test_parameters.json",
        None,
        IdentifierOption::Name,
    )?))
}

fn assert_equilibrium(vle: &PhaseEquilibrium, feed: &ndarray::Array1<f64>) -> Result<(), EosError> {
    let beta = vle.vapor_fraction();
    let x = &vle.liquid().molefracs;
    let y = &vle.vapor().molefracs;
    assert!(beta > 0.0 && beta < 1.0);
    assert_relative_eq!(&((1.0 - beta) * x + beta * y), feed, max_relative = 1e-8);
    let ln_phi_l = vle.liquid().ln_phi(vle.liquid_phase())?;
    let ln_phi_v = vle.vapor().ln_phi(vle.vapor_phase())?;
    let k = (ln_phi_l - ln_phi_v).mapv(f64::exp);
    assert_relative_eq!(&k * x / y, arr1(&vec![1.0; x.len()]), max_relative = 1e-6);
    Ok(())
}

#[test]
fn nitrogen_methane_flash() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["nitrogen", "methane"])?,
        None,
        None,
    )?);
    let z = arr1(&[0.5, 0.5]);
    let vle = PhaseEquilibrium::tp_flash(&eos, 115.0, 1e6, &z, None, FlashOptions::default())?;
    assert_equilibrium(&vle, &z)?;
    assert_relative_eq!(vle.vapor_fraction(), 0.0412636, max_relative = 1e-4);
    assert_relative_eq!(vle.liquid().molefracs[0], 0.482875, max_relative = 1e-4);
    assert_relative_eq!(vle.vapor().molefracs[0], 0.897888, max_relative = 1e-4);
    Ok(())
}

#[test]
fn ternary_flash_variants() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["methane", "ethane", "propane"])?,
        None,
        None,
    )?);
    let z = arr1(&[0.4, 0.3, 0.3]);
    let feed = MixtureState::new_tp(&eos, 250.0, 3e6, &z)?;
    let ss = feed.tp_flash(None, FlashOptions::default())?;
    assert_equilibrium(&ss, &z)?;
    assert_relative_eq!(ss.vapor_fraction(), 0.352637, max_relative = 1e-4);

    let newton = feed.tp_flash_newton(None, FlashOptions::default())?;
    assert_equilibrium(&newton, &z)?;
    assert_relative_eq!(newton.vapor_fraction(), ss.vapor_fraction(), max_relative = 1e-5);

    let options = FlashOptions::default().solver(SolverOptions::new().max_iter(200));
    let broyden = feed.tp_flash_broyden(None, options)?;
    assert_equilibrium(&broyden, &z)?;
    assert_relative_eq!(broyden.vapor_fraction(), ss.vapor_fraction(), max_relative = 1e-5);
    Ok(())
}

#[test]
fn supercritical_feed_does_not_split() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["nitrogen", "methane"])?,
        None,
        None,
    )?);
    let z = arr1(&[0.5, 0.5]);
    match PhaseEquilibrium::tp_flash(&eos, 300.0, 5e6, &z, None, FlashOptions::default()) {
        Ok(vle) => assert_eq!(vle.vapor_fraction(), 1.0),
        Err(EosError::TrivialSolution) => (),
        Err(e) => return Err(e.into()),
    }
    let feed = MixtureState::new_tp(&eos, 300.0, 5e6, &z)?;
    assert!(feed.is_stable(cubic_mix::Phase::Stable, StabilityOptions::default())?);
    Ok(())
}

#[test]
fn stability_analysis_initializes_flash() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["methane", "propane"])?,
        None,
        None,
    )?);
    let z = arr1(&[0.5, 0.5]);
    let feed = MixtureState::new_tp(&eos, 250.0, 3e6, &z)?;
    let stability = feed.stability_analysis(cubic_mix::Phase::Stable, StabilityOptions::default())?;
    assert!(!stability.stable);
    let k = stability.k_values.ok_or("missing K values")?;
    let beta = cubic_mix::rachford_rice(&z, &k, None)?;
    let (x, y) = cubic_mix::phase_compositions(&z, &k, beta);
    let vle = feed.tp_flash(Some((&x, &y)), FlashOptions::default())?;
    assert_equilibrium(&vle, &z)?;
    Ok(())
}

#[test]
fn single_phase_feeds() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["methane", "ethane", "propane"])?,
        None,
        None,
    )?);
    let z = arr1(&[0.4, 0.3, 0.3]);

    // superheated vapor
    let feed = MixtureState::new_tp(&eos, 300.0, 1e5, &z)?;
    assert!(feed.is_stable(cubic_mix::Phase::Stable, StabilityOptions::default())?);
    for vle in [
        feed.tp_flash(None, FlashOptions::default())?,
        feed.tp_flash_newton(None, FlashOptions::default())?,
        feed.tp_flash_broyden(None, FlashOptions::default())?,
    ] {
        assert_eq!(vle.vapor_fraction(), 1.0);
        assert_relative_eq!(vle.vapor().molefracs, z, max_relative = 1e-12);
    }

    // subcooled liquid
    let feed = MixtureState::new_tp(&eos, 150.0, 1e6, &z)?;
    for vle in [
        feed.tp_flash(None, FlashOptions::default())?,
        feed.tp_flash_newton(None, FlashOptions::default())?,
    ] {
        assert_eq!(vle.vapor_fraction(), 0.0);
        assert_relative_eq!(vle.liquid().molefracs, z, max_relative = 1e-12);
    }
    Ok(())
}

#[test]
fn absent_component_in_feed() -> Result<(), Box<dyn Error>> {
    let ternary = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["methane", "ethane", "propane"])?,
        None,
        None,
    )?);
    let binary = Arc::new(CubicEos::peng_robinson(
        read_params(vec!["methane", "propane"])?,
        None,
        None,
    )?);
    let reference =
        PhaseEquilibrium::tp_flash(&binary, 250.0, 3e6, &arr1(&[0.5, 0.5]), None, FlashOptions::default())?;

    let feed = MixtureState::new_tp(&ternary, 250.0, 3e6, &arr1(&[0.5, 0.0, 0.5]))?;
    for vle in [
        feed.tp_flash(None, FlashOptions::default())?,
        feed.tp_flash_newton(None, FlashOptions::default())?,
    ] {
        assert_eq!(vle.liquid().molefracs[1], 0.0);
        assert_eq!(vle.vapor().molefracs[1], 0.0);
        assert_relative_eq!(
            vle.vapor_fraction(),
            reference.vapor_fraction(),
            max_relative = 1e-6
        );
        assert_relative_eq!(
            vle.liquid().molefracs[0],
            reference.liquid().molefracs[0],
            max_relative = 1e-6
        );
    }
    Ok(())
}
