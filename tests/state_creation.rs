use approx::assert_relative_eq;
use cubic_mix::parameter::{CubicParameters, IdentifierOption};
use cubic_mix::{CubicEos, EosError, MixtureState, Phase};
use ndarray::arr1;
use std::error::Error;
use std::sync::Arc;

fn read_params(components: Vec<&str>) -> Result<Arc<CubicParameters>, EosError> {
    Ok(Arc::new(CubicParameters::from_json(
        components,
        "tests/test_parameters.json",
        Some("tests/test_binary_parameters.json"),
        IdentifierOption::Name,
    )?))
}

fn nitrogen_methane() -> Result<Arc<CubicParameters>, EosError> {
    Ok(Arc::new(CubicParameters::new_simple(
        &[126.1, 190.6],
        &[33.94e5, 46.04e5],
        &[0.04, 0.011],
    )?))
}

#[test]
fn peng_robinson_volumes() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::peng_robinson(nitrogen_methane()?, None, None)?);
    let s = MixtureState::new_tp(&eos, 115.0, 1e6, &arr1(&[0.5, 0.5]))?;
    assert_relative_eq!(s.volume(Phase::Liquid)?, 3.625735e-5, max_relative = 1e-6);
    assert_relative_eq!(s.volume(Phase::Vapor)?, 7.006657e-4, max_relative = 1e-6);
    Ok(())
}

#[test]
fn redlich_kwong_volumes() -> Result<(), Box<dyn Error>> {
    let eos = Arc::new(CubicEos::redlich_kwong(nitrogen_methane()?, None)?);
    let s = MixtureState::new_tp(&eos, 115.0, 1e6, &arr1(&[0.5, 0.5]))?;
    assert_relative_eq!(s.volume(Phase::Liquid)?, 4.048415e-5, max_relative = 1e-6);
    assert_relative_eq!(s.volume(Phase::Vapor)?, 7.006061e-4, max_relative = 1e-6);
    Ok(())
}

#[test]
fn root_ordering() -> Result<(), Box<dyn Error>> {
    let parameters = read_params(vec!["methane", "ethane", "propane"])?;
    let eos = Arc::new(CubicEos::soave_redlich_kwong(parameters, None, None)?);
    let z = arr1(&[0.4, 0.3, 0.3]);
    for (t, p) in [(200.0, 1e6), (250.0, 3e6), (300.0, 2e6)] {
        let s = MixtureState::new_tp(&eos, t, p, &z)?;
        if s.has_two_roots() {
            assert!(s.compressibility(Phase::Liquid)? < s.compressibility(Phase::Vapor)?);
        }
    }
    Ok(())
}

#[test]
fn parameters_from_json() -> Result<(), Box<dyn Error>> {
    let parameters = read_params(vec!["methane", "nitrogen", "propane"])?;
    assert_eq!(parameters.components(), 3);
    assert_eq!(parameters.tc[0], 190.6);
    assert_eq!(parameters.k_ij[[0, 1]], 0.03);
    assert_eq!(parameters.k_ij[[1, 0]], 0.03);
    assert_eq!(parameters.k_ij[[0, 2]], 0.014);
    assert_eq!(parameters.k_ij[[1, 2]], 0.0);

    let missing = CubicParameters::from_json(
        vec!["methane", "water"],
        "tests/test_parameters.json",
        None,
        IdentifierOption::Name,
    );
    assert!(matches!(missing, Err(EosError::ComponentsNotFound(_))));
    Ok(())
}

#[test]
fn volume_translation_shifts_volumes() -> Result<(), Box<dyn Error>> {
    let translated = read_params(vec!["butane"])?;
    let c = translated.volume_shift[0];
    let plain = Arc::new(CubicParameters::new_simple(
        &[translated.tc[0]],
        &[translated.pc[0]],
        &[translated.acentric_factor[0]],
    )?);
    let z = arr1(&[1.0]);
    let s = MixtureState::new_tp(
        &Arc::new(CubicEos::peng_robinson(translated, None, None)?),
        300.0,
        1e6,
        &z,
    )?;
    let r = MixtureState::new_tp(
        &Arc::new(CubicEos::peng_robinson(plain, None, None)?),
        300.0,
        1e6,
        &z,
    )?;
    assert_relative_eq!(
        s.volume(Phase::Liquid)?,
        r.volume(Phase::Liquid)? - c,
        max_relative = 1e-9
    );
    // a constant shift leaves the fugacity coefficients unchanged up to the
    // Poynting-like correction exp(-cp/RT)
    let correction = -c * 1e6 / (cubic_mix::RGAS * 300.0);
    assert_relative_eq!(
        s.ln_phi(Phase::Liquid)?[0],
        r.ln_phi(Phase::Liquid)?[0] + correction,
        max_relative = 1e-8
    );
    Ok(())
}

#[test]
fn pure_component_degeneracy() -> Result<(), Box<dyn Error>> {
    let parameters = read_params(vec!["ethane"])?;
    let eos = Arc::new(CubicEos::peng_robinson(parameters, None, None)?);
    let s = MixtureState::new_tp(&eos, 250.0, 1e6, &arr1(&[1.0]))?;
    let pure = eos.pure_alpha_terms(250.0);
    assert_eq!(s.a_alpha_ijs().shape(), &[1, 1]);
    assert_relative_eq!(s.a_alpha_ijs()[[0, 0]], pure.a_alpha[0], max_relative = 1e-14);
    assert_relative_eq!(s.b(), eos.critical_parameters.bc[0], max_relative = 1e-14);
    Ok(())
}

#[test]
fn cache_is_reproducible() -> Result<(), Box<dyn Error>> {
    let parameters = read_params(vec!["nitrogen", "methane", "propane"])?;
    let eos = Arc::new(CubicEos::peng_robinson(parameters, None, None)?);
    let z = arr1(&[0.2, 0.5, 0.3]);
    let mut s = MixtureState::new_tp(&eos, 200.0, 2e6, &z)?;
    let first = (
        s.a_alpha_derivatives().clone(),
        s.dln_phi_dnj(Phase::Stable)?,
    );
    for _ in 0..3 {
        s.invalidate();
        assert_eq!(s.a_alpha_derivatives().d2ns, first.0.d2ns);
        assert_eq!(s.dln_phi_dnj(Phase::Stable)?, first.1);
    }
    let other = s.to_zs_tp(&z, 200.0, 2e6)?;
    assert_eq!(other.a_alpha_derivatives().dns, first.0.dns);
    Ok(())
}
