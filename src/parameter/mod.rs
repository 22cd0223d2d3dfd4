//! Pure component and binary parameters of cubic equations of state.
use crate::errors::{EosError, EosResult};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::path::Path;

mod identifier;
mod model_record;

pub use identifier::{Identifier, IdentifierOption};
pub use model_record::{BinaryRecord, CubicBinaryRecord, CubicRecord, PureRecord};

/// Critical constants and binary interaction parameters of one or more substances.
///
/// The binary interaction matrix is validated on construction: it has to be
/// square, symmetric and its diagonal has to vanish.
#[derive(Debug, Clone)]
pub struct CubicParameters {
    /// Critical temperature in Kelvin
    pub tc: Array1<f64>,
    /// Critical pressure in Pascal
    pub pc: Array1<f64>,
    /// Acentric factor
    pub acentric_factor: Array1<f64>,
    /// Volume translation in m³/mol
    pub volume_shift: Array1<f64>,
    /// Binary interaction parameter for the attraction term
    pub k_ij: Array2<f64>,
    /// List of pure component records
    pub pure_records: Vec<PureRecord<CubicRecord>>,
}

impl std::fmt::Display for CubicParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.pure_records
            .iter()
            .try_for_each(|pr| writeln!(f, "{}", pr))?;
        writeln!(f, "\nk_ij:\n{}", self.k_ij)
    }
}

impl CubicParameters {
    /// Creates parameters from pure component records and an optional
    /// matrix of binary interaction parameters.
    pub fn from_records(
        pure_records: Vec<PureRecord<CubicRecord>>,
        binary_records: Option<Array2<CubicBinaryRecord>>,
    ) -> EosResult<Self> {
        let n = pure_records.len();
        if n == 0 {
            return Err(EosError::IncompatibleParameters(
                "at least one component is required.".into(),
            ));
        }
        let tc = pure_records.iter().map(|r| r.model_record.tc).collect();
        let pc = pure_records.iter().map(|r| r.model_record.pc).collect();
        let acentric_factor = pure_records
            .iter()
            .map(|r| r.model_record.acentric_factor)
            .collect();
        let volume_shift = pure_records
            .iter()
            .map(|r| r.model_record.volume_shift)
            .collect();
        let k_ij = binary_records.map_or_else(|| Array2::zeros([n; 2]), |br| br.mapv(f64::from));

        let parameters = Self {
            tc,
            pc,
            acentric_factor,
            volume_shift,
            k_ij,
            pure_records,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Build a simple parameter set without binary interaction parameters.
    pub fn new_simple(tc: &[f64], pc: &[f64], acentric_factor: &[f64]) -> EosResult<Self> {
        if [pc.len(), acentric_factor.len()]
            .iter()
            .any(|&l| l != tc.len())
        {
            return Err(EosError::IncompatibleParameters(String::from(
                "each component has to have parameters.",
            )));
        }
        let records = (0..tc.len())
            .map(|i| {
                PureRecord::new(
                    Identifier::default(),
                    CubicRecord::new(tc[i], pc[i], acentric_factor[i]),
                )
            })
            .collect();
        Self::from_records(records, None)
    }

    /// Build a parameter set from critical data and a full matrix of binary
    /// interaction parameters.
    pub fn new_with_kij(
        tc: &[f64],
        pc: &[f64],
        acentric_factor: &[f64],
        k_ij: Array2<f64>,
    ) -> EosResult<Self> {
        let mut parameters = Self::new_simple(tc, pc, acentric_factor)?;
        parameters.k_ij = k_ij;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Creates parameters for a pure component from a pure record.
    pub fn new_pure(pure_record: PureRecord<CubicRecord>) -> EosResult<Self> {
        Self::from_records(vec![pure_record], None)
    }

    /// Creates parameters for a binary system from pure records and an optional
    /// binary interaction parameter.
    pub fn new_binary(
        pure_records: Vec<PureRecord<CubicRecord>>,
        binary_record: Option<CubicBinaryRecord>,
    ) -> EosResult<Self> {
        let binary_record = binary_record.map(|br| {
            Array2::from_shape_fn([2, 2], |(i, j)| {
                if i == j {
                    CubicBinaryRecord::default()
                } else {
                    br
                }
            })
        });
        Self::from_records(pure_records, binary_record)
    }

    /// Creates parameters from substance information stored in json files.
    ///
    /// Binary records that are not found for a pair of substances default to `k_ij = 0`.
    pub fn from_json<P>(
        substances: Vec<&str>,
        file_pure: P,
        file_binary: Option<P>,
        identifier_option: IdentifierOption,
    ) -> EosResult<Self>
    where
        P: AsRef<Path>,
    {
        let records = PureRecord::<CubicRecord>::from_json(&substances, file_pure, identifier_option)?;
        let binary_matrix = match file_binary {
            Some(file) => {
                let binary_records =
                    BinaryRecord::<Identifier, CubicBinaryRecord>::from_json(file)?;
                Some(Self::binary_matrix_from_records(
                    &records,
                    &binary_records,
                    identifier_option,
                )?)
            }
            None => None,
        };
        Self::from_records(records, binary_matrix)
    }

    /// Helper function to build matrix from list of records in correct order.
    fn binary_matrix_from_records(
        pure_records: &[PureRecord<CubicRecord>],
        binary_records: &[BinaryRecord<Identifier, CubicBinaryRecord>],
        identifier_option: IdentifierOption,
    ) -> EosResult<Array2<CubicBinaryRecord>> {
        let binary_map: HashMap<(String, String), CubicBinaryRecord> = binary_records
            .iter()
            .filter_map(|br| {
                let id1 = br.id1.as_string(identifier_option)?;
                let id2 = br.id2.as_string(identifier_option)?;
                Some(((id1, id2), br.model_record))
            })
            .collect();
        let ids = pure_records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.identifier.as_string(identifier_option).ok_or_else(|| {
                    EosError::IncompatibleParameters(format!(
                        "No identifier for given identifier_option for pure record {}.",
                        i
                    ))
                })
            })
            .collect::<EosResult<Vec<_>>>()?;
        let n = pure_records.len();
        Ok(Array2::from_shape_fn([n, n], |(i, j)| {
            if i == j {
                return CubicBinaryRecord::default();
            }
            binary_map
                .get(&(ids[i].clone(), ids[j].clone()))
                .or_else(|| binary_map.get(&(ids[j].clone(), ids[i].clone())))
                .copied()
                .unwrap_or_default()
        }))
    }

    /// Number of components.
    pub fn components(&self) -> usize {
        self.tc.len()
    }

    /// Parameters for a subset of the components.
    pub fn subset(&self, component_list: &[usize]) -> Self {
        let n = component_list.len();
        Self {
            tc: component_list.iter().map(|&i| self.tc[i]).collect(),
            pc: component_list.iter().map(|&i| self.pc[i]).collect(),
            acentric_factor: component_list
                .iter()
                .map(|&i| self.acentric_factor[i])
                .collect(),
            volume_shift: component_list
                .iter()
                .map(|&i| self.volume_shift[i])
                .collect(),
            k_ij: Array2::from_shape_fn([n, n], |(i, j)| {
                self.k_ij[[component_list[i], component_list[j]]]
            }),
            pure_records: component_list
                .iter()
                .map(|&i| self.pure_records[i].clone())
                .collect(),
        }
    }

    fn validate(&self) -> EosResult<()> {
        let n = self.tc.len();
        if self.k_ij.shape() != [n, n] {
            return Err(EosError::IncompatibleParameters(format!(
                "k_ij has shape {:?} but {} components are defined.",
                self.k_ij.shape(),
                n
            )));
        }
        for i in 0..n {
            if self.tc[i] <= 0.0 || self.pc[i] <= 0.0 {
                return Err(EosError::IncompatibleParameters(format!(
                    "critical constants of component {} have to be positive.",
                    i
                )));
            }
            if self.k_ij[[i, i]] != 0.0 {
                return Err(EosError::IncompatibleParameters(format!(
                    "k_ij[{i}][{i}] = {} but the diagonal has to vanish.",
                    self.k_ij[[i, i]]
                )));
            }
            for j in i + 1..n {
                if self.k_ij[[i, j]] != self.k_ij[[j, i]] {
                    return Err(EosError::IncompatibleParameters(format!(
                        "k_ij is not symmetric: k_ij[{i}][{j}] = {}, k_ij[{j}][{i}] = {}.",
                        self.k_ij[[i, j]],
                        self.k_ij[[j, i]]
                    )));
                }
            }
        }
        Ok(())
    }
}
