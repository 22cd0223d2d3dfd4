use super::identifier::{Identifier, IdentifierOption};
use crate::errors::{EosError, EosResult};
use indexmap::IndexSet;
use num_traits::Zero;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A collection of parameters of a pure substance.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PureRecord<M> {
    pub identifier: Identifier,
    pub model_record: M,
}

impl<M> PureRecord<M> {
    /// Create a new `PureRecord`.
    pub fn new(identifier: Identifier, model_record: M) -> Self {
        Self {
            identifier,
            model_record,
        }
    }

    /// Create pure substance parameters from a json file.
    ///
    /// The records are returned in the order of `substances`.
    pub fn from_json<P>(
        substances: &[&str],
        file: P,
        identifier_option: IdentifierOption,
    ) -> EosResult<Vec<Self>>
    where
        P: AsRef<Path>,
        M: Clone + DeserializeOwned,
    {
        let mut queried: IndexSet<String> = substances.iter().map(|s| s.to_string()).collect();
        if queried.len() != substances.len() {
            return Err(EosError::IncompatibleParameters(
                "A substance was defined more than once.".to_string(),
            ));
        }

        let reader = BufReader::new(File::open(file)?);
        let file_records: Vec<Self> = serde_json::from_reader(reader)?;
        let mut records: HashMap<String, Self> = HashMap::with_capacity(substances.len());

        // build map, draining list of queried substances in the process
        for record in file_records {
            if let Some(id) = record.identifier.as_string(identifier_option) {
                if queried.shift_remove(&id) {
                    records.insert(id, record);
                }
            }
            if queried.is_empty() {
                break;
            }
        }

        if !queried.is_empty() {
            return Err(EosError::ComponentsNotFound(format!("{:?}", queried)));
        };

        substances
            .iter()
            .map(|&s| {
                records
                    .remove(s)
                    .ok_or_else(|| EosError::ComponentsNotFound(s.to_string()))
            })
            .collect()
    }
}

impl<M> std::fmt::Display for PureRecord<M>
where
    M: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PureRecord(")?;
        write!(f, "\n\tidentifier={},", self.identifier)?;
        write!(f, "\n\tmodel_record={},", self.model_record)?;
        write!(f, "\n)")
    }
}

/// A collection of parameters that model interactions between two substances.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BinaryRecord<I, B> {
    /// Identifier of the first component
    pub id1: I,
    /// Identifier of the second component
    pub id2: I,
    /// Binary interaction parameter(s)
    pub model_record: B,
}

impl<I, B> BinaryRecord<I, B> {
    /// Creates a new `BinaryRecord`.
    pub fn new(id1: I, id2: I, model_record: B) -> Self {
        Self {
            id1,
            id2,
            model_record,
        }
    }

    /// Read a list of `BinaryRecord`s from a JSON file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> EosResult<Vec<Self>>
    where
        I: DeserializeOwned,
        B: DeserializeOwned,
    {
        Ok(serde_json::from_reader(BufReader::new(File::open(file)?))?)
    }
}

/// Cubic parameters for a single substance.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CubicRecord {
    /// critical temperature in Kelvin
    pub tc: f64,
    /// critical pressure in Pascal
    pub pc: f64,
    /// acentric factor
    pub acentric_factor: f64,
    /// volume translation in m³/mol
    #[serde(skip_serializing_if = "f64::is_zero")]
    #[serde(default)]
    pub volume_shift: f64,
}

impl CubicRecord {
    /// Create a new pure substance record for a cubic equation of state.
    pub fn new(tc: f64, pc: f64, acentric_factor: f64) -> Self {
        Self {
            tc,
            pc,
            acentric_factor,
            volume_shift: 0.0,
        }
    }

    /// Add a volume translation to the record.
    pub fn with_volume_shift(mut self, volume_shift: f64) -> Self {
        self.volume_shift = volume_shift;
        self
    }
}

impl std::fmt::Display for CubicRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CubicRecord(tc={} K", self.tc)?;
        write!(f, ", pc={} Pa", self.pc)?;
        write!(f, ", acentric factor={}", self.acentric_factor)?;
        if !self.volume_shift.is_zero() {
            write!(f, ", volume shift={} m³/mol", self.volume_shift)?;
        }
        write!(f, ")")
    }
}

/// Cubic binary interaction parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct CubicBinaryRecord {
    /// Binary interaction parameter for the attraction term
    #[serde(skip_serializing_if = "f64::is_zero")]
    #[serde(default)]
    pub k_ij: f64,
}

impl From<f64> for CubicBinaryRecord {
    fn from(k_ij: f64) -> Self {
        Self { k_ij }
    }
}

impl From<CubicBinaryRecord> for f64 {
    fn from(binary_record: CubicBinaryRecord) -> Self {
        binary_record.k_ij
    }
}

impl std::fmt::Display for CubicBinaryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CubicBinaryRecord(k_ij={})", self.k_ij)
    }
}
