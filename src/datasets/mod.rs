//! Dataset registry: the static table of per-material sub-resources.
//!
//! Every detail request is expressed in terms of [`DatasetKey`]s. The registry
//! answers three questions about them: where the dataset lives upstream, which
//! fields to project, and whether it yields one record or a bounded list.

mod registry;

pub use registry::{DatasetDescriptor, DatasetRegistry, DatasetSelection, DEFAULT_MULTIPLE_LIMIT};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the twelve per-material datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKey {
    Dielectric,
    Elasticity,
    Piezoelectric,
    Absorption,
    Thermo,
    Magnetism,
    Oxidation,
    Provenance,
    Tasks,
    Surface,
    Substrates,
    Eos,
}

impl DatasetKey {
    /// All keys in registry order
    pub const ALL: [DatasetKey; 12] = [
        DatasetKey::Dielectric,
        DatasetKey::Elasticity,
        DatasetKey::Piezoelectric,
        DatasetKey::Absorption,
        DatasetKey::Thermo,
        DatasetKey::Magnetism,
        DatasetKey::Oxidation,
        DatasetKey::Provenance,
        DatasetKey::Tasks,
        DatasetKey::Surface,
        DatasetKey::Substrates,
        DatasetKey::Eos,
    ];

    /// Wire name, as used in the `datasets` parameter and the response keys
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::Dielectric => "dielectric",
            DatasetKey::Elasticity => "elasticity",
            DatasetKey::Piezoelectric => "piezoelectric",
            DatasetKey::Absorption => "absorption",
            DatasetKey::Thermo => "thermo",
            DatasetKey::Magnetism => "magnetism",
            DatasetKey::Oxidation => "oxidation",
            DatasetKey::Provenance => "provenance",
            DatasetKey::Tasks => "tasks",
            DatasetKey::Surface => "surface",
            DatasetKey::Substrates => "substrates",
            DatasetKey::Eos => "eos",
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKey {
    type Err = UnknownDataset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownDataset(s.to_string()))
    }
}

/// Returned when a dataset name is not in the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown dataset: {0}")]
pub struct UnknownDataset(pub String);

/// Whether a dataset yields at most one record or a bounded list per material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Single,
    Multiple,
}
