//! Static registry of dataset descriptors.

use super::{Cardinality, DatasetKey};
use serde::Serialize;

bitflags::bitflags! {
    /// A set of datasets selected for one detail request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DatasetSelection: u16 {
        const DIELECTRIC = 1 << 0;
        const ELASTICITY = 1 << 1;
        const PIEZOELECTRIC = 1 << 2;
        const ABSORPTION = 1 << 3;
        const THERMO = 1 << 4;
        const MAGNETISM = 1 << 5;
        const OXIDATION = 1 << 6;
        const PROVENANCE = 1 << 7;
        const TASKS = 1 << 8;
        const SURFACE = 1 << 9;
        const SUBSTRATES = 1 << 10;
        const EOS = 1 << 11;
    }
}

impl From<DatasetKey> for DatasetSelection {
    fn from(key: DatasetKey) -> Self {
        match key {
            DatasetKey::Dielectric => DatasetSelection::DIELECTRIC,
            DatasetKey::Elasticity => DatasetSelection::ELASTICITY,
            DatasetKey::Piezoelectric => DatasetSelection::PIEZOELECTRIC,
            DatasetKey::Absorption => DatasetSelection::ABSORPTION,
            DatasetKey::Thermo => DatasetSelection::THERMO,
            DatasetKey::Magnetism => DatasetSelection::MAGNETISM,
            DatasetKey::Oxidation => DatasetSelection::OXIDATION,
            DatasetKey::Provenance => DatasetSelection::PROVENANCE,
            DatasetKey::Tasks => DatasetSelection::TASKS,
            DatasetKey::Surface => DatasetSelection::SURFACE,
            DatasetKey::Substrates => DatasetSelection::SUBSTRATES,
            DatasetKey::Eos => DatasetSelection::EOS,
        }
    }
}

impl FromIterator<DatasetKey> for DatasetSelection {
    fn from_iter<I: IntoIterator<Item = DatasetKey>>(iter: I) -> Self {
        iter.into_iter()
            .fold(DatasetSelection::empty(), |acc, key| acc | DatasetSelection::from(key))
    }
}

impl DatasetSelection {
    /// Default selection: every dataset except `tasks`, which needs task ids
    pub fn default_set() -> Self {
        DatasetSelection::all().difference(DatasetSelection::TASKS)
    }

    /// Whether a key is part of this selection
    pub fn has(&self, key: DatasetKey) -> bool {
        self.contains(DatasetSelection::from(key))
    }

    /// Selected keys in registry order
    pub fn keys(&self) -> impl Iterator<Item = DatasetKey> + '_ {
        DatasetKey::ALL.into_iter().filter(move |key| self.has(*key))
    }

    /// Parse a comma-separated list of dataset names.
    ///
    /// Unknown names are dropped and duplicates collapse. Returns `None` when
    /// nothing valid remains so the caller can fall back to the default set.
    pub fn parse_list(value: &str) -> Option<Self> {
        let selection: DatasetSelection = value
            .split(',')
            .map(str::trim)
            .filter_map(|entry| entry.parse::<DatasetKey>().ok())
            .collect();

        if selection.is_empty() {
            None
        } else {
            Some(selection)
        }
    }
}

/// Upstream location, projection and shape of one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetDescriptor {
    pub key: DatasetKey,
    pub path: &'static str,
    pub fields: &'static [&'static str],
    pub cardinality: Cardinality,
    pub limit: usize,
}

impl DatasetDescriptor {
    const fn single(key: DatasetKey, path: &'static str, fields: &'static [&'static str]) -> Self {
        Self {
            key,
            path,
            fields,
            cardinality: Cardinality::Single,
            limit: 1,
        }
    }

    const fn multiple(
        key: DatasetKey,
        path: &'static str,
        fields: &'static [&'static str],
        limit: Option<usize>,
    ) -> Self {
        Self {
            key,
            path,
            fields,
            cardinality: Cardinality::Multiple,
            limit: match limit {
                Some(limit) => limit,
                None => DEFAULT_MULTIPLE_LIMIT,
            },
        }
    }

    pub fn is_multiple(&self) -> bool {
        self.cardinality == Cardinality::Multiple
    }
}

/// Result cap for multiple-cardinality datasets without an explicit limit
pub const DEFAULT_MULTIPLE_LIMIT: usize = 10;

static DESCRIPTORS: [DatasetDescriptor; 12] = [
    DatasetDescriptor::single(
        DatasetKey::Dielectric,
        "materials/dielectric/",
        &[
            "material_id",
            "e_total",
            "e_ionic",
            "e_electronic",
            "n",
            "total",
            "last_updated",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Elasticity,
        "materials/elasticity/",
        &[
            "material_id",
            "k_vrh",
            "g_vrh",
            "homogeneous_poisson",
            "universal_anisotropy",
            "compliance_tensor",
            "elastic_tensor",
            "last_updated",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Piezoelectric,
        "materials/piezoelectric/",
        &[
            "material_id",
            "e_ij_max",
            "max_direction",
            "strain_for_max",
            "total",
            "last_updated",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Absorption,
        "materials/absorption/",
        &[
            "material_id",
            "task_id",
            "bandgap",
            "energy_max",
            "energies",
            "absorption_coefficient",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Thermo,
        "materials/thermo/",
        &[
            "material_id",
            "thermo_id",
            "energy_per_atom",
            "formation_energy_per_atom",
            "energy_above_hull",
            "equilibrium_reaction_energy_per_atom",
            "last_updated",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Magnetism,
        "materials/magnetism/",
        &[
            "material_id",
            "ordering",
            "ordering_temperature",
            "total_magnetization",
            "total_magnetization_normalized_vol",
            "is_magnetic",
            "last_updated",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Oxidation,
        "materials/oxidation_states/",
        &[
            "material_id",
            "oxidation_states",
            "possible_species",
            "last_updated",
        ],
    ),
    DatasetDescriptor::single(
        DatasetKey::Provenance,
        "materials/provenance/",
        &[
            "material_id",
            "deprecated",
            "theoretical",
            "calculations",
            "last_updated",
        ],
    ),
    DatasetDescriptor::multiple(
        DatasetKey::Tasks,
        "materials/tasks/",
        &[
            "task_id",
            "material_id",
            "formula_pretty",
            "task_type",
            "state",
            "energy_per_atom",
            "last_updated",
        ],
        Some(5),
    ),
    DatasetDescriptor::single(
        DatasetKey::Surface,
        "materials/surface_properties/",
        &[
            "material_id",
            "weighted_surface_energy",
            "weighted_surface_energy_EV_PER_ANG2",
            "surface_anisotropy",
            "weighted_work_function",
            "has_reconstructed",
            "surfaces",
        ],
    ),
    DatasetDescriptor::multiple(
        DatasetKey::Substrates,
        "materials/substrates/",
        &[
            "sub_form",
            "sub_id",
            "film_orient",
            "orient",
            "area",
            "energy",
            "_norients",
        ],
        Some(8),
    ),
    DatasetDescriptor::single(
        DatasetKey::Eos,
        "materials/eos/",
        &["material_id", "eos", "energies", "volumes"],
    ),
];

/// Read-only lookup over the dataset descriptors
#[derive(Debug, Clone, Copy)]
pub struct DatasetRegistry {
    descriptors: &'static [DatasetDescriptor],
}

impl DatasetRegistry {
    /// The registry of all twelve datasets
    pub fn new() -> Self {
        Self {
            descriptors: &DESCRIPTORS,
        }
    }

    /// Descriptor for a key
    pub fn get(&self, key: DatasetKey) -> &'static DatasetDescriptor {
        // Table order matches DatasetKey::ALL
        &self.descriptors[key as usize]
    }

    /// Descriptor for a wire name, if it is a known dataset
    pub fn lookup(&self, name: &str) -> Option<&'static DatasetDescriptor> {
        name.parse::<DatasetKey>().ok().map(|key| self.get(key))
    }

    /// Check if a name is a known dataset key
    pub fn is_known(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Datasets fetched when the caller names none
    pub fn default_selection(&self) -> DatasetSelection {
        DatasetSelection::default_set()
    }

    /// All descriptors in registry order
    pub fn all(&self) -> impl Iterator<Item = &'static DatasetDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_basic() {
        let registry = DatasetRegistry::new();
        assert_eq!(registry.len(), 12);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_descriptor_order_matches_keys() {
        let registry = DatasetRegistry::new();
        for key in DatasetKey::ALL {
            assert_eq!(registry.get(key).key, key);
        }
    }

    #[test]
    fn test_cardinality_and_limits() {
        let registry = DatasetRegistry::new();

        let tasks = registry.get(DatasetKey::Tasks);
        assert!(tasks.is_multiple());
        assert_eq!(tasks.limit, 5);

        let substrates = registry.get(DatasetKey::Substrates);
        assert!(substrates.is_multiple());
        assert_eq!(substrates.limit, 8);
        assert!(substrates.fields.contains(&"_norients"));

        for descriptor in registry.all().filter(|d| !d.is_multiple()) {
            assert_eq!(descriptor.limit, 1, "{} should be capped at 1", descriptor.key);
        }
    }

    #[test]
    fn test_lookup_and_validation() {
        let registry = DatasetRegistry::new();
        assert_eq!(
            registry.lookup("oxidation").map(|d| d.path),
            Some("materials/oxidation_states/")
        );
        assert!(registry.is_known("eos"));
        assert!(!registry.is_known("bandstructure"));
        assert!(!registry.is_known(""));
    }

    #[test]
    fn test_default_selection_excludes_tasks() {
        let selection = DatasetRegistry::new().default_selection();
        assert!(!selection.has(DatasetKey::Tasks));
        assert_eq!(selection.keys().count(), 11);
    }

    #[test]
    fn test_parse_list() {
        let selection = DatasetSelection::parse_list(" thermo, eos ,thermo,unknown,").unwrap();
        let keys: Vec<_> = selection.keys().collect();
        assert_eq!(keys, vec![DatasetKey::Thermo, DatasetKey::Eos]);

        assert_eq!(DatasetSelection::parse_list("nope, ,"), None);
        assert_eq!(DatasetSelection::parse_list(""), None);
    }
}
