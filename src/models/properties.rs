//! Per-dataset detail payloads and the merged detail response.
//!
//! Field sets follow the projections in the dataset registry. Everything except
//! the identifier is optional because the catalog omits fields it has no value for.
//! Fields whose upstream shape varies between records are kept as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datasets::DatasetKey;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DielectricProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default)]
    pub e_total: Option<f64>,
    #[serde(default)]
    pub e_ionic: Option<f64>,
    #[serde(default)]
    pub e_electronic: Option<f64>,
    #[serde(default)]
    pub n: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElasticityProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default)]
    pub k_vrh: Option<f64>,
    #[serde(default)]
    pub g_vrh: Option<f64>,
    #[serde(default)]
    pub homogeneous_poisson: Option<f64>,
    #[serde(default)]
    pub universal_anisotropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_tensor: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic_tensor: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PiezoelectricProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default)]
    pub e_ij_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_direction: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strain_for_max: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AbsorptionProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub bandgap: Option<f64>,
    #[serde(default)]
    pub energy_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energies: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absorption_coefficient: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThermoProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermo_id: Option<String>,
    #[serde(default)]
    pub energy_per_atom: Option<f64>,
    #[serde(default)]
    pub energy_above_hull: Option<f64>,
    #[serde(default)]
    pub formation_energy_per_atom: Option<f64>,
    #[serde(default)]
    pub equilibrium_reaction_energy_per_atom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposition_products: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MagnetismProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default)]
    pub ordering: Option<String>,
    #[serde(default)]
    pub ordering_temperature: Option<f64>,
    #[serde(default)]
    pub total_magnetization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_magnetization_normalized_vol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_magnetic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OxidationStateProperty {
    #[serde(default)]
    pub material_id: String,
    /// Either a per-element map or a per-site list
    #[serde(default)]
    pub oxidation_states: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_species: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProvenanceProperty {
    #[serde(default)]
    pub material_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theoretical: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_pretty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub energy_per_atom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miller_index: Option<Vec<i32>>,
    #[serde(
        rename = "surface_energy_EV_PER_ANG2",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub surface_energy_ev_per_ang2: Option<f64>,
    #[serde(default)]
    pub surface_energy: Option<f64>,
    #[serde(default)]
    pub work_function: Option<f64>,
    #[serde(default)]
    pub area_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reconstructed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
    #[serde(
        rename = "weighted_surface_energy_EV_PER_ANG2",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub weighted_surface_energy_ev_per_ang2: Option<f64>,
    #[serde(default)]
    pub weighted_surface_energy: Option<f64>,
    #[serde(default)]
    pub weighted_work_function: Option<f64>,
    #[serde(default)]
    pub surface_anisotropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_reconstructed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surfaces: Option<Vec<SurfaceEntry>>,
}

/// A candidate substrate for growing the material as a film
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubstrateMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_orient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orient: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub norients: Option<u64>,
    /// Count as exposed by the catalog under its legacy name
    #[serde(rename = "_norients", default, skip_serializing)]
    pub legacy_norients: Option<u64>,
}

impl SubstrateMatch {
    /// Move the legacy `_norients` count into `norients` unless it is already set
    pub fn reconcile(mut self) -> Self {
        if self.norients.is_none() {
            self.norients = self.legacy_norients;
        }
        self.legacy_norients = None;
        self
    }
}

/// One equation-of-state fit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EosFit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "V0", default)]
    pub v0: Option<f64>,
    #[serde(rename = "B0", default)]
    pub b0: Option<f64>,
    #[serde(rename = "B1", default)]
    pub b1: Option<f64>,
    #[serde(rename = "E0", default)]
    pub e0: Option<f64>,
    #[serde(rename = "R2", default)]
    pub r2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EosProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
    /// Fits keyed or listed by model, depending on the catalog release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eos: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energies: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<f64>>,
}

impl EosProperty {
    /// Fits in list form; empty when the catalog keyed them differently
    pub fn fits(&self) -> Vec<EosFit> {
        match &self.eos {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(model, item)| {
                    let mut fit: EosFit = serde_json::from_value(item.clone()).ok()?;
                    fit.model.get_or_insert_with(|| model.clone());
                    Some(fit)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A shaped payload for one dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetPayload {
    Dielectric(DielectricProperty),
    Elasticity(ElasticityProperty),
    Piezoelectric(PiezoelectricProperty),
    Absorption(AbsorptionProperty),
    Thermo(ThermoProperty),
    Magnetism(MagnetismProperty),
    Oxidation(OxidationStateProperty),
    Provenance(ProvenanceProperty),
    Tasks(Vec<TaskProperty>),
    Surface(SurfaceProperty),
    Substrates(Vec<SubstrateMatch>),
    Eos(EosProperty),
}

impl DatasetPayload {
    pub fn key(&self) -> DatasetKey {
        match self {
            DatasetPayload::Dielectric(_) => DatasetKey::Dielectric,
            DatasetPayload::Elasticity(_) => DatasetKey::Elasticity,
            DatasetPayload::Piezoelectric(_) => DatasetKey::Piezoelectric,
            DatasetPayload::Absorption(_) => DatasetKey::Absorption,
            DatasetPayload::Thermo(_) => DatasetKey::Thermo,
            DatasetPayload::Magnetism(_) => DatasetKey::Magnetism,
            DatasetPayload::Oxidation(_) => DatasetKey::Oxidation,
            DatasetPayload::Provenance(_) => DatasetKey::Provenance,
            DatasetPayload::Tasks(_) => DatasetKey::Tasks,
            DatasetPayload::Surface(_) => DatasetKey::Surface,
            DatasetPayload::Substrates(_) => DatasetKey::Substrates,
            DatasetPayload::Eos(_) => DatasetKey::Eos,
        }
    }
}

/// All requested datasets for one material, merged
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialPropertyResponse {
    pub material_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dielectric: Option<DielectricProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticity: Option<ElasticityProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piezoelectric: Option<PiezoelectricProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absorption: Option<AbsorptionProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermo: Option<ThermoProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetism: Option<MagnetismProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxidation: Option<OxidationStateProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ProvenanceProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<SurfaceProperty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substrates: Option<Vec<SubstrateMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eos: Option<EosProperty>,
}

impl MaterialPropertyResponse {
    pub fn new(material_id: impl Into<String>) -> Self {
        Self {
            material_id: material_id.into(),
            ..Default::default()
        }
    }

    /// Place a payload under its dataset key
    pub fn insert(&mut self, payload: DatasetPayload) {
        match payload {
            DatasetPayload::Dielectric(p) => self.dielectric = Some(p),
            DatasetPayload::Elasticity(p) => self.elasticity = Some(p),
            DatasetPayload::Piezoelectric(p) => self.piezoelectric = Some(p),
            DatasetPayload::Absorption(p) => self.absorption = Some(p),
            DatasetPayload::Thermo(p) => self.thermo = Some(p),
            DatasetPayload::Magnetism(p) => self.magnetism = Some(p),
            DatasetPayload::Oxidation(p) => self.oxidation = Some(p),
            DatasetPayload::Provenance(p) => self.provenance = Some(p),
            DatasetPayload::Tasks(p) => self.tasks = Some(p),
            DatasetPayload::Surface(p) => self.surface = Some(p),
            DatasetPayload::Substrates(p) => self.substrates = Some(p),
            DatasetPayload::Eos(p) => self.eos = Some(p),
        }
    }

    /// Keys of the datasets that are present
    pub fn present(&self) -> Vec<DatasetKey> {
        let flags = [
            (DatasetKey::Dielectric, self.dielectric.is_some()),
            (DatasetKey::Elasticity, self.elasticity.is_some()),
            (DatasetKey::Piezoelectric, self.piezoelectric.is_some()),
            (DatasetKey::Absorption, self.absorption.is_some()),
            (DatasetKey::Thermo, self.thermo.is_some()),
            (DatasetKey::Magnetism, self.magnetism.is_some()),
            (DatasetKey::Oxidation, self.oxidation.is_some()),
            (DatasetKey::Provenance, self.provenance.is_some()),
            (DatasetKey::Tasks, self.tasks.is_some()),
            (DatasetKey::Surface, self.surface.is_some()),
            (DatasetKey::Substrates, self.substrates.is_some()),
            (DatasetKey::Eos, self.eos.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(key, present)| present.then_some(key))
            .collect()
    }
}
