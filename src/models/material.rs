//! Summary records returned by a catalog search.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Symmetry sub-record of a summary entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Symmetry {
    #[serde(default)]
    pub crystal_system: Option<String>,

    #[serde(default)]
    pub symbol: Option<String>,

    #[serde(default)]
    pub point_group: Option<String>,
}

/// One catalog entry as projected by the search endpoint.
///
/// Coverage, warning and calculation fields vary in shape between catalog
/// releases and pass through as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialSummary {
    #[serde(default)]
    pub material_id: String,

    #[serde(default)]
    pub formula_pretty: String,

    #[serde(default)]
    pub elements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nelements: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsites: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_above_hull: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation_energy_per_atom: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_gap: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_magnetization: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_magnetization_normalized_vol: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_stable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theoretical: Option<bool>,

    /// Data-coverage tags, either a list of names or a `{name: bool}` map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_props: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Value>,

    /// Calculation id per task type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calc_types: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<Symmetry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Paging metadata attached to a search response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialsMeta {
    pub total_doc: u64,
    pub limit: u32,
    pub skip: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialsResponse {
    pub data: Vec<MaterialSummary>,
    pub meta: MaterialsMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_decodes_sparse_record() {
        let summary: MaterialSummary = serde_json::from_value(json!({
            "material_id": "mp-19017",
            "formula_pretty": "LiFePO4",
            "elements": ["Fe", "Li", "O", "P"],
            "band_gap": 3.7,
            "is_stable": true,
            "calc_types": { "mp-1940138": "GGA+U Structure Optimization", "mp-2": null },
            "symmetry": { "crystal_system": "Orthorhombic", "symbol": "Pnma" }
        }))
        .unwrap();

        assert_eq!(summary.formula_pretty, "LiFePO4");
        assert_eq!(summary.band_gap, Some(3.7));
        assert_eq!(summary.density, None);
        let calc_types = summary.calc_types.unwrap();
        assert_eq!(calc_types.get("mp-2"), Some(&Value::Null));
        assert_eq!(
            summary.symmetry.and_then(|s| s.symbol),
            Some("Pnma".to_string())
        );
    }

    #[test]
    fn test_has_props_accepts_list_or_map() {
        let listed: MaterialSummary =
            serde_json::from_value(json!({ "material_id": "mp-1", "has_props": ["elasticity"] }))
                .unwrap();
        assert_eq!(listed.has_props, Some(json!(["elasticity"])));

        let mapped: MaterialSummary = serde_json::from_value(json!({
            "material_id": "mp-2",
            "has_props": { "elasticity": true, "dielectric": false },
            "warnings": "none"
        }))
        .unwrap();
        assert_eq!(
            mapped.has_props,
            Some(json!({ "elasticity": true, "dielectric": false }))
        );
        assert_eq!(mapped.warnings, Some(json!("none")));
    }

    #[test]
    fn test_meta_omits_missing_message() {
        let meta = MaterialsMeta {
            total_doc: 40,
            limit: 18,
            skip: 18,
            message: None,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, json!({ "total_doc": 40, "limit": 18, "skip": 18 }));
    }
}
