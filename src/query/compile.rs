//! Query compiler: canonical parameters to the catalog's query-string dialect.

use serde_json::{Map, Value};

use crate::datasets::{DatasetDescriptor, DatasetKey};
use crate::error::{GatewayError, Result};
use crate::models::{RangeFilter, RequestKind, SearchParams, SortOrder};

use super::normalize::normalize;

/// Fields projected from the summary endpoint
pub const SUMMARY_FIELDS: &[&str] = &[
    "material_id",
    "formula_pretty",
    "elements",
    "nelements",
    "nsites",
    "energy_above_hull",
    "formation_energy_per_atom",
    "band_gap",
    "density",
    "volume",
    "total_magnetization",
    "total_magnetization_normalized_vol",
    "is_stable",
    "theoretical",
    "has_props",
    "warnings",
    "calc_types",
    "symmetry",
    "last_updated",
];

/// Ordered upstream query parameters.
///
/// Setting a key that is already present replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpstreamQuery {
    pairs: Vec<(String, String)>,
}

impl UpstreamQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    /// Set `key` to the comma-joined values, or leave it out when nothing remains
    fn set_csv<S: AsRef<str>>(&mut self, key: &str, values: &[S]) {
        let cleaned: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .collect();
        if !cleaned.is_empty() {
            self.set(key, cleaned.join(","));
        }
    }

    fn set_range(&mut self, field: &str, range: Option<RangeFilter>) {
        let Some(range) = range.and_then(|r| RangeFilter::new(r.min, r.max)) else {
            return;
        };
        if let Some(min) = range.min {
            self.set(&format!("{field}_min"), min.to_string());
        }
        if let Some(max) = range.max {
            self.set(&format!("{field}_max"), max.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Percent-encoded `k=v&...` form
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UpstreamQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = UpstreamQuery::new();
        for (k, v) in iter {
            let key: String = k.into();
            query.set(&key, v);
        }
        query
    }
}

/// Compile search parameters for the summary endpoint
pub fn compile_search(params: &SearchParams) -> UpstreamQuery {
    let mut query = UpstreamQuery::new();

    query.set("_limit", params.page_size().to_string());
    query.set("_skip", params.offset().to_string());
    query.set("_all_fields", "false");
    query.set("_fields", SUMMARY_FIELDS.join(","));

    let field = params.sort_field.unwrap_or_default();
    let prefix = match params.sort_order.unwrap_or_default() {
        SortOrder::Desc => "-",
        SortOrder::Asc => "",
    };
    query.set("_sort_fields", format!("{prefix}{field}"));

    if let Some(formula) = &params.formula {
        query.set_csv("formula", &formula.split(',').collect::<Vec<_>>());
    }
    if let Some(chemsys) = &params.chemsys {
        query.set_csv("chemsys", &chemsys.split(',').collect::<Vec<_>>());
    }
    for (key, values) in [
        ("elements", &params.elements),
        ("exclude_elements", &params.exclude_elements),
        ("possible_species", &params.possible_species),
        ("has_props", &params.has_props),
    ] {
        if let Some(values) = values {
            query.set_csv(key, values);
        }
    }

    if let Some(crystal_system) = params.crystal_system.as_deref().map(str::trim) {
        if !crystal_system.is_empty() {
            query.set("crystal_system", crystal_system);
        }
    }
    if let Some(symbol) = params.spacegroup_symbol.as_deref().map(str::trim) {
        if !symbol.is_empty() {
            query.set("spacegroup_symbol", symbol);
        }
    }

    if let Some(is_stable) = params.is_stable {
        query.set("is_stable", is_stable.to_string());
    }
    if let Some(theoretical) = params.theoretical {
        query.set("theoretical", theoretical.to_string());
    }

    for (field, range) in params.ranges() {
        query.set_range(field, range);
    }

    query
}

/// Compile the per-dataset query for one material.
///
/// `tasks` is keyed by task ids rather than the material id and cannot be
/// fetched without at least one; `substrates` is keyed by film id.
pub fn compile_dataset(
    descriptor: &DatasetDescriptor,
    material_id: &str,
    task_ids: &[String],
) -> Result<UpstreamQuery> {
    let mut query = UpstreamQuery::new();
    query.set("_limit", descriptor.limit.to_string());

    match descriptor.key {
        DatasetKey::Tasks => {
            let ids: Vec<&str> = task_ids
                .iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .collect();
            if ids.is_empty() {
                return Err(GatewayError::ClientInput(
                    "This material has no task_ids; calculation tasks cannot be queried."
                        .to_string(),
                ));
            }
            query.set("task_ids", ids.join(","));
        }
        DatasetKey::Substrates => query.set("film_id", material_id),
        _ => query.set("material_ids", material_id),
    }

    if descriptor.fields.is_empty() {
        query.set("_all_fields", "true");
    } else {
        query.set("_all_fields", "false");
        query.set("_fields", descriptor.fields.join(","));
    }

    Ok(query)
}

/// Read a compiled summary query back into canonical parameters.
///
/// Paging and sort tokens are translated back to their caller-facing keys;
/// everything else goes through the normalizer's snake_case aliases.
pub fn parse_compiled(query: &UpstreamQuery) -> SearchParams {
    let mut raw = Map::new();

    for (key, value) in query.pairs() {
        match key.as_str() {
            "_fields" | "_all_fields" | "_skip" => {}
            "_limit" => {
                raw.insert("pageSize".into(), Value::String(value.clone()));
            }
            "_sort_fields" => {
                let (order, field) = match value.strip_prefix('-') {
                    Some(field) => ("desc", field),
                    None => ("asc", value.as_str()),
                };
                raw.insert("sortField".into(), Value::String(field.to_string()));
                raw.insert("sortOrder".into(), Value::String(order.to_string()));
            }
            _ => {
                raw.insert(key.clone(), Value::String(value.clone()));
            }
        }
    }

    let limit = query.get("_limit").and_then(|v| v.parse::<u64>().ok());
    let skip = query.get("_skip").and_then(|v| v.parse::<u64>().ok());
    if let (Some(limit), Some(skip)) = (limit, skip) {
        if limit > 0 {
            raw.insert("page".into(), Value::String((skip / limit + 1).to_string()));
        }
    }

    normalize(&Value::Object(raw), RequestKind::Search)
}
