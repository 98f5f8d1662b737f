//! Parameter normalizer: untyped key-value input to canonical [`SearchParams`].
//!
//! Normalization is total. Unrecognized keys are ignored, and malformed values
//! are treated as absent. Nothing in this module returns an error.

use serde_json::{Map, Value};

use crate::datasets::{DatasetKey, DatasetSelection};
use crate::models::{
    clamp_page_size, RangeFilter, RequestKind, SearchParams, SortField, SortOrder,
};

/// Accepted spellings for each range filter, camelCase first
const BAND_GAP_KEYS: &[&str] = &["bandGap", "band_gap"];
const ENERGY_ABOVE_HULL_KEYS: &[&str] = &["energyAboveHull", "energy_above_hull"];
const FORMATION_ENERGY_KEYS: &[&str] = &[
    "formationEnergy",
    "formation_energy",
    "formation_energy_per_atom",
];
const DENSITY_KEYS: &[&str] = &["density"];
const VOLUME_KEYS: &[&str] = &["volume"];
const TOTAL_MAGNETIZATION_KEYS: &[&str] = &["totalMagnetization", "total_magnetization"];

/// Normalize a raw JSON value. Anything other than an object is an empty bag.
pub fn normalize(input: &Value, kind: RequestKind) -> SearchParams {
    match input {
        Value::Object(source) => normalize_map(source, kind),
        _ => normalize_map(&Map::new(), kind),
    }
}

/// Normalize flat string pairs, as decoded from a query string.
///
/// Later duplicates of a key win.
pub fn normalize_pairs<I, K, V>(pairs: I, kind: RequestKind) -> SearchParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    normalize_map(&pairs_to_map(pairs), kind)
}

pub(crate) fn pairs_to_map<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect()
}

fn normalize_map(source: &Map<String, Value>, kind: RequestKind) -> SearchParams {
    let mut params = SearchParams {
        formula: pick(source, &["formula", "material"]).and_then(parse_csv),
        chemsys: pick(source, &["chemsys"]).and_then(parse_csv),
        crystal_system: pick(source, &["crystalSystem", "crystal_system"]).and_then(parse_string),
        spacegroup_symbol: pick(source, &["spacegroupSymbol", "spacegroup_symbol"])
            .and_then(parse_string),

        elements: pick(source, &["elements"]).and_then(parse_string_set),
        exclude_elements: pick(source, &["excludeElements", "exclude_elements"])
            .and_then(parse_string_set),
        possible_species: pick(source, &["possibleSpecies", "possible_species"])
            .and_then(parse_string_set),
        has_props: pick(source, &["hasProps", "has_props"]).and_then(parse_string_set),

        band_gap: parse_range(source, BAND_GAP_KEYS),
        energy_above_hull: parse_range(source, ENERGY_ABOVE_HULL_KEYS),
        formation_energy: parse_range(source, FORMATION_ENERGY_KEYS),
        density: parse_range(source, DENSITY_KEYS),
        volume: parse_range(source, VOLUME_KEYS),
        total_magnetization: parse_range(source, TOTAL_MAGNETIZATION_KEYS),

        is_stable: pick(source, &["isStable", "is_stable"]).and_then(parse_bool),
        theoretical: pick(source, &["theoretical"]).and_then(parse_bool),

        sort_field: pick(source, &["sortField", "sort_field", "sort"])
            .and_then(as_trimmed_str)
            .and_then(SortField::parse),
        sort_order: pick(source, &["sortOrder", "sort_order"])
            .and_then(Value::as_str)
            .and_then(SortOrder::parse),

        page: pick(source, &["page"]).and_then(parse_count),
        page_size: pick(source, &["pageSize", "page_size", "limit"])
            .and_then(parse_count)
            .map(clamp_page_size),
    };

    if kind == RequestKind::Search {
        params = params.with_defaults();
    }

    params
}

/// First present, non-null value among the given keys
fn pick<'a>(source: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| source.get(*key))
        .find(|value| !value.is_null())
}

fn as_trimmed_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_string(value: &Value) -> Option<String> {
    as_trimmed_str(value).map(str::to_string)
}

/// Comma-separated alternatives, each trimmed, empties dropped, re-joined without spaces
fn parse_csv(value: &Value) -> Option<String> {
    let joined = as_trimmed_str(value)?
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// A list or a comma-separated string, trimmed, de-duplicated in first-seen order
fn parse_string_set(value: &Value) -> Option<Vec<String>> {
    let entries: Vec<&str> = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().unwrap_or(""))
            .collect(),
        Value::String(text) => text.split(',').collect(),
        _ => return None,
    };

    let mut cleaned: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries.into_iter().map(str::trim).filter(|e| !e.is_empty()) {
        if !cleaned.iter().any(|seen| seen == entry) {
            cleaned.push(entry.to_string());
        }
    }

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// A finite number, given natively or as a numeric string
fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                text.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Floored and at least 1
fn parse_count(value: &Value) -> Option<u32> {
    parse_number(value).map(|n| n.floor().max(1.0) as u32)
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Nested `{min, max}` object, falling back to flat `<key>Min` / `<key>_min` keys
fn parse_range(source: &Map<String, Value>, names: &[&str]) -> Option<RangeFilter> {
    let nested = names
        .iter()
        .filter_map(|name| source.get(*name))
        .find_map(Value::as_object);

    let bound = |suffix_camel: &str, suffix_snake: &str, inner: &str| -> Option<f64> {
        nested
            .and_then(|object| object.get(inner))
            .filter(|value| !value.is_null())
            .or_else(|| {
                names.iter().find_map(|name| {
                    source
                        .get(&format!("{name}{suffix_camel}"))
                        .or_else(|| source.get(&format!("{name}{suffix_snake}")))
                        .filter(|value| !value.is_null())
                })
            })
            .and_then(parse_number)
    };

    RangeFilter::new(bound("Min", "_min", "min"), bound("Max", "_max", "max"))
}

/// Item id and dataset selection for one detail request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub material_id: String,
    pub datasets: DatasetSelection,
    pub task_ids: Vec<String>,
}

impl DetailRequest {
    /// Build from a material id and the raw `datasets` / `taskIds` parameters.
    ///
    /// Unknown dataset names are dropped; when none remain the default set is
    /// used. Supplying task ids adds the `tasks` dataset.
    pub fn parse(material_id: &str, source: &Map<String, Value>) -> Self {
        let task_ids = pick(source, &["taskIds", "task_ids"])
            .and_then(parse_string_set)
            .unwrap_or_default();

        let mut datasets = pick(source, &["datasets"])
            .and_then(|value| match value {
                Value::String(text) => DatasetSelection::parse_list(text),
                Value::Array(_) => parse_string_set(value)
                    .and_then(|names| DatasetSelection::parse_list(&names.join(","))),
                _ => None,
            })
            .unwrap_or_else(DatasetSelection::default_set);

        if !task_ids.is_empty() {
            datasets |= DatasetSelection::from(DatasetKey::Tasks);
        }

        Self {
            material_id: material_id.trim().to_string(),
            datasets,
            task_ids,
        }
    }

    /// Build from query-string pairs
    pub fn from_pairs<I, K, V>(material_id: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::parse(material_id, &pairs_to_map(pairs))
    }
}
