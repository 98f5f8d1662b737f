//! Canonical search representation produced by the normalizer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of results per page
pub const DEFAULT_PAGE_SIZE: u32 = 18;

/// Smallest page size the upstream is asked for
pub const MIN_PAGE_SIZE: u32 = 6;

/// Largest page size the upstream is asked for
pub const MAX_PAGE_SIZE: u32 = 60;

/// Inclusive numeric bounds on one summary property.
///
/// At least one bound is present and `min <= max` whenever both are.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeFilter {
    /// Build a range from optional bounds, repairing an inverted pair.
    ///
    /// Returns `None` when neither bound is present.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        let min = min.filter(|v| v.is_finite());
        let max = max.filter(|v| v.is_finite());

        match (min, max) {
            (None, None) => None,
            (Some(lo), Some(hi)) if lo > hi => Some(Self {
                min: Some(hi),
                max: Some(lo),
            }),
            (min, max) => Some(Self { min, max }),
        }
    }
}

/// Summary fields the upstream can sort on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    EnergyAboveHull,
    BandGap,
    Density,
    FormationEnergyPerAtom,
    Volume,
    TotalMagnetization,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::EnergyAboveHull,
        SortField::BandGap,
        SortField::Density,
        SortField::FormationEnergyPerAtom,
        SortField::Volume,
        SortField::TotalMagnetization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::EnergyAboveHull => "energy_above_hull",
            SortField::BandGap => "band_gap",
            SortField::Density => "density",
            SortField::FormationEnergyPerAtom => "formation_energy_per_atom",
            SortField::Volume => "volume",
            SortField::TotalMagnetization => "total_magnetization",
        }
    }

    /// Parse an upstream field name; anything outside the sortable set is `None`
    pub fn parse(value: &str) -> Option<Self> {
        SortField::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive `asc` / `desc`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// What the raw input is being normalized for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A paged summary search; defaults are applied
    Search,
    /// Filters accompanying a detail lookup; only explicit fields are kept
    Detail,
}

/// Validated search parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemsys: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_elements: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_species: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_gap: Option<RangeFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_above_hull: Option<RangeFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation_energy: Option<RangeFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<RangeFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<RangeFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_magnetization: Option<RangeFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crystal_system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacegroup_symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_props: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_stable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theoretical: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<SortField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl SearchParams {
    /// Fill in defaults for any field still absent.
    ///
    /// Explicit values, including `is_stable = false`, are kept.
    pub fn with_defaults(mut self) -> Self {
        self.page = Some(self.page.unwrap_or(1).max(1));
        self.page_size = Some(clamp_page_size(
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        ));
        self.sort_field = Some(self.sort_field.unwrap_or_default());
        self.sort_order = Some(self.sort_order.unwrap_or_default());
        self.is_stable = Some(self.is_stable.unwrap_or(true));
        self
    }

    /// Effective page number (1-based)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size
    pub fn page_size(&self) -> u32 {
        clamp_page_size(self.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.page_size())
    }

    /// The six range filters paired with their upstream field names
    pub fn ranges(&self) -> [(&'static str, Option<RangeFilter>); 6] {
        [
            ("band_gap", self.band_gap),
            ("energy_above_hull", self.energy_above_hull),
            ("formation_energy_per_atom", self.formation_energy),
            ("density", self.density),
            ("volume", self.volume),
            ("total_magnetization", self.total_magnetization),
        ]
    }
}

/// Clamp a page size into the accepted window
pub fn clamp_page_size(size: u32) -> u32 {
    size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_swaps_inverted_bounds() {
        let range = RangeFilter::new(Some(1.5), Some(0.5)).unwrap();
        assert_eq!(range.min, Some(0.5));
        assert_eq!(range.max, Some(1.5));
    }

    #[test]
    fn test_range_half_open_and_empty() {
        let range = RangeFilter::new(None, Some(3.0)).unwrap();
        assert_eq!(range.min, None);
        assert_eq!(range.max, Some(3.0));

        assert_eq!(RangeFilter::new(None, None), None);
        assert_eq!(RangeFilter::new(Some(f64::NAN), Some(f64::INFINITY)), None);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(SortField::parse("density"), Some(SortField::Density));
        assert_eq!(SortField::parse("nsites"), None);
        for field in SortField::ALL {
            assert_eq!(SortField::parse(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(" DESC "), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("Asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("descending"), None);
    }

    #[test]
    fn test_defaults_keep_explicit_false() {
        let params = SearchParams {
            is_stable: Some(false),
            ..Default::default()
        }
        .with_defaults();

        assert_eq!(params.is_stable, Some(false));
        assert_eq!(params.page, Some(1));
        assert_eq!(params.page_size, Some(DEFAULT_PAGE_SIZE));
        assert_eq!(params.sort_field, Some(SortField::EnergyAboveHull));
        assert_eq!(params.sort_order, Some(SortOrder::Asc));
    }

    #[test]
    fn test_offset() {
        let params = SearchParams {
            page: Some(3),
            page_size: Some(12),
            ..Default::default()
        };
        assert_eq!(params.offset(), 24);
        assert_eq!(SearchParams::default().offset(), 0);
    }

    #[test]
    fn test_page_size_clamp() {
        assert_eq!(clamp_page_size(1), MIN_PAGE_SIZE);
        assert_eq!(clamp_page_size(500), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(24), 24);
    }
}
