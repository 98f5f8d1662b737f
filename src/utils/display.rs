//! Terminal table rendering for CLI output.

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, Table};

use crate::datasets::{Cardinality, DatasetKey, DatasetRegistry};
use crate::models::{MaterialPropertyResponse, MaterialSummary};

/// Placeholder for values the catalog did not report
const MISSING: &str = "-";

/// Format an optional number with fixed precision
pub fn fmt_number(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", precision, v),
        _ => MISSING.to_string(),
    }
}

/// Truncate to `max_chars` characters, appending "..." when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn numeric(value: Option<f64>, precision: usize) -> Cell {
    Cell::new(fmt_number(value, precision)).set_alignment(CellAlignment::Right)
}

/// One row per material in a search page
pub fn summary_table(materials: &[MaterialSummary]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Material",
        "Formula",
        "Crystal system",
        "Band gap (eV)",
        "E above hull (eV/atom)",
        "Density (g/cm³)",
        "Stable",
    ]);

    for material in materials {
        let symmetry = material
            .symmetry
            .as_ref()
            .and_then(|s| s.crystal_system.clone())
            .unwrap_or_else(|| MISSING.to_string());
        let stable = match material.is_stable {
            Some(true) => "yes",
            Some(false) => "no",
            None => MISSING,
        };

        table.add_row(vec![
            Cell::new(&material.material_id).add_attribute(Attribute::Bold),
            Cell::new(truncate(&material.formula_pretty, 24)),
            Cell::new(symmetry),
            numeric(material.band_gap, 3),
            numeric(material.energy_above_hull, 3),
            numeric(material.density, 3),
            Cell::new(stable),
        ]);
    }

    table
}

/// The dataset registry: key, endpoint, shape and page limit
pub fn dataset_table(registry: &DatasetRegistry) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Dataset", "Endpoint", "Shape", "Limit", "Default"]);

    let defaults = registry.default_selection();
    for descriptor in registry.all() {
        let shape = match descriptor.cardinality {
            Cardinality::Single => "single",
            Cardinality::Multiple => "list",
        };
        table.add_row(vec![
            Cell::new(descriptor.key.as_str()).add_attribute(Attribute::Bold),
            Cell::new(descriptor.path),
            Cell::new(shape),
            Cell::new(descriptor.limit).set_alignment(CellAlignment::Right),
            Cell::new(if defaults.has(descriptor.key) { "yes" } else { "no" }),
        ]);
    }

    table
}

/// Which datasets came back for a material detail
pub fn detail_table(detail: &MaterialPropertyResponse) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Dataset", "Records"]);

    for key in detail.present() {
        let records = match key {
            DatasetKey::Tasks => detail.tasks.as_ref().map_or(0, Vec::len),
            DatasetKey::Substrates => detail.substrates.as_ref().map_or(0, Vec::len),
            _ => 1,
        };
        table.add_row(vec![
            Cell::new(key.as_str()).add_attribute(Attribute::Bold),
            Cell::new(records).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}
