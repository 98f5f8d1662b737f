//! Shaping raw dataset records into typed payloads.
//!
//! Each dataset key maps to one shaper. Single-record datasets keep the first
//! record or nothing; multi-record datasets keep up to the descriptor limit and
//! are present even when empty.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::datasets::{DatasetDescriptor, DatasetKey};
use crate::error::Result;
use crate::models::{DatasetPayload, SubstrateMatch};

type Shaper = fn(Vec<Value>, &DatasetDescriptor) -> Result<Option<DatasetPayload>>;

fn first<T: DeserializeOwned>(entries: Vec<Value>) -> Result<Option<T>> {
    match entries.into_iter().next() {
        Some(entry) => Ok(Some(serde_json::from_value(entry)?)),
        None => Ok(None),
    }
}

fn list<T: DeserializeOwned>(entries: Vec<Value>, limit: usize) -> Result<Vec<T>> {
    entries
        .into_iter()
        .take(limit)
        .map(|entry| serde_json::from_value(entry).map_err(Into::into))
        .collect()
}

fn shaper(key: DatasetKey) -> Shaper {
    match key {
        DatasetKey::Dielectric => |entries, _| Ok(first(entries)?.map(DatasetPayload::Dielectric)),
        DatasetKey::Elasticity => |entries, _| Ok(first(entries)?.map(DatasetPayload::Elasticity)),
        DatasetKey::Piezoelectric => {
            |entries, _| Ok(first(entries)?.map(DatasetPayload::Piezoelectric))
        }
        DatasetKey::Absorption => |entries, _| Ok(first(entries)?.map(DatasetPayload::Absorption)),
        DatasetKey::Thermo => |entries, _| Ok(first(entries)?.map(DatasetPayload::Thermo)),
        DatasetKey::Magnetism => |entries, _| Ok(first(entries)?.map(DatasetPayload::Magnetism)),
        DatasetKey::Oxidation => |entries, _| Ok(first(entries)?.map(DatasetPayload::Oxidation)),
        DatasetKey::Provenance => |entries, _| Ok(first(entries)?.map(DatasetPayload::Provenance)),
        DatasetKey::Surface => |entries, _| Ok(first(entries)?.map(DatasetPayload::Surface)),
        DatasetKey::Eos => |entries, _| Ok(first(entries)?.map(DatasetPayload::Eos)),
        DatasetKey::Tasks => {
            |entries, descriptor| Ok(Some(DatasetPayload::Tasks(list(entries, descriptor.limit)?)))
        }
        DatasetKey::Substrates => |entries, descriptor| {
            let matches: Vec<SubstrateMatch> = list(entries, descriptor.limit)?;
            Ok(Some(DatasetPayload::Substrates(
                matches.into_iter().map(SubstrateMatch::reconcile).collect(),
            )))
        },
    }
}

/// Shape the records returned for one dataset.
///
/// `Ok(None)` means a single-record dataset had nothing to report.
pub fn shape(descriptor: &DatasetDescriptor, entries: Vec<Value>) -> Result<Option<DatasetPayload>> {
    shaper(descriptor.key)(entries, descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DatasetRegistry;
    use crate::error::GatewayError;
    use serde_json::json;

    fn shape_key(key: DatasetKey, entries: Vec<Value>) -> Result<Option<DatasetPayload>> {
        shape(DatasetRegistry::new().get(key), entries)
    }

    #[test]
    fn test_every_key_has_a_shaper_with_matching_payload() {
        let registry = DatasetRegistry::new();
        for descriptor in registry.all() {
            let entry = json!({ "material_id": "mp-149" });
            if let Some(payload) = shape(descriptor, vec![entry]).unwrap() {
                assert_eq!(payload.key(), descriptor.key);
            }
        }
    }

    #[test]
    fn test_single_takes_first_record() {
        let payload = shape_key(
            DatasetKey::Thermo,
            vec![
                json!({ "material_id": "mp-149", "energy_above_hull": 0.0 }),
                json!({ "material_id": "mp-149", "energy_above_hull": 0.5 }),
            ],
        )
        .unwrap();

        match payload {
            Some(DatasetPayload::Thermo(thermo)) => {
                assert_eq!(thermo.energy_above_hull, Some(0.0))
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_provenance_calculations_pass_through() {
        let calculations = json!({ "mp-1791": { "task_type": "GGA Static" } });
        let payload = shape_key(
            DatasetKey::Provenance,
            vec![json!({ "material_id": "mp-149", "calculations": calculations })],
        )
        .unwrap();

        match payload {
            Some(DatasetPayload::Provenance(provenance)) => {
                assert_eq!(provenance.calculations, Some(calculations))
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_single_without_records_is_absent() {
        assert_eq!(shape_key(DatasetKey::Dielectric, vec![]).unwrap(), None);
        assert_eq!(shape_key(DatasetKey::Eos, vec![]).unwrap(), None);
    }

    #[test]
    fn test_multiple_is_truncated_to_limit() {
        let entries: Vec<Value> = (0..12)
            .map(|i| json!({ "sub_id": format!("mp-{}", i), "area": 10.0 + i as f64 }))
            .collect();

        match shape_key(DatasetKey::Substrates, entries).unwrap() {
            Some(DatasetPayload::Substrates(matches)) => {
                assert_eq!(matches.len(), 8);
                assert_eq!(matches[0].sub_id.as_deref(), Some("mp-0"));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_multiple_without_records_is_empty_list() {
        assert_eq!(
            shape_key(DatasetKey::Tasks, vec![]).unwrap(),
            Some(DatasetPayload::Tasks(Vec::new()))
        );
    }

    #[test]
    fn test_substrates_reconcile_legacy_count() {
        let entries = vec![
            json!({ "sub_id": "mp-1", "_norients": 4 }),
            json!({ "sub_id": "mp-2", "norients": 2, "_norients": 9 }),
        ];

        match shape_key(DatasetKey::Substrates, entries).unwrap() {
            Some(DatasetPayload::Substrates(matches)) => {
                assert_eq!(matches[0].norients, Some(4));
                assert_eq!(matches[1].norients, Some(2));
                assert!(matches.iter().all(|m| m.legacy_norients.is_none()));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_wrongly_typed_record_is_decode_error() {
        let err = shape_key(
            DatasetKey::Thermo,
            vec![json!({ "material_id": "mp-1", "energy_above_hull": "low" })],
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
