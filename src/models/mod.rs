//! Core data models for material searches and detail aggregation.

mod material;
mod properties;
mod search;

pub use material::{MaterialSummary, MaterialsMeta, MaterialsResponse, Symmetry};
pub use properties::{
    AbsorptionProperty, DatasetPayload, DielectricProperty, ElasticityProperty, EosFit,
    EosProperty, MagnetismProperty, MaterialPropertyResponse, OxidationStateProperty,
    PiezoelectricProperty, ProvenanceProperty, SubstrateMatch,
    SurfaceEntry, SurfaceProperty, TaskProperty, ThermoProperty,
};
pub use search::{
    clamp_page_size, RangeFilter, RequestKind, SearchParams, SortField, SortOrder,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
};
