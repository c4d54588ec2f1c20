use serde::{Deserialize, Serialize};

use crate::types::PropertyMap;

/// A named collection of features sharing a geometry kind and SRID.
///
/// Layers are created explicitly before any feature references them and are
/// immutable once created apart from their description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub geom_type: String,
    pub srid: i32,
}

/// Input for creating a layer.
#[derive(Debug, Clone)]
pub struct CreateLayerInput {
    pub name: String,
    pub geom_type: String,
    pub srid: i32,
    pub description: Option<String>,
}

/// A geospatial feature belonging to exactly one layer.
///
/// The geometry is WKT in SRID 4326, validated at insert time. Features are
/// immutable after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub layer_id: i64,
    pub properties: PropertyMap,
    pub geom_wkt: String,
}

/// Input for inserting a feature into a resolved layer.
#[derive(Debug, Clone)]
pub struct InsertFeatureInput {
    pub layer_id: i64,
    pub properties: PropertyMap,
    pub geom_wkt: String,
}
