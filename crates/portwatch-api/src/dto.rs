use portwatch_domain::{
    AggregateResult, DomainResult, Feature, GeometryEngine, PropertyMap,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn new() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLayerParams {
    #[serde(default = "default_geom_type")]
    pub geom_type: String,
    #[serde(default = "default_srid")]
    pub srid: i32,
    pub description: Option<String>,
}

fn default_geom_type() -> String {
    "GEOMETRY".to_string()
}

fn default_srid() -> i32 {
    4326
}

#[derive(Debug, Deserialize)]
pub struct InsertFeatureRequest {
    pub layer: String,
    #[serde(default)]
    pub properties: PropertyMap,
    pub geom_wkt: String,
}

#[derive(Debug, Deserialize)]
pub struct IntersectRequest {
    pub layer: String,
    pub geom_wkt: String,
}

#[derive(Debug, Deserialize)]
pub struct AppendReadingRequest {
    pub sensor_id: String,
    pub value: f64,
    pub time: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
}

#[derive(Debug, Deserialize)]
pub struct FeatureListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingListParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationParams {
    pub limit: Option<i64>,
    pub hours_back: Option<i64>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HoursBackParams {
    pub hours_back: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LayerAreaResponse {
    pub layer: String,
    pub area_m2: f64,
}

#[derive(Debug, Serialize)]
pub struct SensorStatsResponse {
    pub sensor_id: String,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl SensorStatsResponse {
    pub fn new(sensor_id: String, agg: AggregateResult) -> Self {
        Self {
            sensor_id,
            count: agg.count,
            min: agg.min,
            max: agg.max,
            avg: agg.avg,
        }
    }
}

/// Renders features as a GeoJSON FeatureCollection, converting each stored WKT
/// geometry through the engine.
pub fn feature_collection(
    features: &[Feature],
    geometry: &dyn GeometryEngine,
) -> DomainResult<serde_json::Value> {
    let mut rendered = Vec::with_capacity(features.len());
    for feature in features {
        rendered.push(json!({
            "type": "Feature",
            "id": feature.id,
            "properties": feature.properties,
            "geometry": geometry.to_geojson(&feature.geom_wkt)?,
        }));
    }
    Ok(json!({
        "type": "FeatureCollection",
        "features": rendered,
        "count": features.len(),
    }))
}
