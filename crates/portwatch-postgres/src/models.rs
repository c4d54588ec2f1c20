use chrono::{DateTime, Utc};
use portwatch_domain::{
    Feature, Layer, Observation, PropertyMap, SensorReading,
};
use tokio_postgres::types::Json;
use tokio_postgres::Row;

/// Layer row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct LayerRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub geom_type: String,
    pub srid: i32,
}

impl LayerRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get(0),
            name: row.get(1),
            description: row.get(2),
            geom_type: row.get(3),
            srid: row.get(4),
        }
    }
}

impl From<LayerRow> for Layer {
    fn from(row: LayerRow) -> Self {
        Layer {
            id: row.id,
            name: row.name,
            description: row.description,
            geom_type: row.geom_type,
            srid: row.srid,
        }
    }
}

/// Feature row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub id: i64,
    pub layer_id: i64,
    pub properties: PropertyMap,
    pub geom: String,
}

impl FeatureRow {
    pub fn from_row(row: &Row) -> Self {
        let Json(properties) = row.get::<_, Json<PropertyMap>>(2);
        Self {
            id: row.get(0),
            layer_id: row.get(1),
            properties,
            geom: row.get(3),
        }
    }
}

impl From<FeatureRow> for Feature {
    fn from(row: FeatureRow) -> Self {
        Feature {
            id: row.id,
            layer_id: row.layer_id,
            properties: row.properties,
            geom_wkt: row.geom,
        }
    }
}

/// Sensor reading row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct ReadingRow {
    pub sensor_id: String,
    pub ts: DateTime<Utc>,
    pub value: f64,
    pub properties: PropertyMap,
}

impl ReadingRow {
    pub fn from_row(row: &Row) -> Self {
        let Json(properties) = row.get::<_, Json<PropertyMap>>(3);
        Self {
            sensor_id: row.get(0),
            ts: row.get(1),
            value: row.get(2),
            properties,
        }
    }
}

impl From<ReadingRow> for SensorReading {
    fn from(row: ReadingRow) -> Self {
        SensorReading {
            sensor_id: row.sensor_id,
            time: row.ts,
            value: row.value,
            properties: row.properties,
        }
    }
}

/// Observation row for PostgreSQL storage; shared by every source table.
#[derive(Debug, Clone)]
pub struct ObservationRow {
    pub ts: DateTime<Utc>,
    pub dataset: String,
    pub parameter: String,
    pub value: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub geom: String,
    pub location: Option<String>,
    pub metadata: PropertyMap,
}

impl ObservationRow {
    pub fn from_row(row: &Row) -> Self {
        let Json(metadata) = row.get::<_, Json<PropertyMap>>(8);
        Self {
            ts: row.get(0),
            dataset: row.get(1),
            parameter: row.get(2),
            value: row.get(3),
            latitude: row.get(4),
            longitude: row.get(5),
            geom: row.get(6),
            location: row.get(7),
            metadata,
        }
    }
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Observation {
            timestamp: row.ts,
            dataset: row.dataset,
            parameter: row.parameter,
            value: row.value,
            latitude: row.latitude,
            longitude: row.longitude,
            geom_wkt: row.geom,
            location: row.location,
            metadata: row.metadata,
        }
    }
}
