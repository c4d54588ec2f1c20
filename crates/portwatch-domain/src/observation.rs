use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reading::TimeWindow;
use crate::types::PropertyMap;

/// A normalized external-source reading: one physical point per sample,
/// unified across satellite and municipal producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub dataset: String,
    pub parameter: String,
    pub value: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Point geometry derived from (longitude, latitude), as WKT.
    pub geom_wkt: String,
    /// Human-readable site name; present for municipal sources only.
    pub location: Option<String>,
    #[serde(default)]
    pub metadata: PropertyMap,
}

/// Region-of-interest filter for spatial-average queries. Not persisted;
/// defined by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Default region of interest around the Chancay port area.
    pub fn chancay() -> Self {
        Self {
            min_lat: -11.65,
            max_lat: -11.50,
            min_lon: -77.35,
            max_lon: -77.20,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

/// Filter set for observation range and stats queries. All filters combine
/// with logical AND; absent filters impose no restriction.
#[derive(Debug, Clone, Default)]
pub struct ObservationQuery {
    pub dataset: Option<String>,
    pub parameter: Option<String>,
    pub location: Option<String>,
    pub window: TimeWindow,
    pub bbox: Option<BoundingBox>,
    pub limit: Option<i64>,
}

impl ObservationQuery {
    /// Whether an observation matches every filter of this query (time window,
    /// dataset, parameter, location, bounding box).
    pub fn matches(&self, obs: &Observation) -> bool {
        if !self.window.contains(obs.timestamp) {
            return false;
        }
        if let Some(dataset) = &self.dataset {
            if &obs.dataset != dataset {
                return false;
            }
        }
        if let Some(parameter) = &self.parameter {
            if &obs.parameter != parameter {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if obs.location.as_deref() != Some(location.as_str()) {
                return false;
            }
        }
        if let Some(bbox) = &self.bbox {
            if !bbox.contains(obs.latitude, obs.longitude) {
                return false;
            }
        }
        true
    }
}

/// One distinct (dataset, parameter, location) combination held by an
/// observation store, with its row count and time coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset: String,
    pub parameter: String,
    pub location: Option<String>,
    pub count: u64,
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(dataset: &str, parameter: &str, lat: f64, lon: f64) -> Observation {
        Observation {
            timestamp: Utc::now(),
            dataset: dataset.to_string(),
            parameter: parameter.to_string(),
            value: 1.0,
            latitude: lat,
            longitude: lon,
            geom_wkt: format!("POINT({} {})", lon, lat),
            location: None,
            metadata: PropertyMap::new(),
        }
    }

    #[test]
    fn bbox_filter_excludes_points_outside() {
        let query = ObservationQuery {
            bbox: Some(BoundingBox::chancay()),
            ..Default::default()
        };
        assert!(query.matches(&observation("MODIS_LST", "lst", -11.6, -77.3)));
        assert!(!query.matches(&observation("MODIS_LST", "lst", -12.1, -77.0)));
    }

    #[test]
    fn dataset_and_parameter_filters_are_exact() {
        let query = ObservationQuery {
            dataset: Some("SENTINEL2_MSI".to_string()),
            parameter: Some("ndvi".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&observation("SENTINEL2_MSI", "ndvi", 0.0, 0.0)));
        assert!(!query.matches(&observation("SENTINEL2_MSI", "lst", 0.0, 0.0)));
        assert!(!query.matches(&observation("MODIS_NDVI", "ndvi", 0.0, 0.0)));
    }
}
