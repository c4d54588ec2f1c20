use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use portwatch_domain::{
    BoundingBox, DomainResult, ObservationSource, PropertyMap, PropertyValue, RawSample, SourceId,
};

use crate::synth::{diurnal_phase, gaussian};

/// Synthetic NASA Earth-observation producer: MODIS land surface temperature
/// and vegetation index samples at random points inside the region of
/// interest. Stands in for the satellite data APIs in development setups.
pub struct NasaCollector {
    bbox: BoundingBox,
}

impl NasaCollector {
    pub fn new(bbox: BoundingBox) -> Self {
        Self { bbox }
    }
}

fn modis_metadata() -> PropertyMap {
    let mut metadata = PropertyMap::new();
    metadata.insert(
        "source".to_string(),
        PropertyValue::Text("MODIS".to_string()),
    );
    metadata.insert("synthetic".to_string(), PropertyValue::Bool(true));
    metadata
}

#[async_trait]
impl ObservationSource for NasaCollector {
    fn source_id(&self) -> SourceId {
        SourceId::Nasa
    }

    async fn fetch_batch(&self) -> DomainResult<Vec<RawSample>> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let phase = diurnal_phase(now);

        let lat = self.bbox.min_lat + (self.bbox.max_lat - self.bbox.min_lat) * rng.gen::<f64>();
        let lon = self.bbox.min_lon + (self.bbox.max_lon - self.bbox.min_lon) * rng.gen::<f64>();

        // Land surface temperature in Celsius with a diurnal swing.
        let lst = 20.0 + 5.0 * phase.sin() + gaussian(&mut rng, 2.0);
        let ndvi = 0.3 + 0.4 * rng.gen::<f64>();

        Ok(vec![
            RawSample {
                occurred_at: now,
                dataset: "MODIS_LST".to_string(),
                parameter: "land_surface_temperature".to_string(),
                value: lst,
                latitude: lat,
                longitude: lon,
                site: None,
                metadata: modis_metadata(),
            },
            RawSample {
                occurred_at: now,
                dataset: "MODIS_NDVI".to_string(),
                parameter: "normalized_difference_vegetation_index".to_string(),
                value: ndvi,
                latitude: lat,
                longitude: lon,
                site: None,
                metadata: modis_metadata(),
            },
        ])
    }
}
