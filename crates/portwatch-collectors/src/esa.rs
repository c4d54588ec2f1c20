use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use portwatch_domain::{
    DomainResult, ObservationSource, PropertyMap, PropertyValue, RawSample, SourceId,
};

use crate::synth::{diurnal_phase, gaussian};

/// Synthetic ESA Copernicus producer: Sentinel-1 radar backscatter and
/// Sentinel-2 NDVI over the greater Lima area, plus Sentinel-3 sea surface
/// temperature in the coastal waters off Chancay.
pub struct EsaCollector;

impl EsaCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EsaCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn sentinel_metadata(mission: &str) -> PropertyMap {
    let mut metadata = PropertyMap::new();
    metadata.insert(
        "source".to_string(),
        PropertyValue::Text(format!("ESA {mission}")),
    );
    metadata.insert("synthetic".to_string(), PropertyValue::Bool(true));
    metadata
}

#[async_trait]
impl ObservationSource for EsaCollector {
    fn source_id(&self) -> SourceId {
        SourceId::Esa
    }

    async fn fetch_batch(&self) -> DomainResult<Vec<RawSample>> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let phase = diurnal_phase(now);

        // Greater Lima footprint for the land missions.
        let land_lat = -11.5 + (rng.gen::<f64>() - 0.5) * 0.3;
        let land_lon = -77.0 + (rng.gen::<f64>() - 0.5) * 0.6;
        // Coastal waters off Chancay for the ocean mission.
        let sea_lat = -11.6 + (rng.gen::<f64>() - 0.5) * 0.2;
        let sea_lon = -77.3 + (rng.gen::<f64>() - 0.5) * 0.2;

        let backscatter = -15.0 + gaussian(&mut rng, 3.0);
        let ndvi = 0.2 + 0.5 * rng.gen::<f64>();
        let sst = 18.0 + 3.0 * phase.sin() + gaussian(&mut rng, 0.5);

        let mut sar_metadata = sentinel_metadata("Sentinel-1");
        sar_metadata.insert(
            "polarization".to_string(),
            PropertyValue::Text("VV".to_string()),
        );

        Ok(vec![
            RawSample {
                occurred_at: now,
                dataset: "SENTINEL1_SAR".to_string(),
                parameter: "backscatter_coefficient".to_string(),
                value: backscatter,
                latitude: land_lat,
                longitude: land_lon,
                site: None,
                metadata: sar_metadata,
            },
            RawSample {
                occurred_at: now,
                dataset: "SENTINEL2_MSI".to_string(),
                parameter: "ndvi".to_string(),
                value: ndvi,
                latitude: land_lat,
                longitude: land_lon,
                site: None,
                metadata: sentinel_metadata("Sentinel-2"),
            },
            RawSample {
                occurred_at: now,
                dataset: "SENTINEL3_SLSTR".to_string(),
                parameter: "sea_surface_temperature".to_string(),
                value: sst,
                latitude: sea_lat,
                longitude: sea_lon,
                site: None,
                metadata: sentinel_metadata("Sentinel-3"),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_covers_all_three_missions() {
        let collector = EsaCollector::new();
        let batch = collector.fetch_batch().await.unwrap();

        let datasets: Vec<&str> = batch.iter().map(|s| s.dataset.as_str()).collect();
        assert_eq!(
            datasets,
            vec!["SENTINEL1_SAR", "SENTINEL2_MSI", "SENTINEL3_SLSTR"]
        );
        // NDVI is bounded by construction.
        assert!((0.2..=0.7).contains(&batch[1].value));
    }
}
