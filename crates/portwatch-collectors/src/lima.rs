use async_trait::async_trait;
use chrono::{Timelike, Utc};
use rand::Rng;

use portwatch_domain::{
    DomainResult, ObservationSource, PropertyMap, PropertyValue, RawSample, SourceId,
};

use crate::synth::{diurnal_phase, gaussian};

/// Fixed air quality monitoring stations across metropolitan Lima.
const AIR_STATIONS: [(&str, f64, f64); 5] = [
    ("Campo de Marte", -12.072, -77.036),
    ("San Borja", -12.092, -77.007),
    ("Villa María del Triunfo", -12.159, -76.935),
    ("Ate", -12.058, -76.927),
    ("Carabayllo", -11.857, -77.020),
];

/// Major avenues with traffic flow sensors.
const TRAFFIC_POINTS: [(&str, f64, f64); 4] = [
    ("Av. Javier Prado", -12.089, -77.024),
    ("Av. Arequipa", -12.088, -77.040),
    ("Panamericana Norte", -11.950, -77.080),
    ("Av. Paseo de la República", -12.070, -77.042),
];

/// Synthetic municipal producer: PM2.5 and NO2 at the air quality stations
/// and a 0-100 traffic flow index on the major avenues, with rush-hour peaks.
pub struct LimaCollector;

impl LimaCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LimaCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn station_metadata(source: &str, site: &str) -> PropertyMap {
    let mut metadata = PropertyMap::new();
    metadata.insert(
        "source".to_string(),
        PropertyValue::Text(source.to_string()),
    );
    metadata.insert(
        "station".to_string(),
        PropertyValue::Text(site.to_string()),
    );
    metadata.insert("synthetic".to_string(), PropertyValue::Bool(true));
    metadata
}

/// Baseline traffic flow index by hour of day.
fn traffic_baseline(hour: u32) -> f64 {
    match hour {
        7..=9 | 17..=19 => 75.0,
        10..=16 => 50.0,
        22..=23 | 0..=5 => 15.0,
        _ => 30.0,
    }
}

#[async_trait]
impl ObservationSource for LimaCollector {
    fn source_id(&self) -> SourceId {
        SourceId::Lima
    }

    async fn fetch_batch(&self) -> DomainResult<Vec<RawSample>> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let phase = diurnal_phase(now);

        let mut samples = Vec::with_capacity(AIR_STATIONS.len() * 2 + TRAFFIC_POINTS.len());

        for (name, lat, lon) in AIR_STATIONS {
            let pm25 = (25.0 + 15.0 * phase.sin() + gaussian(&mut rng, 5.0)).max(0.0);
            let no2 = (35.0 + 20.0 * (phase + 1.0).sin() + gaussian(&mut rng, 8.0)).max(0.0);

            samples.push(RawSample {
                occurred_at: now,
                dataset: "LIMA_AIR_QUALITY".to_string(),
                parameter: "pm25".to_string(),
                value: pm25,
                latitude: lat,
                longitude: lon,
                site: Some(name.to_string()),
                metadata: station_metadata("SENAMHI Lima", name),
            });
            samples.push(RawSample {
                occurred_at: now,
                dataset: "LIMA_AIR_QUALITY".to_string(),
                parameter: "no2".to_string(),
                value: no2,
                latitude: lat,
                longitude: lon,
                site: Some(name.to_string()),
                metadata: station_metadata("SENAMHI Lima", name),
            });
        }

        for (name, lat, lon) in TRAFFIC_POINTS {
            let traffic =
                (traffic_baseline(now.hour()) + gaussian(&mut rng, 10.0)).clamp(0.0, 100.0);

            samples.push(RawSample {
                occurred_at: now,
                dataset: "LIMA_TRAFFIC".to_string(),
                parameter: "traffic_flow_index".to_string(),
                value: traffic,
                latitude: lat,
                longitude: lon,
                site: Some(name.to_string()),
                metadata: station_metadata("Municipalidad de Lima", name),
            });
        }

        Ok(samples)
    }
}
