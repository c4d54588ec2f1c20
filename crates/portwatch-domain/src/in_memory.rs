//! In-process store implementations backing tests and local development runs.
//! They honor the same ordering and uniqueness rules as the Postgres stores.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{DomainError, DomainResult};
use crate::layer::{CreateLayerInput, Feature, InsertFeatureInput, Layer};
use crate::observation::{DatasetSummary, Observation, ObservationQuery};
use crate::reading::{AggregateResult, SensorReading, TimeWindow};
use crate::repository::{
    FeatureRepository, LayerRepository, ObservationRepository, SensorReadingRepository,
};

fn apply_limit<T>(mut rows: Vec<T>, limit: Option<i64>) -> Vec<T> {
    if let Some(limit) = limit {
        let limit = usize::try_from(limit).unwrap_or(0);
        rows.truncate(limit);
    }
    rows
}

fn matches_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Default)]
struct GeoState {
    layers: Vec<Layer>,
    features: Vec<Feature>,
    next_layer_id: i64,
    next_feature_id: i64,
}

/// Layer and feature storage held in memory.
#[derive(Default)]
pub struct InMemoryGeoStore {
    state: RwLock<GeoState>,
}

impl InMemoryGeoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LayerRepository for InMemoryGeoStore {
    async fn create_layer(&self, input: CreateLayerInput) -> DomainResult<Layer> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("geo store poisoned")))?;
        if state.layers.iter().any(|l| l.name == input.name) {
            return Err(DomainError::LayerAlreadyExists(input.name));
        }
        state.next_layer_id += 1;
        let layer = Layer {
            id: state.next_layer_id,
            name: input.name,
            description: input.description,
            geom_type: input.geom_type,
            srid: input.srid,
        };
        state.layers.push(layer.clone());
        Ok(layer)
    }

    async fn get_layer(&self, name: &str) -> DomainResult<Option<Layer>> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("geo store poisoned")))?;
        Ok(state.layers.iter().find(|l| l.name == name).cloned())
    }

    async fn list_layers(&self) -> DomainResult<Vec<Layer>> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("geo store poisoned")))?;
        Ok(state.layers.clone())
    }
}

#[async_trait]
impl FeatureRepository for InMemoryGeoStore {
    async fn insert_feature(&self, input: InsertFeatureInput) -> DomainResult<Feature> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("geo store poisoned")))?;
        state.next_feature_id += 1;
        let feature = Feature {
            id: state.next_feature_id,
            layer_id: input.layer_id,
            properties: input.properties,
            geom_wkt: input.geom_wkt,
        };
        state.features.push(feature.clone());
        Ok(feature)
    }

    async fn list_features(
        &self,
        layer_id: i64,
        limit: Option<i64>,
    ) -> DomainResult<Vec<Feature>> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("geo store poisoned")))?;
        let mut rows: Vec<Feature> = state
            .features
            .iter()
            .filter(|f| f.layer_id == layer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(apply_limit(rows, limit))
    }

    async fn list_geometries(&self, layer_id: i64) -> DomainResult<Vec<String>> {
        let state = self
            .state
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("geo store poisoned")))?;
        Ok(state
            .features
            .iter()
            .filter(|f| f.layer_id == layer_id)
            .map(|f| f.geom_wkt.clone())
            .collect())
    }
}

/// Append-only sensor telemetry held in memory.
#[derive(Default)]
pub struct InMemoryReadingStore {
    readings: RwLock<Vec<SensorReading>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SensorReadingRepository for InMemoryReadingStore {
    async fn append(&self, reading: SensorReading) -> DomainResult<()> {
        self.readings
            .write()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("reading store poisoned")))?
            .push(reading);
        Ok(())
    }

    async fn range(
        &self,
        sensor_id: &str,
        window: TimeWindow,
        limit: Option<i64>,
    ) -> DomainResult<Vec<SensorReading>> {
        let readings = self
            .readings
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("reading store poisoned")))?;
        let mut rows: Vec<SensorReading> = readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id && window.contains(r.time))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(apply_limit(rows, limit))
    }

    async fn stats(&self, sensor_id: &str, window: TimeWindow) -> DomainResult<AggregateResult> {
        let readings = self
            .readings
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("reading store poisoned")))?;
        Ok(AggregateResult::from_values(
            readings
                .iter()
                .filter(|r| r.sensor_id == sensor_id && window.contains(r.time))
                .map(|r| r.value),
        ))
    }

    async fn stats_matching(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<AggregateResult> {
        let readings = self
            .readings
            .read()
            .map_err(|_| DomainError::StorageFailure(anyhow::anyhow!("reading store poisoned")))?;
        Ok(AggregateResult::from_values(
            readings
                .iter()
                .filter(|r| matches_ci(&r.sensor_id, parameter) && window.contains(r.time))
                .map(|r| r.value),
        ))
    }
}

/// Normalized external observations for one source, held in memory.
#[derive(Default)]
pub struct InMemoryObservationStore {
    observations: RwLock<Vec<Observation>>,
}

impl InMemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObservationRepository for InMemoryObservationStore {
    async fn store_batch(&self, observations: Vec<Observation>) -> DomainResult<()> {
        self.observations
            .write()
            .map_err(|_| {
                DomainError::StorageFailure(anyhow::anyhow!("observation store poisoned"))
            })?
            .extend(observations);
        Ok(())
    }

    async fn list_datasets(&self) -> DomainResult<Vec<DatasetSummary>> {
        let observations = self.observations.read().map_err(|_| {
            DomainError::StorageFailure(anyhow::anyhow!("observation store poisoned"))
        })?;
        let mut groups: BTreeMap<(String, String, Option<String>), DatasetSummary> =
            BTreeMap::new();
        for obs in observations.iter() {
            let key = (
                obs.dataset.clone(),
                obs.parameter.clone(),
                obs.location.clone(),
            );
            groups
                .entry(key)
                .and_modify(|summary| {
                    summary.count += 1;
                    summary.earliest = summary.earliest.min(obs.timestamp);
                    summary.latest = summary.latest.max(obs.timestamp);
                })
                .or_insert_with(|| DatasetSummary {
                    dataset: obs.dataset.clone(),
                    parameter: obs.parameter.clone(),
                    location: obs.location.clone(),
                    count: 1,
                    earliest: obs.timestamp,
                    latest: obs.timestamp,
                });
        }
        Ok(groups.into_values().collect())
    }

    async fn query(&self, query: ObservationQuery) -> DomainResult<Vec<Observation>> {
        let observations = self.observations.read().map_err(|_| {
            DomainError::StorageFailure(anyhow::anyhow!("observation store poisoned"))
        })?;
        let mut rows: Vec<Observation> = observations
            .iter()
            .filter(|obs| query.matches(obs))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(apply_limit(rows, query.limit))
    }

    async fn stats(&self, query: ObservationQuery) -> DomainResult<AggregateResult> {
        let observations = self.observations.read().map_err(|_| {
            DomainError::StorageFailure(anyhow::anyhow!("observation store poisoned"))
        })?;
        Ok(AggregateResult::from_values(
            observations
                .iter()
                .filter(|obs| query.matches(obs))
                .map(|obs| obs.value),
        ))
    }

    async fn stats_matching(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<AggregateResult> {
        let observations = self.observations.read().map_err(|_| {
            DomainError::StorageFailure(anyhow::anyhow!("observation store poisoned"))
        })?;
        Ok(AggregateResult::from_values(
            observations
                .iter()
                .filter(|obs| matches_ci(&obs.parameter, parameter) && window.contains(obs.timestamp))
                .map(|obs| obs.value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyMap;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn duplicate_layer_name_is_rejected() {
        let store = InMemoryGeoStore::new();
        let input = CreateLayerInput {
            name: "port_zones".to_string(),
            geom_type: "POLYGON".to_string(),
            srid: 4326,
            description: None,
        };
        store.create_layer(input.clone()).await.unwrap();
        let err = store.create_layer(input).await.unwrap_err();
        assert!(matches!(err, DomainError::LayerAlreadyExists(name) if name == "port_zones"));
    }

    #[tokio::test]
    async fn features_list_newest_first_with_limit() {
        let store = InMemoryGeoStore::new();
        for i in 0..3 {
            store
                .insert_feature(InsertFeatureInput {
                    layer_id: 1,
                    properties: PropertyMap::new(),
                    geom_wkt: format!("POINT({} 0)", i),
                })
                .await
                .unwrap();
        }

        let rows = store.list_features(1, Some(2)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id > rows[1].id);
    }

    #[tokio::test]
    async fn dataset_summaries_group_by_dataset_parameter_location() {
        let store = InMemoryObservationStore::new();
        let now = Utc::now();
        let obs = |dataset: &str, location: Option<&str>, offset: i64| Observation {
            timestamp: now + Duration::minutes(offset),
            dataset: dataset.to_string(),
            parameter: "pm25".to_string(),
            value: 10.0,
            latitude: -12.07,
            longitude: -77.03,
            geom_wkt: "POINT(-77.03 -12.07)".to_string(),
            location: location.map(|s| s.to_string()),
            metadata: PropertyMap::new(),
        };
        store
            .store_batch(vec![
                obs("LIMA_AIR_QUALITY", Some("Campo de Marte"), 0),
                obs("LIMA_AIR_QUALITY", Some("Campo de Marte"), 5),
                obs("LIMA_AIR_QUALITY", Some("San Borja"), 0),
            ])
            .await
            .unwrap();

        let summaries = store.list_datasets().await.unwrap();
        assert_eq!(summaries.len(), 2);
        let campo = summaries
            .iter()
            .find(|s| s.location.as_deref() == Some("Campo de Marte"))
            .unwrap();
        assert_eq!(campo.count, 2);
        assert_eq!(campo.latest, now + Duration::minutes(5));
    }

    #[tokio::test]
    async fn stats_matching_is_case_insensitive_substring() {
        let store = InMemoryReadingStore::new();
        for (sensor, value) in [("Harbor_Temp", 18.0), ("salinity", 35.0)] {
            store
                .append(SensorReading {
                    sensor_id: sensor.to_string(),
                    time: Utc::now(),
                    value,
                    properties: PropertyMap::new(),
                })
                .await
                .unwrap();
        }

        let agg = store
            .stats_matching("temp", TimeWindow::default())
            .await
            .unwrap();
        assert_eq!(agg.count, 1);
        assert_eq!(agg.avg, Some(18.0));
    }
}
