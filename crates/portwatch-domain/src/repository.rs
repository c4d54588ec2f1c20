use async_trait::async_trait;

use crate::error::DomainResult;
use crate::layer::{CreateLayerInput, Feature, InsertFeatureInput, Layer};
use crate::observation::{DatasetSummary, Observation, ObservationQuery};
use crate::reading::{AggregateResult, SensorReading, TimeWindow};

/// Storage for layers. Layer names are globally unique; creating a layer with
/// an existing name fails with `LayerAlreadyExists`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LayerRepository: Send + Sync {
    async fn create_layer(&self, input: CreateLayerInput) -> DomainResult<Layer>;

    async fn get_layer(&self, name: &str) -> DomainResult<Option<Layer>>;

    async fn list_layers(&self) -> DomainResult<Vec<Layer>>;
}

/// Storage for features. Features are append-only and ordered newest-first by
/// insertion id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    async fn insert_feature(&self, input: InsertFeatureInput) -> DomainResult<Feature>;

    /// Features of a layer, newest-first, bounded by `limit` when present.
    async fn list_features(&self, layer_id: i64, limit: Option<i64>)
        -> DomainResult<Vec<Feature>>;

    /// WKT geometries of every feature in the layer.
    async fn list_geometries(&self, layer_id: i64) -> DomainResult<Vec<String>>;
}

/// Append-only store for local sensor telemetry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SensorReadingRepository: Send + Sync {
    async fn append(&self, reading: SensorReading) -> DomainResult<()>;

    /// Readings for a sensor, newest-first, filtered by the window.
    async fn range(
        &self,
        sensor_id: &str,
        window: TimeWindow,
        limit: Option<i64>,
    ) -> DomainResult<Vec<SensorReading>>;

    async fn stats(&self, sensor_id: &str, window: TimeWindow) -> DomainResult<AggregateResult>;

    /// Stats over readings whose sensor id contains `parameter` as a
    /// case-insensitive substring. Used by the cross-source aggregator, where
    /// the sensor id plays the role of the parameter field.
    async fn stats_matching(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<AggregateResult>;
}

/// Append-only store for normalized external observations. One store exists
/// per external source.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    async fn store_batch(&self, observations: Vec<Observation>) -> DomainResult<()>;

    /// Distinct (dataset, parameter, location) combinations with coverage.
    async fn list_datasets(&self) -> DomainResult<Vec<DatasetSummary>>;

    /// Observations matching the query, newest-first.
    async fn query(&self, query: ObservationQuery) -> DomainResult<Vec<Observation>>;

    /// Aggregate over observations matching the query.
    async fn stats(&self, query: ObservationQuery) -> DomainResult<AggregateResult>;

    /// Stats over observations whose parameter contains `parameter` as a
    /// case-insensitive substring, within the window.
    async fn stats_matching(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<AggregateResult>;
}
