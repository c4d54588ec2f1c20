use std::sync::Arc;

use chrono::Utc;

use crate::error::DomainResult;
use crate::observation::{BoundingBox, DatasetSummary, Observation, ObservationQuery};
use crate::reading::{AggregateResult, TimeWindow};
use crate::repository::ObservationRepository;
use crate::types::SourceId;

/// The per-source observation stores, in declared reporting order.
#[derive(Clone)]
pub struct ObservationCatalog {
    nasa: Arc<dyn ObservationRepository>,
    esa: Arc<dyn ObservationRepository>,
    lima: Arc<dyn ObservationRepository>,
}

impl ObservationCatalog {
    pub fn new(
        nasa: Arc<dyn ObservationRepository>,
        esa: Arc<dyn ObservationRepository>,
        lima: Arc<dyn ObservationRepository>,
    ) -> Self {
        Self { nasa, esa, lima }
    }

    pub fn get(&self, source: SourceId) -> &Arc<dyn ObservationRepository> {
        match source {
            SourceId::Nasa => &self.nasa,
            SourceId::Esa => &self.esa,
            SourceId::Lima => &self.lima,
        }
    }

    /// Stores in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &Arc<dyn ObservationRepository>)> {
        SourceId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

/// Read-side service over the per-source observation stores: dataset
/// inventory, windowed data queries and the bounding-box spatial average.
pub struct ObservationService {
    catalog: ObservationCatalog,
    spatial_bbox: BoundingBox,
}

impl ObservationService {
    pub fn new(catalog: ObservationCatalog, spatial_bbox: BoundingBox) -> Self {
        Self {
            catalog,
            spatial_bbox,
        }
    }

    pub async fn datasets(&self, source: SourceId) -> DomainResult<Vec<DatasetSummary>> {
        self.catalog.get(source).list_datasets().await
    }

    /// Observations of one (dataset, parameter) within the trailing window,
    /// newest-first, optionally restricted to a named site.
    pub async fn data(
        &self,
        source: SourceId,
        dataset: &str,
        parameter: &str,
        hours_back: i64,
        limit: i64,
        location: Option<String>,
    ) -> DomainResult<Vec<Observation>> {
        let query = ObservationQuery {
            dataset: Some(dataset.to_string()),
            parameter: Some(parameter.to_string()),
            location,
            window: TimeWindow::last_hours(Utc::now(), hours_back),
            bbox: None,
            limit: Some(limit),
        };
        self.catalog.get(source).query(query).await
    }

    /// Aggregate restricted to the configured region-of-interest bounding box.
    pub async fn spatial_average(
        &self,
        source: SourceId,
        dataset: &str,
        parameter: &str,
        hours_back: i64,
    ) -> DomainResult<AggregateResult> {
        let query = ObservationQuery {
            dataset: Some(dataset.to_string()),
            parameter: Some(parameter.to_string()),
            location: None,
            window: TimeWindow::last_hours(Utc::now(), hours_back),
            bbox: Some(self.spatial_bbox),
            limit: None,
        };
        self.catalog.get(source).stats(query).await
    }
}
