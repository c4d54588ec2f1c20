use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DomainResult;
use crate::observation_service::ObservationCatalog;
use crate::reading::TimeWindow;
use crate::repository::SensorReadingRepository;

/// Source label for the local sensor telemetry store in integrated results.
pub const LOCAL_SENSOR_SOURCE: &str = "local_sensors";

/// Aggregate for one source inside an integrated analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAggregate {
    pub source: String,
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Combined statistics for one parameter across every registered source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedAnalysis {
    pub per_source: Vec<SourceAggregate>,
    pub total_count: u64,
}

/// Cross-source aggregator: queries every observation store plus the local
/// time-series store for one parameter and merges the per-source statistics.
pub struct IntegratedAnalysisService {
    catalog: ObservationCatalog,
    readings: Arc<dyn SensorReadingRepository>,
}

impl IntegratedAnalysisService {
    pub fn new(catalog: ObservationCatalog, readings: Arc<dyn SensorReadingRepository>) -> Self {
        Self { catalog, readings }
    }

    /// Per-source stats for rows whose parameter contains `parameter` as a
    /// case-insensitive substring, within the window. Sources report in
    /// declared order (nasa, esa, lima, local sensors); sources with no
    /// matching rows are skipped, and a failing source degrades to exclusion
    /// with a logged warning instead of aborting the analysis.
    pub async fn integrated_analysis(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<IntegratedAnalysis> {
        let mut per_source = Vec::new();
        let mut total_count = 0u64;

        for (source, store) in self.catalog.iter() {
            match store.stats_matching(parameter, window).await {
                Ok(agg) => {
                    if let Some(entry) = source_aggregate(source.as_str(), agg) {
                        total_count += entry.count;
                        per_source.push(entry);
                    }
                }
                Err(e) => {
                    warn!(
                        source = %source,
                        parameter = %parameter,
                        error = %e,
                        "source query failed, excluding from integrated analysis"
                    );
                }
            }
        }

        match self.readings.stats_matching(parameter, window).await {
            Ok(agg) => {
                if let Some(entry) = source_aggregate(LOCAL_SENSOR_SOURCE, agg) {
                    total_count += entry.count;
                    per_source.push(entry);
                }
            }
            Err(e) => {
                warn!(
                    source = LOCAL_SENSOR_SOURCE,
                    parameter = %parameter,
                    error = %e,
                    "source query failed, excluding from integrated analysis"
                );
            }
        }

        debug!(
            parameter = %parameter,
            sources = per_source.len(),
            total_count,
            "integrated analysis complete"
        );

        Ok(IntegratedAnalysis {
            per_source,
            total_count,
        })
    }
}

/// Nonzero aggregates carry min/max/avg by construction, so the unwraps are
/// guarded by the count check.
fn source_aggregate(
    source: &str,
    agg: crate::reading::AggregateResult,
) -> Option<SourceAggregate> {
    if agg.count == 0 {
        return None;
    }
    match (agg.avg, agg.min, agg.max) {
        (Some(avg), Some(min), Some(max)) => Some(SourceAggregate {
            source: source.to_string(),
            count: agg.count,
            avg,
            min,
            max,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::reading::AggregateResult;
    use crate::repository::{MockObservationRepository, MockSensorReadingRepository};

    fn aggregate(count: u64, avg: f64) -> AggregateResult {
        AggregateResult {
            count,
            min: Some(avg - 1.0),
            max: Some(avg + 1.0),
            avg: Some(avg),
        }
    }

    fn empty_store() -> Arc<MockObservationRepository> {
        let mut store = MockObservationRepository::new();
        store
            .expect_stats_matching()
            .returning(|_, _| Ok(AggregateResult::empty()));
        Arc::new(store)
    }

    fn empty_readings() -> Arc<MockSensorReadingRepository> {
        let mut readings = MockSensorReadingRepository::new();
        readings
            .expect_stats_matching()
            .returning(|_, _| Ok(AggregateResult::empty()));
        Arc::new(readings)
    }

    #[tokio::test]
    async fn only_sources_with_rows_are_included() {
        let mut lima = MockObservationRepository::new();
        lima.expect_stats_matching()
            .withf(|parameter, _| parameter == "temperature")
            .returning(|_, _| Ok(aggregate(5, 20.0)));

        let service = IntegratedAnalysisService::new(
            ObservationCatalog::new(empty_store(), empty_store(), Arc::new(lima)),
            empty_readings(),
        );

        let analysis = service
            .integrated_analysis("temperature", TimeWindow::default())
            .await
            .unwrap();
        assert_eq!(analysis.per_source.len(), 1);
        assert_eq!(analysis.per_source[0].source, "lima");
        assert_eq!(analysis.total_count, 5);
    }

    #[tokio::test]
    async fn total_count_sums_included_sources_in_declared_order() {
        let mut nasa = MockObservationRepository::new();
        nasa.expect_stats_matching()
            .returning(|_, _| Ok(aggregate(3, 21.0)));
        let mut lima = MockObservationRepository::new();
        lima.expect_stats_matching()
            .returning(|_, _| Ok(aggregate(7, 25.0)));
        let mut readings = MockSensorReadingRepository::new();
        readings
            .expect_stats_matching()
            .returning(|_, _| Ok(aggregate(2, 19.0)));

        let service = IntegratedAnalysisService::new(
            ObservationCatalog::new(Arc::new(nasa), empty_store(), Arc::new(lima)),
            Arc::new(readings),
        );

        let analysis = service
            .integrated_analysis("temperature", TimeWindow::default())
            .await
            .unwrap();
        let order: Vec<&str> = analysis
            .per_source
            .iter()
            .map(|s| s.source.as_str())
            .collect();
        assert_eq!(order, vec!["nasa", "lima", LOCAL_SENSOR_SOURCE]);
        assert_eq!(analysis.total_count, 12);
    }

    #[tokio::test]
    async fn failing_source_is_excluded_not_fatal() {
        let mut esa = MockObservationRepository::new();
        esa.expect_stats_matching()
            .returning(|_, _| Err(DomainError::StorageFailure(anyhow::anyhow!("store down"))));
        let mut lima = MockObservationRepository::new();
        lima.expect_stats_matching()
            .returning(|_, _| Ok(aggregate(4, 30.0)));

        let service = IntegratedAnalysisService::new(
            ObservationCatalog::new(empty_store(), Arc::new(esa), Arc::new(lima)),
            empty_readings(),
        );

        let analysis = service
            .integrated_analysis("pm25", TimeWindow::default())
            .await
            .unwrap();
        assert_eq!(analysis.per_source.len(), 1);
        assert_eq!(analysis.per_source[0].source, "lima");
        assert_eq!(analysis.total_count, 4);
    }
}
