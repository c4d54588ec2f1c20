use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::data_source::ObservationSource;
use crate::error::{DomainError, DomainResult};
use crate::normalizer::normalize_batch;
use crate::repository::ObservationRepository;

/// Schedule for one external collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Normal cadence between collection cycles.
    pub interval: Duration,
    /// Backoff after a failed cycle; strictly shorter than `interval`.
    pub retry_interval: Duration,
    /// Bound on a single producer fetch.
    pub fetch_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            retry_interval: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// Run one external collector until cancelled: fetch a batch, normalize it,
/// persist it, then sleep for the cadence. Any error abandons the cycle,
/// is logged, and shortens the next sleep to the retry interval; the normal
/// cadence resumes after the next success. A cycle already in flight runs to
/// completion on shutdown.
pub async fn run_collector(
    ctx: CancellationToken,
    config: CollectorConfig,
    source: Arc<dyn ObservationSource>,
    repository: Arc<dyn ObservationRepository>,
) -> anyhow::Result<()> {
    let source_id = source.source_id();
    info!(
        source = %source_id,
        interval_secs = config.interval.as_secs(),
        "collector started"
    );

    let mut next_delay = Duration::ZERO;
    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!(source = %source_id, "collector stopping");
                break;
            }
            _ = tokio::time::sleep(next_delay) => {
                match run_cycle(&config, source.as_ref(), repository.as_ref()).await {
                    Ok(stored) => {
                        debug!(source = %source_id, stored, "collection cycle complete");
                        next_delay = config.interval;
                    }
                    Err(e) => {
                        error!(
                            source = %source_id,
                            error = %e,
                            retry_secs = config.retry_interval.as_secs(),
                            "collection cycle failed, backing off"
                        );
                        next_delay = config.retry_interval;
                    }
                }
            }
        }
    }

    Ok(())
}

/// One collection cycle: bounded fetch, normalize, persist. Returns the
/// number of observations stored.
pub async fn run_cycle(
    config: &CollectorConfig,
    source: &dyn ObservationSource,
    repository: &dyn ObservationRepository,
) -> DomainResult<usize> {
    let samples = tokio::time::timeout(config.fetch_timeout, source.fetch_batch())
        .await
        .map_err(|_| {
            DomainError::UpstreamUnavailable(format!(
                "{} fetch timed out after {:?}",
                source.source_id(),
                config.fetch_timeout
            ))
        })??;

    let observations = normalize_batch(samples);
    let stored = observations.len();
    if stored > 0 {
        repository.store_batch(observations).await?;
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{FixedObservationSource, RawSample};
    use crate::in_memory::InMemoryObservationStore;
    use crate::observation::ObservationQuery;
    use crate::types::{PropertyMap, SourceId};
    use chrono::Utc;

    fn sample(value: f64) -> RawSample {
        RawSample {
            occurred_at: Utc::now(),
            dataset: "MODIS_LST".to_string(),
            parameter: "land_surface_temperature".to_string(),
            value,
            latitude: -11.56,
            longitude: -77.27,
            site: None,
            metadata: PropertyMap::new(),
        }
    }

    #[tokio::test]
    async fn successful_cycle_persists_normalized_batch() {
        let source = FixedObservationSource::new(SourceId::Nasa);
        source.push_batch(vec![sample(21.0), sample(22.5)]);
        let store = InMemoryObservationStore::new();

        let stored = run_cycle(&CollectorConfig::default(), &source, &store)
            .await
            .unwrap();
        assert_eq!(stored, 2);

        let rows = store.query(ObservationQuery::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].geom_wkt, "POINT(-77.27 -11.56)");
    }

    #[tokio::test]
    async fn failed_fetch_abandons_cycle_without_storing() {
        let source = FixedObservationSource::new(SourceId::Nasa);
        source.push_failure("satellite feed down");
        let store = InMemoryObservationStore::new();

        let result = run_cycle(&CollectorConfig::default(), &source, &store).await;
        assert!(matches!(result, Err(DomainError::UpstreamUnavailable(_))));
        assert!(store
            .query(ObservationQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cycle_after_failure_succeeds() {
        let source = FixedObservationSource::new(SourceId::Nasa);
        source.push_failure("transient");
        source.push_batch(vec![sample(20.0)]);
        let store = InMemoryObservationStore::new();
        let config = CollectorConfig::default();

        assert!(run_cycle(&config, &source, &store).await.is_err());
        assert_eq!(run_cycle(&config, &source, &store).await.unwrap(), 1);
    }
}
