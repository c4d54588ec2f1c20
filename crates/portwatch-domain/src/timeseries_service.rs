use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::DomainResult;
use crate::reading::{AggregateResult, SensorReading, TimeWindow};
use crate::repository::SensorReadingRepository;
use crate::timestamp;
use crate::types::PropertyMap;

/// Domain service over the append-only time-series store.
pub struct TimeSeriesService {
    readings: Arc<dyn SensorReadingRepository>,
}

impl TimeSeriesService {
    pub fn new(readings: Arc<dyn SensorReadingRepository>) -> Self {
        Self { readings }
    }

    /// Append one reading. An absent or unparsable `time` falls back to
    /// ingestion wall-clock time; the fallback never surfaces as an error.
    pub async fn append(
        &self,
        sensor_id: String,
        time: Option<&str>,
        value: f64,
        properties: PropertyMap,
    ) -> DomainResult<()> {
        let resolved = timestamp::resolve(time, Utc::now());
        debug!(sensor_id = %sensor_id, time = %resolved, value, "appending reading");
        self.readings
            .append(SensorReading {
                sensor_id,
                time: resolved,
                value,
                properties,
            })
            .await
    }

    /// Readings for a sensor, newest-first, optionally bounded by window and
    /// row limit. Caller-supplied bound strings follow the same flexible
    /// parsing as `append`, except that an unparsable bound imposes no filter.
    pub async fn range(
        &self,
        sensor_id: &str,
        start: Option<&str>,
        end: Option<&str>,
        limit: Option<i64>,
    ) -> DomainResult<Vec<SensorReading>> {
        let window = parse_window(start, end);
        self.readings.range(sensor_id, window, limit).await
    }

    pub async fn stats(
        &self,
        sensor_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> DomainResult<AggregateResult> {
        let window = parse_window(start, end);
        self.readings.stats(sensor_id, window).await
    }
}

/// Optional bounds parse individually; a bound that fails to parse is dropped
/// rather than rejected, mirroring the append-side recovery policy.
fn parse_window(start: Option<&str>, end: Option<&str>) -> TimeWindow {
    let parse = |raw: Option<&str>| {
        raw.and_then(|s| {
            let sentinel = chrono::DateTime::<Utc>::MIN_UTC;
            let parsed = timestamp::resolve(Some(s), sentinel);
            (parsed != sentinel).then_some(parsed)
        })
    };
    TimeWindow::new(parse(start), parse(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryReadingStore;
    use chrono::{DateTime, TimeZone};

    fn service() -> (Arc<InMemoryReadingStore>, TimeSeriesService) {
        let store = Arc::new(InMemoryReadingStore::new());
        let service = TimeSeriesService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn appended_unix_timestamp_resolves_exactly() {
        let (_, service) = service();
        service
            .append(
                "harbor_temp".to_string(),
                Some("1700000000"),
                19.5,
                PropertyMap::new(),
            )
            .await
            .unwrap();

        let readings = service.range("harbor_temp", None, None, None).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].time.timestamp(), 1_700_000_000);
        assert_eq!(readings[0].value, 19.5);
    }

    #[tokio::test]
    async fn unparsable_timestamp_falls_back_to_now() {
        let (_, service) = service();
        let before = Utc::now();
        service
            .append(
                "harbor_temp".to_string(),
                Some("not-a-date"),
                20.0,
                PropertyMap::new(),
            )
            .await
            .unwrap();
        let after = Utc::now();

        let readings = service.range("harbor_temp", None, None, None).await.unwrap();
        assert!(readings[0].time >= before && readings[0].time <= after);
    }

    #[tokio::test]
    async fn stats_of_empty_window_is_all_null() {
        let (_, service) = service();
        service
            .append(
                "harbor_temp".to_string(),
                Some("1700000000"),
                19.5,
                PropertyMap::new(),
            )
            .await
            .unwrap();

        let stats = service
            .stats(
                "harbor_temp",
                Some("2050-01-01T00:00:00Z"),
                Some("2050-01-02T00:00:00Z"),
            )
            .await
            .unwrap();
        assert_eq!(stats, AggregateResult::empty());
    }

    #[tokio::test]
    async fn stats_over_readings_orders_min_avg_max() {
        let (_, service) = service();
        for (ts, value) in [("1700000000", 18.0), ("1700000060", 21.0), ("1700000120", 19.5)] {
            service
                .append("harbor_temp".to_string(), Some(ts), value, PropertyMap::new())
                .await
                .unwrap();
        }

        let stats = service.stats("harbor_temp", None, None).await.unwrap();
        assert_eq!(stats.count, 3);
        assert!(stats.min.unwrap() <= stats.avg.unwrap());
        assert!(stats.avg.unwrap() <= stats.max.unwrap());
    }

    #[tokio::test]
    async fn range_is_newest_first_and_bounded() {
        let (_, service) = service();
        for ts in ["1700000000", "1700000060", "1700000120"] {
            service
                .append("harbor_temp".to_string(), Some(ts), 1.0, PropertyMap::new())
                .await
                .unwrap();
        }

        let readings = service
            .range("harbor_temp", Some("1700000030"), None, Some(1))
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].time.timestamp(), 1_700_000_120);
    }

    #[test]
    fn window_bound_with_z_suffix_parses() {
        let window = parse_window(Some("2024-01-01T00:00:00Z"), Some("junk"));
        let expected: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(window.start, Some(expected));
        assert_eq!(window.end, None);
    }
}
