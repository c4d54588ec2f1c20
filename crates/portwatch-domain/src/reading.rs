use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::PropertyMap;

/// One sensor telemetry sample. Readings are append-only; timestamps need not
/// be unique or monotonic per sensor and duplicates are never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_id: String,
    pub time: DateTime<Utc>,
    pub value: f64,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Optional inclusive time bounds for range and stats queries. Absent bounds
/// impose no filter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Window covering the last `hours` hours up to `now`.
    pub fn last_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: Some(now - chrono::Duration::hours(hours)),
            end: None,
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if t < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if t > end {
                return false;
            }
        }
        true
    }
}

/// Count/min/max/avg over a set of values. The min, max and avg fields are
/// `None` whenever the count is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl AggregateResult {
    pub fn empty() -> Self {
        Self {
            count: 0,
            min: None,
            max: None,
            avg: None,
        }
    }

    /// Aggregate an iterator of values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0u64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;

        for v in values {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }

        if count == 0 {
            Self::empty()
        } else {
            Self {
                count,
                min: Some(min),
                max: Some(max),
                avg: Some(sum / count as f64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_of_nothing_is_all_null() {
        let agg = AggregateResult::from_values(std::iter::empty());
        assert_eq!(agg, AggregateResult::empty());
    }

    #[test]
    fn aggregate_orders_min_avg_max() {
        let agg = AggregateResult::from_values([19.5, 21.0, 18.0]);
        assert_eq!(agg.count, 3);
        assert!(agg.min.unwrap() <= agg.avg.unwrap());
        assert!(agg.avg.unwrap() <= agg.max.unwrap());
        assert_eq!(agg.min, Some(18.0));
        assert_eq!(agg.max, Some(21.0));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc::now();
        let end = start + chrono::Duration::hours(1);
        let window = TimeWindow::new(Some(start), Some(end));
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(start - chrono::Duration::seconds(1)));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
    }
}
