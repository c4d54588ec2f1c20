use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{DomainError, DomainResult};
use crate::types::{PropertyMap, SourceId};

/// A raw, source-specific sample as produced by an external dataset producer,
/// before normalization into an `Observation`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub occurred_at: DateTime<Utc>,
    pub dataset: String,
    pub parameter: String,
    pub value: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Named site, supplied by municipal producers only.
    pub site: Option<String>,
    pub metadata: PropertyMap,
}

/// Pluggable external data producer. Production implementations live in
/// portwatch-collectors; tests use `FixedObservationSource`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObservationSource: Send + Sync {
    fn source_id(&self) -> SourceId;

    /// Fetch or generate one batch of raw samples.
    async fn fetch_batch(&self) -> DomainResult<Vec<RawSample>>;
}

/// Deterministic source double: hands out pre-scripted batches in order, so
/// the normalizer and collector can be tested without nondeterministic input.
pub struct FixedObservationSource {
    source: SourceId,
    batches: Mutex<VecDeque<DomainResult<Vec<RawSample>>>>,
}

impl FixedObservationSource {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            batches: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_batch(&self, batch: Vec<RawSample>) {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(Ok(batch));
    }

    pub fn push_failure(&self, message: &str) {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(Err(DomainError::UpstreamUnavailable(message.to_string())));
    }
}

#[async_trait]
impl ObservationSource for FixedObservationSource {
    fn source_id(&self) -> SourceId {
        self.source
    }

    async fn fetch_batch(&self) -> DomainResult<Vec<RawSample>> {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
