pub mod collector;
pub mod data_source;
pub mod error;
pub mod feature_service;
pub mod geometry;
pub mod in_memory;
pub mod integrated_service;
pub mod layer;
pub mod normalizer;
pub mod observation;
pub mod observation_service;
pub mod reading;
pub mod repository;
pub mod timeseries_service;
pub mod timestamp;
pub mod types;

pub use collector::{run_collector, run_cycle, CollectorConfig};
pub use data_source::{FixedObservationSource, ObservationSource, RawSample};
pub use error::{DomainError, DomainResult};
pub use feature_service::FeatureService;
pub use geometry::{point_wkt, GeometryEngine};
pub use in_memory::{InMemoryGeoStore, InMemoryObservationStore, InMemoryReadingStore};
pub use integrated_service::{
    IntegratedAnalysis, IntegratedAnalysisService, SourceAggregate, LOCAL_SENSOR_SOURCE,
};
pub use layer::*;
pub use normalizer::{normalize, normalize_batch};
pub use observation::*;
pub use observation_service::{ObservationCatalog, ObservationService};
pub use reading::*;
pub use repository::{
    FeatureRepository, LayerRepository, ObservationRepository, SensorReadingRepository,
};
pub use timeseries_service::TimeSeriesService;
pub use types::{PropertyMap, PropertyValue, SourceId};
