use std::sync::Arc;

use portwatch_domain::{
    FeatureService, GeometryEngine, IntegratedAnalysisService, ObservationService,
    TimeSeriesService,
};

/// Shared handler state: the domain services plus the geometry engine used to
/// render stored WKT as GeoJSON.
#[derive(Clone)]
pub struct ApiState {
    pub features: Arc<FeatureService>,
    pub timeseries: Arc<TimeSeriesService>,
    pub observations: Arc<ObservationService>,
    pub integrated: Arc<IntegratedAnalysisService>,
    pub geometry: Arc<dyn GeometryEngine>,
}
