use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use portwatch_domain::{IntegratedAnalysis, TimeWindow};

use crate::dto::{
    feature_collection, HoursBackParams, IntersectRequest, LayerAreaResponse, SensorStatsResponse,
    StatsParams,
};
use crate::error::ApiError;
use crate::state::ApiState;

const DEFAULT_HOURS_BACK: i64 = 24;

pub async fn layer_area(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<LayerAreaResponse>, ApiError> {
    let area_m2 = state.features.total_area(&name).await?;
    Ok(Json(LayerAreaResponse {
        layer: name,
        area_m2,
    }))
}

pub async fn intersect(
    State(state): State<ApiState>,
    Json(request): Json<IntersectRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let features = state
        .features
        .intersects(&request.layer, &request.geom_wkt)
        .await?;
    Ok(Json(feature_collection(&features, state.geometry.as_ref())?))
}

pub async fn timeseries_stats(
    State(state): State<ApiState>,
    Path(sensor_id): Path<String>,
    Query(params): Query<StatsParams>,
) -> Result<Json<SensorStatsResponse>, ApiError> {
    let agg = state
        .timeseries
        .stats(&sensor_id, params.start.as_deref(), params.end.as_deref())
        .await?;
    Ok(Json(SensorStatsResponse::new(sensor_id, agg)))
}

pub async fn integrated(
    State(state): State<ApiState>,
    Path(parameter): Path<String>,
    Query(params): Query<HoursBackParams>,
) -> Result<Json<IntegratedAnalysis>, ApiError> {
    let hours_back = params.hours_back.unwrap_or(DEFAULT_HOURS_BACK);
    let window = TimeWindow::last_hours(Utc::now(), hours_back);
    let analysis = state
        .integrated
        .integrated_analysis(&parameter, window)
        .await?;
    Ok(Json(analysis))
}
