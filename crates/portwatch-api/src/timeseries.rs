use axum::extract::{Path, Query, State};
use axum::Json;
use portwatch_domain::SensorReading;

use crate::dto::{AppendReadingRequest, OkResponse, ReadingListParams};
use crate::error::ApiError;
use crate::state::ApiState;

const DEFAULT_READING_LIMIT: i64 = 1000;

pub async fn append_reading(
    State(state): State<ApiState>,
    Json(request): Json<AppendReadingRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .timeseries
        .append(
            request.sensor_id,
            request.time.as_deref(),
            request.value,
            request.properties,
        )
        .await?;
    Ok(Json(OkResponse::new()))
}

pub async fn list_readings(
    State(state): State<ApiState>,
    Path(sensor_id): Path<String>,
    Query(params): Query<ReadingListParams>,
) -> Result<Json<Vec<SensorReading>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_READING_LIMIT);
    let readings = state
        .timeseries
        .range(
            &sensor_id,
            params.start.as_deref(),
            params.end.as_deref(),
            Some(limit),
        )
        .await?;
    Ok(Json(readings))
}
