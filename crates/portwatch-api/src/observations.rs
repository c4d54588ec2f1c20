use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use portwatch_domain::{DatasetSummary, Observation, SourceId};

use crate::dto::{HoursBackParams, ObservationParams};
use crate::error::ApiError;
use crate::state::ApiState;

const DEFAULT_OBSERVATION_LIMIT: i64 = 100;
const DEFAULT_HOURS_BACK: i64 = 24;

fn parse_source(raw: &str) -> Result<SourceId, ApiError> {
    SourceId::from_str(raw).map_err(|_| ApiError::not_found(format!("Unknown source: {raw}")))
}

pub async fn list_datasets(
    State(state): State<ApiState>,
    Path(source): Path<String>,
) -> Result<Json<Vec<DatasetSummary>>, ApiError> {
    let source = parse_source(&source)?;
    Ok(Json(state.observations.datasets(source).await?))
}

pub async fn list_data(
    State(state): State<ApiState>,
    Path((source, dataset, parameter)): Path<(String, String, String)>,
    Query(params): Query<ObservationParams>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let source = parse_source(&source)?;
    let rows = state
        .observations
        .data(
            source,
            &dataset,
            &parameter,
            params.hours_back.unwrap_or(DEFAULT_HOURS_BACK),
            params.limit.unwrap_or(DEFAULT_OBSERVATION_LIMIT),
            params.location,
        )
        .await?;
    Ok(Json(rows))
}

pub async fn spatial_average(
    State(state): State<ApiState>,
    Path((source, dataset, parameter)): Path<(String, String, String)>,
    Query(params): Query<HoursBackParams>,
) -> Result<Json<portwatch_domain::AggregateResult>, ApiError> {
    let source = parse_source(&source)?;
    let agg = state
        .observations
        .spatial_average(
            source,
            &dataset,
            &parameter,
            params.hours_back.unwrap_or(DEFAULT_HOURS_BACK),
        )
        .await?;
    Ok(Json(agg))
}
