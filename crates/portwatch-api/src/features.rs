use axum::extract::{Path, Query, State};
use axum::Json;
use portwatch_domain::{CreateLayerInput, Layer};

use crate::dto::{feature_collection, CreateLayerParams, FeatureListParams, InsertFeatureRequest, OkResponse};
use crate::error::ApiError;
use crate::state::ApiState;

const DEFAULT_FEATURE_LIMIT: i64 = 100;

pub async fn create_layer(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<CreateLayerParams>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .features
        .create_layer(CreateLayerInput {
            name,
            geom_type: params.geom_type,
            srid: params.srid,
            description: params.description,
        })
        .await?;
    Ok(Json(OkResponse::new()))
}

pub async fn list_layers(State(state): State<ApiState>) -> Result<Json<Vec<Layer>>, ApiError> {
    Ok(Json(state.features.list_layers().await?))
}

pub async fn insert_feature(
    State(state): State<ApiState>,
    Json(request): Json<InsertFeatureRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .features
        .insert_feature(&request.layer, request.properties, request.geom_wkt)
        .await
        .map_err(ApiError::from_insert_feature)?;
    Ok(Json(OkResponse::new()))
}

pub async fn list_features(
    State(state): State<ApiState>,
    Path(layer): Path<String>,
    Query(params): Query<FeatureListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_FEATURE_LIMIT);
    let features = state.features.list_features(&layer, Some(limit)).await?;
    Ok(Json(feature_collection(&features, state.geometry.as_ref())?))
}
