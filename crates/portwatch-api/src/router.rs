use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analysis;
use crate::features;
use crate::observations;
use crate::state::ApiState;
use crate::timeseries;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Builds the query facade router. Static path segments take precedence over
/// the `{source}` captures, so the analysis and store routes coexist with the
/// per-source observation routes.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/layers", get(features::list_layers))
        .route("/layers/:name", post(features::create_layer))
        .route("/features", post(features::insert_feature))
        .route("/features/:layer", get(features::list_features))
        .route("/timeseries", post(timeseries::append_reading))
        .route("/timeseries/:sensor_id", get(timeseries::list_readings))
        .route("/analysis/layer/:name/area", get(analysis::layer_area))
        .route("/analysis/intersect", post(analysis::intersect))
        .route(
            "/analysis/timeseries/:sensor_id/stats",
            get(analysis::timeseries_stats),
        )
        .route("/analysis/integrated/:parameter", get(analysis::integrated))
        .route("/:source/datasets", get(observations::list_datasets))
        .route(
            "/:source/data/:dataset/:parameter",
            get(observations::list_data),
        )
        .route(
            "/:source/analysis/spatial-average/:dataset/:parameter",
            get(observations::spatial_average),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
