use anyhow::{Context, Result};
use tracing::info;

use crate::client::PostgresClient;

/// Idempotent DDL for the `gd` schema. Applied once at startup; geometries are
/// stored as WKT text so no spatial extension is required.
const SCHEMA_DDL: &str = "
CREATE SCHEMA IF NOT EXISTS gd;

CREATE TABLE IF NOT EXISTS gd.layers (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    geom_type   TEXT NOT NULL,
    srid        INTEGER NOT NULL DEFAULT 4326,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS gd.features (
    id         BIGSERIAL PRIMARY KEY,
    layer_id   BIGINT NOT NULL REFERENCES gd.layers(id),
    properties JSONB NOT NULL DEFAULT '{}'::jsonb,
    geom       TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS features_layer_id_idx ON gd.features (layer_id);

CREATE TABLE IF NOT EXISTS gd.timeseries (
    id         BIGSERIAL PRIMARY KEY,
    sensor_id  TEXT NOT NULL,
    ts         TIMESTAMPTZ NOT NULL,
    value      DOUBLE PRECISION NOT NULL,
    properties JSONB NOT NULL DEFAULT '{}'::jsonb
);
CREATE INDEX IF NOT EXISTS timeseries_sensor_ts_idx ON gd.timeseries (sensor_id, ts DESC);

CREATE TABLE IF NOT EXISTS gd.nasa_data (
    id        BIGSERIAL PRIMARY KEY,
    ts        TIMESTAMPTZ NOT NULL,
    dataset   TEXT NOT NULL,
    parameter TEXT NOT NULL,
    value     DOUBLE PRECISION NOT NULL,
    latitude  DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    geom      TEXT NOT NULL,
    location  TEXT,
    metadata  JSONB NOT NULL DEFAULT '{}'::jsonb
);
CREATE INDEX IF NOT EXISTS nasa_data_dataset_ts_idx ON gd.nasa_data (dataset, parameter, ts DESC);

CREATE TABLE IF NOT EXISTS gd.esa_data (
    id        BIGSERIAL PRIMARY KEY,
    ts        TIMESTAMPTZ NOT NULL,
    dataset   TEXT NOT NULL,
    parameter TEXT NOT NULL,
    value     DOUBLE PRECISION NOT NULL,
    latitude  DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    geom      TEXT NOT NULL,
    location  TEXT,
    metadata  JSONB NOT NULL DEFAULT '{}'::jsonb
);
CREATE INDEX IF NOT EXISTS esa_data_dataset_ts_idx ON gd.esa_data (dataset, parameter, ts DESC);

CREATE TABLE IF NOT EXISTS gd.lima_data (
    id        BIGSERIAL PRIMARY KEY,
    ts        TIMESTAMPTZ NOT NULL,
    dataset   TEXT NOT NULL,
    parameter TEXT NOT NULL,
    value     DOUBLE PRECISION NOT NULL,
    latitude  DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    geom      TEXT NOT NULL,
    location  TEXT,
    metadata  JSONB NOT NULL DEFAULT '{}'::jsonb
);
CREATE INDEX IF NOT EXISTS lima_data_dataset_ts_idx ON gd.lima_data (dataset, parameter, ts DESC);
";

/// Applies the schema DDL. Safe to run on every startup.
pub async fn ensure_schema(client: &PostgresClient) -> Result<()> {
    let conn = client.get_connection().await?;
    conn.batch_execute(SCHEMA_DDL)
        .await
        .context("Failed to apply schema DDL")?;
    info!("database schema ensured");
    Ok(())
}
