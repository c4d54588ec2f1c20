use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use portwatch_domain::{
    CreateLayerInput, DomainError, DomainResult, Layer, LayerRepository,
};

use crate::client::PostgresClient;
use crate::models::LayerRow;

/// PostgreSQL implementation of LayerRepository trait
#[derive(Clone)]
pub struct PostgresLayerRepository {
    client: PostgresClient,
}

impl PostgresLayerRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LayerRepository for PostgresLayerRepository {
    async fn create_layer(&self, input: CreateLayerInput) -> DomainResult<Layer> {
        let conn = self.client.get_connection().await?;

        let result = conn
            .query_one(
                "INSERT INTO gd.layers (name, description, geom_type, srid)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, name, description, geom_type, srid",
                &[&input.name, &input.description, &input.geom_type, &input.srid],
            )
            .await;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                // PostgreSQL error code 23505 is unique_violation
                if let Some(db_err) = e.as_db_error() {
                    if db_err.code().code() == "23505" {
                        return Err(DomainError::LayerAlreadyExists(input.name));
                    }
                }
                return Err(DomainError::StorageFailure(e.into()));
            }
        };

        debug!(layer = %input.name, "created layer");
        Ok(LayerRow::from_row(&row).into())
    }

    async fn get_layer(&self, name: &str) -> DomainResult<Option<Layer>> {
        let conn = self.client.get_connection().await?;

        let row = conn
            .query_opt(
                "SELECT id, name, description, geom_type, srid
                 FROM gd.layers
                 WHERE name = $1",
                &[&name],
            )
            .await
            .context("Failed to query layer")?;

        Ok(row.map(|row| LayerRow::from_row(&row).into()))
    }

    async fn list_layers(&self) -> DomainResult<Vec<Layer>> {
        let conn = self.client.get_connection().await?;

        let rows = conn
            .query(
                "SELECT id, name, description, geom_type, srid
                 FROM gd.layers
                 ORDER BY name",
                &[],
            )
            .await
            .context("Failed to list layers")?;

        Ok(rows
            .iter()
            .map(|row| LayerRow::from_row(row).into())
            .collect())
    }
}
