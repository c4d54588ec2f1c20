use anyhow::Context;
use async_trait::async_trait;
use tokio_postgres::types::Json;
use tracing::debug;

use portwatch_domain::{
    DomainResult, Feature, FeatureRepository, InsertFeatureInput,
};

use crate::client::PostgresClient;
use crate::models::FeatureRow;
use crate::predicate::PredicateBuilder;

/// PostgreSQL implementation of FeatureRepository trait
#[derive(Clone)]
pub struct PostgresFeatureRepository {
    client: PostgresClient,
}

impl PostgresFeatureRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeatureRepository for PostgresFeatureRepository {
    async fn insert_feature(&self, input: InsertFeatureInput) -> DomainResult<Feature> {
        let conn = self.client.get_connection().await?;

        let row = conn
            .query_one(
                "INSERT INTO gd.features (layer_id, properties, geom)
                 VALUES ($1, $2, $3)
                 RETURNING id, layer_id, properties, geom",
                &[&input.layer_id, &Json(&input.properties), &input.geom_wkt],
            )
            .await
            .context("Failed to insert feature")?;

        debug!(layer_id = input.layer_id, "inserted feature");
        Ok(FeatureRow::from_row(&row).into())
    }

    async fn list_features(
        &self,
        layer_id: i64,
        limit: Option<i64>,
    ) -> DomainResult<Vec<Feature>> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        builder.eq("layer_id", layer_id);
        let mut sql = format!(
            "SELECT id, layer_id, properties, geom
             FROM gd.features{}
             ORDER BY id DESC",
            builder.where_sql()
        );
        if let Some(limit) = limit {
            let n = builder.bind_extra(limit);
            sql.push_str(&format!(" LIMIT ${n}"));
        }

        let rows = conn
            .query(&sql, &builder.params())
            .await
            .context("Failed to list features")?;

        Ok(rows
            .iter()
            .map(|row| FeatureRow::from_row(row).into())
            .collect())
    }

    async fn list_geometries(&self, layer_id: i64) -> DomainResult<Vec<String>> {
        let conn = self.client.get_connection().await?;

        let rows = conn
            .query(
                "SELECT geom FROM gd.features WHERE layer_id = $1",
                &[&layer_id],
            )
            .await
            .context("Failed to list geometries")?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
