use anyhow::Context;
use async_trait::async_trait;
use tokio_postgres::types::Json;
use tracing::debug;

use portwatch_domain::{
    AggregateResult, DatasetSummary, DomainResult, Observation, ObservationQuery,
    ObservationRepository, SourceId, TimeWindow,
};

use crate::client::PostgresClient;
use crate::models::ObservationRow;
use crate::predicate::PredicateBuilder;
use crate::reading_repository::aggregate_from_row;

/// PostgreSQL implementation of ObservationRepository trait. One instance per
/// external source; each source persists to its own table.
#[derive(Clone)]
pub struct PostgresObservationRepository {
    client: PostgresClient,
    table: &'static str,
}

impl PostgresObservationRepository {
    pub fn new(client: PostgresClient, source: SourceId) -> Self {
        let table = match source {
            SourceId::Nasa => "gd.nasa_data",
            SourceId::Esa => "gd.esa_data",
            SourceId::Lima => "gd.lima_data",
        };
        Self { client, table }
    }
}

fn apply_window(builder: &mut PredicateBuilder, window: TimeWindow) {
    if let Some(start) = window.start {
        builder.gte("ts", start);
    }
    if let Some(end) = window.end {
        builder.lte("ts", end);
    }
}

fn apply_query(builder: &mut PredicateBuilder, query: &ObservationQuery) {
    if let Some(dataset) = &query.dataset {
        builder.eq("dataset", dataset.clone());
    }
    if let Some(parameter) = &query.parameter {
        builder.eq("parameter", parameter.clone());
    }
    if let Some(location) = &query.location {
        builder.eq("location", location.clone());
    }
    apply_window(builder, query.window);
    if let Some(bbox) = &query.bbox {
        builder.between_f64("latitude", bbox.min_lat, bbox.max_lat);
        builder.between_f64("longitude", bbox.min_lon, bbox.max_lon);
    }
}

const OBSERVATION_COLUMNS: &str =
    "ts, dataset, parameter, value, latitude, longitude, geom, location, metadata";

#[async_trait]
impl ObservationRepository for PostgresObservationRepository {
    async fn store_batch(&self, observations: Vec<Observation>) -> DomainResult<()> {
        if observations.is_empty() {
            return Ok(());
        }

        let conn = self.client.get_connection().await?;
        let sql = format!(
            "INSERT INTO {} ({OBSERVATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            self.table
        );
        let stmt = conn
            .prepare_cached(&sql)
            .await
            .context("Failed to prepare observation insert")?;

        let stored = observations.len();
        for obs in observations {
            conn.execute(
                &stmt,
                &[
                    &obs.timestamp,
                    &obs.dataset,
                    &obs.parameter,
                    &obs.value,
                    &obs.latitude,
                    &obs.longitude,
                    &obs.geom_wkt,
                    &obs.location,
                    &Json(&obs.metadata),
                ],
            )
            .await
            .context("Failed to insert observation")?;
        }

        debug!(table = self.table, stored, "stored observation batch");
        Ok(())
    }

    async fn list_datasets(&self) -> DomainResult<Vec<DatasetSummary>> {
        let conn = self.client.get_connection().await?;

        let sql = format!(
            "SELECT dataset, parameter, location, COUNT(*), MIN(ts), MAX(ts)
             FROM {}
             GROUP BY dataset, parameter, location
             ORDER BY dataset, parameter, location",
            self.table
        );
        let rows = conn
            .query(&sql, &[])
            .await
            .context("Failed to list datasets")?;

        Ok(rows
            .iter()
            .map(|row| {
                let count: i64 = row.get(3);
                DatasetSummary {
                    dataset: row.get(0),
                    parameter: row.get(1),
                    location: row.get(2),
                    count: u64::try_from(count).unwrap_or(0),
                    earliest: row.get(4),
                    latest: row.get(5),
                }
            })
            .collect())
    }

    async fn query(&self, query: ObservationQuery) -> DomainResult<Vec<Observation>> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        apply_query(&mut builder, &query);
        let mut sql = format!(
            "SELECT {OBSERVATION_COLUMNS} FROM {}{} ORDER BY ts DESC",
            self.table,
            builder.where_sql()
        );
        if let Some(limit) = query.limit {
            let n = builder.bind_extra(limit);
            sql.push_str(&format!(" LIMIT ${n}"));
        }

        let rows = conn
            .query(&sql, &builder.params())
            .await
            .context("Failed to query observations")?;

        Ok(rows
            .iter()
            .map(|row| ObservationRow::from_row(row).into())
            .collect())
    }

    async fn stats(&self, query: ObservationQuery) -> DomainResult<AggregateResult> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        apply_query(&mut builder, &query);
        let sql = format!(
            "SELECT COUNT(*), MIN(value), MAX(value), AVG(value) FROM {}{}",
            self.table,
            builder.where_sql()
        );

        let row = conn
            .query_one(&sql, &builder.params())
            .await
            .context("Failed to aggregate observations")?;

        Ok(aggregate_from_row(&row))
    }

    async fn stats_matching(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<AggregateResult> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        builder.contains_ci("parameter", parameter);
        apply_window(&mut builder, window);
        let sql = format!(
            "SELECT COUNT(*), MIN(value), MAX(value), AVG(value) FROM {}{}",
            self.table,
            builder.where_sql()
        );

        let row = conn
            .query_one(&sql, &builder.params())
            .await
            .context("Failed to aggregate matching observations")?;

        Ok(aggregate_from_row(&row))
    }
}
