use anyhow::Context;
use async_trait::async_trait;
use tokio_postgres::types::Json;
use tracing::debug;

use portwatch_domain::{
    AggregateResult, DomainResult, SensorReading, SensorReadingRepository, TimeWindow,
};

use crate::client::PostgresClient;
use crate::models::ReadingRow;
use crate::predicate::PredicateBuilder;

/// PostgreSQL implementation of SensorReadingRepository trait
#[derive(Clone)]
pub struct PostgresReadingRepository {
    client: PostgresClient,
}

impl PostgresReadingRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
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

pub(crate) fn aggregate_from_row(row: &tokio_postgres::Row) -> AggregateResult {
    let count: i64 = row.get(0);
    AggregateResult {
        count: u64::try_from(count).unwrap_or(0),
        min: row.get(1),
        max: row.get(2),
        avg: row.get(3),
    }
}

#[async_trait]
impl SensorReadingRepository for PostgresReadingRepository {
    async fn append(&self, reading: SensorReading) -> DomainResult<()> {
        let conn = self.client.get_connection().await?;

        conn.execute(
            "INSERT INTO gd.timeseries (sensor_id, ts, value, properties)
             VALUES ($1, $2, $3, $4)",
            &[
                &reading.sensor_id,
                &reading.time,
                &reading.value,
                &Json(&reading.properties),
            ],
        )
        .await
        .context("Failed to insert reading")?;

        debug!(sensor_id = %reading.sensor_id, "appended reading");
        Ok(())
    }

    async fn range(
        &self,
        sensor_id: &str,
        window: TimeWindow,
        limit: Option<i64>,
    ) -> DomainResult<Vec<SensorReading>> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        builder.eq("sensor_id", sensor_id.to_string());
        apply_window(&mut builder, window);
        let mut sql = format!(
            "SELECT sensor_id, ts, value, properties
             FROM gd.timeseries{}
             ORDER BY ts DESC",
            builder.where_sql()
        );
        if let Some(limit) = limit {
            let n = builder.bind_extra(limit);
            sql.push_str(&format!(" LIMIT ${n}"));
        }

        let rows = conn
            .query(&sql, &builder.params())
            .await
            .context("Failed to query readings")?;

        Ok(rows
            .iter()
            .map(|row| ReadingRow::from_row(row).into())
            .collect())
    }

    async fn stats(&self, sensor_id: &str, window: TimeWindow) -> DomainResult<AggregateResult> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        builder.eq("sensor_id", sensor_id.to_string());
        apply_window(&mut builder, window);
        let sql = format!(
            "SELECT COUNT(*), MIN(value), MAX(value), AVG(value)
             FROM gd.timeseries{}",
            builder.where_sql()
        );

        let row = conn
            .query_one(&sql, &builder.params())
            .await
            .context("Failed to aggregate readings")?;

        Ok(aggregate_from_row(&row))
    }

    async fn stats_matching(
        &self,
        parameter: &str,
        window: TimeWindow,
    ) -> DomainResult<AggregateResult> {
        let conn = self.client.get_connection().await?;

        let mut builder = PredicateBuilder::new();
        builder.contains_ci("sensor_id", parameter);
        apply_window(&mut builder, window);
        let sql = format!(
            "SELECT COUNT(*), MIN(value), MAX(value), AVG(value)
             FROM gd.timeseries{}",
            builder.where_sql()
        );

        let row = conn
            .query_one(&sql, &builder.params())
            .await
            .context("Failed to aggregate matching readings")?;

        Ok(aggregate_from_row(&row))
    }
}
