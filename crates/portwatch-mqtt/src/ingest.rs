use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use portwatch_domain::{DomainError, DomainResult, PropertyMap, TimeSeriesService};

/// Configuration for the MQTT ingest gateway
#[derive(Debug, Clone)]
pub struct MqttIngestConfig {
    /// Broker URL in mqtt://host:port, tcp://host:port or host:port form
    pub broker_url: String,
    /// Topic filter to subscribe to
    pub topic_filter: String,
    /// MQTT client identifier
    pub client_id: String,
    /// Delay between reconnection attempts
    pub retry_delay: Duration,
}

impl Default for MqttIngestConfig {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://localhost:1883".to_string(),
            topic_filter: "gd/sensors/#".to_string(),
            client_id: "portwatch-ingest".to_string(),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Sensor telemetry payload published by field devices. The timestamp is
/// optional and may be either unix seconds or an ISO-8601 string.
#[derive(Debug, Deserialize)]
pub struct TelemetryMessage {
    pub sensor_id: String,
    pub value: f64,
    #[serde(default)]
    pub ts: Option<TimestampField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TimestampField {
    Number(i64),
    Text(String),
}

impl TimestampField {
    fn as_raw(&self) -> String {
        match self {
            TimestampField::Number(n) => n.to_string(),
            TimestampField::Text(s) => s.clone(),
        }
    }
}

/// Run the MQTT ingest gateway until cancelled.
///
/// Subscribes to the configured topic filter and appends each decoded reading
/// to the time-series store. Delivery is at-most-once: a reading lost between
/// receipt and persistence is never retried. Connection failures reconnect
/// forever with a fixed delay.
pub async fn run_ingest_gateway(
    ctx: CancellationToken,
    config: MqttIngestConfig,
    timeseries: Arc<TimeSeriesService>,
) -> anyhow::Result<()> {
    info!(
        broker_url = %config.broker_url,
        topic = %config.topic_filter,
        "starting MQTT ingest gateway"
    );

    loop {
        if ctx.is_cancelled() {
            break;
        }

        match run_connection(&ctx, &config, Arc::clone(&timeseries)).await {
            Ok(()) => {
                debug!("MQTT ingest gateway stopped cleanly");
                break;
            }
            Err(e) => {
                error!(error = %e, "MQTT connection error");
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    _ = tokio::time::sleep(config.retry_delay) => {}
                }
            }
        }
    }

    info!("MQTT ingest gateway stopped");
    Ok(())
}

/// Run a single MQTT connection session
async fn run_connection(
    ctx: &CancellationToken,
    config: &MqttIngestConfig,
    timeseries: Arc<TimeSeriesService>,
) -> DomainResult<()> {
    let (host, port) = parse_broker_url(&config.broker_url)?;

    let mut mqtt_options = MqttOptions::new(&config.client_id, host, port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    client
        .subscribe(&config.topic_filter, QoS::AtMostOnce)
        .await
        .map_err(|e| DomainError::UpstreamUnavailable(format!("Failed to subscribe: {}", e)))?;

    info!(topic = %config.topic_filter, "subscribed to MQTT topic");

    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                debug!("shutdown signal received");
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_message(&publish.topic, &publish.payload, Arc::clone(&timeseries))
                            .await;
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to MQTT broker");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        return Err(DomainError::UpstreamUnavailable(format!(
                            "MQTT event loop error: {}",
                            e
                        )));
                    }
                }
            }
        }
    }
}

/// Handle an incoming MQTT message.
///
/// Malformed payloads are logged and dropped; they never tear down the
/// connection. Each message gets its own root span.
pub(crate) async fn handle_message(
    topic: &str,
    payload: &[u8],
    timeseries: Arc<TimeSeriesService>,
) {
    let span = info_span!(
        parent: Span::none(),
        "sensor_message",
        topic = %topic,
        payload_size = payload.len(),
        sensor_id = tracing::field::Empty,
    );

    async {
        let message: TelemetryMessage = match serde_json::from_slice(payload) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to decode telemetry payload, skipping message");
                return;
            }
        };

        Span::current().record("sensor_id", message.sensor_id.as_str());

        let raw_ts = message.ts.as_ref().map(TimestampField::as_raw);
        let result = timeseries
            .append(
                message.sensor_id,
                raw_ts.as_deref(),
                message.value,
                PropertyMap::new(),
            )
            .await;

        match result {
            Ok(()) => debug!("appended sensor reading"),
            Err(e) => error!(error = %e, "failed to persist sensor reading"),
        }
    }
    .instrument(span)
    .await
}

/// Parse broker URL in format mqtt://host:port or tcp://host:port or host:port
pub fn parse_broker_url(url: &str) -> DomainResult<(&str, u16)> {
    let url = url.trim_start_matches("mqtt://");
    let url = url.trim_start_matches("tcp://");

    let parts: Vec<&str> = url.split(':').collect();
    match parts.len() {
        1 => Ok((parts[0], 1883)), // Default MQTT port
        2 => {
            let port = parts[1].parse::<u16>().map_err(|_| {
                DomainError::InvalidPayload(format!("Invalid port in broker URL: {}", parts[1]))
            })?;
            Ok((parts[0], port))
        }
        _ => Err(DomainError::InvalidPayload(format!(
            "Invalid broker URL format: {}",
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portwatch_domain::{InMemoryReadingStore, SensorReadingRepository, TimeWindow};

    fn service() -> (Arc<InMemoryReadingStore>, Arc<TimeSeriesService>) {
        let store = Arc::new(InMemoryReadingStore::new());
        let service = Arc::new(TimeSeriesService::new(store.clone()));
        (store, service)
    }

    #[test]
    fn parse_broker_url_with_port() {
        let (host, port) = parse_broker_url("mqtt://localhost:1883").unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_broker_url_default_port() {
        let (host, port) = parse_broker_url("broker.local").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_broker_url_rejects_garbage() {
        assert!(parse_broker_url("mqtt://a:b:c").is_err());
        assert!(parse_broker_url("mqtt://host:notaport").is_err());
    }

    #[tokio::test]
    async fn valid_payload_is_appended_with_unix_timestamp() {
        let (store, service) = service();
        let payload = br#"{"sensor_id": "harbor_temp", "value": 19.5, "ts": 1700000000}"#;

        handle_message("gd/sensors/harbor/temp", payload, service).await;

        let readings = store
            .range("harbor_temp", TimeWindow::default(), None)
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].time.timestamp(), 1_700_000_000);
        assert_eq!(readings[0].value, 19.5);
    }

    #[tokio::test]
    async fn string_timestamp_is_accepted() {
        let (store, service) = service();
        let payload =
            br#"{"sensor_id": "harbor_temp", "value": 20.0, "ts": "2024-01-01T00:00:00Z"}"#;

        handle_message("gd/sensors/harbor/temp", payload, service).await;

        let readings = store
            .range("harbor_temp", TimeWindow::default(), None)
            .await
            .unwrap();
        assert_eq!(readings[0].time.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn malformed_payload_is_dropped_and_later_messages_survive() {
        let (store, service) = service();

        handle_message("gd/sensors/x", b"not json", Arc::clone(&service)).await;
        handle_message("gd/sensors/x", br#"{"value": 1.0}"#, Arc::clone(&service)).await;
        handle_message(
            "gd/sensors/x",
            br#"{"sensor_id": "salinity", "value": 35.1}"#,
            service,
        )
        .await;

        let readings = store
            .range("salinity", TimeWindow::default(), None)
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, 35.1);
    }
}
