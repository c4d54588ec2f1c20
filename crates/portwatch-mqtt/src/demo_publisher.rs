use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::ingest::parse_broker_url;

/// Configuration for the demo sensor publisher
pub struct DemoPublisherConfig {
    /// Broker URL in mqtt://host:port form
    pub broker_url: String,
    /// Topic to publish readings on
    pub topic: String,
    /// Sensor ID carried in each payload
    pub sensor_id: String,
    /// Interval between publishing readings
    pub interval: Duration,
}

impl Default for DemoPublisherConfig {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://localhost:1883".to_string(),
            topic: "gd/sensors/harbor/temp".to_string(),
            sensor_id: "harbor_temp".to_string(),
            interval: Duration::from_secs(5),
        }
    }
}

/// Run a demo publisher that emits synthetic harbor water temperature
/// readings at the configured interval until cancelled. Useful for exercising
/// the ingest path without field hardware.
pub async fn run_demo_publisher(
    ctx: CancellationToken,
    config: DemoPublisherConfig,
) -> Result<()> {
    let (host, port) = parse_broker_url(&config.broker_url)
        .map_err(|e| anyhow::anyhow!("invalid broker URL: {e}"))?;

    let client_id = format!("portwatch-demo-{}", config.sensor_id);
    let mut mqtt_options = MqttOptions::new(&client_id, host, port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 10);
    let mut tick = tokio::time::interval(config.interval);

    info!(topic = %config.topic, "demo publisher started");

    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!("received shutdown signal, stopping demo publisher");
                let _ = client.disconnect().await;
                break;
            }
            _ = tick.tick() => {
                let payload = sample_payload(&config.sensor_id);
                if let Err(e) = client
                    .publish(&config.topic, QoS::AtMostOnce, false, payload)
                    .await
                {
                    error!(error = %e, "failed to publish demo reading");
                } else {
                    debug!(topic = %config.topic, "published demo reading");
                }
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("demo publisher connected to MQTT broker");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "demo publisher event loop error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Harbor water temperature around Chancay sits near 18-22 C.
fn sample_payload(sensor_id: &str) -> Vec<u8> {
    let value = 18.0 + rand::thread_rng().gen::<f64>() * 4.0;
    let message = serde_json::json!({
        "sensor_id": sensor_id,
        "value": value,
        "ts": chrono::Utc::now().timestamp(),
    });
    message.to_string().into_bytes()
}
