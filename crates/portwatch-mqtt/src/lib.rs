mod demo_publisher;
mod ingest;

pub use demo_publisher::{run_demo_publisher, DemoPublisherConfig};
pub use ingest::{run_ingest_gateway, MqttIngestConfig, TelemetryMessage, TimestampField};
