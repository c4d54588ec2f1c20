use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // OpenTelemetry configuration
    #[serde(default)]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,

    // PostgreSQL configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_pool_size")]
    pub postgres_max_pool_size: usize,

    // HTTP facade
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // MQTT ingest gateway
    #[serde(default = "default_mqtt_broker_url")]
    pub mqtt_broker_url: String,

    #[serde(default = "default_mqtt_topic_filter")]
    pub mqtt_topic_filter: String,

    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,

    #[serde(default = "default_mqtt_retry_secs")]
    pub mqtt_retry_secs: u64,

    /// Publish synthetic harbor sensor readings alongside the gateway
    #[serde(default)]
    pub demo_publisher_enabled: bool,

    #[serde(default = "default_demo_publisher_interval_secs")]
    pub demo_publisher_interval_secs: u64,

    // Collector cadences; each retry interval is strictly shorter than its
    // normal cadence
    #[serde(default = "default_nasa_interval_secs")]
    pub nasa_interval_secs: u64,

    #[serde(default = "default_nasa_retry_secs")]
    pub nasa_retry_secs: u64,

    #[serde(default = "default_esa_interval_secs")]
    pub esa_interval_secs: u64,

    #[serde(default = "default_esa_retry_secs")]
    pub esa_retry_secs: u64,

    #[serde(default = "default_lima_interval_secs")]
    pub lima_interval_secs: u64,

    #[serde(default = "default_lima_retry_secs")]
    pub lima_retry_secs: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    // Region of interest for spatial-average queries (Chancay port area)
    #[serde(default = "default_bbox_min_lat")]
    pub bbox_min_lat: f64,

    #[serde(default = "default_bbox_max_lat")]
    pub bbox_max_lat: f64,

    #[serde(default = "default_bbox_min_lon")]
    pub bbox_min_lon: f64,

    #[serde(default = "default_bbox_max_lon")]
    pub bbox_max_lon: f64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "portwatch".to_string()
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "portwatch".to_string()
}

fn default_postgres_username() -> String {
    "portwatch".to_string()
}

fn default_postgres_password() -> String {
    "portwatch".to_string()
}

fn default_postgres_pool_size() -> usize {
    10
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_mqtt_broker_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_mqtt_topic_filter() -> String {
    "gd/sensors/#".to_string()
}

fn default_mqtt_client_id() -> String {
    "portwatch-ingest".to_string()
}

fn default_mqtt_retry_secs() -> u64 {
    5
}

fn default_demo_publisher_interval_secs() -> u64 {
    5
}

fn default_nasa_interval_secs() -> u64 {
    3600
}

fn default_nasa_retry_secs() -> u64 {
    300
}

fn default_esa_interval_secs() -> u64 {
    7200
}

fn default_esa_retry_secs() -> u64 {
    600
}

fn default_lima_interval_secs() -> u64 {
    7200
}

fn default_lima_retry_secs() -> u64 {
    600
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_bbox_min_lat() -> f64 {
    -11.65
}

fn default_bbox_max_lat() -> f64 {
    -11.50
}

fn default_bbox_min_lon() -> f64 {
    -77.35
}

fn default_bbox_max_lon() -> f64 {
    -77.20
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("PORTWATCH"))
            .build()?
            .try_deserialize()
    }
}
