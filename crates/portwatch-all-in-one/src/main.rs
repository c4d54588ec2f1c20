mod config;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use portwatch_api::{router, ApiState};
use portwatch_collectors::{EsaCollector, LimaCollector, NasaCollector};
use portwatch_domain::{
    run_collector, BoundingBox, CollectorConfig, FeatureService, GeometryEngine,
    IntegratedAnalysisService, ObservationCatalog, ObservationRepository, ObservationService,
    ObservationSource, TimeSeriesService,
};
use portwatch_geometry::GeoEngine;
use portwatch_mqtt::{run_demo_publisher, run_ingest_gateway, DemoPublisherConfig, MqttIngestConfig};
use portwatch_postgres::{
    ensure_schema, PostgresClient, PostgresConfig, PostgresFeatureRepository,
    PostgresLayerRepository, PostgresObservationRepository, PostgresReadingRepository,
};
use portwatch_runner::Runner;
use tracing::{error, info};

use config::ServiceConfig;
use telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        http_port = config.http_port,
        "starting portwatch-all-in-one service"
    );

    let result = run_service(&config).await;

    shutdown_telemetry(telemetry_providers);

    if let Err(e) = result {
        error!("service exited with error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_service(config: &ServiceConfig) -> anyhow::Result<()> {
    // Storage
    let postgres = PostgresClient::new(&PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        max_pool_size: config.postgres_max_pool_size,
    })?;
    postgres.ping().await?;
    ensure_schema(&postgres).await?;

    let layers = Arc::new(PostgresLayerRepository::new(postgres.clone()));
    let features = Arc::new(PostgresFeatureRepository::new(postgres.clone()));
    let readings = Arc::new(PostgresReadingRepository::new(postgres.clone()));
    let nasa_store = Arc::new(PostgresObservationRepository::new(
        postgres.clone(),
        portwatch_domain::SourceId::Nasa,
    ));
    let esa_store = Arc::new(PostgresObservationRepository::new(
        postgres.clone(),
        portwatch_domain::SourceId::Esa,
    ));
    let lima_store = Arc::new(PostgresObservationRepository::new(
        postgres.clone(),
        portwatch_domain::SourceId::Lima,
    ));

    let bbox = BoundingBox {
        min_lat: config.bbox_min_lat,
        max_lat: config.bbox_max_lat,
        min_lon: config.bbox_min_lon,
        max_lon: config.bbox_max_lon,
    };

    // Domain services
    let engine: Arc<dyn GeometryEngine> = Arc::new(GeoEngine::new());
    let catalog = ObservationCatalog::new(nasa_store.clone(), esa_store.clone(), lima_store.clone());
    let feature_service = Arc::new(FeatureService::new(layers, features, engine.clone()));
    let timeseries_service = Arc::new(TimeSeriesService::new(readings.clone()));
    let observation_service = Arc::new(ObservationService::new(catalog.clone(), bbox));
    let integrated_service = Arc::new(IntegratedAnalysisService::new(catalog, readings));

    let api_state = ApiState {
        features: feature_service,
        timeseries: timeseries_service.clone(),
        observations: observation_service,
        integrated: integrated_service,
        geometry: engine,
    };

    let http_addr = format!("{}:{}", config.http_host, config.http_port);
    let mqtt_config = MqttIngestConfig {
        broker_url: config.mqtt_broker_url.clone(),
        topic_filter: config.mqtt_topic_filter.clone(),
        client_id: config.mqtt_client_id.clone(),
        retry_delay: Duration::from_secs(config.mqtt_retry_secs),
    };

    let mut runner = Runner::new()
        .with_named_process("http_facade", {
            let app = router(api_state);
            move |ctx| async move {
                let listener = tokio::net::TcpListener::bind(&http_addr).await?;
                info!(addr = %http_addr, "query facade listening");
                axum::serve(listener, app)
                    .with_graceful_shutdown(ctx.cancelled_owned())
                    .await?;
                Ok(())
            }
        })
        .with_named_process("mqtt_ingest", {
            let timeseries = timeseries_service.clone();
            move |ctx| run_ingest_gateway(ctx, mqtt_config, timeseries)
        })
        .with_named_process("nasa_collector", {
            collector_process(
                CollectorConfig {
                    interval: Duration::from_secs(config.nasa_interval_secs),
                    retry_interval: Duration::from_secs(config.nasa_retry_secs),
                    fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
                },
                Arc::new(NasaCollector::new(bbox)),
                nasa_store,
            )
        })
        .with_named_process("esa_collector", {
            collector_process(
                CollectorConfig {
                    interval: Duration::from_secs(config.esa_interval_secs),
                    retry_interval: Duration::from_secs(config.esa_retry_secs),
                    fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
                },
                Arc::new(EsaCollector::new()),
                esa_store,
            )
        })
        .with_named_process("lima_collector", {
            collector_process(
                CollectorConfig {
                    interval: Duration::from_secs(config.lima_interval_secs),
                    retry_interval: Duration::from_secs(config.lima_retry_secs),
                    fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
                },
                Arc::new(LimaCollector::new()),
                lima_store,
            )
        });

    if config.demo_publisher_enabled {
        let demo_config = DemoPublisherConfig {
            broker_url: config.mqtt_broker_url.clone(),
            interval: Duration::from_secs(config.demo_publisher_interval_secs),
            ..DemoPublisherConfig::default()
        };
        runner = runner.with_named_process("demo_publisher", move |ctx| {
            run_demo_publisher(ctx, demo_config)
        });
    }

    runner.run().await
}

fn collector_process(
    config: CollectorConfig,
    source: Arc<dyn ObservationSource>,
    repository: Arc<dyn ObservationRepository>,
) -> impl FnOnce(
    tokio_util::sync::CancellationToken,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>>
       + Send
       + 'static {
    move |ctx| Box::pin(run_collector(ctx, config, source, repository))
}
