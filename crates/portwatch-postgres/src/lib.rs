mod client;
mod config;
mod feature_repository;
mod layer_repository;
mod models;
mod observation_repository;
mod predicate;
mod reading_repository;
mod schema;

pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use feature_repository::PostgresFeatureRepository;
pub use layer_repository::PostgresLayerRepository;
pub use models::{FeatureRow, LayerRow, ObservationRow, ReadingRow};
pub use observation_repository::PostgresObservationRepository;
pub use reading_repository::PostgresReadingRepository;
pub use schema::ensure_schema;
