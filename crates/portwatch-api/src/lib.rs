mod analysis;
mod dto;
mod error;
mod features;
mod observations;
mod router;
mod state;
mod timeseries;

pub use error::ApiError;
pub use router::router;
pub use state::ApiState;
